use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polyloft_engine::parser::Lexer;
use polyloft_engine::vm::context::parse_program;
use polyloft_engine::{BufferSink, EvalOptions, Runtime};

const FIB: &str = "def fib(n: Int) -> Int:
    if n < 2:
        return n
    end
    return fib(n - 1) + fib(n - 2)
end
";

const CLASSES: &str = "class Point:
    var x: Int = 0
    var y: Int = 0
    Point(x: Int, y: Int):
        this.x = x
        this.y = y
    end
    def add(other: Point) -> Point = Point(this.x + other.x, this.y + other.y)
end
var acc = Point(0, 0)
for i in range(500):
    acc = acc.add(Point(i, 1))
end
acc.x
";

fn runtime() -> Runtime {
    Runtime::new(EvalOptions::default().with_stdout(BufferSink::new()))
}

fn bench_front_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("front_end");
    group.bench_function("lex_classes", |b| {
        b.iter(|| Lexer::new(black_box(CLASSES)).tokenize().unwrap());
    });
    group.bench_function("parse_classes", |b| {
        b.iter(|| parse_program(black_box(CLASSES)).unwrap());
    });
    group.finish();
}

fn bench_fib(c: &mut Criterion) {
    let mut group = c.benchmark_group("fib");
    for n in [10, 15] {
        let program = parse_program(&format!("{}fib({})", FIB, n)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &program, |b, program| {
            let runtime = runtime();
            b.iter(|| runtime.eval_program(black_box(program)).unwrap());
        });
    }
    group.finish();
}

fn bench_objects(c: &mut Criterion) {
    let program = parse_program(CLASSES).unwrap();
    c.bench_function("object_allocation", |b| {
        b.iter(|| runtime().eval_program(black_box(&program)).unwrap());
    });
}

fn bench_channels(c: &mut Criterion) {
    let mut group = c.benchmark_group("channels");
    for count in [100, 1000] {
        let source = format!(
            "let ch = Channel<Int>(16)
             let producer = thread spawn do
                 for i in range({}):
                     ch.send(i)
                 end
                 ch.close()
             end
             var total = 0
             loop:
                 let v = ch.recv()
                 if v == nil:
                     break
                 end
                 total += v
             end
             thread join producer
             total",
            count
        );
        let program = parse_program(&source).unwrap();
        group.bench_with_input(BenchmarkId::new("producer_consumer", count), &program, |b, program| {
            b.iter(|| runtime().eval_program(black_box(program)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_front_end, bench_fib, bench_objects, bench_channels);
criterion_main!(benches);
