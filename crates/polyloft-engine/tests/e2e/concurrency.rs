//! Threads, channels and select

use super::harness::*;
use polyloft_engine::{BufferSink, EvalOptions, Runtime, SelectPolicy};

// ============================================================================
// Threads
// ============================================================================

#[test]
fn test_thread_join_returns_body_value() {
    expect_int(
        "let t = thread spawn do
             return 42
         end
         thread join t",
        42,
    );
}

#[test]
fn test_thread_sees_enclosing_bindings() {
    expect_int(
        "let base = 40
         let t = thread spawn do
             return base + 2
         end
         thread join t",
        42,
    );
}

#[test]
fn test_thread_throw_is_rethrown_at_join() {
    expect_str(
        "let t = thread spawn do
             throw \"worker failed\"
         end
         var got = \"\"
         try
             thread join t
         catch e
             got = e
         end
         got",
        "worker failed",
    );
}

#[test]
fn test_thread_defers_run_before_join() {
    expect_str(
        "let log = []
         let t = thread spawn do
             defer log.push(\"cleanup\")
             log.push(\"work\")
         end
         thread join t
         log.join(\",\")",
        "work,cleanup",
    );
}

#[test]
fn test_many_threads_share_a_channel() {
    expect_int(
        "let results = Channel<Int>(10)
         let workers = []
         for i in 1...10:
             let n = i
             workers.push(thread spawn do
                 results.send(n * n)
             end)
         end
         for w in workers:
             thread join w
         end
         results.close()
         var total = 0
         loop:
             let v = results.recv()
             if v == nil:
                 break
             end
             total += v
         end
         total",
        385,
    );
}

// ============================================================================
// Channels
// ============================================================================

#[test]
fn test_buffered_channel_drains_after_close() {
    expect_str(
        "let ch = Channel<Int>(3)
         ch.send(1)
         ch.send(2)
         ch.send(3)
         ch.close()
         str(ch.recv()) + str(ch.recv()) + str(ch.recv()) + str(ch.recv())",
        "123nil",
    );
}

#[test]
fn test_send_on_closed_channel() {
    expect_error_contains(
        "let ch = Channel<Int>(1)\nch.close()\nch.send(1)",
        "send on closed channel",
    );
}

#[test]
fn test_channel_element_type_is_checked() {
    expect_error_contains(
        "let ch = Channel<Int>(1)\nch.send(\"one\")",
        "expected Int, got String",
    );
}

#[test]
fn test_channel_keyword_form() {
    expect_int(
        "let ch = channel[Int](2)
         ch.send(5)
         ch.len() + ch.capacity()",
        3,
    );
}

#[test]
fn test_try_recv_does_not_block() {
    expect_bool("let ch = Channel(1)\nch.tryRecv() == nil && !ch.isClosed()", true);
}

// ============================================================================
// select
// ============================================================================

const EVEN_COUNTER: &str = "let ch = Channel<Int>(2)
let producer = thread spawn do
    for i in 1...5:
        ch.send(i)
    end
    ch.close()
end
var evens = 0
loop:
    select
        case let v = ch.recv():
            if v % 2 == 0:
                evens += 1
            end
        case closed ch:
            break
    end
end
thread join producer
evens
";

#[test]
fn test_select_consumes_until_closed() {
    expect_int(EVEN_COUNTER, 2);
}

#[test]
fn test_select_with_random_policy() {
    let runtime = Runtime::new(
        EvalOptions::default()
            .with_stdout(BufferSink::new())
            .with_select_policy(SelectPolicy::Random),
    );
    let value = runtime.eval_source(EVEN_COUNTER).expect("program should run");
    assert_eq!(value.as_int(), Some(2));
}

#[test]
fn test_select_prefers_first_ready_case() {
    expect_str(
        "let a = Channel(1)
         let b = Channel(1)
         a.send(\"a\")
         b.send(\"b\")
         var got = \"\"
         select
             case let x = a.recv():
                 got = x
             case let y = b.recv():
                 got = y
         end
         got",
        "a",
    );
}

#[test]
fn test_select_skips_drained_closed_channel() {
    expect_str(
        "let done = Channel(1)
         let data = Channel(1)
         done.close()
         data.send(7)
         var got = \"\"
         select
             case let x = done.recv():
                 got = \"done\"
             case let y = data.recv():
                 got = \"data \" + y
         end
         got",
        "data 7",
    );
}
