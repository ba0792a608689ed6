//! Runtime session and isolation tests
//!
//! A runtime keeps declarations between evaluations until it is reset, and
//! two runtimes never observe each other's state.

use polyloft_engine::{BufferSink, EvalError, EvalOptions, Runtime};
use std::io::Write;

fn quiet_runtime() -> (Runtime, std::sync::Arc<BufferSink>) {
    let sink = BufferSink::new();
    let runtime = Runtime::new(EvalOptions::default().with_stdout(sink.clone()));
    (runtime, sink)
}

#[test]
fn test_bindings_persist_between_evaluations() {
    let (runtime, _) = quiet_runtime();
    runtime.eval_source("let answer = 41").unwrap();
    runtime.eval_source("def bump(n) = n + 1").unwrap();
    let value = runtime.eval_source("bump(answer)").unwrap();
    assert_eq!(value.as_int(), Some(42));
    assert_eq!(runtime.global("answer").and_then(|v| v.as_int()), Some(41));
}

#[test]
fn test_classes_persist_between_evaluations() {
    let (runtime, _) = quiet_runtime();
    runtime
        .eval_source("class Greeter:\n def hi() = \"hi\"\nend")
        .unwrap();
    assert!(runtime.registry().contains("Greeter"));
    let value = runtime.eval_source("Greeter().hi()").unwrap();
    assert_eq!(value.as_str(), Some("hi"));
}

#[test]
fn test_reset_clears_declarations() {
    let (runtime, _) = quiet_runtime();
    runtime
        .eval_source("let x = 1\nclass Temp\nend")
        .unwrap();
    runtime.reset();

    assert!(runtime.global("x").is_none());
    assert!(!runtime.registry().contains("Temp"));
    let err = runtime.eval_source("x").unwrap_err();
    assert!(err.to_string().contains("name 'x' is not defined"), "got: {}", err);

    // Builtins are reinstalled.
    assert!(runtime.registry().contains("RuntimeError"));
    assert_eq!(runtime.eval_source("len([1, 2])").unwrap().as_int(), Some(2));
}

#[test]
fn test_runtimes_are_isolated() {
    let (first, first_out) = quiet_runtime();
    let (second, second_out) = quiet_runtime();

    first.eval_source("class Only\nend\nlet shared = 1\nprintln(\"first\")").unwrap();
    assert!(second.global("shared").is_none());
    assert!(!second.registry().contains("Only"));

    second.eval_source("let shared = 2\nprintln(\"second\")").unwrap();
    assert_eq!(first.global("shared").and_then(|v| v.as_int()), Some(1));
    assert_eq!(first_out.contents(), "first\n");
    assert_eq!(second_out.contents(), "second\n");
}

#[test]
fn test_failed_evaluation_keeps_earlier_state() {
    let (runtime, _) = quiet_runtime();
    runtime.eval_source("var count = 1").unwrap();
    assert!(runtime.eval_source("count = 2\nthrow \"stop\"").is_err());
    assert_eq!(runtime.global("count").and_then(|v| v.as_int()), Some(2));
}

#[test]
fn test_eval_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "def triple(n) = n * 3").unwrap();
    writeln!(file, "println(triple(4))").unwrap();
    writeln!(file, "triple(5)").unwrap();

    let (runtime, out) = quiet_runtime();
    let value = runtime.eval_file(file.path()).unwrap();
    assert_eq!(value.as_int(), Some(15));
    assert_eq!(out.contents(), "12\n");
}

#[test]
fn test_eval_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, _) = quiet_runtime();
    let err = runtime.eval_file(dir.path().join("missing.pf")).unwrap_err();
    assert!(matches!(err, EvalError::Io { .. }));
}

#[test]
fn test_syntax_error_is_reported() {
    let (runtime, _) = quiet_runtime();
    let err = runtime.eval_source("let = 1").unwrap_err();
    assert!(matches!(err, EvalError::Parse(_)), "got: {:?}", err);
}

#[test]
fn test_call_depth_option() {
    let runtime = Runtime::new(
        EvalOptions::default()
            .with_stdout(BufferSink::new())
            .with_max_call_depth(50),
    );
    let err = runtime
        .eval_source("def down(n) = down(n + 1)\ndown(0)")
        .unwrap_err();
    assert!(
        err.to_string().contains("maximum recursion depth exceeded (50)"),
        "got: {}",
        err
    );
    assert_eq!(runtime.options().max_call_depth, 50);
}
