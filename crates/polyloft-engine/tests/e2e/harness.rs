//! Test harness for end-to-end evaluation
//!
//! Runs Polyloft source in a fresh runtime with captured output.

use polyloft_engine::{BufferSink, EvalError, EvalOptions, Runtime, Value};

/// Evaluate `source` in a fresh runtime, returning the result and everything
/// the program printed.
pub fn run_capturing(source: &str) -> (Result<Value, EvalError>, String) {
    let sink = BufferSink::new();
    let runtime = Runtime::new(EvalOptions::default().with_stdout(sink.clone()));
    let result = runtime.eval_source(source);
    (result, sink.contents())
}

pub fn run(source: &str) -> Result<Value, EvalError> {
    run_capturing(source).0
}

fn run_ok(source: &str) -> Value {
    match run(source) {
        Ok(value) => value,
        Err(e) => panic!("Evaluation failed: {}\nSource:\n{}", e, source),
    }
}

/// Evaluate, expecting the program's last expression to be an Int.
pub fn expect_int(source: &str, expected: i64) {
    let value = run_ok(source);
    match value.as_int() {
        Some(actual) => assert_eq!(actual, expected, "Wrong result for:\n{}", source),
        None => panic!("Expected Int result, got {:?}\nSource:\n{}", value, source),
    }
}

/// Evaluate, expecting a Float result (within epsilon).
#[allow(dead_code)]
pub fn expect_float(source: &str, expected: f64) {
    let value = run_ok(source);
    match value.as_float() {
        Some(actual) => assert!(
            (actual - expected).abs() < 1e-10,
            "Expected {}, got {} for:\n{}",
            expected,
            actual,
            source
        ),
        None => panic!("Expected Float result, got {:?}\nSource:\n{}", value, source),
    }
}

pub fn expect_bool(source: &str, expected: bool) {
    let value = run_ok(source);
    match value.as_bool() {
        Some(actual) => assert_eq!(actual, expected, "Wrong result for:\n{}", source),
        None => panic!("Expected Bool result, got {:?}\nSource:\n{}", value, source),
    }
}

pub fn expect_str(source: &str, expected: &str) {
    let value = run_ok(source);
    match value.as_str() {
        Some(actual) => assert_eq!(actual, expected, "Wrong result for:\n{}", source),
        None => panic!("Expected String result, got {:?}\nSource:\n{}", value, source),
    }
}

/// Evaluate, expecting the program to print exactly `expected`.
pub fn expect_output(source: &str, expected: &str) {
    let (result, output) = run_capturing(source);
    if let Err(e) = result {
        panic!("Evaluation failed: {}\nSource:\n{}", e, source);
    }
    assert_eq!(output, expected, "Wrong output for:\n{}", source);
}

/// Evaluate, expecting failure with a message containing `pattern`.
pub fn expect_error_contains(source: &str, pattern: &str) {
    match run(source) {
        Ok(value) => panic!(
            "Expected error containing '{}', but got {:?}\nSource:\n{}",
            pattern, value, source
        ),
        Err(e) => {
            let message = e.to_string();
            assert!(
                message.contains(pattern),
                "Expected error containing '{}', got: {}\nSource:\n{}",
                pattern,
                message,
                source
            );
        }
    }
}
