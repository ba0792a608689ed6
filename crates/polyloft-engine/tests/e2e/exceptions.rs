//! throw / try / catch / finally and defer

use super::harness::*;

// ============================================================================
// try / catch / finally
// ============================================================================

#[test]
fn test_catch_thrown_string() {
    expect_str(
        "var got = \"\"
         try
             throw \"boom\"
         catch e
             got = e
         end
         got",
        "boom",
    );
}

#[test]
fn test_typed_catch_selects_matching_clause() {
    expect_str(
        "var got = \"\"
         try
             throw TypeError(\"bad type\")
         catch e: TimeoutError
             got = \"timeout\"
         catch e: RuntimeError
             got = \"runtime: \" + e.getMessage()
         end
         got",
        "runtime: bad type",
    );
}

#[test]
fn test_catch_string_type() {
    expect_int(
        "var n = 0
         try
             throw \"text\"
         catch e: Int
             n = 1
         catch e: String
             n = 2
         end
         n",
        2,
    );
}

#[test]
fn test_unmatched_catch_propagates() {
    expect_error_contains(
        "try
             throw \"escaped\"
         catch e: RuntimeError
             println(\"no\")
         end",
        "Uncaught exception: escaped",
    );
}

#[test]
fn test_finally_runs_on_every_path() {
    expect_str(
        "var log = []
         def attempt(fail):
             try
                 if fail:
                     throw \"x\"
                 end
                 log.push(\"ok\")
             catch e
                 log.push(\"caught\")
             finally
                 log.push(\"finally\")
             end
         end
         attempt(false)
         attempt(true)
         log.join(\",\")",
        "ok,finally,caught,finally",
    );
}

#[test]
fn test_finally_runs_before_return() {
    expect_str(
        "var log = []
         def early():
             try
                 return \"value\"
             finally
                 log.push(\"cleanup\")
             end
         end
         early() + \":\" + log.join(\",\")",
        "value:cleanup",
    );
}

#[test]
fn test_exception_class_hierarchy() {
    expect_bool(
        "let e = TimeoutError(\"late\")
         (e instanceof RuntimeError) && (e instanceof Exception) && (e instanceof Throwable)",
        true,
    );
}

#[test]
fn test_uncaught_exception_object_message() {
    expect_error_contains("throw RuntimeError(\"broken\")", "Uncaught exception: broken");
}

#[test]
fn test_engine_faults_are_not_catchable() {
    expect_error_contains(
        "try
             let n: Int = \"x\"
         catch e
             println(\"caught\")
         end",
        "expected Int, got String",
    );
}

// ============================================================================
// defer
// ============================================================================

#[test]
fn test_defer_runs_in_reverse_order() {
    expect_str(
        "var log = []
         def work():
             defer log.push(\"first\")
             defer log.push(\"second\")
             log.push(\"body\")
         end
         work()
         log.join(\",\")",
        "body,second,first",
    );
}

#[test]
fn test_defer_runs_on_early_return() {
    expect_str(
        "var log = []
         def work(n):
             defer log.push(\"deferred\")
             if n > 0:
                 return \"early\"
             end
             log.push(\"late\")
             return \"late\"
         end
         work(1) + \":\" + log.join(\",\")",
        "early:deferred",
    );
}

#[test]
fn test_defer_runs_when_throw_unwinds() {
    expect_str(
        "var log = []
         def risky():
             defer log.push(\"d1\")
             defer log.push(\"d2\")
             throw \"fail\"
         end
         try
             risky()
         catch e
             log.push(\"caught \" + e)
         end
         log.join(\",\")",
        "d2,d1,caught fail",
    );
}

#[test]
fn test_defer_runs_once() {
    expect_int(
        "var count = 0
         def bump():
             count = count + 1
         end
         def work():
             defer bump()
             return 1
         end
         work()
         work()
         count",
        2,
    );
}

#[test]
fn test_defer_with_function_value() {
    expect_str(
        "var log = []
         def cleanup():
             log.push(\"cleaned\")
         end
         def work():
             defer cleanup
         end
         work()
         log.join(\",\")",
        "cleaned",
    );
}

#[test]
fn test_builtin_error_classes_extend_runtime_error() {
    expect_str(
        "var caught = []
         for err in [NameError(\"n\"), ValueError(\"v\"), AttributeError(\"a\"), IndexError(\"i\")]:
             try
                 throw err
             catch e: RuntimeError
                 caught.push(Sys.type(e))
             end
         end
         caught.join(\",\")",
        "NameError,ValueError,AttributeError,IndexError",
    );
}
