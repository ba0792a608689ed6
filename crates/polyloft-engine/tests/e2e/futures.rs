//! async, Promise and CompletableFuture

use super::harness::*;

#[test]
fn test_async_await() {
    expect_int("async(() => 21 * 2).await()", 42);
}

#[test]
fn test_async_throw_rejects() {
    expect_str(
        "let p = async(() => do
             throw \"nope\"
         end)
         var got = \"\"
         try
             p.await()
         catch e
             got = \"caught \" + e
         end
         got",
        "caught nope",
    );
}

#[test]
fn test_promise_resolve() {
    expect_str(
        "let p = Promise((resolve, reject) => resolve(\"done\"))
         p.await() + \" \" + p.getState()",
        "done fulfilled",
    );
}

#[test]
fn test_promise_reject_is_thrown_by_await() {
    expect_error_contains(
        "Promise((resolve, reject) => reject(\"bad input\")).await()",
        "Uncaught exception: bad input",
    );
}

#[test]
fn test_executor_throw_rejects() {
    expect_str(
        "let p = Promise((resolve, reject) => do
             throw \"exploded\"
         end)
         p.getState()",
        "rejected",
    );
}

#[test]
fn test_promise_settles_once() {
    expect_int(
        "let p = Promise((resolve, reject) => do
             resolve(1)
             resolve(2)
             reject(\"late\")
         end)
         p.await()",
        1,
    );
}

#[test]
fn test_then_chains_values() {
    expect_int(
        "async(() => 10).then((x) => x + 1).then((x) => x * 2).await()",
        22,
    );
}

#[test]
fn test_then_registered_after_settlement() {
    expect_int(
        "let p = Promise((resolve, reject) => resolve(5))
         Sys.sleep(5)
         p.then((x) => x * 3).await()",
        15,
    );
}

#[test]
fn test_catch_recovers_rejection() {
    expect_str(
        "Promise((resolve, reject) => reject(\"oops\"))
             .then((x) => \"unreachable\")
             .catch((e) => \"caught \" + e)
             .await()",
        "caught oops",
    );
}

#[test]
fn test_finally_runs_and_passes_value_through() {
    expect_str(
        "let log = []
         let v = async(() => \"value\").finally(() => log.push(\"finally\")).await()
         v + \" \" + log.join(\",\")",
        "value finally",
    );
}

#[test]
fn test_completable_future_complete() {
    expect_str(
        "let f = CompletableFuture()
         let worker = thread spawn do
             Sys.sleep(5)
             f.complete(\"ready\")
         end
         let v = f.get()
         thread join worker
         v + \" \" + f.isDone()",
        "ready true",
    );
}

#[test]
fn test_complete_twice_keeps_first_value() {
    expect_str(
        "let f = CompletableFuture()
         let first = f.complete(1)
         let second = f.complete(2)
         str(first) + \" \" + second + \" \" + f.get()",
        "true false 1",
    );
}

#[test]
fn test_get_timeout_throws_timeout_error() {
    expect_str(
        "let f = CompletableFuture()
         var got = \"\"
         try
             f.getTimeout(20)
         catch e: TimeoutError
             got = e.getMessage()
         end
         got",
        "timeout waiting for CompletableFuture",
    );
}

#[test]
fn test_get_timeout_returns_completed_value() {
    expect_int(
        "let f = CompletableFuture()
         f.complete(5)
         f.getTimeout(100)",
        5,
    );
    expect_int(
        "let f = CompletableFuture()
         let worker = thread spawn do
             Sys.sleep(5)
             f.complete(7)
         end
         let v = f.getTimeout(2000)
         thread join worker
         v",
        7,
    );
}

#[test]
fn test_complete_exceptionally() {
    expect_str(
        "let f = CompletableFuture()
         f.completeExceptionally(\"failed\")
         var got = \"\"
         try
             f.get()
         catch e
             got = e
         end
         got",
        "failed",
    );
}

#[test]
fn test_cancel() {
    expect_str(
        "let f = CompletableFuture()
         let cancelled = f.cancel()
         var got = \"\"
         try
             f.get()
         catch e: CancellationError
             got = \"cancelled\"
         end
         str(cancelled) + \" \" + f.isCancelled() + \" \" + got",
        "true true cancelled",
    );
}

#[test]
fn test_future_to_string() {
    expect_str("str(CompletableFuture())", "CompletableFuture{status=pending}");
}
