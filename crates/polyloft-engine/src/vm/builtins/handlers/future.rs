//! Promise and CompletableFuture handlers
//!
//! Continuations (`then`, `catch`, `finally`) and `async` bodies each run
//! on a fresh OS thread with their own interpreter, so settling a future
//! never runs user code on the settling thread.

use crate::vm::builtins::handlers::array::callback_arg;
use crate::vm::builtins::{arg, expect_args, int_arg};
use crate::vm::context::RuntimeState;
use crate::vm::future::{FutureCell, FutureKind, Settlement};
use crate::vm::interpreter::{EvalResult, Exception, Interpreter, Signal};
use crate::vm::sync::spawn_detached;
use crate::vm::value::{NativeCall, NativeFunction, Value};
use crate::vm::VmError;
use std::sync::Arc;
use std::time::Duration;

pub const METHODS: &[&str] = &[
    "then",
    "catch",
    "finally",
    "await",
    "getState",
    "complete",
    "completeExceptionally",
    "get",
    "getTimeout",
    "isDone",
    "cancel",
    "isCancelled",
    "toString",
];

// ============================================================================
// Constructors
// ============================================================================

/// `async(fn)`: run `fn` on a new thread, settling the returned Promise.
pub fn spawn_async(interp: &Interpreter, call: NativeCall) -> EvalResult<Value> {
    expect_args(&call.args, 1)?;
    let body = callback_arg(&call.args, "async")?.clone();
    let cell = Arc::new(FutureCell::new(FutureKind::Promise));
    let target = Arc::clone(&cell);
    run_detached(interp.state(), move |interp| {
        let settlement = match interp.call_callback(&body, Vec::new()) {
            Ok(value) => Settlement::Fulfilled(value),
            Err(signal) => Settlement::Rejected(rejection(signal)),
        };
        target.settle(settlement);
    })?;
    Ok(Value::Future(cell))
}

/// `Promise((resolve, reject) => ...)`: the executor runs synchronously.
pub fn promise(interp: &Interpreter, call: NativeCall) -> EvalResult<Value> {
    expect_args(&call.args, 1)?;
    let executor = callback_arg(&call.args, "Promise")?.clone();
    let cell = Arc::new(FutureCell::new(FutureKind::Promise));

    let on_resolve = Arc::clone(&cell);
    let resolve = NativeFunction::value("resolve", move |_, call| {
        Ok(Value::Bool(on_resolve.resolve(arg(&call.args, 0))))
    });
    let on_reject = Arc::clone(&cell);
    let reject = NativeFunction::value("reject", move |_, call| {
        Ok(Value::Bool(on_reject.reject(Exception::new(arg(&call.args, 0), None))))
    });

    match interp.call_callback(&executor, vec![resolve, reject]) {
        Ok(_) => {}
        Err(Signal::Throw(exception)) => {
            cell.reject(exception);
        }
        Err(fault) => return Err(fault),
    }
    Ok(Value::Future(cell))
}

/// `CompletableFuture()`
pub fn completable(call: NativeCall) -> EvalResult<Value> {
    expect_args(&call.args, 0)?;
    Ok(Value::Future(Arc::new(FutureCell::new(FutureKind::Completable))))
}

// ============================================================================
// Methods
// ============================================================================

/// Call a Promise / CompletableFuture method
pub fn call(
    interp: &Interpreter,
    cell: &Arc<FutureCell>,
    name: &str,
    args: Vec<Value>,
) -> EvalResult<Value> {
    let value = match name {
        "then" => {
            let callback = callback_arg(&args, "then")?.clone();
            chain(interp, cell, move |interp, settled| match settled {
                Settlement::Fulfilled(value) => {
                    interp.call_callback(&callback, vec![value]).map(Settlement::Fulfilled)
                }
                other => Ok(other),
            })?
        }
        "catch" => {
            let callback = callback_arg(&args, "catch")?.clone();
            chain(interp, cell, move |interp, settled| match settled {
                Settlement::Rejected(error) => interp
                    .call_callback(&callback, vec![Value::from(error.message())])
                    .map(Settlement::Fulfilled),
                other => Ok(other),
            })?
        }
        "finally" => {
            let callback = callback_arg(&args, "finally")?.clone();
            chain(interp, cell, move |interp, settled| {
                interp.call_callback(&callback, Vec::new())?;
                Ok(settled)
            })?
        }
        "await" | "get" => {
            expect_args(&args, 0)?;
            unwrap_settlement(interp, cell.wait())?
        }
        "getTimeout" => {
            let millis = int_arg(&args, 0, "getTimeout")?.max(0) as u64;
            match cell.wait_timeout(Duration::from_millis(millis)) {
                Some(settled) => unwrap_settlement(interp, settled)?,
                None => {
                    return Err(interp.throw_error(
                        "TimeoutError",
                        format!("timeout waiting for {}", cell.kind.name()),
                    ))
                }
            }
        }
        "complete" => {
            expect_args(&args, 1)?;
            Value::Bool(cell.resolve(args[0].clone()))
        }
        "completeExceptionally" => {
            expect_args(&args, 1)?;
            Value::Bool(cell.reject(Exception::new(args[0].clone(), None)))
        }
        "cancel" => Value::Bool(cell.cancel()),
        "isCancelled" => Value::Bool(matches!(cell.settlement(), Settlement::Cancelled)),
        "isDone" => Value::Bool(cell.is_done()),
        "getState" => Value::str(cell.state_name()),
        "toString" => Value::from(cell.to_string()),
        _ => return Err(VmError::attribute(cell.kind.name(), name).into()),
    };
    Ok(value)
}

/// Register `step` to run on a new thread once `upstream` settles; the
/// returned Promise settles with whatever `step` produces.
fn chain<F>(interp: &Interpreter, upstream: &FutureCell, step: F) -> EvalResult<Value>
where
    F: FnOnce(&Interpreter, Settlement) -> EvalResult<Settlement> + Send + 'static,
{
    let downstream = Arc::new(FutureCell::new(FutureKind::Promise));
    let target = Arc::clone(&downstream);
    let state = Arc::clone(interp.state());
    upstream.on_settle(move |settled| {
        let fallback = Arc::clone(&target);
        let scheduled = run_detached(&state, move |interp| {
            let next = step(interp, settled).unwrap_or_else(|signal| Settlement::Rejected(rejection(signal)));
            target.settle(next);
        });
        if let Err(error) = scheduled {
            tracing::warn!(%error, "failed to schedule promise continuation");
            fallback.reject(Exception::new(Value::from(error.to_string()), None));
        }
    });
    Ok(Value::Future(downstream))
}

/// Run `job` on a detached thread with a fresh interpreter.
fn run_detached<F>(state: &Arc<RuntimeState>, job: F) -> Result<(), VmError>
where
    F: FnOnce(&Interpreter) + Send + 'static,
{
    let stack_size = state.options.thread_stack_size;
    let state = Arc::clone(state);
    spawn_detached(stack_size, move || job(&Interpreter::new(state)))
}

/// How a failed body or continuation rejects its promise.
fn rejection(signal: Signal) -> Exception {
    match signal {
        Signal::Throw(exception) => exception,
        Signal::Fault(fault) => {
            tracing::debug!(error = %fault.error, "engine fault rejected a promise");
            Exception::new(Value::from(fault.error.to_string()), fault.span)
        }
    }
}

fn unwrap_settlement(interp: &Interpreter, settled: Settlement) -> EvalResult<Value> {
    match settled {
        Settlement::Fulfilled(value) => Ok(value),
        Settlement::Rejected(exception) => Err(Signal::Throw(exception)),
        Settlement::Cancelled => Err(interp.throw_error("CancellationError", "future was cancelled")),
        Settlement::Pending => Ok(Value::Nil),
    }
}
