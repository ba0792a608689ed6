//! Promises and completable futures
//!
//! A [`FutureCell`] settles exactly once. Continuations registered before
//! settlement run when it settles; continuations registered afterwards run
//! immediately. Either way they are expected to hand the real work to a
//! new thread (see `builtins::handlers::future`), so settling never runs user
//! code on the settling thread.

use crate::vm::interpreter::Exception;
use crate::vm::value::Value;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::time::{Duration, Instant};

/// Which builtin type a cell presents as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FutureKind {
    /// Created by `async(fn)`, `Promise(executor)` or `.then`
    Promise,
    /// Created by `CompletableFuture()`
    Completable,
}

impl FutureKind {
    pub fn name(&self) -> &'static str {
        match self {
            FutureKind::Promise => "Promise",
            FutureKind::Completable => "CompletableFuture",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Settlement {
    Pending,
    Fulfilled(Value),
    Rejected(Exception),
    Cancelled,
}

impl Settlement {
    pub fn is_pending(&self) -> bool {
        matches!(self, Settlement::Pending)
    }
}

type Continuation = Box<dyn FnOnce(Settlement) + Send>;

struct FutureState {
    settlement: Settlement,
    continuations: Vec<Continuation>,
}

/// Shared state of a Promise or CompletableFuture.
pub struct FutureCell {
    pub kind: FutureKind,
    state: Mutex<FutureState>,
    settled: Condvar,
}

impl FutureCell {
    pub fn new(kind: FutureKind) -> Self {
        Self {
            kind,
            state: Mutex::new(FutureState {
                settlement: Settlement::Pending,
                continuations: Vec::new(),
            }),
            settled: Condvar::new(),
        }
    }

    /// Move from pending to `settlement`. Returns `false` if already settled.
    pub fn settle(&self, settlement: Settlement) -> bool {
        if settlement.is_pending() {
            return false;
        }
        let continuations = {
            let mut state = self.state.lock();
            if !state.settlement.is_pending() {
                return false;
            }
            state.settlement = settlement.clone();
            self.settled.notify_all();
            std::mem::take(&mut state.continuations)
        };
        tracing::debug!(kind = self.kind.name(), state = self.state_name(), "future settled");
        for continuation in continuations {
            continuation(settlement.clone());
        }
        true
    }

    pub fn resolve(&self, value: Value) -> bool {
        self.settle(Settlement::Fulfilled(value))
    }

    pub fn reject(&self, error: Exception) -> bool {
        self.settle(Settlement::Rejected(error))
    }

    pub fn cancel(&self) -> bool {
        self.settle(Settlement::Cancelled)
    }

    /// Run `continuation` once the cell settles (now, if it already has).
    pub fn on_settle<F>(&self, continuation: F)
    where
        F: FnOnce(Settlement) + Send + 'static,
    {
        let settled = {
            let mut state = self.state.lock();
            if state.settlement.is_pending() {
                state.continuations.push(Box::new(continuation));
                return;
            }
            state.settlement.clone()
        };
        continuation(settled);
    }

    pub fn settlement(&self) -> Settlement {
        self.state.lock().settlement.clone()
    }

    pub fn is_done(&self) -> bool {
        !self.state.lock().settlement.is_pending()
    }

    /// Block until settled.
    pub fn wait(&self) -> Settlement {
        let mut state = self.state.lock();
        while state.settlement.is_pending() {
            self.settled.wait(&mut state);
        }
        state.settlement.clone()
    }

    /// Block until settled or `timeout` elapses; `None` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Settlement> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.settlement.is_pending() {
            if self.settled.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        match &state.settlement {
            Settlement::Pending => None,
            settled => Some(settled.clone()),
        }
    }

    /// `pending`, `fulfilled`, `rejected` or `cancelled`.
    pub fn state_name(&self) -> &'static str {
        match self.state.lock().settlement {
            Settlement::Pending => "pending",
            Settlement::Fulfilled(_) => "fulfilled",
            Settlement::Rejected(_) => "rejected",
            Settlement::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FutureCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FutureKind::Promise => write!(f, "Promise{{state={}}}", self.state_name()),
            FutureKind::Completable => {
                let status = match self.state_name() {
                    "fulfilled" => "completed",
                    "rejected" => "failed",
                    other => other,
                };
                write!(f, "CompletableFuture{{status={}}}", status)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_settles_only_once() {
        let cell = FutureCell::new(FutureKind::Completable);
        assert!(cell.resolve(Value::Int(1)));
        assert!(!cell.resolve(Value::Int(2)));
        assert!(!cell.cancel());
        match cell.settlement() {
            Settlement::Fulfilled(v) => assert_eq!(v.as_int(), Some(1)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_continuation_runs_once_before_or_after_settle() {
        let cell = FutureCell::new(FutureKind::Promise);
        let calls = Arc::new(AtomicUsize::new(0));

        let early = Arc::clone(&calls);
        cell.on_settle(move |_| {
            early.fetch_add(1, Ordering::SeqCst);
        });
        cell.resolve(Value::Nil);
        cell.resolve(Value::Nil);

        let late = Arc::clone(&calls);
        cell.on_settle(move |_| {
            late.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_wait_timeout_expires_while_pending() {
        let cell = FutureCell::new(FutureKind::Completable);
        assert!(cell.wait_timeout(Duration::from_millis(10)).is_none());
        assert_eq!(cell.to_string(), "CompletableFuture{status=pending}");
    }

    #[test]
    fn test_wait_wakes_on_settle_from_other_thread() {
        let cell = Arc::new(FutureCell::new(FutureKind::Promise));
        let setter = {
            let cell = Arc::clone(&cell);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                cell.resolve(Value::str("done"));
            })
        };
        match cell.wait() {
            Settlement::Fulfilled(v) => assert_eq!(v.as_str(), Some("done")),
            other => panic!("unexpected {:?}", other),
        }
        setter.join().unwrap();
        assert_eq!(cell.to_string(), "Promise{state=fulfilled}");
    }
}
