//! Native threads behind `thread spawn` / `thread join`

use crate::vm::error::Fault;
use crate::vm::interpreter::Exception;
use crate::vm::value::Value;
use crate::vm::{VmError, VmResult};
use crossbeam::channel::{bounded, Receiver};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

/// How a spawned body finished.
#[derive(Debug, Clone)]
pub enum ThreadOutcome {
    /// Normal completion or `return`
    Returned(Value),
    /// A thrown value escaped the body
    Thrown(Exception),
    /// Engine fault
    Faulted(Box<Fault>),
}

/// Handle returned by `thread spawn`.
///
/// Joining more than once returns the same outcome every time.
pub struct ThreadHandle {
    id: u64,
    result: Receiver<ThreadOutcome>,
    outcome: Mutex<Option<ThreadOutcome>>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl ThreadHandle {
    /// Run `job` on a new OS thread with the given stack size.
    pub fn spawn<F>(stack_size: usize, job: F) -> VmResult<Arc<ThreadHandle>>
    where
        F: FnOnce() -> ThreadOutcome + Send + 'static,
    {
        let id = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = bounded(1);
        let join = std::thread::Builder::new()
            .name(format!("polyloft-thread-{}", id))
            .stack_size(stack_size)
            .spawn(move || {
                let outcome = job();
                // The handle may already be gone; nobody is waiting then
                let _ = tx.send(outcome);
            })
            .map_err(|e| VmError::Runtime(format!("failed to spawn thread: {}", e)))?;
        tracing::debug!(thread = id, "thread spawned");

        Ok(Arc::new(ThreadHandle {
            id,
            result: rx,
            outcome: Mutex::new(None),
            join: Mutex::new(Some(join)),
        }))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the body has finished.
    pub fn is_finished(&self) -> bool {
        if self.outcome.lock().is_some() {
            return true;
        }
        !self.result.is_empty()
            || self
                .join
                .lock()
                .as_ref()
                .map_or(true, |handle| handle.is_finished())
    }

    /// Block until the body finishes and return its outcome.
    pub fn join(&self) -> ThreadOutcome {
        let mut cached = self.outcome.lock();
        if let Some(outcome) = cached.as_ref() {
            return outcome.clone();
        }
        let outcome = match self.result.recv() {
            Ok(outcome) => outcome,
            Err(_) => ThreadOutcome::Faulted(Box::new(Fault::new(VmError::Runtime(
                "thread terminated without a result".to_string(),
            )))),
        };
        if let Some(handle) = self.join.lock().take() {
            let _ = handle.join();
        }
        tracing::debug!(thread = self.id, "thread joined");
        *cached = Some(outcome.clone());
        outcome
    }
}

/// Run `job` on a new OS thread nobody joins (promise continuations).
pub fn spawn_detached<F>(stack_size: usize, job: F) -> VmResult<()>
where
    F: FnOnce() + Send + 'static,
{
    std::thread::Builder::new()
        .name("polyloft-task".to_string())
        .stack_size(stack_size)
        .spawn(job)
        .map(|_| ())
        .map_err(|e| VmError::Runtime(format!("failed to spawn thread: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_returns_value_and_caches_it() {
        let handle = ThreadHandle::spawn(1 << 20, || ThreadOutcome::Returned(Value::Int(42))).unwrap();
        for _ in 0..2 {
            match handle.join() {
                ThreadOutcome::Returned(v) => assert_eq!(v.as_int(), Some(42)),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert!(handle.is_finished());
    }

    #[test]
    fn test_fault_is_reported_to_joiner() {
        let handle = ThreadHandle::spawn(1 << 20, || {
            ThreadOutcome::Faulted(Box::new(Fault::new(VmError::DivisionByZero)))
        })
        .unwrap();
        match handle.join() {
            ThreadOutcome::Faulted(fault) => assert_eq!(fault.error, VmError::DivisionByZero),
            other => panic!("unexpected {:?}", other),
        }
    }
}
