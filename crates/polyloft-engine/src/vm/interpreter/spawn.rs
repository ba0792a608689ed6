//! `thread spawn` / `thread join`

use super::{EvalResult, Flow, Interpreter, Signal};
use crate::parser::ast::Block;
use crate::vm::env::Env;
use crate::vm::error::Fault;
use crate::vm::sync::{ThreadHandle, ThreadOutcome};
use crate::vm::value::Value;
use crate::vm::VmError;
use std::sync::Arc;

impl Interpreter {
    /// Start `body` on a new thread against a snapshot of `env`.
    pub(crate) fn spawn_thread(&self, body: &Arc<Block>, env: &Env) -> EvalResult<Value> {
        let snapshot = env.snapshot();
        let state = Arc::clone(&self.state);
        let body = Arc::clone(body);
        let handle = ThreadHandle::spawn(self.options().thread_stack_size, move || {
            Interpreter::new(state).run_detached(&body, &snapshot)
        })?;
        Ok(Value::Thread(handle))
    }

    /// Run a block as the root of a thread, including its defers.
    pub(crate) fn run_detached(&self, body: &Block, env: &Env) -> ThreadOutcome {
        let outcome = self.exec_block(body, env);
        match self.finish_frame(env, outcome) {
            Ok(Flow::Value(value)) | Ok(Flow::Return(value)) => ThreadOutcome::Returned(value),
            Ok(Flow::Thrown(exception)) => ThreadOutcome::Thrown(exception),
            Ok(Flow::Break) => {
                ThreadOutcome::Faulted(Box::new(Fault::new(VmError::ControlOutsideLoop("break"))))
            }
            Ok(Flow::Continue) => {
                ThreadOutcome::Faulted(Box::new(Fault::new(VmError::ControlOutsideLoop("continue"))))
            }
            Err(fault) => ThreadOutcome::Faulted(fault),
        }
    }

    /// Wait for a thread; a throw escaping it is rethrown here.
    pub(crate) fn join_thread(&self, handle: &ThreadHandle) -> EvalResult<Value> {
        match handle.join() {
            ThreadOutcome::Returned(value) => Ok(value),
            ThreadOutcome::Thrown(exception) => Err(Signal::Throw(exception)),
            ThreadOutcome::Faulted(fault) => Err(Signal::Fault(fault)),
        }
    }
}
