//! Tree-walking interpreter
//!
//! Statements evaluate to a [`Flow`]; expressions evaluate to a value or a
//! [`Signal`]. A thrown value travels as `Flow::Thrown` between statements
//! and as `Signal::Throw` inside expressions, so `?` carries it through
//! nested calls. Engine faults (`Signal::Fault`) are never caught by user
//! code; they unwind to the entry point, picking up a source position and
//! one trace line per call frame.
//!
//! The interpreter is split across:
//! - `stmt`: statements, blocks, defer unwinding
//! - `expr`: expressions, operators, member and index access
//! - `call`: calls, overload dispatch, argument and return checks
//! - `class`: class/interface/enum/record declarations and construction
//! - `spawn`: `thread spawn` / `thread join`

use crate::parser::ast::Program;
use crate::parser::token::Span;
use crate::vm::context::{EvalOptions, RuntimeState};
use crate::vm::env::Env;
use crate::vm::error::{EvalError, Fault};
use crate::vm::object::CollectionData;
use crate::vm::types::TypeRegistry;
use crate::vm::value::Value;
use crate::vm::{VmError, VmResult};
use std::cell::Cell;
use std::sync::Arc;

/// Fold a thrown [`Signal`] into `Flow::Thrown` inside a statement evaluator.
macro_rules! try_flow {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err($crate::vm::interpreter::Signal::Throw(exception)) => {
                return Ok($crate::vm::interpreter::Flow::Thrown(exception))
            }
            Err($crate::vm::interpreter::Signal::Fault(fault)) => return Err(fault),
        }
    };
}

mod call;
mod class;
mod expr;
mod spawn;
mod stmt;

pub use call::Invocation;
pub(crate) use expr::{compare, index_of};

/// Outcome of executing a statement or block.
#[derive(Debug, Clone)]
pub enum Flow {
    /// Completed normally with this value
    Value(Value),
    Return(Value),
    Break,
    Continue,
    Thrown(Exception),
}

/// A thrown value in flight.
#[derive(Debug, Clone)]
pub struct Exception {
    pub value: Value,
    /// Where the `throw` happened, when known
    pub span: Option<Span>,
}

impl Exception {
    pub fn new(value: Value, span: Option<Span>) -> Self {
        Self { value, span }
    }

    /// The `message` field of exception objects, otherwise the value itself.
    pub fn message(&self) -> String {
        match &self.value {
            Value::Object(inst) => match inst.field("message") {
                Some(message) => message.to_string(),
                None => self.value.to_string(),
            },
            other => other.to_string(),
        }
    }

    pub fn class_name(&self) -> String {
        self.value.kind_name()
    }
}

/// Non-value outcome of an expression.
#[derive(Debug)]
pub enum Signal {
    /// User-level throw; catchable
    Throw(Exception),
    /// Engine fault; never catchable
    Fault(Box<Fault>),
}

impl From<VmError> for Signal {
    fn from(error: VmError) -> Self {
        Signal::Fault(Box::new(Fault::new(error)))
    }
}

impl From<Box<Fault>> for Signal {
    fn from(fault: Box<Fault>) -> Self {
        Signal::Fault(fault)
    }
}

/// Result of evaluating an expression.
pub type EvalResult<T> = Result<T, Signal>;

/// Result of executing a statement.
pub type ExecResult = Result<Flow, Box<Fault>>;

/// Decrements the call depth when a call returns.
pub(crate) struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

/// Per-thread evaluator bound to one runtime.
pub struct Interpreter {
    state: Arc<RuntimeState>,
    depth: Cell<usize>,
}

impl Interpreter {
    pub fn new(state: Arc<RuntimeState>) -> Self {
        Self {
            state,
            depth: Cell::new(0),
        }
    }

    pub fn state(&self) -> &Arc<RuntimeState> {
        &self.state
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.state.registry
    }

    pub fn options(&self) -> &EvalOptions {
        &self.state.options
    }

    /// Enter one level of user call nesting.
    pub(crate) fn enter(&self) -> VmResult<DepthGuard<'_>> {
        let limit = self.state.options.max_call_depth;
        let depth = self.depth.get() + 1;
        if depth > limit {
            return Err(VmError::StackOverflow(limit));
        }
        self.depth.set(depth);
        Ok(DepthGuard { depth: &self.depth })
    }

    /// Run a whole program in `env`, including its top-level defers.
    pub fn run_program(&self, program: &Program, env: &Env) -> Result<Value, EvalError> {
        let outcome = self.exec_statements(&program.statements, env);
        match self.finish_frame(env, outcome) {
            Ok(Flow::Value(value)) | Ok(Flow::Return(value)) => Ok(value),
            Ok(Flow::Break) => Err(Box::new(Fault::new(VmError::ControlOutsideLoop("break"))).into()),
            Ok(Flow::Continue) => {
                Err(Box::new(Fault::new(VmError::ControlOutsideLoop("continue"))).into())
            }
            Ok(Flow::Thrown(exception)) => Err(EvalError::Uncaught {
                message: exception.message(),
                class_name: exception.class_name(),
                span: exception.span,
            }),
            Err(fault) => Err(fault.into()),
        }
    }

    /// Build and throw an instance of a builtin exception class.
    ///
    /// Falls back to throwing the bare message when the class is missing.
    pub fn throw_error(&self, class: &str, message: impl Into<String>) -> Signal {
        let message = Value::from(message.into());
        let value = match self.registry().class(class) {
            Some(class) => {
                match self.instantiate(&class, &[], vec![message.clone()], Span::default()) {
                    Ok(value) => value,
                    Err(signal) => return signal,
                }
            }
            None => message,
        };
        Signal::Throw(Exception::new(value, None))
    }

    /// Render a value for output, honouring user `toString` methods.
    pub fn stringify(&self, value: &Value) -> EvalResult<String> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            Value::Object(inst) => {
                let candidates = inst.class.find_methods("toString");
                match candidates.iter().find(|m| m.params.is_empty()) {
                    Some(method) => {
                        let rendered = self.invoke_method(inst, method, Vec::new(), Span::default())?;
                        match rendered {
                            Value::Str(s) => Ok(s.to_string()),
                            other => self.stringify(&other),
                        }
                    }
                    None => Ok(value.to_string()),
                }
            }
            Value::Array(items) => {
                let items = items.read().clone();
                Ok(format!("[{}]", self.join_values(&items)?))
            }
            Value::Map(map) => {
                let entries: Vec<(Value, Value)> = map
                    .read()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                self.render_entries(&entries)
            }
            Value::Collection(collection) => {
                let data = match &*collection.data.read() {
                    CollectionData::Seq(items) => Ok(items.iter().cloned().collect::<Vec<_>>()),
                    CollectionData::Map(map) => Err(map
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect::<Vec<_>>()),
                };
                match data {
                    Ok(items) => {
                        let inner = self.join_values(&items)?;
                        Ok(match collection.kind {
                            crate::vm::object::CollectionKind::Set => format!("{{{}}}", inner),
                            _ => format!("[{}]", inner),
                        })
                    }
                    Err(entries) => self.render_entries(&entries),
                }
            }
            other => Ok(other.to_string()),
        }
    }

    fn join_values(&self, items: &[Value]) -> EvalResult<String> {
        let parts = items
            .iter()
            .map(|item| self.stringify(item))
            .collect::<EvalResult<Vec<_>>>()?;
        Ok(parts.join(", "))
    }

    fn render_entries(&self, entries: &[(Value, Value)]) -> EvalResult<String> {
        let mut parts = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            parts.push(format!("{}: {}", self.stringify(key)?, self.stringify(value)?));
        }
        Ok(format!("{{{}}}", parts.join(", ")))
    }
}
