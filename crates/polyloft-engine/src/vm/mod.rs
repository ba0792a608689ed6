//! Polyloft VM Core Runtime
//!
//! This module provides the tree-walking runtime including:
//! - Runtime values and lexical environments
//! - Class, interface, enum and record model with overload resolution
//! - Generic type engine (bounds, variance, wildcard matching)
//! - Native threads, channels and `select`
//! - Promises and completable futures
//! - Builtin functions, modules and the exception prelude

pub mod builtins;
pub mod context;
pub mod env;
pub mod error;
pub mod future;
pub mod interpreter;
pub mod object;
pub mod overload;
pub mod sync;
pub mod types;
pub mod value;

pub use context::{
    eval, eval_source, BufferSink, EvalOptions, OutputSink, Runtime, SelectPolicy, StdoutSink,
};
pub use env::{Env, Environment};
pub use error::{EvalError, Fault};
pub use interpreter::{Exception, Flow, Interpreter, Signal};
pub use object::{ClassDef, ClassKind, Instance, InterfaceDef};
pub use types::TypeRegistry;
pub use value::Value;

/// Longest string, in bytes, or array, in elements, an operator may build.
pub const MAX_SEQUENCE_LEN: usize = 1 << 24;

/// VM execution errors
///
/// These are engine faults: they are never caught by `try/catch` and
/// terminate the current evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VmError {
    /// No overload accepts the supplied argument count
    #[error("Arity mismatch: expected {expected}, got {got}")]
    Arity { expected: String, got: usize },

    /// No constructor overload accepts the supplied argument count
    #[error("no constructor found for {class} with {got} arguments")]
    NoConstructor { class: String, got: usize },

    /// Identifier not found in any enclosing scope
    #[error("name '{0}' is not defined")]
    Undefined(String),

    /// Out-of-range index
    #[error("index {index} out of range for length {len}")]
    Index { index: i64, len: usize },

    /// Value of the wrong runtime shape
    #[error("Type error: {0}")]
    Type(String),

    /// Missing field or method
    #[error("'{type_name}' object has no attribute '{attribute}'")]
    Attribute {
        type_name: String,
        attribute: String,
    },

    /// Call on a value that is not a function, class or method
    #[error("'{0}' is not callable")]
    NotCallable(String),

    /// Extending or implementing a sealed type without being permitted
    #[error("{0}")]
    SealedPermit(String),

    /// Type parameter used against its declared variance
    #[error("{0}")]
    Variance(String),

    /// Type argument outside its declared bound
    #[error("type {actual} does not satisfy constraint: must extends {bound}")]
    Bound { actual: String, bound: String },

    /// Assignment to a const/final binding or an immutable field
    #[error("cannot assign to {kind} '{name}'")]
    Immutable { kind: &'static str, name: String },

    /// Access to a private or protected member from outside
    #[error("cannot access {visibility} member '{member}' of {class}")]
    Visibility {
        visibility: &'static str,
        member: String,
        class: String,
    },

    /// Integer division or modulo by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Send on a closed channel
    #[error("send on closed channel")]
    ClosedChannel,

    /// Construction of an abstract class
    #[error("cannot instantiate abstract class {0}")]
    AbstractInstantiation(String),

    /// String repetition or range larger than `MAX_SEQUENCE_LEN`
    #[error("{0} exceeds the maximum length of {max}", max = MAX_SEQUENCE_LEN)]
    SizeLimit(String),

    /// Call depth limit reached
    #[error("maximum recursion depth exceeded ({0})")]
    StackOverflow(usize),

    /// `break`/`continue` escaping a function body
    #[error("'{0}' outside of a loop")]
    ControlOutsideLoop(&'static str),

    /// Other runtime error
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl VmError {
    /// `expected X, got Y` type error.
    pub fn type_mismatch(expected: impl std::fmt::Display, actual: impl std::fmt::Display) -> Self {
        VmError::Type(format!("expected {}, got {}", expected, actual))
    }

    /// Missing attribute on a value of the given type.
    pub fn attribute(type_name: impl Into<String>, attribute: impl Into<String>) -> Self {
        VmError::Attribute {
            type_name: type_name.into(),
            attribute: attribute.into(),
        }
    }

    /// Arity failure against a single expected count.
    pub fn arity(expected: usize, got: usize) -> Self {
        VmError::Arity {
            expected: expected.to_string(),
            got,
        }
    }

    /// Short name of the error kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            VmError::Arity { .. } | VmError::NoConstructor { .. } => "ArityError",
            VmError::Undefined(_) => "NameError",
            VmError::Index { .. } => "IndexError",
            VmError::Type(_) | VmError::NotCallable(_) => "TypeError",
            VmError::Attribute { .. } => "AttributeError",
            VmError::SealedPermit(_) => "SealedError",
            VmError::Variance(_) => "VarianceError",
            VmError::Bound { .. } => "BoundError",
            VmError::Immutable { .. } => "ImmutableError",
            VmError::Visibility { .. } => "AccessError",
            VmError::DivisionByZero => "ZeroDivisionError",
            VmError::ClosedChannel => "ChannelError",
            VmError::AbstractInstantiation(_) => "InstantiationError",
            VmError::SizeLimit(_) => "MemoryError",
            VmError::StackOverflow(_) => "RecursionError",
            VmError::ControlOutsideLoop(_) => "SyntaxError",
            VmError::Runtime(_) => "RuntimeError",
        }
    }
}

/// VM execution result
pub type VmResult<T> = Result<T, VmError>;
