//! Located engine faults and the public evaluation error

use crate::parser::token::Span;
use crate::parser::{LexError, ParseError};
use crate::vm::VmError;
use std::fmt::Write as _;

/// An engine fault on its way out of the evaluator.
///
/// The span is filled in by the innermost statement the fault passes
/// through; every call frame it unwinds appends one trace line.
#[derive(Debug, Clone)]
pub struct Fault {
    pub error: VmError,
    pub span: Option<Span>,
    pub trace: Vec<String>,
}

impl Fault {
    pub fn new(error: VmError) -> Self {
        Self {
            error,
            span: None,
            trace: Vec::new(),
        }
    }

    /// Record `span` unless a more precise position is already known.
    pub fn locate(&mut self, span: Span) {
        if self.span.is_none() {
            self.span = Some(span);
        }
    }

    /// Record that the fault unwound through a call of `name` made at `call_site`.
    pub fn push_frame(&mut self, name: &str, call_site: Span) {
        self.trace.push(format!("at {} ({})", name, call_site));
    }
}

impl From<VmError> for Box<Fault> {
    fn from(error: VmError) -> Self {
        Box::new(Fault::new(error))
    }
}

impl From<Box<Fault>> for EvalError {
    fn from(fault: Box<Fault>) -> Self {
        let Fault { error, span, trace } = *fault;
        EvalError::Runtime { error, span, trace }
    }
}

/// Error returned by the public evaluation entry points.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// Source could not be tokenized
    #[error("{}", join_lines(.0))]
    Lex(Vec<LexError>),

    /// Source could not be parsed
    #[error("{}", join_lines(.0))]
    Parse(Vec<ParseError>),

    /// Engine fault (not catchable by the program)
    #[error("{}", format_runtime(.error, .span, .trace))]
    Runtime {
        error: VmError,
        span: Option<Span>,
        trace: Vec<String>,
    },

    /// A thrown value escaped every `try`
    #[error("Uncaught exception: {message}")]
    Uncaught {
        message: String,
        class_name: String,
        span: Option<Span>,
    },

    /// Program file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl EvalError {
    /// The engine fault behind this error, if it is one.
    pub fn vm_error(&self) -> Option<&VmError> {
        match self {
            EvalError::Runtime { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Source position the error was reported at.
    pub fn span(&self) -> Option<Span> {
        match self {
            EvalError::Lex(errors) => errors.first().map(|e| *e.span()),
            EvalError::Parse(errors) => errors.first().map(|e| e.span),
            EvalError::Runtime { span, .. } | EvalError::Uncaught { span, .. } => *span,
            EvalError::Io { .. } => None,
        }
    }
}

fn join_lines<T: std::fmt::Display>(errors: &[T]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_runtime(error: &VmError, span: &Option<Span>, trace: &[String]) -> String {
    let mut out = error.to_string();
    if let Some(span) = span {
        let _ = write!(out, " at {}", span);
    }
    for frame in trace {
        let _ = write!(out, "\n    {}", frame);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error_display_includes_position_and_trace() {
        let mut fault = Fault::new(VmError::Undefined("x".to_string()));
        fault.locate(Span::new(10, 11, 3, 5));
        fault.locate(Span::new(0, 1, 1, 1));
        fault.push_frame("f", Span::new(20, 23, 7, 1));
        let err = EvalError::from(Box::new(fault));
        let text = err.to_string();
        assert!(text.starts_with("name 'x' is not defined at 3:5"));
        assert!(text.contains("at f (7:1)"));
    }
}
