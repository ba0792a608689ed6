//! Polyloft Language Engine
//!
//! This crate provides the complete Polyloft runtime:
//! - **Parser**: Lexer and recursive-descent parser (`parser` module)
//! - **VM**: Tree-walking evaluator, class model, generic type engine,
//!   threads, channels and futures (`vm` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use polyloft_engine::{eval_source, EvalOptions};
//!
//! let source = r#"
//!     def add(a: Int, b: Int) -> Int:
//!         return a + b
//!     end
//!     add(40, 2)
//! "#;
//!
//! let value = eval_source(source, EvalOptions::default())?;
//! assert_eq!(value.as_int(), Some(42));
//! ```

#![warn(rust_2018_idioms)]
#![allow(clippy::new_without_default)]
#![allow(clippy::result_large_err)]

// ============================================================================
// Core Modules
// ============================================================================

/// Parser module: lexer, tokens, AST and parser
pub mod parser;

/// VM module: runtime values, environments, evaluator and builtins
pub mod vm;

// ============================================================================
// Re-exports
// ============================================================================

pub use parser::ast::Program;
pub use parser::{LexError, ParseError, Parser};
pub use vm::{
    eval, eval_source, BufferSink, EvalError, EvalOptions, OutputSink, Runtime, SelectPolicy,
    StdoutSink, Value, VmError, VmResult,
};
