//! Polyloft front end - lexer and parser.
//!
//! This module provides lexical analysis (tokenization) and syntactic analysis
//! (parsing) for Polyloft source code.
//!
//! # Example
//!
//! ```ignore
//! use polyloft_engine::parser::Parser;
//!
//! let source = r#"
//!     def add(a: Int, b: Int) -> Int:
//!         return a + b
//!     end
//! "#;
//!
//! let program = Parser::new(source)
//!     .map_err(|errs| errs[0].to_string())?
//!     .parse()
//!     .map_err(|errs| errs[0].to_string())?;
//! ```

pub mod ast;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;
pub mod token;

pub use ast::Program;
pub use lexer::{LexError, Lexer};
pub use parser::{parse_type_spec, ParseError, ParseErrorKind, Parser};
pub use token::{Span, Token};
