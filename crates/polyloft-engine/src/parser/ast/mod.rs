//! Abstract syntax tree for Polyloft programs.
//!
//! Statements and expressions are closed enums of span-carrying structs;
//! the evaluator dispatches over them with exhaustive `match`.

mod expression;
mod statement;
mod types;

pub use expression::*;
pub use statement::*;
pub use types::*;

use crate::parser::token::Span;

/// A parsed program: an ordered list of top-level statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            statements,
            span: Span::default(),
        }
    }
}
