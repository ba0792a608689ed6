//! Operator precedence table for expression parsing.

use crate::parser::token::Token;

/// Operator precedence level (higher = tighter binding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None = 0,
    Conditional = 1,    // ?:
    LogicalOr = 2,      // ||
    LogicalAnd = 3,     // &&
    Equality = 4,       // ==, !=
    Relational = 5,     // <, >, <=, >=, instanceof
    Range = 6,          // ...
    Additive = 7,       // +, -
    Multiplicative = 8, // *, /, %
    Unary = 9,          // !, -
    Call = 10,          // (), [], .
    Primary = 11,
}

impl Precedence {
    /// The next-higher level, used for left-associative operators.
    pub fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Conditional,
            Precedence::Conditional => Precedence::LogicalOr,
            Precedence::LogicalOr => Precedence::LogicalAnd,
            Precedence::LogicalAnd => Precedence::Equality,
            Precedence::Equality => Precedence::Relational,
            Precedence::Relational => Precedence::Range,
            Precedence::Range => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

/// Get the precedence of a binary operator token.
pub fn get_precedence(token: &Token) -> Precedence {
    match token {
        Token::Question => Precedence::Conditional,
        Token::PipePipe => Precedence::LogicalOr,
        Token::AmpAmp => Precedence::LogicalAnd,
        Token::EqualEqual | Token::BangEqual => Precedence::Equality,
        Token::Less
        | Token::LessEqual
        | Token::Greater
        | Token::GreaterEqual
        | Token::Instanceof => Precedence::Relational,
        Token::DotDotDot => Precedence::Range,
        Token::Plus | Token::Minus => Precedence::Additive,
        Token::Star | Token::Slash | Token::Percent => Precedence::Multiplicative,
        _ => Precedence::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Precedence::Multiplicative > Precedence::Additive);
        assert!(Precedence::Additive > Precedence::Range);
        assert!(Precedence::LogicalAnd > Precedence::LogicalOr);
    }

    #[test]
    fn test_get_precedence() {
        assert_eq!(get_precedence(&Token::Star), Precedence::Multiplicative);
        assert_eq!(get_precedence(&Token::Instanceof), Precedence::Relational);
        assert_eq!(get_precedence(&Token::Comma), Precedence::None);
    }
}
