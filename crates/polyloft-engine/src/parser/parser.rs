//! Parser for the Polyloft language
//!
//! This module implements a recursive descent parser that transforms
//! a token stream from the lexer into an Abstract Syntax Tree (AST).
//! Blocks are opened by a header (optionally ending in `:`) and closed by
//! `end`; a few constructs are line sensitive, such as a bare `return`
//! followed by a statement on the next line.

pub mod decl;
pub mod error;
pub mod expr;
pub mod precedence;
pub mod stmt;
pub mod types;

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer};
use crate::parser::token::{Span, Token};

pub use error::{ParseError, ParseErrorKind};

/// Maximum nesting of expressions and blocks before the parser gives up.
const MAX_DEPTH: usize = 256;

/// Parser state for the Polyloft programming language.
pub struct Parser {
    /// Pre-tokenized input
    tokens: Vec<(Token, Span)>,

    /// Current position in token stream
    pos: usize,

    /// Accumulated parse errors (allows continuing after errors)
    errors: Vec<ParseError>,

    /// Current nesting depth
    depth: usize,
}

impl Parser {
    /// Create a new parser from source code.
    pub fn new(source: &str) -> Result<Self, Vec<LexError>> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self::from_tokens(tokens))
    }

    /// Create a parser over an already lexed token stream.
    pub fn from_tokens(mut tokens: Vec<(Token, Span)>) -> Self {
        let needs_eof = !matches!(tokens.last(), Some((Token::Eof, _)));
        if needs_eof {
            let eof_span = match tokens.last() {
                Some((_, last)) => Span::new(last.end, last.end, last.line, last.column),
                None => Span::new(0, 0, 1, 1),
            };
            tokens.push((Token::Eof, eof_span));
        }

        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            depth: 0,
        }
    }

    /// Parse the entire source into a Program.
    ///
    /// Returns the Program on success, or all accumulated errors on failure.
    pub fn parse(mut self) -> Result<Program, Vec<ParseError>> {
        let start_span = self.current_span();
        let mut statements = Vec::new();

        while !self.at_eof() {
            if self.eat(&Token::Semicolon) {
                continue;
            }
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.sync_to_statement_boundary();
                }
            }
        }

        let span = match statements.last() {
            Some(last) => self.combine_spans(&start_span, last.span()),
            None => start_span,
        };

        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        Ok(Program { statements, span })
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Get the current token.
    #[inline]
    pub fn current(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    /// Get the current token's span.
    #[inline]
    pub fn current_span(&self) -> Span {
        self.tokens[self.pos].1
    }

    /// Span of the most recently consumed token.
    pub fn previous_span(&self) -> Span {
        if self.pos == 0 {
            self.current_span()
        } else {
            self.tokens[self.pos - 1].1
        }
    }

    /// Peek at the next token (lookahead).
    #[inline]
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1).map(|(tok, _)| tok)
    }

    /// Peek `n` tokens ahead of the current one.
    pub fn peek_nth(&self, n: usize) -> &Token {
        match self.tokens.get(self.pos + n) {
            Some((tok, _)) => tok,
            None => &Token::Eof,
        }
    }

    /// Span of the token `n` positions ahead of the current one.
    pub fn peek_span_nth(&self, n: usize) -> Span {
        match self.tokens.get(self.pos + n) {
            Some((_, span)) => *span,
            None => self.tokens[self.tokens.len() - 1].1,
        }
    }

    /// Advance to the next token, returning the previous current token.
    pub fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].0.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    /// Check if the current token matches the given kind.
    #[inline]
    pub fn check(&self, expected: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(expected)
    }

    /// Check if the current token matches any of the given kinds.
    pub fn check_any(&self, expected: &[Token]) -> bool {
        expected.iter().any(|tok| self.check(tok))
    }

    /// Consume the current token if it matches, reporting whether it did.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Check if we've reached EOF.
    #[inline]
    pub fn at_eof(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    /// Whether the current token starts on the same line as the previous one.
    pub fn on_same_line(&self) -> bool {
        self.pos > 0 && self.current_span().line == self.previous_span().line
    }

    /// Consume the current token if it matches the expected kind.
    pub fn expect(&mut self, expected: Token) -> Result<Token, ParseError> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected_token(&[expected]))
        }
    }

    /// Consume an identifier, returning its name.
    pub fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match self.current().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected_token(&[Token::Identifier(String::new())])),
        }
    }

    /// Consume the `end` closing a block opened by `opened_by`.
    pub fn expect_end(&mut self, opened_by: &str, opened_at: Span) -> Result<Span, ParseError> {
        if self.check(&Token::End) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else if self.at_eof() {
            Err(ParseError::unclosed_block(opened_by, opened_at))
        } else {
            Err(self.unexpected_token(&[Token::End]))
        }
    }

    /// Save the current position for backtracking.
    pub fn checkpoint(&self) -> usize {
        self.pos
    }

    /// Restore a position saved by [`Parser::checkpoint`].
    pub fn restore(&mut self, checkpoint: usize) {
        self.pos = checkpoint;
    }

    // ========================================================================
    // Error Handling
    // ========================================================================

    /// Create an "unexpected token" error at the current position.
    pub fn unexpected_token(&self, expected: &[Token]) -> ParseError {
        let span = self.current_span();
        if self.at_eof() {
            ParseError::unexpected_eof(expected.to_vec(), span)
        } else {
            ParseError::unexpected_token(expected.to_vec(), self.current().clone(), span)
        }
    }

    /// Enter a nested construct, failing once the nesting limit is reached.
    pub fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::parser_limit_exceeded(
                "nesting too deep",
                self.current_span(),
            ));
        }
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // ========================================================================
    // Utilities
    // ========================================================================

    /// Combine two spans into a single span.
    pub fn combine_spans(&self, start: &Span, end: &Span) -> Span {
        Span {
            start: start.start,
            end: end.end,
            line: start.line,
            column: start.column,
        }
    }

    /// Span from `start` to the most recently consumed token.
    pub fn span_from(&self, start: &Span) -> Span {
        let end = self.previous_span();
        self.combine_spans(start, &end)
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        stmt::parse_statement(self)
    }

    /// Synchronize to the next statement boundary after an error.
    fn sync_to_statement_boundary(&mut self) {
        let error_line = self.current_span().line;
        self.advance();
        while !self.at_eof() {
            if self.current_span().line != error_line && stmt::starts_statement(self.current()) {
                return;
            }
            self.advance();
        }
    }
}

/// Parse a standalone type specification such as `List<? extends Number>`.
///
/// Used by runtime `instanceof` checks that receive the type as a string.
pub fn parse_type_spec(spec: &str) -> Result<TypeExpr, ParseError> {
    let mut parser = Parser::new(spec).map_err(|errors| {
        let span = errors.first().map(|e| *e.span()).unwrap_or_default();
        ParseError::invalid_syntax(format!("invalid type '{}'", spec), span)
    })?;
    let ty = types::parse_type(&mut parser)?;
    if !parser.at_eof() {
        return Err(parser.unexpected_token(&[Token::Eof]));
    }
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_new() {
        let parser = Parser::new("let x = 42").unwrap();
        assert!(matches!(parser.current(), Token::Let));
    }

    #[test]
    fn test_parser_advance() {
        let mut parser = Parser::new("let x").unwrap();
        let tok = parser.advance();
        assert!(matches!(tok, Token::Let));
        assert!(matches!(parser.current(), Token::Identifier(_)));
    }

    #[test]
    fn test_parser_at_eof() {
        let parser = Parser::new("").unwrap();
        assert!(parser.at_eof());
    }

    #[test]
    fn test_checkpoint_restore() {
        let mut parser = Parser::new("a b c").unwrap();
        let saved = parser.checkpoint();
        parser.advance();
        parser.advance();
        parser.restore(saved);
        assert_eq!(parser.current(), &Token::Identifier("a".to_string()));
    }

    #[test]
    fn test_parse_type_spec() {
        let ty = parse_type_spec("List<? extends Number>").unwrap();
        assert_eq!(ty.to_string(), "List<? extends Number>");
        assert!(parse_type_spec("List<").is_err());
    }

    #[test]
    fn test_errors_are_accumulated() {
        let errors = Parser::new("let = 1\nlet y = \nlet z = 3")
            .unwrap()
            .parse()
            .unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_unclosed_block_reports_opener() {
        let errors = Parser::new("if true:\n  println(1)\n").unwrap().parse().unwrap_err();
        assert!(errors[0].message.contains("'if'"));
    }
}
