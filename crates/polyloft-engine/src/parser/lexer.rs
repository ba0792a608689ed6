//! Lexer for the Polyloft programming language.
//!
//! This module implements the lexer using the logos library. It converts
//! source code into a stream of tokens with source location information.
//! Double-quoted strings are scanned by hand so that `#{expr}` interpolation
//! segments can be lexed recursively.

use crate::parser::token::{Span, TemplatePart, Token};
use logos::Logos;

/// Logos-based token enum for lexing.
///
/// This enum is used internally by logos for efficient tokenization.
/// It's converted to our main Token enum after lexing.
#[derive(Logos, Debug, Clone, PartialEq)]
enum LogosToken {
    #[regex(r"[ \t\r\n]+", logos::skip)]
    Whitespace,

    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*", lex_block_comment)]
    BlockComment,

    // Keywords (must come before identifiers)
    #[token("var")]
    Var,
    #[token("let")]
    Let,
    #[token("const")]
    Const,
    #[token("final")]
    Final,
    #[token("public")]
    #[token("pub")]
    Public,
    #[token("private")]
    #[token("priv")]
    Private,
    #[token("protected")]
    #[token("prot")]
    Protected,
    #[token("static")]
    Static,
    #[token("def")]
    Def,
    #[token("interface")]
    Interface,
    #[token("class")]
    Class,
    #[token("import")]
    Import,
    #[token("implements")]
    Implements,
    #[token("abstract")]
    Abstract,
    #[token("sealed")]
    Sealed,
    #[token("extends")]
    Extends,
    #[token("enum")]
    Enum,
    #[token("record")]
    Record,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("where")]
    Where,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("loop")]
    Loop,
    #[token("end")]
    End,
    #[token("do")]
    Do,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("finally")]
    Finally,
    #[token("throw")]
    Throw,
    #[token("defer")]
    Defer,
    #[token("thread")]
    Thread,
    #[token("spawn")]
    Spawn,
    #[token("join")]
    Join,
    #[token("channel")]
    Channel,
    #[token("select")]
    Select,
    #[token("closed")]
    Closed,
    #[token("instanceof")]
    Instanceof,
    #[token("this")]
    This,
    #[token("super")]
    Super,
    #[token("out")]
    Out,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("nil")]
    Nil,

    // Identifiers (must come after keywords)
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Numbers with numeric separator support
    #[regex(r"0x[0-9a-fA-F]+(_[0-9a-fA-F]+)*", parse_hex)]
    #[regex(r"0b[01]+(_[01]+)*", parse_binary)]
    #[regex(r"[0-9]+(_[0-9]+)*", parse_int)]
    IntLiteral(i64),

    #[regex(r"[0-9]+(_[0-9]+)*\.[0-9]+(_[0-9]+)*([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"[0-9]+(_[0-9]+)*[eE][+-]?[0-9]+", parse_float)]
    FloatLiteral(f64),

    // Single-quoted strings never interpolate
    #[regex(r"'([^'\\]|\\.)*'", parse_string)]
    StringLiteral(String),

    // Operators
    #[token(":=")]
    ColonEqual,
    #[token("+=")]
    PlusEqual,
    #[token("-=")]
    MinusEqual,
    #[token("*=")]
    StarEqual,
    #[token("/=")]
    SlashEqual,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    BangEqual,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("=>")]
    FatArrow,
    #[token("->")]
    Arrow,
    #[token("...")]
    DotDotDot,
    #[token("=")]
    Equal,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("!")]
    Bang,
    #[token("|")]
    Pipe,
    #[token("?")]
    Question,
    #[token("@")]
    At,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
}

// Helper parsing functions
fn lex_block_comment(lex: &mut logos::Lexer<LogosToken>) -> logos::Skip {
    let remainder = lex.remainder();
    if let Some(end) = remainder.find("*/") {
        lex.bump(end + 2);
    } else {
        lex.bump(remainder.len());
    }
    logos::Skip
}

fn parse_hex(lex: &mut logos::Lexer<LogosToken>) -> Option<i64> {
    let s = lex.slice()[2..].replace('_', "");
    i64::from_str_radix(&s, 16).ok()
}

fn parse_binary(lex: &mut logos::Lexer<LogosToken>) -> Option<i64> {
    let s = lex.slice()[2..].replace('_', "");
    i64::from_str_radix(&s, 2).ok()
}

fn parse_int(lex: &mut logos::Lexer<LogosToken>) -> Option<i64> {
    lex.slice().replace('_', "").parse().ok()
}

fn parse_float(lex: &mut logos::Lexer<LogosToken>) -> Option<f64> {
    lex.slice().replace('_', "").parse().ok()
}

fn parse_string(lex: &mut logos::Lexer<LogosToken>) -> Option<String> {
    let s = lex.slice();
    Some(unescape_string(&s[1..s.len() - 1]))
}

fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('0') => result.push('\0'),
                Some('#') => result.push('#'),
                Some(other) => result.push(other),
                None => break,
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Main lexer structure.
pub struct Lexer<'a> {
    source: &'a str,
    tokens: Vec<(Token, Span)>,
    errors: Vec<LexError>,
}

/// Lexer error types.
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    UnexpectedCharacter { char: char, span: Span },
    UnterminatedString { span: Span },
    UnterminatedInterpolation { span: Span },
    InvalidNumber { text: String, span: Span },
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Format all errors with source context
    pub fn format_errors(errors: &[LexError], source: &str) -> String {
        errors
            .iter()
            .map(|e| e.format_with_source(source))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn tokenize(mut self) -> Result<Vec<(Token, Span)>, Vec<LexError>> {
        let mut pos = 0;
        let mut line = 1u32;
        let mut column = 1u32;
        let source = self.source;
        let bytes = source.as_bytes();

        while pos < self.source.len() {
            // Whitespace and comments are skipped by hand so that line and
            // column tracking stays exact before a double-quoted string.
            while pos < bytes.len() {
                match bytes[pos] {
                    b' ' | b'\t' | b'\r' => {
                        column += 1;
                        pos += 1;
                    }
                    b'\n' => {
                        line += 1;
                        column = 1;
                        pos += 1;
                    }
                    b'/' if pos + 1 < bytes.len() && bytes[pos + 1] == b'/' => {
                        while pos < bytes.len() && bytes[pos] != b'\n' {
                            pos += 1;
                            column += 1;
                        }
                    }
                    b'/' if pos + 1 < bytes.len() && bytes[pos + 1] == b'*' => {
                        pos += 2;
                        column += 2;
                        while pos < bytes.len() {
                            if bytes[pos] == b'*' && pos + 1 < bytes.len() && bytes[pos + 1] == b'/' {
                                pos += 2;
                                column += 2;
                                break;
                            }
                            if bytes[pos] == b'\n' {
                                line += 1;
                                column = 1;
                            } else {
                                column += 1;
                            }
                            pos += 1;
                        }
                    }
                    _ => break,
                }
            }

            if pos >= self.source.len() {
                break;
            }

            if bytes[pos] == b'"' {
                match self.lex_string(pos + 1, line) {
                    Ok((token, end_pos)) => {
                        let span = Span::new(pos, end_pos, line, column);
                        self.tokens.push((token, span));
                        for c in self.source[pos..end_pos].chars() {
                            if c == '\n' {
                                line += 1;
                                column = 1;
                            } else {
                                column += 1;
                            }
                        }
                        pos = end_pos;
                    }
                    Err(err) => {
                        self.errors.push(err);
                        // Recover at the end of the line
                        while pos < bytes.len() && bytes[pos] != b'\n' {
                            pos += 1;
                            column += 1;
                        }
                    }
                }
                continue;
            }

            let mut logos_lexer = LogosToken::lexer(&self.source[pos..]);

            if let Some(token_result) = logos_lexer.next() {
                let range = logos_lexer.span();
                let abs_start = pos + range.start;
                let abs_end = pos + range.end;

                // Account for anything logos skipped before this token
                for c in self.source[pos..abs_start].chars() {
                    if c == '\n' {
                        line += 1;
                        column = 1;
                    } else {
                        column += 1;
                    }
                }

                let span = Span::new(abs_start, abs_end, line, column);

                match token_result {
                    Ok(logos_token) => {
                        self.tokens.push((convert_token(logos_token), span));
                    }
                    Err(_) => {
                        let text = &self.source[abs_start..abs_end];
                        if text.starts_with(|c: char| c.is_ascii_digit()) {
                            self.errors.push(LexError::InvalidNumber {
                                text: text.to_string(),
                                span,
                            });
                        } else {
                            let char = text.chars().next().unwrap_or('\0');
                            self.errors.push(LexError::UnexpectedCharacter { char, span });
                        }
                    }
                }

                for c in self.source[abs_start..abs_end].chars() {
                    if c == '\n' {
                        line += 1;
                        column = 1;
                    } else {
                        column += 1;
                    }
                }

                pos = abs_end;
            } else {
                break;
            }
        }

        let eof_span = Span::new(self.source.len(), self.source.len(), line, column);
        self.tokens.push((Token::Eof, eof_span));

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    /// Scan a double-quoted string starting just after the opening quote.
    ///
    /// Returns the token and the byte offset one past the closing quote.
    fn lex_string(&self, start: usize, line: u32) -> Result<(Token, usize), LexError> {
        let bytes = self.source.as_bytes();
        let mut parts: Vec<TemplatePart> = Vec::new();
        let mut current = String::new();
        let mut pos = start;

        while pos < bytes.len() {
            match bytes[pos] {
                b'"' => {
                    if parts.is_empty() {
                        return Ok((Token::StringLiteral(unescape_string(&current)), pos + 1));
                    }
                    if !current.is_empty() {
                        parts.push(TemplatePart::String(unescape_string(&current)));
                    }
                    return Ok((Token::InterpolatedString(parts), pos + 1));
                }
                b'\\' if pos + 1 < bytes.len() => {
                    // Keep escapes raw; they are resolved per segment
                    let next_len = self.source[pos + 1..]
                        .chars()
                        .next()
                        .map(char::len_utf8)
                        .unwrap_or(1);
                    current.push_str(&self.source[pos..pos + 1 + next_len]);
                    pos += 1 + next_len;
                }
                b'#' if pos + 1 < bytes.len() && bytes[pos + 1] == b'{' => {
                    if !current.is_empty() {
                        parts.push(TemplatePart::String(unescape_string(&current)));
                        current.clear();
                    }
                    let expr_start = pos + 2;
                    let expr_end = find_interpolation_end(bytes, expr_start).ok_or(
                        LexError::UnterminatedInterpolation {
                            span: Span::new(pos, bytes.len(), line, 1),
                        },
                    )?;
                    let inner = &self.source[expr_start..expr_end];
                    let mut tokens = Lexer::new(inner).tokenize().map_err(|mut errs| {
                        errs.swap_remove(0)
                    })?;
                    for (_, span) in tokens.iter_mut() {
                        span.start += expr_start;
                        span.end += expr_start;
                        span.line = line + span.line - 1;
                    }
                    parts.push(TemplatePart::Expression(tokens));
                    pos = expr_end + 1;
                }
                _ => {
                    let ch_len = self.source[pos..]
                        .chars()
                        .next()
                        .map(char::len_utf8)
                        .unwrap_or(1);
                    current.push_str(&self.source[pos..pos + ch_len]);
                    pos += ch_len;
                }
            }
        }

        Err(LexError::UnterminatedString {
            span: Span::new(start.saturating_sub(1), bytes.len(), line, 1),
        })
    }
}

/// Find the `}` closing an interpolation, honoring nested braces and strings.
fn find_interpolation_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string: Option<u8> = None;
    let mut pos = start;
    while pos < bytes.len() {
        let b = bytes[pos];
        match in_string {
            Some(quote) => {
                if b == b'\\' {
                    pos += 1;
                } else if b == quote {
                    in_string = None;
                }
            }
            None => match b {
                b'"' | b'\'' => in_string = Some(b),
                b'{' => depth += 1,
                b'}' if depth == 0 => return Some(pos),
                b'}' => depth -= 1,
                _ => {}
            },
        }
        pos += 1;
    }
    None
}

fn convert_token(logos_token: LogosToken) -> Token {
    match logos_token {
        LogosToken::Var => Token::Var,
        LogosToken::Let => Token::Let,
        LogosToken::Const => Token::Const,
        LogosToken::Final => Token::Final,
        LogosToken::Public => Token::Public,
        LogosToken::Private => Token::Private,
        LogosToken::Protected => Token::Protected,
        LogosToken::Static => Token::Static,
        LogosToken::Def => Token::Def,
        LogosToken::Interface => Token::Interface,
        LogosToken::Class => Token::Class,
        LogosToken::Import => Token::Import,
        LogosToken::Implements => Token::Implements,
        LogosToken::Abstract => Token::Abstract,
        LogosToken::Sealed => Token::Sealed,
        LogosToken::Extends => Token::Extends,
        LogosToken::Enum => Token::Enum,
        LogosToken::Record => Token::Record,
        LogosToken::Return => Token::Return,
        LogosToken::If => Token::If,
        LogosToken::Elif => Token::Elif,
        LogosToken::Else => Token::Else,
        LogosToken::For => Token::For,
        LogosToken::In => Token::In,
        LogosToken::Where => Token::Where,
        LogosToken::Break => Token::Break,
        LogosToken::Continue => Token::Continue,
        LogosToken::Loop => Token::Loop,
        LogosToken::End => Token::End,
        LogosToken::Do => Token::Do,
        LogosToken::Switch => Token::Switch,
        LogosToken::Case => Token::Case,
        LogosToken::Default => Token::Default,
        LogosToken::Try => Token::Try,
        LogosToken::Catch => Token::Catch,
        LogosToken::Finally => Token::Finally,
        LogosToken::Throw => Token::Throw,
        LogosToken::Defer => Token::Defer,
        LogosToken::Thread => Token::Thread,
        LogosToken::Spawn => Token::Spawn,
        LogosToken::Join => Token::Join,
        LogosToken::Channel => Token::Channel,
        LogosToken::Select => Token::Select,
        LogosToken::Closed => Token::Closed,
        LogosToken::Instanceof => Token::Instanceof,
        LogosToken::This => Token::This,
        LogosToken::Super => Token::Super,
        LogosToken::Out => Token::Out,
        LogosToken::True => Token::True,
        LogosToken::False => Token::False,
        LogosToken::Nil => Token::Nil,
        LogosToken::Identifier(name) => Token::Identifier(name),
        LogosToken::IntLiteral(n) => Token::IntLiteral(n),
        LogosToken::FloatLiteral(n) => Token::FloatLiteral(n),
        LogosToken::StringLiteral(s) => Token::StringLiteral(s),
        LogosToken::ColonEqual => Token::ColonEqual,
        LogosToken::PlusEqual => Token::PlusEqual,
        LogosToken::MinusEqual => Token::MinusEqual,
        LogosToken::StarEqual => Token::StarEqual,
        LogosToken::SlashEqual => Token::SlashEqual,
        LogosToken::EqualEqual => Token::EqualEqual,
        LogosToken::BangEqual => Token::BangEqual,
        LogosToken::LessEqual => Token::LessEqual,
        LogosToken::GreaterEqual => Token::GreaterEqual,
        LogosToken::AmpAmp => Token::AmpAmp,
        LogosToken::PipePipe => Token::PipePipe,
        LogosToken::FatArrow => Token::FatArrow,
        LogosToken::Arrow => Token::Arrow,
        LogosToken::DotDotDot => Token::DotDotDot,
        LogosToken::Equal => Token::Equal,
        LogosToken::Plus => Token::Plus,
        LogosToken::Minus => Token::Minus,
        LogosToken::Star => Token::Star,
        LogosToken::Slash => Token::Slash,
        LogosToken::Percent => Token::Percent,
        LogosToken::Less => Token::Less,
        LogosToken::Greater => Token::Greater,
        LogosToken::Bang => Token::Bang,
        LogosToken::Pipe => Token::Pipe,
        LogosToken::Question => Token::Question,
        LogosToken::At => Token::At,
        LogosToken::LeftParen => Token::LeftParen,
        LogosToken::RightParen => Token::RightParen,
        LogosToken::LeftBrace => Token::LeftBrace,
        LogosToken::RightBrace => Token::RightBrace,
        LogosToken::LeftBracket => Token::LeftBracket,
        LogosToken::RightBracket => Token::RightBracket,
        LogosToken::Comma => Token::Comma,
        LogosToken::Colon => Token::Colon,
        LogosToken::Semicolon => Token::Semicolon,
        LogosToken::Dot => Token::Dot,
        // Skipped by logos callbacks; never produced
        LogosToken::Whitespace | LogosToken::LineComment | LogosToken::BlockComment => Token::Eof,
    }
}

impl LexError {
    /// Get the span of this error
    pub fn span(&self) -> &Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::UnterminatedInterpolation { span }
            | LexError::InvalidNumber { span, .. } => span,
        }
    }

    /// Get a description of this error
    pub fn description(&self) -> String {
        match self {
            LexError::UnexpectedCharacter { char, .. } => {
                format!("Unexpected character '{}'", char)
            }
            LexError::UnterminatedString { .. } => "Unterminated string literal".to_string(),
            LexError::UnterminatedInterpolation { .. } => {
                "Unterminated string interpolation".to_string()
            }
            LexError::InvalidNumber { text, .. } => format!("Invalid number '{}'", text),
        }
    }

    /// Get a hint for fixing this error
    pub fn hint(&self) -> Option<String> {
        match self {
            LexError::UnterminatedString { .. } => {
                Some("Add a closing quote to terminate the string".to_string())
            }
            LexError::UnterminatedInterpolation { .. } => {
                Some("Close the interpolation with '}'".to_string())
            }
            _ => None,
        }
    }

    /// Format the error with source context
    pub fn format_with_source(&self, source: &str) -> String {
        let span = self.span();
        let mut result = format!(
            "Error at {}:{}: {}\n",
            span.line,
            span.column,
            self.description()
        );

        if let Some(error_line) = source.lines().nth(span.line.saturating_sub(1) as usize) {
            result.push_str("  |\n");
            result.push_str(&format!("{:3} | {}\n", span.line, error_line));
            result.push_str(&format!(
                "  | {}^\n",
                " ".repeat(span.column.saturating_sub(1) as usize)
            ));
        }

        if let Some(hint) = self.hint() {
            result.push_str(&format!("\nHint: {}\n", hint));
        }

        result
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.description(),
            self.span().line,
            self.span().column
        )
    }
}

impl std::error::Error for LexError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|(tok, _)| tok)
            .collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens = kinds("def greet(name) end");
        assert_eq!(
            tokens,
            vec![
                Token::Def,
                Token::Identifier("greet".to_string()),
                Token::LeftParen,
                Token::Identifier("name".to_string()),
                Token::RightParen,
                Token::End,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_short_keyword_aliases() {
        assert_eq!(kinds("pub priv prot")[..3], [Token::Public, Token::Private, Token::Protected]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42")[0], Token::IntLiteral(42));
        assert_eq!(kinds("1_000")[0], Token::IntLiteral(1000));
        assert_eq!(kinds("3.5")[0], Token::FloatLiteral(3.5));
        assert_eq!(kinds("0xff")[0], Token::IntLiteral(255));
    }

    #[test]
    fn test_range_is_not_a_float() {
        assert_eq!(
            kinds("1...5"),
            vec![Token::IntLiteral(1), Token::DotDotDot, Token::IntLiteral(5), Token::Eof]
        );
    }

    #[test]
    fn test_method_call_on_int() {
        assert_eq!(
            kinds("5.toString")[..3],
            [Token::IntLiteral(5), Token::Dot, Token::Identifier("toString".to_string())]
        );
    }

    #[test]
    fn test_nested_generics_close_separately() {
        let tokens = kinds("List<List<Int>>");
        assert_eq!(tokens[5], Token::Greater);
        assert_eq!(tokens[6], Token::Greater);
    }

    #[test]
    fn test_plain_string() {
        assert_eq!(kinds(r#""a\tb""#)[0], Token::StringLiteral("a\tb".to_string()));
        assert_eq!(kinds("'single'")[0], Token::StringLiteral("single".to_string()));
    }

    #[test]
    fn test_interpolated_string() {
        let tokens = kinds(r#""Hello #{name}!""#);
        match &tokens[0] {
            Token::InterpolatedString(parts) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(parts[0], TemplatePart::String("Hello ".to_string()));
                match &parts[1] {
                    TemplatePart::Expression(inner) => {
                        assert_eq!(inner[0].0, Token::Identifier("name".to_string()));
                    }
                    other => panic!("expected expression part, got {:?}", other),
                }
                assert_eq!(parts[2], TemplatePart::String("!".to_string()));
            }
            other => panic!("expected interpolated string, got {:?}", other),
        }
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = kinds("// line\nlet /* block\n */ x");
        assert_eq!(tokens, vec![Token::Let, Token::Identifier("x".to_string()), Token::Eof]);
    }

    #[test]
    fn test_line_tracking() {
        let tokens = Lexer::new("let x\n  = 1").tokenize().unwrap();
        let (_, eq_span) = &tokens[2];
        assert_eq!(eq_span.line, 2);
        assert_eq!(eq_span.column, 3);
    }

    #[test]
    fn test_unterminated_string() {
        let errors = Lexer::new("\"abc").tokenize().unwrap_err();
        assert!(matches!(errors[0], LexError::UnterminatedString { .. }));
    }

    #[test]
    fn test_unexpected_character() {
        let errors = Lexer::new("let $x").tokenize().unwrap_err();
        assert!(matches!(errors[0], LexError::UnexpectedCharacter { char: '$', .. }));
    }
}
