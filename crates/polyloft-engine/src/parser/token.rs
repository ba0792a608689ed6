//! Token definitions for the Polyloft programming language.
//!
//! This module defines all tokens that can appear in Polyloft source code,
//! including keywords, operators, literals, and special tokens.

use std::fmt;

/// A token in the Polyloft programming language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Declarations
    Var,
    Let,
    Const,
    Final,
    Public,
    Private,
    Protected,
    Static,
    Def,
    Interface,
    Class,
    Import,
    Implements,
    Abstract,
    Sealed,
    Extends,
    Enum,
    Record,

    // Control flow
    Return,
    If,
    Elif,
    Else,
    For,
    In,
    Where,
    Break,
    Continue,
    Loop,
    End,
    Do,
    Switch,
    Case,
    Default,

    // Errors
    Try,
    Catch,
    Finally,
    Throw,
    Defer,

    // Concurrency
    Thread,
    Spawn,
    Join,
    Channel,
    Select,
    Closed,

    // Objects and types
    Instanceof,
    This,
    Super,
    Out,

    // Literals
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    /// `"text #{expr} more"`
    InterpolatedString(Vec<TemplatePart>),
    True,
    False,
    Nil,

    // Identifiers
    Identifier(String),

    // Operators
    Equal,
    ColonEqual,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AmpAmp,
    PipePipe,
    Bang,
    FatArrow,
    Arrow,
    Pipe,
    Question,
    At,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    DotDotDot,

    // Special
    Eof,
}

impl Token {
    /// Check if this token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::Var
                | Token::Let
                | Token::Const
                | Token::Final
                | Token::Public
                | Token::Private
                | Token::Protected
                | Token::Static
                | Token::Def
                | Token::Interface
                | Token::Class
                | Token::Import
                | Token::Implements
                | Token::Abstract
                | Token::Sealed
                | Token::Extends
                | Token::Enum
                | Token::Record
                | Token::Return
                | Token::If
                | Token::Elif
                | Token::Else
                | Token::For
                | Token::In
                | Token::Where
                | Token::Break
                | Token::Continue
                | Token::Loop
                | Token::End
                | Token::Do
                | Token::Switch
                | Token::Case
                | Token::Default
                | Token::Try
                | Token::Catch
                | Token::Finally
                | Token::Throw
                | Token::Defer
                | Token::Thread
                | Token::Spawn
                | Token::Join
                | Token::Channel
                | Token::Select
                | Token::Closed
                | Token::Instanceof
                | Token::This
                | Token::Super
                | Token::Out
                | Token::True
                | Token::False
                | Token::Nil
        )
    }

    /// Tokens that close or continue an enclosing block.
    pub fn is_block_terminator(&self) -> bool {
        matches!(
            self,
            Token::End
                | Token::Elif
                | Token::Else
                | Token::Catch
                | Token::Finally
                | Token::Case
                | Token::Default
                | Token::Eof
        )
    }

    /// Keyword text usable as a member name after `.` (e.g. `p.catch(...)`).
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            Token::Catch => "catch",
            Token::Finally => "finally",
            Token::Default => "default",
            Token::Join => "join",
            Token::Select => "select",
            Token::Closed => "closed",
            Token::Channel => "channel",
            Token::Spawn => "spawn",
            Token::Thread => "thread",
            Token::Import => "import",
            Token::Record => "record",
            Token::Enum => "enum",
            Token::Out => "out",
            Token::In => "in",
            Token::Where => "where",
            Token::Loop => "loop",
            Token::Defer => "defer",
            _ => return None,
        };
        Some(text)
    }
}

/// Part of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    String(String),
    Expression(Vec<(Token, Span)>),
}

/// Source location information for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: self.line.min(other.line),
            column: self.column.min(other.column),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Var => "var",
            Token::Let => "let",
            Token::Const => "const",
            Token::Final => "final",
            Token::Public => "public",
            Token::Private => "private",
            Token::Protected => "protected",
            Token::Static => "static",
            Token::Def => "def",
            Token::Interface => "interface",
            Token::Class => "class",
            Token::Import => "import",
            Token::Implements => "implements",
            Token::Abstract => "abstract",
            Token::Sealed => "sealed",
            Token::Extends => "extends",
            Token::Enum => "enum",
            Token::Record => "record",
            Token::Return => "return",
            Token::If => "if",
            Token::Elif => "elif",
            Token::Else => "else",
            Token::For => "for",
            Token::In => "in",
            Token::Where => "where",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Loop => "loop",
            Token::End => "end",
            Token::Do => "do",
            Token::Switch => "switch",
            Token::Case => "case",
            Token::Default => "default",
            Token::Try => "try",
            Token::Catch => "catch",
            Token::Finally => "finally",
            Token::Throw => "throw",
            Token::Defer => "defer",
            Token::Thread => "thread",
            Token::Spawn => "spawn",
            Token::Join => "join",
            Token::Channel => "channel",
            Token::Select => "select",
            Token::Closed => "closed",
            Token::Instanceof => "instanceof",
            Token::This => "this",
            Token::Super => "super",
            Token::Out => "out",
            Token::IntLiteral(n) => return write!(f, "{}", n),
            Token::FloatLiteral(n) => return write!(f, "{}", n),
            Token::StringLiteral(s) => return write!(f, "\"{}\"", s),
            Token::InterpolatedString(_) => "interpolated string",
            Token::True => "true",
            Token::False => "false",
            Token::Nil => "nil",
            Token::Identifier(name) => return write!(f, "{}", name),
            Token::Equal => "=",
            Token::ColonEqual => ":=",
            Token::PlusEqual => "+=",
            Token::MinusEqual => "-=",
            Token::StarEqual => "*=",
            Token::SlashEqual => "/=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::EqualEqual => "==",
            Token::BangEqual => "!=",
            Token::Less => "<",
            Token::LessEqual => "<=",
            Token::Greater => ">",
            Token::GreaterEqual => ">=",
            Token::AmpAmp => "&&",
            Token::PipePipe => "||",
            Token::Bang => "!",
            Token::FatArrow => "=>",
            Token::Arrow => "->",
            Token::Pipe => "|",
            Token::Question => "?",
            Token::At => "@",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::LeftBrace => "{",
            Token::RightBrace => "}",
            Token::LeftBracket => "[",
            Token::RightBracket => "]",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Semicolon => ";",
            Token::Dot => ".",
            Token::DotDotDot => "...",
            Token::Eof => "end of file",
        };
        write!(f, "{}", text)
    }
}
