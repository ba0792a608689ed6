//! Expression AST nodes

use super::*;
use crate::parser::token::Span;
use std::sync::Arc;

/// Expression (produces a value)
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Integer literal: 42
    IntLiteral(IntLiteral),

    /// Float literal: 3.14
    FloatLiteral(FloatLiteral),

    /// String literal: "hello"
    StringLiteral(StringLiteral),

    /// Interpolated string: "hello #{name}"
    Interpolated(InterpolatedString),

    /// Boolean literal: true, false
    BooleanLiteral(BooleanLiteral),

    /// nil
    NilLiteral(Span),

    /// Identifier
    Identifier(Identifier),

    /// this
    This(Span),

    /// super (only valid as a call target or member object)
    Super(Span),

    /// Array literal: [1, 2, 3]
    Array(ArrayLiteral),

    /// Map literal: {"a": 1}
    Map(MapLiteral),

    /// Unary: -x, !x
    Unary(UnaryExpression),

    /// Binary: a + b
    Binary(BinaryExpression),

    /// Short-circuit logical: a && b, a || b
    Logical(LogicalExpression),

    /// Ternary: c ? a : b
    Conditional(ConditionalExpression),

    /// Call: f(x), Box<Int>(1), obj.m(x)
    Call(CallExpression),

    /// Member access: obj.field
    Member(MemberExpression),

    /// Index access: arr[0]
    Index(IndexExpression),

    /// Lambda: (x) => x * 2
    Lambda(LambdaExpression),

    /// thread spawn do ... end
    ThreadSpawn(ThreadSpawnExpression),

    /// thread join handle
    ThreadJoin(ThreadJoinExpression),

    /// channel[Int](), channel[Int](4)
    Channel(ChannelExpression),

    /// value instanceof Type
    InstanceOf(InstanceOfExpression),

    /// Inclusive range: 1...5
    Range(RangeExpression),
}

impl Expression {
    pub fn span(&self) -> &Span {
        match self {
            Expression::IntLiteral(e) => &e.span,
            Expression::FloatLiteral(e) => &e.span,
            Expression::StringLiteral(e) => &e.span,
            Expression::Interpolated(e) => &e.span,
            Expression::BooleanLiteral(e) => &e.span,
            Expression::NilLiteral(span) => span,
            Expression::Identifier(e) => &e.span,
            Expression::This(span) => span,
            Expression::Super(span) => span,
            Expression::Array(e) => &e.span,
            Expression::Map(e) => &e.span,
            Expression::Unary(e) => &e.span,
            Expression::Binary(e) => &e.span,
            Expression::Logical(e) => &e.span,
            Expression::Conditional(e) => &e.span,
            Expression::Call(e) => &e.span,
            Expression::Member(e) => &e.span,
            Expression::Index(e) => &e.span,
            Expression::Lambda(e) => &e.span,
            Expression::ThreadSpawn(e) => &e.span,
            Expression::ThreadJoin(e) => &e.span,
            Expression::Channel(e) => &e.span,
            Expression::InstanceOf(e) => &e.span,
            Expression::Range(e) => &e.span,
        }
    }

    /// Check if this expression can appear on the left of `=`
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            Expression::Identifier(_) | Expression::Member(_) | Expression::Index(_)
        )
    }

    pub fn identifier(name: impl Into<String>, span: Span) -> Self {
        Expression::Identifier(Identifier {
            name: name.into(),
            span,
        })
    }
}

// ============================================================================
// Literals
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct IntLiteral {
    pub value: i64,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatLiteral {
    pub value: f64,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedString {
    pub parts: Vec<InterpolationPart>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpolationPart {
    Text(String),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanLiteral {
    pub value: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteral {
    pub elements: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapLiteral {
    pub entries: Vec<(Expression, Expression)>,
    pub span: Span,
}

// ============================================================================
// Operators
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub operand: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpression {
    pub operator: LogicalOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpression {
    pub test: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternate: Box<Expression>,
    pub span: Span,
}

// ============================================================================
// Calls and access
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    /// Explicit type arguments: `Box<Int>(1)`
    pub type_args: Vec<TypeExpr>,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpression {
    pub object: Box<Expression>,
    pub index: Box<Expression>,
    pub span: Span,
}

// ============================================================================
// Functions and concurrency
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpression {
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: LambdaBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LambdaBody {
    Expression(Arc<Expression>),
    Block(Arc<Block>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadSpawnExpression {
    pub body: Arc<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadJoinExpression {
    pub handle: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelExpression {
    pub element_type: Option<TypeExpr>,
    pub capacity: Option<Box<Expression>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceOfExpression {
    pub value: Box<Expression>,
    pub target: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeExpression {
    pub start: Box<Expression>,
    pub end: Box<Expression>,
    pub span: Span,
}
