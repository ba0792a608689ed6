//! Statement AST nodes
//!
//! This module defines all statement types in the Polyloft language, including:
//! - Variable declarations (let, var, const, final) and assignments
//! - Function, class, interface, enum and record declarations
//! - Control flow (if, for-in, loop, switch, select)
//! - Exceptions and cleanup (try, throw, defer)

use super::*;
use crate::parser::token::Span;
use std::sync::Arc;

/// Top-level or block-level statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Variable declaration: let/var/const/final
    VariableDecl(VariableDecl),

    /// Assignment: x = 1, obj.f += 2, arr[0] = 3
    Assignment(Assignment),

    /// Expression statement (e.g., function call)
    Expression(ExpressionStatement),

    /// Return statement
    Return(ReturnStatement),

    /// Function declaration
    FunctionDecl(FunctionDecl),

    /// If statement with elif chain
    If(IfStatement),

    /// for x in iterable [where cond]
    ForIn(ForInStatement),

    /// loop [cond:] ... end
    Loop(LoopStatement),

    Break(Span),

    Continue(Span),

    /// Try-catch-finally
    Try(TryStatement),

    /// Throw statement
    Throw(ThrowStatement),

    /// defer expr
    Defer(DeferStatement),

    /// Class declaration
    ClassDecl(ClassDecl),

    /// Interface declaration
    InterfaceDecl(InterfaceDecl),

    /// Enum declaration
    EnumDecl(EnumDecl),

    /// Record declaration
    RecordDecl(RecordDecl),

    /// select over channels
    Select(SelectStatement),

    /// switch on values or types
    Switch(SwitchStatement),

    /// import Name [as Alias]
    Import(ImportDecl),
}

impl Statement {
    /// Get the span of this statement
    pub fn span(&self) -> &Span {
        match self {
            Statement::VariableDecl(s) => &s.span,
            Statement::Assignment(s) => &s.span,
            Statement::Expression(s) => &s.span,
            Statement::Return(s) => &s.span,
            Statement::FunctionDecl(s) => &s.span,
            Statement::If(s) => &s.span,
            Statement::ForIn(s) => &s.span,
            Statement::Loop(s) => &s.span,
            Statement::Break(span) => span,
            Statement::Continue(span) => span,
            Statement::Try(s) => &s.span,
            Statement::Throw(s) => &s.span,
            Statement::Defer(s) => &s.span,
            Statement::ClassDecl(s) => &s.span,
            Statement::InterfaceDecl(s) => &s.span,
            Statement::EnumDecl(s) => &s.span,
            Statement::RecordDecl(s) => &s.span,
            Statement::Select(s) => &s.span,
            Statement::Switch(s) => &s.span,
            Statement::Import(s) => &s.span,
        }
    }

    /// Check if this statement is a declaration
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            Statement::VariableDecl(_)
                | Statement::FunctionDecl(_)
                | Statement::ClassDecl(_)
                | Statement::InterfaceDecl(_)
                | Statement::EnumDecl(_)
                | Statement::RecordDecl(_)
        )
    }
}

/// A sequence of statements closed by `end` (or another block keyword).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

// ============================================================================
// Variables
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Let,
    Var,
    Const,
    Final,
}

impl BindingKind {
    /// const and final bindings cannot be reassigned
    pub fn is_immutable(&self) -> bool {
        matches!(self, BindingKind::Const | BindingKind::Final)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub kind: BindingKind,
    pub name: String,
    pub type_annotation: Option<TypeExpr>,
    /// Missing initializer binds nil
    pub initializer: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOperator {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Expression,
    pub operator: AssignOperator,
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub value: Option<Expression>,
    pub span: Span,
}

// ============================================================================
// Functions
// ============================================================================

/// Function parameter: `name`, `name: Type`, `rest: Int...`
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub type_annotation: Option<TypeExpr>,
    pub variadic: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: Arc<Block>,
    pub span: Span,
}

// ============================================================================
// Control flow
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Block,
    pub elif_branches: Vec<(Expression, Block)>,
    pub else_branch: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForInStatement {
    /// One name, or two for `for k, v in map`
    pub bindings: Vec<String>,
    pub iterable: Expression,
    pub filter: Option<Expression>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopStatement {
    pub condition: Option<Expression>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStatement {
    pub body: Block,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub binding: Option<String>,
    pub exception_type: Option<TypeExpr>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStatement {
    pub value: Expression,
    pub span: Span,
}

/// The expression is evaluated when the frame exits, not when registered.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferStatement {
    pub call: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub cases: Vec<SelectCase>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectCase {
    pub kind: SelectCaseKind,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectCaseKind {
    /// `case let x = ch.recv():` (binding optional)
    Recv {
        binding: Option<String>,
        channel: Expression,
    },
    /// `case closed ch:`
    Closed { channel: Expression },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStatement {
    pub subject: Expression,
    pub cases: Vec<SwitchCase>,
    pub default: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub pattern: CasePattern,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CasePattern {
    /// `case 1, 2:`
    Values(Vec<Expression>),
    /// `case (n: Int):`
    Type { binding: String, ty: TypeExpr },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub name: String,
    pub alias: Option<String>,
    pub span: Span,
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub kind: BindingKind,
    pub modifiers: Modifiers,
    pub type_annotation: Option<TypeExpr>,
    pub initializer: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub function: FunctionDecl,
    pub modifiers: Modifiers,
    /// Abstract and interface methods have no body
    pub has_body: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDecl {
    pub params: Vec<Param>,
    pub body: Arc<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub parent: Option<TypeExpr>,
    pub interfaces: Vec<TypeExpr>,
    pub is_sealed: bool,
    pub is_abstract: bool,
    pub permits: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub constructors: Vec<ConstructorDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub parents: Vec<TypeExpr>,
    pub is_sealed: bool,
    pub permits: Vec<String>,
    pub methods: Vec<MethodDecl>,
    pub static_fields: Vec<FieldDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDecl {
    pub name: String,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub is_sealed: bool,
    pub permits: Vec<String>,
    pub interfaces: Vec<TypeExpr>,
    pub values: Vec<EnumValueDecl>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub constructors: Vec<ConstructorDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub components: Vec<Param>,
    pub interfaces: Vec<TypeExpr>,
    pub methods: Vec<MethodDecl>,
    pub span: Span,
}
