//! Evaluation of hand-built syntax trees
//!
//! The evaluator takes any `Program`, not only parser output, so embedders
//! can construct trees directly.

use polyloft_engine::parser::ast::*;
use polyloft_engine::parser::Span;
use polyloft_engine::vm::context::parse_program;
use polyloft_engine::{eval, BufferSink, EvalOptions};

fn int(value: i64) -> Expression {
    Expression::IntLiteral(IntLiteral {
        value,
        span: Span::default(),
    })
}

fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::Binary(BinaryExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
        span: Span::default(),
    })
}

fn expression_statement(expression: Expression) -> Statement {
    Statement::Expression(ExpressionStatement {
        expression,
        span: Span::default(),
    })
}

fn let_binding(name: &str, initializer: Expression) -> Statement {
    Statement::VariableDecl(VariableDecl {
        kind: BindingKind::Let,
        name: name.to_string(),
        type_annotation: None,
        initializer: Some(initializer),
        span: Span::default(),
    })
}

fn options() -> EvalOptions {
    EvalOptions::default().with_stdout(BufferSink::new())
}

#[test]
fn test_arithmetic_tree() {
    // (2 + 3) * 4
    let program = Program::new(vec![expression_statement(binary(
        BinaryOperator::Multiply,
        binary(BinaryOperator::Add, int(2), int(3)),
        int(4),
    ))]);
    let value = eval(&program, options()).unwrap();
    assert_eq!(value.as_int(), Some(20));
}

#[test]
fn test_bindings_in_tree() {
    let program = Program::new(vec![
        let_binding("a", int(40)),
        let_binding("b", int(2)),
        expression_statement(binary(
            BinaryOperator::Add,
            Expression::identifier("a", Span::default()),
            Expression::identifier("b", Span::default()),
        )),
    ]);
    assert_eq!(eval(&program, options()).unwrap().as_int(), Some(42));
}

#[test]
fn test_declaration_only_program_is_nil() {
    let program = Program::new(vec![let_binding("unused", int(1))]);
    assert!(eval(&program, options()).unwrap().is_nil());
}

#[test]
fn test_empty_program_is_nil() {
    assert!(eval(&Program::new(Vec::new()), options()).unwrap().is_nil());
}

#[test]
fn test_fault_in_tree() {
    let program = Program::new(vec![expression_statement(binary(
        BinaryOperator::Divide,
        int(1),
        int(0),
    ))]);
    let err = eval(&program, options()).unwrap_err();
    assert!(err.to_string().contains("division by zero"), "got: {}", err);
}

#[test]
fn test_parsed_program_matches_hand_built_tree() {
    let parsed = parse_program("1 + 2").unwrap();
    assert_eq!(parsed.statements.len(), 1);
    match &parsed.statements[0] {
        Statement::Expression(stmt) => match &stmt.expression {
            Expression::Binary(bin) => assert_eq!(bin.operator, BinaryOperator::Add),
            other => panic!("expected binary expression, got {:?}", other),
        },
        other => panic!("expected expression statement, got {:?}", other),
    }
    assert_eq!(eval(&parsed, options()).unwrap().as_int(), Some(3));
}
