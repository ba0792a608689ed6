//! Expression parsing
//!
//! Binary operators use precedence climbing over the table in
//! `precedence.rs`. Infix operators and postfix `(` and `[` must start on
//! the same line as the expression they apply to, so a line beginning with
//! `-1` or a parenthesized lambda is never folded into the previous one.

use super::precedence::{get_precedence, Precedence};
use super::{stmt, types, ParseError, Parser};
use crate::parser::ast::*;
use crate::parser::token::{TemplatePart, Token};
use std::sync::Arc;

/// Parse a full expression.
pub fn parse_expression(parser: &mut Parser) -> Result<Expression, ParseError> {
    parser.enter()?;
    let result = parse_precedence(parser, Precedence::Conditional);
    parser.leave();
    result
}

fn parse_precedence(parser: &mut Parser, min: Precedence) -> Result<Expression, ParseError> {
    let mut left = parse_unary(parser)?;

    loop {
        let prec = get_precedence(parser.current());
        // An infix operator must share a line with its left operand; a line
        // starting with `-1` or `instanceof(` begins a new statement.
        if prec == Precedence::None || prec < min || !parser.on_same_line() {
            break;
        }
        if parser.check(&Token::Instanceof) && matches!(parser.peek(), Some(Token::LeftParen)) {
            break;
        }
        let start = *left.span();

        match parser.current().clone() {
            Token::Question => {
                parser.advance();
                let consequent = parse_expression(parser)?;
                parser.expect(Token::Colon)?;
                let alternate = parse_precedence(parser, Precedence::Conditional)?;
                left = Expression::Conditional(ConditionalExpression {
                    test: Box::new(left),
                    consequent: Box::new(consequent),
                    alternate: Box::new(alternate),
                    span: parser.span_from(&start),
                });
            }
            Token::Instanceof => {
                parser.advance();
                let target = types::parse_type(parser)?;
                left = Expression::InstanceOf(InstanceOfExpression {
                    value: Box::new(left),
                    target,
                    span: parser.span_from(&start),
                });
            }
            Token::DotDotDot => {
                parser.advance();
                let end = parse_precedence(parser, prec.next())?;
                left = Expression::Range(RangeExpression {
                    start: Box::new(left),
                    end: Box::new(end),
                    span: parser.span_from(&start),
                });
            }
            Token::AmpAmp | Token::PipePipe => {
                let operator = if parser.advance() == Token::AmpAmp {
                    LogicalOperator::And
                } else {
                    LogicalOperator::Or
                };
                let right = parse_precedence(parser, prec.next())?;
                left = Expression::Logical(LogicalExpression {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                    span: parser.span_from(&start),
                });
            }
            token => {
                let operator = match binary_operator(&token) {
                    Some(op) => op,
                    None => break,
                };
                parser.advance();
                let right = parse_precedence(parser, prec.next())?;
                left = Expression::Binary(BinaryExpression {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                    span: parser.span_from(&start),
                });
            }
        }
    }

    Ok(left)
}

fn binary_operator(token: &Token) -> Option<BinaryOperator> {
    let op = match token {
        Token::Plus => BinaryOperator::Add,
        Token::Minus => BinaryOperator::Subtract,
        Token::Star => BinaryOperator::Multiply,
        Token::Slash => BinaryOperator::Divide,
        Token::Percent => BinaryOperator::Modulo,
        Token::EqualEqual => BinaryOperator::Equal,
        Token::BangEqual => BinaryOperator::NotEqual,
        Token::Less => BinaryOperator::Less,
        Token::LessEqual => BinaryOperator::LessEqual,
        Token::Greater => BinaryOperator::Greater,
        Token::GreaterEqual => BinaryOperator::GreaterEqual,
        _ => return None,
    };
    Some(op)
}

fn parse_unary(parser: &mut Parser) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    let operator = match parser.current() {
        Token::Minus => UnaryOperator::Negate,
        Token::Bang => UnaryOperator::Not,
        _ => return parse_postfix(parser),
    };
    parser.advance();
    parser.enter()?;
    let operand = parse_unary(parser);
    parser.leave();
    Ok(Expression::Unary(UnaryExpression {
        operator,
        operand: Box::new(operand?),
        span: parser.span_from(&start),
    }))
}

fn parse_postfix(parser: &mut Parser) -> Result<Expression, ParseError> {
    let mut expr = parse_primary(parser)?;

    loop {
        let start = *expr.span();
        match parser.current() {
            Token::Dot => {
                parser.advance();
                let property = member_name(parser)?;
                expr = Expression::Member(MemberExpression {
                    object: Box::new(expr),
                    property,
                    span: parser.span_from(&start),
                });
            }
            Token::LeftParen if parser.on_same_line() => {
                let arguments = parse_arguments(parser)?;
                expr = Expression::Call(CallExpression {
                    callee: Box::new(expr),
                    type_args: Vec::new(),
                    arguments,
                    span: parser.span_from(&start),
                });
            }
            Token::LeftBracket if parser.on_same_line() => {
                parser.advance();
                let index = parse_expression(parser)?;
                parser.expect(Token::RightBracket)?;
                expr = Expression::Index(IndexExpression {
                    object: Box::new(expr),
                    index: Box::new(index),
                    span: parser.span_from(&start),
                });
            }
            _ => break,
        }
    }

    Ok(expr)
}

/// Member names may reuse a handful of keywords (`p.catch`, `f.finally`).
fn member_name(parser: &mut Parser) -> Result<String, ParseError> {
    if let Some(text) = parser.current().keyword_text() {
        parser.advance();
        return Ok(text.to_string());
    }
    parser.expect_identifier()
}

/// Parse `(a, b, c)` call arguments.
pub fn parse_arguments(parser: &mut Parser) -> Result<Vec<Expression>, ParseError> {
    parser.expect(Token::LeftParen)?;
    let mut arguments = Vec::new();
    while !parser.check(&Token::RightParen) {
        arguments.push(parse_expression(parser)?);
        if !parser.eat(&Token::Comma) {
            break;
        }
    }
    parser.expect(Token::RightParen)?;
    Ok(arguments)
}

fn parse_primary(parser: &mut Parser) -> Result<Expression, ParseError> {
    let start = parser.current_span();

    match parser.current().clone() {
        Token::IntLiteral(value) => {
            parser.advance();
            Ok(Expression::IntLiteral(IntLiteral { value, span: start }))
        }
        Token::FloatLiteral(value) => {
            parser.advance();
            Ok(Expression::FloatLiteral(FloatLiteral { value, span: start }))
        }
        Token::StringLiteral(value) => {
            parser.advance();
            Ok(Expression::StringLiteral(StringLiteral { value, span: start }))
        }
        Token::InterpolatedString(parts) => {
            parser.advance();
            parse_interpolation(parts, start)
        }
        Token::True | Token::False => {
            let value = parser.advance() == Token::True;
            Ok(Expression::BooleanLiteral(BooleanLiteral { value, span: start }))
        }
        Token::Nil => {
            parser.advance();
            Ok(Expression::NilLiteral(start))
        }
        Token::This => {
            parser.advance();
            Ok(Expression::This(start))
        }
        Token::Super => {
            parser.advance();
            Ok(Expression::Super(start))
        }
        // Function form: instanceof(value, "List<?>")
        Token::Instanceof if matches!(parser.peek(), Some(Token::LeftParen)) => {
            parser.advance();
            Ok(Expression::identifier("instanceof", start))
        }
        Token::Identifier(name) => {
            // Single-parameter lambda: x => x + 1
            if matches!(parser.peek(), Some(Token::FatArrow)) {
                return parse_lambda(parser);
            }
            parser.advance();
            let ident = Expression::identifier(name, start);
            if parser.check(&Token::Less) && parser.on_same_line() {
                if let Some(type_args) = types::try_parse_call_type_args(parser) {
                    let arguments = parse_arguments(parser)?;
                    return Ok(Expression::Call(CallExpression {
                        callee: Box::new(ident),
                        type_args,
                        arguments,
                        span: parser.span_from(&start),
                    }));
                }
            }
            Ok(ident)
        }
        Token::LeftParen => {
            if is_lambda_start(parser) {
                return parse_lambda(parser);
            }
            parser.advance();
            let expr = parse_expression(parser)?;
            parser.expect(Token::RightParen)?;
            Ok(expr)
        }
        Token::LeftBracket => parse_array(parser),
        Token::LeftBrace => parse_map(parser),
        Token::Thread => parse_thread(parser),
        Token::Channel => parse_channel(parser),
        _ => Err(parser
            .unexpected_token(&[Token::Identifier(String::new())])
            .with_suggestion("Expected an expression")),
    }
}

fn parse_interpolation(
    parts: Vec<TemplatePart>,
    span: crate::parser::token::Span,
) -> Result<Expression, ParseError> {
    let mut out = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            TemplatePart::String(text) => out.push(InterpolationPart::Text(text)),
            TemplatePart::Expression(tokens) => {
                let mut sub = Parser::from_tokens(tokens);
                let expr = parse_expression(&mut sub)?;
                if !sub.at_eof() {
                    return Err(sub.unexpected_token(&[Token::RightBrace]));
                }
                out.push(InterpolationPart::Expression(expr));
            }
        }
    }
    Ok(Expression::Interpolated(InterpolatedString { parts: out, span }))
}

fn parse_array(parser: &mut Parser) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::LeftBracket)?;
    let mut elements = Vec::new();
    while !parser.check(&Token::RightBracket) {
        elements.push(parse_expression(parser)?);
        if !parser.eat(&Token::Comma) {
            break;
        }
    }
    parser.expect(Token::RightBracket)?;
    Ok(Expression::Array(ArrayLiteral {
        elements,
        span: parser.span_from(&start),
    }))
}

fn parse_map(parser: &mut Parser) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::LeftBrace)?;
    let mut entries = Vec::new();
    while !parser.check(&Token::RightBrace) {
        // Bare identifier keys are string keys: { name: "x" }
        let key = match parser.current().clone() {
            Token::Identifier(name) if matches!(parser.peek(), Some(Token::Colon)) => {
                let span = parser.current_span();
                parser.advance();
                Expression::StringLiteral(StringLiteral { value: name, span })
            }
            _ => parse_expression(parser)?,
        };
        parser.expect(Token::Colon)?;
        let value = parse_expression(parser)?;
        entries.push((key, value));
        if !parser.eat(&Token::Comma) {
            break;
        }
    }
    parser.expect(Token::RightBrace)?;
    Ok(Expression::Map(MapLiteral {
        entries,
        span: parser.span_from(&start),
    }))
}

/// `thread spawn do ... end` or `thread join expr`
fn parse_thread(parser: &mut Parser) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Thread)?;
    if parser.eat(&Token::Join) {
        let handle = parse_unary(parser)?;
        return Ok(Expression::ThreadJoin(ThreadJoinExpression {
            handle: Box::new(handle),
            span: parser.span_from(&start),
        }));
    }

    parser.expect(Token::Spawn)?;
    parser.expect(Token::Do)?;
    let body = stmt::parse_block(parser, &[Token::End])?;
    parser.expect_end("thread spawn", start)?;
    Ok(Expression::ThreadSpawn(ThreadSpawnExpression {
        body: Arc::new(body),
        span: parser.span_from(&start),
    }))
}

/// `channel[Int]()`, `channel[Int](8)` or `channel()`
fn parse_channel(parser: &mut Parser) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Channel)?;
    let element_type = if parser.eat(&Token::LeftBracket) {
        let ty = types::parse_type(parser)?;
        parser.expect(Token::RightBracket)?;
        Some(ty)
    } else {
        None
    };
    let mut arguments = parse_arguments(parser)?;
    if arguments.len() > 1 {
        return Err(ParseError::invalid_syntax(
            "channel takes at most one capacity argument",
            parser.span_from(&start),
        ));
    }
    Ok(Expression::Channel(ChannelExpression {
        element_type,
        capacity: arguments.pop().map(Box::new),
        span: parser.span_from(&start),
    }))
}

/// Scan ahead from `(` to its matching `)` and check for `=>` or `->`.
fn is_lambda_start(parser: &Parser) -> bool {
    let mut depth = 0usize;
    let mut offset = 0usize;
    loop {
        match parser.peek_nth(offset) {
            Token::LeftParen => depth += 1,
            Token::RightParen => {
                depth -= 1;
                if depth == 0 {
                    return matches!(parser.peek_nth(offset + 1), Token::FatArrow | Token::Arrow);
                }
            }
            Token::Eof => return false,
            _ => {}
        }
        offset += 1;
    }
}

/// `(a, b: Int) => expr`, `(x) -> Int => do ... end`, `x => expr`
fn parse_lambda(parser: &mut Parser) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    let params = if let Token::Identifier(name) = parser.current().clone() {
        parser.advance();
        vec![Param {
            name,
            type_annotation: None,
            variadic: false,
            span: start,
        }]
    } else {
        stmt::parse_params(parser)?
    };

    let return_type = if parser.eat(&Token::Arrow) {
        Some(types::parse_type(parser)?)
    } else {
        None
    };
    parser.expect(Token::FatArrow)?;

    let body = if parser.check(&Token::Do) {
        let do_span = parser.current_span();
        parser.advance();
        let block = stmt::parse_block(parser, &[Token::End])?;
        parser.expect_end("do", do_span)?;
        LambdaBody::Block(Arc::new(block))
    } else {
        LambdaBody::Expression(Arc::new(parse_expression(parser)?))
    };

    Ok(Expression::Lambda(LambdaExpression {
        params,
        return_type,
        body,
        span: parser.span_from(&start),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(src: &str) -> Expression {
        let mut parser = Parser::new(src).unwrap();
        let e = parse_expression(&mut parser).unwrap();
        assert!(parser.at_eof(), "trailing tokens in {:?}", src);
        e
    }

    #[test]
    fn test_precedence() {
        match expr("1 + 2 * 3") {
            Expression::Binary(bin) => {
                assert_eq!(bin.operator, BinaryOperator::Add);
                assert!(matches!(*bin.right, Expression::Binary(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_generic_call_vs_comparison() {
        match expr("Box<Int>(1)") {
            Expression::Call(call) => {
                assert_eq!(call.type_args, vec![TypeExpr::named("Int")]);
                assert_eq!(call.arguments.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(expr("a < b"), Expression::Binary(_)));
        assert!(matches!(expr("a < b && c > d"), Expression::Logical(_)));
    }

    #[test]
    fn test_lambda_forms() {
        assert!(matches!(expr("(x) => x * 2"), Expression::Lambda(_)));
        assert!(matches!(expr("x => x"), Expression::Lambda(_)));
        match expr("(a, b) => do\n return a + b\nend") {
            Expression::Lambda(lambda) => {
                assert_eq!(lambda.params.len(), 2);
                assert!(matches!(lambda.body, LambdaBody::Block(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(!matches!(expr("(1 + 2)"), Expression::Lambda(_)));
    }

    #[test]
    fn test_member_call_with_keyword_name() {
        match expr("p.catch((e) => 0)") {
            Expression::Call(call) => match *call.callee {
                Expression::Member(member) => assert_eq!(member.property, "catch"),
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_instanceof_with_generic_type() {
        match expr("x instanceof List<? extends Number>") {
            Expression::InstanceOf(inst) => {
                assert_eq!(inst.target.to_string(), "List<? extends Number>")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_instanceof_function_form() {
        match expr(r#"instanceof(x, "List<?>")"#) {
            Expression::Call(call) => {
                assert!(matches!(*call.callee, Expression::Identifier(ref id) if id.name == "instanceof"));
                assert_eq!(call.arguments.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_ternary_and_range() {
        assert!(matches!(expr("a > 0 ? 1 : 2"), Expression::Conditional(_)));
        assert!(matches!(expr("1...n + 1"), Expression::Range(_)));
    }

    #[test]
    fn test_channel_and_thread() {
        match expr("channel[Int](4)") {
            Expression::Channel(ch) => {
                assert_eq!(ch.element_type, Some(TypeExpr::named("Int")));
                assert!(ch.capacity.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(expr("thread spawn do return 1 end"), Expression::ThreadSpawn(_)));
        assert!(matches!(expr("thread join t"), Expression::ThreadJoin(_)));
    }

    #[test]
    fn test_map_literal() {
        match expr(r#"{"a": 1, b: 2}"#) {
            Expression::Map(map) => assert_eq!(map.entries.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_interpolation() {
        match expr(r#""sum: #{a + b}""#) {
            Expression::Interpolated(s) => {
                assert_eq!(s.parts.len(), 2);
                assert!(matches!(s.parts[1], InterpolationPart::Expression(Expression::Binary(_))));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_call_must_start_on_same_line() {
        let mut parser = Parser::new("f\n(1)").unwrap();
        let e = parse_expression(&mut parser).unwrap();
        assert!(matches!(e, Expression::Identifier(_)));
        assert!(!parser.at_eof());
    }

    #[test]
    fn test_infix_operator_must_start_on_same_line() {
        let mut parser = Parser::new("a\n-1").unwrap();
        let e = parse_expression(&mut parser).unwrap();
        assert!(matches!(e, Expression::Identifier(_)));
        assert!(parser.check(&Token::Minus));

        // Trailing operators still continue onto the next line.
        assert!(matches!(expr("a +\n1"), Expression::Binary(_)));
    }

    #[test]
    fn test_instanceof_call_on_next_line_is_not_infix() {
        let mut parser = Parser::new("xs\ninstanceof(xs, \"List<?>\")").unwrap();
        let e = parse_expression(&mut parser).unwrap();
        assert!(matches!(e, Expression::Identifier(_)));
        assert!(parser.check(&Token::Instanceof));
    }
}
