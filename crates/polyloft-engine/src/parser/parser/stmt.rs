//! Statement parsing

use super::expr::parse_expression;
use super::{decl, types, ParseError, Parser};
use crate::parser::ast::*;
use crate::parser::token::Token;

/// Parse a single statement.
pub fn parse_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    parser.enter()?;
    let result = parse_statement_inner(parser);
    parser.leave();
    result
}

fn parse_statement_inner(parser: &mut Parser) -> Result<Statement, ParseError> {
    match parser.current() {
        Token::Let | Token::Var | Token::Const | Token::Final => parse_variable_decl(parser),
        Token::Def => decl::parse_function_decl(parser).map(Statement::FunctionDecl),
        Token::Class | Token::Abstract => decl::parse_class_decl(parser),
        Token::Interface => decl::parse_interface_decl(parser),
        Token::Enum => decl::parse_enum_decl(parser),
        Token::Record => decl::parse_record_decl(parser),
        Token::Sealed => decl::parse_sealed_decl(parser),
        Token::Public | Token::Private | Token::Protected | Token::Static => {
            // Top-level modifiers carry no meaning outside a class body
            parser.advance();
            parse_statement_inner(parser)
        }
        Token::If => parse_if(parser),
        Token::For => parse_for_in(parser),
        Token::Loop => parse_loop(parser),
        Token::Break => {
            let span = parser.current_span();
            parser.advance();
            Ok(Statement::Break(span))
        }
        Token::Continue => {
            let span = parser.current_span();
            parser.advance();
            Ok(Statement::Continue(span))
        }
        Token::Return => parse_return(parser),
        Token::Try => parse_try(parser),
        Token::Throw => parse_throw(parser),
        Token::Defer => parse_defer(parser),
        Token::Select => parse_select(parser),
        Token::Switch => parse_switch(parser),
        Token::Import => parse_import(parser),
        Token::Identifier(_) if matches!(parser.peek(), Some(Token::ColonEqual)) => {
            parse_short_decl(parser)
        }
        _ => parse_expression_statement(parser),
    }
}

/// Whether `token` can begin a statement; used for error recovery.
pub fn starts_statement(token: &Token) -> bool {
    matches!(
        token,
        Token::Let
            | Token::Var
            | Token::Const
            | Token::Final
            | Token::Def
            | Token::Class
            | Token::Abstract
            | Token::Sealed
            | Token::Interface
            | Token::Enum
            | Token::Record
            | Token::If
            | Token::For
            | Token::Loop
            | Token::Return
            | Token::Try
            | Token::Throw
            | Token::Defer
            | Token::Select
            | Token::Switch
            | Token::Import
            | Token::End
            | Token::Identifier(_)
    )
}

/// Parse statements until one of `terminators` (or EOF); the terminator is not consumed.
pub fn parse_block(parser: &mut Parser, terminators: &[Token]) -> Result<Block, ParseError> {
    let start = parser.current_span();
    let mut statements = Vec::new();
    while !parser.at_eof() && !parser.check_any(terminators) {
        if parser.eat(&Token::Semicolon) {
            continue;
        }
        statements.push(parse_statement(parser)?);
    }
    let span = match statements.last() {
        Some(last) => parser.combine_spans(&start, last.span()),
        None => start,
    };
    Ok(Block { statements, span })
}

/// Parse `(a, b: Int, rest: String...)`.
pub fn parse_params(parser: &mut Parser) -> Result<Vec<Param>, ParseError> {
    parser.expect(Token::LeftParen)?;
    let mut params: Vec<Param> = Vec::new();
    while !parser.check(&Token::RightParen) {
        let span = parser.current_span();
        let name = parser.expect_identifier()?;
        let mut variadic = parser.eat(&Token::DotDotDot);
        let type_annotation = if parser.eat(&Token::Colon) {
            Some(types::parse_type(parser)?)
        } else {
            None
        };
        variadic |= parser.eat(&Token::DotDotDot);
        if params.last().is_some_and(|p| p.variadic) {
            return Err(ParseError::invalid_syntax(
                "variadic parameter must be last",
                span,
            ));
        }
        params.push(Param {
            name,
            type_annotation,
            variadic,
            span: parser.span_from(&span),
        });
        if !parser.eat(&Token::Comma) {
            break;
        }
    }
    parser.expect(Token::RightParen)?;
    Ok(params)
}

fn binding_kind(token: &Token) -> BindingKind {
    match token {
        Token::Var => BindingKind::Var,
        Token::Const => BindingKind::Const,
        Token::Final => BindingKind::Final,
        _ => BindingKind::Let,
    }
}

/// `let x: Int = 1`, `var y`, `const z := 3`
fn parse_variable_decl(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    let kind = binding_kind(&parser.advance());
    let name = parser.expect_identifier()?;
    let type_annotation = if parser.eat(&Token::Colon) {
        Some(types::parse_type(parser)?)
    } else {
        None
    };

    let initializer = if parser.eat(&Token::Equal) || parser.eat(&Token::ColonEqual) {
        Some(parse_expression(parser)?)
    } else if kind.is_immutable() {
        return Err(ParseError::invalid_syntax(
            format!("'{}' must be initialized", name),
            parser.current_span(),
        ));
    } else {
        None
    };

    Ok(Statement::VariableDecl(VariableDecl {
        kind,
        name,
        type_annotation,
        initializer,
        span: parser.span_from(&start),
    }))
}

/// `name := expr`
fn parse_short_decl(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    let name = parser.expect_identifier()?;
    parser.expect(Token::ColonEqual)?;
    let initializer = parse_expression(parser)?;
    Ok(Statement::VariableDecl(VariableDecl {
        kind: BindingKind::Let,
        name,
        type_annotation: None,
        initializer: Some(initializer),
        span: parser.span_from(&start),
    }))
}

fn parse_expression_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    let expression = parse_expression(parser)?;

    let operator = match parser.current() {
        Token::Equal => Some(AssignOperator::Assign),
        Token::PlusEqual => Some(AssignOperator::Add),
        Token::MinusEqual => Some(AssignOperator::Subtract),
        Token::StarEqual => Some(AssignOperator::Multiply),
        Token::SlashEqual => Some(AssignOperator::Divide),
        _ => None,
    };

    if let Some(operator) = operator {
        if !expression.is_assignable() {
            return Err(ParseError::invalid_assignment_target(*expression.span()));
        }
        parser.advance();
        let value = parse_expression(parser)?;
        return Ok(Statement::Assignment(Assignment {
            target: expression,
            operator,
            value,
            span: parser.span_from(&start),
        }));
    }

    Ok(Statement::Expression(ExpressionStatement {
        expression,
        span: parser.span_from(&start),
    }))
}

fn parse_return(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Return)?;
    let value = if parser.current().is_block_terminator()
        || !parser.on_same_line()
        || parser.check(&Token::Semicolon)
    {
        None
    } else {
        Some(parse_expression(parser)?)
    };
    Ok(Statement::Return(ReturnStatement {
        value,
        span: parser.span_from(&start),
    }))
}

/// `if c: ... elif c: ... else ... end`
fn parse_if(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::If)?;
    let condition = parse_expression(parser)?;
    parser.eat(&Token::Colon);
    let then_branch = parse_block(parser, &[Token::Elif, Token::Else, Token::End])?;

    let mut elif_branches = Vec::new();
    while parser.eat(&Token::Elif) {
        let cond = parse_expression(parser)?;
        parser.eat(&Token::Colon);
        let block = parse_block(parser, &[Token::Elif, Token::Else, Token::End])?;
        elif_branches.push((cond, block));
    }

    let else_branch = if parser.eat(&Token::Else) {
        parser.eat(&Token::Colon);
        Some(parse_block(parser, &[Token::End])?)
    } else {
        None
    };
    parser.expect_end("if", start)?;

    Ok(Statement::If(IfStatement {
        condition,
        then_branch,
        elif_branches,
        else_branch,
        span: parser.span_from(&start),
    }))
}

/// `for x in xs [where cond]: ... end`, `for k, v in map: ... end`
fn parse_for_in(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::For)?;
    let mut bindings = vec![parser.expect_identifier()?];
    while parser.eat(&Token::Comma) {
        bindings.push(parser.expect_identifier()?);
    }
    parser.expect(Token::In)?;
    let iterable = parse_expression(parser)?;
    let filter = if parser.eat(&Token::Where) {
        Some(parse_expression(parser)?)
    } else {
        None
    };
    parser.eat(&Token::Colon);
    let body = parse_block(parser, &[Token::End])?;
    parser.expect_end("for", start)?;

    Ok(Statement::ForIn(ForInStatement {
        bindings,
        iterable,
        filter,
        body,
        span: parser.span_from(&start),
    }))
}

/// `loop ... end` or `loop cond: ... end`
fn parse_loop(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Loop)?;

    // A condition is only present when an expression on the header line is
    // followed by ':'; otherwise the first token starts the body.
    let mut condition = None;
    if parser.on_same_line() && !parser.check(&Token::Colon) {
        let saved = parser.checkpoint();
        match parse_expression(parser) {
            Ok(expr) if parser.check(&Token::Colon) => condition = Some(expr),
            _ => parser.restore(saved),
        }
    }
    parser.eat(&Token::Colon);
    let body = parse_block(parser, &[Token::End])?;
    parser.expect_end("loop", start)?;

    Ok(Statement::Loop(LoopStatement {
        condition,
        body,
        span: parser.span_from(&start),
    }))
}

/// `try ... catch e[: Type] ... finally ... end`
fn parse_try(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Try)?;
    parser.eat(&Token::Colon);
    let body = parse_block(parser, &[Token::Catch, Token::Finally, Token::End])?;

    let mut catches = Vec::new();
    while parser.check(&Token::Catch) {
        let catch_span = parser.current_span();
        parser.advance();
        let (binding, exception_type) = parse_catch_header(parser)?;
        parser.eat(&Token::Colon);
        let block = parse_block(parser, &[Token::Catch, Token::Finally, Token::End])?;
        catches.push(CatchClause {
            binding,
            exception_type,
            body: block,
            span: parser.span_from(&catch_span),
        });
    }

    let finally = if parser.eat(&Token::Finally) {
        parser.eat(&Token::Colon);
        Some(parse_block(parser, &[Token::End])?)
    } else {
        None
    };

    if catches.is_empty() && finally.is_none() {
        return Err(ParseError::invalid_syntax(
            "try requires at least one catch or finally",
            start,
        ));
    }
    parser.expect_end("try", start)?;

    Ok(Statement::Try(TryStatement {
        body,
        catches,
        finally,
        span: parser.span_from(&start),
    }))
}

/// `catch`, `catch e`, `catch e: Type`, `catch (e: Type)`
fn parse_catch_header(parser: &mut Parser) -> Result<(Option<String>, Option<TypeExpr>), ParseError> {
    if !parser.on_same_line() {
        return Ok((None, None));
    }
    let parenthesized = parser.eat(&Token::LeftParen);
    let binding = match parser.current() {
        Token::Identifier(_) => Some(parser.expect_identifier()?),
        _ => None,
    };

    // `catch e:` followed by a body on the next line has no type
    let mut exception_type = None;
    if parser.check(&Token::Colon) {
        let colon_line = parser.current_span().line;
        let type_on_same_line =
            parser.peek_nth(1) != &Token::Eof && parser.peek_span_nth(1).line == colon_line;
        if parenthesized || type_on_same_line {
            parser.advance();
            exception_type = Some(types::parse_type(parser)?);
        }
    }
    if parenthesized {
        parser.expect(Token::RightParen)?;
    }
    Ok((binding, exception_type))
}

fn parse_throw(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Throw)?;
    let value = parse_expression(parser)?;
    Ok(Statement::Throw(ThrowStatement {
        value,
        span: parser.span_from(&start),
    }))
}

fn parse_defer(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Defer)?;
    let call = parse_expression(parser)?;
    Ok(Statement::Defer(DeferStatement {
        call,
        span: parser.span_from(&start),
    }))
}

/// ```text
/// select
///     case let x = ch.recv(): ...
///     case closed ch: ...
/// end
/// ```
fn parse_select(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Select)?;
    parser.eat(&Token::Colon);

    let mut cases = Vec::new();
    while parser.check(&Token::Case) {
        let case_span = parser.current_span();
        parser.advance();
        let kind = if parser.eat(&Token::Closed) {
            SelectCaseKind::Closed {
                channel: parse_expression(parser)?,
            }
        } else {
            let binding = if parser.eat(&Token::Let) || parser.eat(&Token::Var) {
                let name = parser.expect_identifier()?;
                parser.expect(Token::Equal)?;
                Some(name)
            } else {
                None
            };
            let recv = parse_expression(parser)?;
            SelectCaseKind::Recv {
                binding,
                channel: recv_channel(recv)?,
            }
        };
        parser.eat(&Token::Colon);
        let body = parse_block(parser, &[Token::Case, Token::End])?;
        cases.push(SelectCase {
            kind,
            body,
            span: parser.span_from(&case_span),
        });
    }
    parser.expect_end("select", start)?;

    Ok(Statement::Select(SelectStatement {
        cases,
        span: parser.span_from(&start),
    }))
}

/// Extract `ch` from `ch.recv()`.
fn recv_channel(expr: Expression) -> Result<Expression, ParseError> {
    let span = *expr.span();
    if let Expression::Call(call) = expr {
        if call.arguments.is_empty() {
            if let Expression::Member(member) = *call.callee {
                if member.property == "recv" {
                    return Ok(*member.object);
                }
            }
        }
    }
    Err(ParseError::invalid_syntax("select case must receive with ch.recv()", span))
}

/// ```text
/// switch value
///     case 1, 2: ...
///     case (s: String): ...
///     default: ...
/// end
/// ```
fn parse_switch(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Switch)?;
    let subject = parse_expression(parser)?;
    parser.eat(&Token::Colon);

    let mut cases = Vec::new();
    let mut default = None;
    loop {
        if parser.check(&Token::Case) {
            let case_span = parser.current_span();
            parser.advance();
            let pattern = parse_case_pattern(parser)?;
            parser.eat(&Token::Colon);
            let body = parse_block(parser, &[Token::Case, Token::Default, Token::End])?;
            cases.push(SwitchCase {
                pattern,
                body,
                span: parser.span_from(&case_span),
            });
        } else if parser.eat(&Token::Default) {
            parser.eat(&Token::Colon);
            default = Some(parse_block(parser, &[Token::Case, Token::Default, Token::End])?);
        } else {
            break;
        }
    }
    parser.expect_end("switch", start)?;

    Ok(Statement::Switch(SwitchStatement {
        subject,
        cases,
        default,
        span: parser.span_from(&start),
    }))
}

fn parse_case_pattern(parser: &mut Parser) -> Result<CasePattern, ParseError> {
    let is_type_pattern = parser.check(&Token::LeftParen)
        && matches!(parser.peek_nth(1), Token::Identifier(_))
        && matches!(parser.peek_nth(2), Token::Colon);
    if is_type_pattern {
        parser.advance();
        let binding = parser.expect_identifier()?;
        parser.expect(Token::Colon)?;
        let ty = types::parse_type(parser)?;
        parser.expect(Token::RightParen)?;
        return Ok(CasePattern::Type { binding, ty });
    }

    let mut values = vec![parse_expression(parser)?];
    while parser.eat(&Token::Comma) {
        values.push(parse_expression(parser)?);
    }
    Ok(CasePattern::Values(values))
}

/// `import Math` or `import Math as M`
fn parse_import(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Import)?;
    let name = parser.expect_identifier()?;
    let alias = if matches!(parser.current(), Token::Identifier(word) if word == "as") {
        parser.advance();
        Some(parser.expect_identifier()?)
    } else {
        None
    };
    Ok(Statement::Import(ImportDecl {
        name,
        alias,
        span: parser.span_from(&start),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Vec<Statement> {
        Parser::new(src).unwrap().parse().unwrap().statements
    }

    #[test]
    fn test_variable_decls() {
        let stmts = parse("let x: Int = 1\nvar y\nconst z := 3\nw := 4");
        assert_eq!(stmts.len(), 4);
        match &stmts[1] {
            Statement::VariableDecl(decl) => {
                assert_eq!(decl.kind, BindingKind::Var);
                assert!(decl.initializer.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_const_requires_initializer() {
        assert!(Parser::new("const x").unwrap().parse().is_err());
    }

    #[test]
    fn test_assignment_forms() {
        let stmts = parse("x = 1\nobj.f += 2\narr[0] = 3");
        assert!(stmts.iter().all(|s| matches!(s, Statement::Assignment(_))));
        assert!(Parser::new("1 = 2").unwrap().parse().is_err());
    }

    #[test]
    fn test_if_elif_else() {
        let stmts = parse("if a:\n 1\nelif b:\n 2\nelse\n 3\nend");
        match &stmts[0] {
            Statement::If(s) => {
                assert_eq!(s.elif_branches.len(), 1);
                assert!(s.else_branch.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bare_return_before_newline() {
        let stmts = parse("def f():\n return\nend");
        match &stmts[0] {
            Statement::FunctionDecl(f) => match &f.body.statements[0] {
                Statement::Return(r) => assert!(r.value.is_none()),
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_for_where() {
        let stmts = parse("for x in xs where x > 1:\n println(x)\nend");
        match &stmts[0] {
            Statement::ForIn(f) => {
                assert_eq!(f.bindings, vec!["x".to_string()]);
                assert!(f.filter.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_loop_with_and_without_condition() {
        match &parse("loop\n x = x + 1\nend")[0] {
            Statement::Loop(l) => assert!(l.condition.is_none()),
            other => panic!("unexpected {:?}", other),
        }
        match &parse("loop i < 3:\n i = i + 1\nend")[0] {
            Statement::Loop(l) => assert!(l.condition.is_some()),
            other => panic!("unexpected {:?}", other),
        }
        match &parse("loop\n println(1)\n break\nend")[0] {
            Statement::Loop(l) => {
                assert!(l.condition.is_none());
                assert_eq!(l.body.statements.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_try_catch_forms() {
        let stmts = parse(
            "try\n f()\ncatch e: RuntimeError\n g()\ncatch (e: TypeError)\n h()\ncatch e:\n println(e)\nfinally\n k()\nend",
        );
        match &stmts[0] {
            Statement::Try(t) => {
                assert_eq!(t.catches.len(), 3);
                assert_eq!(t.catches[0].exception_type, Some(TypeExpr::named("RuntimeError")));
                assert_eq!(t.catches[1].exception_type, Some(TypeExpr::named("TypeError")));
                assert_eq!(t.catches[2].exception_type, None);
                assert_eq!(t.catches[2].body.statements.len(), 1);
                assert!(t.finally.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_select() {
        let stmts = parse(
            "select\n case let x = ch.recv():\n println(x)\n case closed ch:\n break\nend",
        );
        match &stmts[0] {
            Statement::Select(s) => {
                assert_eq!(s.cases.len(), 2);
                assert!(matches!(
                    &s.cases[0].kind,
                    SelectCaseKind::Recv { binding: Some(name), .. } if name == "x"
                ));
                assert!(matches!(s.cases[1].kind, SelectCaseKind::Closed { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_switch() {
        let stmts = parse("switch v\n case 1, 2:\n a()\n case (s: String):\n b()\n default:\n c()\nend");
        match &stmts[0] {
            Statement::Switch(s) => {
                assert_eq!(s.cases.len(), 2);
                assert!(matches!(&s.cases[0].pattern, CasePattern::Values(v) if v.len() == 2));
                assert!(matches!(s.cases[1].pattern, CasePattern::Type { .. }));
                assert!(s.default.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_import_alias() {
        match &parse("import Math as M")[0] {
            Statement::Import(i) => assert_eq!(i.alias.as_deref(), Some("M")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
