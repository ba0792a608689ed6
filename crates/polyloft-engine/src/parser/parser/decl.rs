//! Declaration parsing: functions, classes, interfaces, enums and records.

use super::expr::parse_expression;
use super::stmt::{parse_block, parse_params};
use super::{types, ParseError, Parser};
use crate::parser::ast::*;
use crate::parser::token::{Span, Token};
use std::sync::Arc;

/// How a method signature's body is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyMode {
    /// A body closed by `end` (or `= expr`) is required
    Required,
    /// No body at all (abstract methods)
    Absent,
    /// Body present only when the signature is followed by `:` (interfaces)
    IfColon,
}

/// `def name<T>(params) -> Type: ... end` or `def name(params) = expr`
pub fn parse_function_decl(parser: &mut Parser) -> Result<FunctionDecl, ParseError> {
    let (function, _) = parse_def(parser, BodyMode::Required)?;
    Ok(function)
}

fn parse_def(parser: &mut Parser, mode: BodyMode) -> Result<(FunctionDecl, bool), ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Def)?;
    let name = parser.expect_identifier()?;
    let type_params = if parser.check(&Token::Less) {
        types::parse_type_params(parser)?
    } else {
        Vec::new()
    };
    let params = parse_params(parser)?;
    let return_type = if parser.eat(&Token::Arrow) {
        Some(types::parse_type(parser)?)
    } else {
        None
    };

    let has_body = match mode {
        BodyMode::Required => true,
        BodyMode::Absent => false,
        BodyMode::IfColon => parser.check(&Token::Colon) || parser.check(&Token::Equal),
    };

    let body = if !has_body {
        Block::default()
    } else if parser.eat(&Token::Equal) {
        let value = parse_expression(parser)?;
        let span = *value.span();
        Block {
            statements: vec![Statement::Return(ReturnStatement {
                value: Some(value),
                span,
            })],
            span,
        }
    } else {
        parser.eat(&Token::Colon);
        let block = parse_block(parser, &[Token::End])?;
        parser.expect_end("def", start)?;
        block
    };

    Ok((
        FunctionDecl {
            name,
            type_params,
            params,
            return_type,
            body: Arc::new(body),
            span: parser.span_from(&start),
        },
        has_body,
    ))
}

/// `sealed class ...`, `sealed interface ...`, `sealed enum ...`
pub fn parse_sealed_decl(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Sealed)?;
    match parser.current() {
        Token::Class | Token::Abstract => class_decl(parser, start, true),
        Token::Interface => interface_decl(parser, start, true),
        Token::Enum => enum_decl(parser, start, true),
        _ => Err(parser.unexpected_token(&[Token::Class, Token::Interface, Token::Enum])),
    }
}

pub fn parse_class_decl(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    class_decl(parser, start, false)
}

pub fn parse_interface_decl(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    interface_decl(parser, start, false)
}

pub fn parse_enum_decl(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    enum_decl(parser, start, false)
}

/// `(A, B)` permits list after a sealed type's name.
fn parse_permits(parser: &mut Parser) -> Result<Vec<String>, ParseError> {
    let mut permits = Vec::new();
    if parser.eat(&Token::LeftParen) {
        while !parser.check(&Token::RightParen) {
            permits.push(parser.expect_identifier()?);
            if !parser.eat(&Token::Comma) {
                break;
            }
        }
        parser.expect(Token::RightParen)?;
    }
    Ok(permits)
}

fn parse_type_list(parser: &mut Parser) -> Result<Vec<TypeExpr>, ParseError> {
    let mut list = vec![types::parse_type(parser)?];
    while parser.eat(&Token::Comma) {
        list.push(types::parse_type(parser)?);
    }
    Ok(list)
}

/// Type parameters after a class name; backtracks when `<` introduces a parent.
fn parse_optional_type_params(parser: &mut Parser) -> Vec<TypeParam> {
    if !parser.check(&Token::Less) {
        return Vec::new();
    }
    let saved = parser.checkpoint();
    match types::parse_type_params(parser) {
        Ok(params) => params,
        Err(_) => {
            parser.restore(saved);
            Vec::new()
        }
    }
}

/// ```text
/// [abstract] class Name<T>(Permits) < Parent implements A, B:
///     var field: T = init
///     Name(params): ... end
///     def method(): ... end
/// end
/// ```
fn class_decl(parser: &mut Parser, start: Span, is_sealed: bool) -> Result<Statement, ParseError> {
    let is_abstract = parser.eat(&Token::Abstract);
    parser.expect(Token::Class)?;
    let name = parser.expect_identifier()?;
    let type_params = parse_optional_type_params(parser);
    let permits = parse_permits(parser)?;

    let parent = if parser.eat(&Token::Less) || parser.eat(&Token::Extends) {
        Some(types::parse_type(parser)?)
    } else {
        None
    };
    let interfaces = if parser.eat(&Token::Implements) {
        parse_type_list(parser)?
    } else {
        Vec::new()
    };
    parser.eat(&Token::Colon);

    let members = parse_members(parser, &name, MemberContext::Class)?;
    parser.expect_end("class", start)?;

    Ok(Statement::ClassDecl(ClassDecl {
        name,
        type_params,
        parent,
        interfaces,
        is_sealed,
        is_abstract,
        permits,
        fields: members.fields,
        methods: members.methods,
        constructors: members.constructors,
        span: parser.span_from(&start),
    }))
}

fn interface_decl(parser: &mut Parser, start: Span, is_sealed: bool) -> Result<Statement, ParseError> {
    parser.expect(Token::Interface)?;
    let name = parser.expect_identifier()?;
    let type_params = parse_optional_type_params(parser);
    let permits = parse_permits(parser)?;
    let parents = if parser.eat(&Token::Extends) {
        parse_type_list(parser)?
    } else {
        Vec::new()
    };
    parser.eat(&Token::Colon);

    let members = parse_members(parser, &name, MemberContext::Interface)?;
    parser.expect_end("interface", start)?;

    Ok(Statement::InterfaceDecl(InterfaceDecl {
        name,
        type_params,
        parents,
        is_sealed,
        permits,
        methods: members.methods,
        static_fields: members.fields,
        span: parser.span_from(&start),
    }))
}

/// ```text
/// enum Color implements Named
///     RED("r"), GREEN("g")
///     var code: String
///     Color(code: String): this.code = code end
/// end
/// ```
fn enum_decl(parser: &mut Parser, start: Span, is_sealed: bool) -> Result<Statement, ParseError> {
    parser.expect(Token::Enum)?;
    let name = parser.expect_identifier()?;
    let permits = parse_permits(parser)?;
    let interfaces = if parser.eat(&Token::Implements) {
        parse_type_list(parser)?
    } else {
        Vec::new()
    };
    parser.eat(&Token::Colon);

    let mut values = Vec::new();
    loop {
        let value_name = match parser.current() {
            Token::Identifier(value_name) => value_name.clone(),
            _ => break,
        };
        // `Color(` starts the constructor, not a value
        if value_name == name && matches!(parser.peek(), Some(Token::LeftParen)) {
            break;
        }
        let span = parser.current_span();
        parser.advance();
        let arguments = if parser.check(&Token::LeftParen) && parser.on_same_line() {
            super::expr::parse_arguments(parser)?
        } else {
            Vec::new()
        };
        values.push(EnumValueDecl {
            name: value_name,
            arguments,
            span: parser.span_from(&span),
        });
        parser.eat(&Token::Comma);
        parser.eat(&Token::Semicolon);
    }

    let members = parse_members(parser, &name, MemberContext::Class)?;
    parser.expect_end("enum", start)?;

    Ok(Statement::EnumDecl(EnumDecl {
        name,
        is_sealed,
        permits,
        interfaces,
        values,
        fields: members.fields,
        methods: members.methods,
        constructors: members.constructors,
        span: parser.span_from(&start),
    }))
}

/// `record Point(x: Int, y: Int) [implements I]: def methods end`
pub fn parse_record_decl(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Record)?;
    let name = parser.expect_identifier()?;
    let type_params = parse_optional_type_params(parser);
    let components = parse_params(parser)?;
    if let Some(variadic) = components.iter().find(|c| c.variadic) {
        return Err(ParseError::invalid_syntax(
            "record components cannot be variadic",
            variadic.span,
        ));
    }
    let interfaces = if parser.eat(&Token::Implements) {
        parse_type_list(parser)?
    } else {
        Vec::new()
    };
    parser.eat(&Token::Colon);

    let members = parse_members(parser, &name, MemberContext::Record)?;
    parser.expect_end("record", start)?;

    Ok(Statement::RecordDecl(RecordDecl {
        name,
        type_params,
        components,
        interfaces,
        methods: members.methods,
        span: parser.span_from(&start),
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberContext {
    Class,
    Interface,
    Record,
}

#[derive(Default)]
struct Members {
    fields: Vec<FieldDecl>,
    methods: Vec<MethodDecl>,
    constructors: Vec<ConstructorDecl>,
}

fn parse_members(
    parser: &mut Parser,
    owner: &str,
    context: MemberContext,
) -> Result<Members, ParseError> {
    let mut members = Members::default();

    while !parser.check(&Token::End) && !parser.at_eof() {
        if parser.eat(&Token::Semicolon) {
            continue;
        }
        let member_start = parser.current_span();
        let modifiers = parse_modifiers(parser);

        match parser.current().clone() {
            Token::Var | Token::Let | Token::Const | Token::Final => {
                if context == MemberContext::Record {
                    return Err(ParseError::invalid_syntax(
                        "records cannot declare fields; use components",
                        member_start,
                    ));
                }
                let mut field = parse_field(parser, modifiers, member_start)?;
                if context == MemberContext::Interface {
                    // Interface fields are always static
                    field.modifiers.is_static = true;
                }
                members.fields.push(field);
            }
            Token::Def => {
                let mode = match context {
                    MemberContext::Interface => BodyMode::IfColon,
                    _ if modifiers.is_abstract => BodyMode::Absent,
                    _ => BodyMode::Required,
                };
                let (function, has_body) = parse_def(parser, mode)?;
                members.methods.push(MethodDecl {
                    function,
                    modifiers,
                    has_body,
                });
            }
            Token::Identifier(name)
                if name == owner
                    && matches!(parser.peek(), Some(Token::LeftParen))
                    && context == MemberContext::Class =>
            {
                parser.advance();
                let params = parse_params(parser)?;
                parser.eat(&Token::Colon);
                let body = parse_block(parser, &[Token::End])?;
                parser.expect_end("constructor", member_start)?;
                members.constructors.push(ConstructorDecl {
                    params,
                    body: Arc::new(body),
                    span: parser.span_from(&member_start),
                });
            }
            _ => {
                return Err(parser
                    .unexpected_token(&[Token::Var, Token::Def, Token::End])
                    .with_suggestion(format!("Expected a member declaration in '{}'", owner)))
            }
        }
    }

    Ok(members)
}

fn parse_modifiers(parser: &mut Parser) -> Modifiers {
    let mut modifiers = Modifiers::default();
    loop {
        match parser.current() {
            Token::Public => modifiers.visibility = Visibility::Public,
            Token::Private => modifiers.visibility = Visibility::Private,
            Token::Protected => modifiers.visibility = Visibility::Protected,
            Token::Static => modifiers.is_static = true,
            Token::Abstract => modifiers.is_abstract = true,
            _ => break,
        }
        parser.advance();
    }
    modifiers
}

fn parse_field(
    parser: &mut Parser,
    modifiers: Modifiers,
    start: Span,
) -> Result<FieldDecl, ParseError> {
    let kind = match parser.advance() {
        Token::Var => BindingKind::Var,
        Token::Const => BindingKind::Const,
        Token::Final => BindingKind::Final,
        _ => BindingKind::Let,
    };
    let name = parser.expect_identifier()?;
    let type_annotation = if parser.eat(&Token::Colon) {
        Some(types::parse_type(parser)?)
    } else {
        None
    };
    let initializer = if parser.eat(&Token::Equal) || parser.eat(&Token::ColonEqual) {
        Some(parse_expression(parser)?)
    } else {
        None
    };
    Ok(FieldDecl {
        name,
        kind,
        modifiers,
        type_annotation,
        initializer,
        span: parser.span_from(&start),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(src: &str) -> Statement {
        let mut program = Parser::new(src).unwrap().parse().unwrap();
        assert_eq!(program.statements.len(), 1);
        program.statements.remove(0)
    }

    #[test]
    fn test_function_forms() {
        match parse_one("def add<T>(a: T, rest: Int...) -> T:\n return a\nend") {
            Statement::FunctionDecl(f) => {
                assert_eq!(f.type_params.len(), 1);
                assert!(f.params[1].variadic);
                assert_eq!(f.return_type, Some(TypeExpr::named("T")));
            }
            other => panic!("unexpected {:?}", other),
        }
        match parse_one("def double(x) = x * 2") {
            Statement::FunctionDecl(f) => {
                assert!(matches!(f.body.statements[0], Statement::Return(_)))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_class_with_members() {
        let src = "class Box<T extends Number> < Base implements Show, Eq:\n\
                   private var value: T\n\
                   static var count: Int = 0\n\
                   Box(v: T):\n this.value = v\n end\n\
                   def get() -> T:\n return this.value\n end\n\
                   end";
        match parse_one(src) {
            Statement::ClassDecl(c) => {
                assert_eq!(c.name, "Box");
                assert_eq!(c.type_params[0].bound, Some(TypeExpr::named("Number")));
                assert_eq!(c.parent, Some(TypeExpr::named("Base")));
                assert_eq!(c.interfaces.len(), 2);
                assert_eq!(c.fields.len(), 2);
                assert_eq!(c.fields[0].modifiers.visibility, Visibility::Private);
                assert!(c.fields[1].modifiers.is_static);
                assert_eq!(c.constructors.len(), 1);
                assert_eq!(c.methods.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parent_without_type_params() {
        match parse_one("class Dog < Animal\nend") {
            Statement::ClassDecl(c) => {
                assert!(c.type_params.is_empty());
                assert_eq!(c.parent, Some(TypeExpr::named("Animal")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sealed_with_permits() {
        match parse_one("sealed class Shape(Circle, Square)\nend") {
            Statement::ClassDecl(c) => {
                assert!(c.is_sealed);
                assert_eq!(c.permits, vec!["Circle".to_string(), "Square".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_abstract_method_has_no_body() {
        match parse_one("abstract class Shape\n abstract def area() -> Float\n def name() = \"shape\"\nend") {
            Statement::ClassDecl(c) => {
                assert!(c.is_abstract);
                assert!(!c.methods[0].has_body);
                assert!(c.methods[1].has_body);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_interface_default_and_static() {
        let src = "sealed interface Lockable(SafeBox)\n\
                   def lock() -> Bool\n\
                   def describe():\n return \"lockable\"\n end\n\
                   static var MAX: Int = 3\n\
                   end";
        match parse_one(src) {
            Statement::InterfaceDecl(i) => {
                assert!(i.is_sealed);
                assert_eq!(i.permits, vec!["SafeBox".to_string()]);
                assert!(!i.methods[0].has_body);
                assert!(i.methods[1].has_body);
                assert!(i.static_fields[0].modifiers.is_static);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_enum_with_constructor() {
        let src = "enum Planet\n MERCURY(1), VENUS(2)\n var order: Int\n Planet(o: Int):\n this.order = o\n end\nend";
        match parse_one(src) {
            Statement::EnumDecl(e) => {
                assert_eq!(e.values.len(), 2);
                assert_eq!(e.values[1].arguments.len(), 1);
                assert_eq!(e.constructors.len(), 1);
                assert_eq!(e.fields.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_record() {
        match parse_one("record Point(x: Int, y: Int)\n def sum() = x + y\nend") {
            Statement::RecordDecl(r) => {
                assert_eq!(r.components.len(), 2);
                assert_eq!(r.methods.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
