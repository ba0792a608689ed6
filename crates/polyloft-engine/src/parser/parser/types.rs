//! Type annotation parsing
//!
//! Grammar:
//! ```text
//! type       := atom ('|' atom)*
//! atom       := '?' (('extends' | 'super') type)?
//!             | Name ('<' type (',' type)* '>')?
//! type_params:= '<' param (',' param)* '>'
//! param      := ('in' | 'out')? Name ('extends' type)? '...'?
//! ```

use super::{ParseError, Parser};
use crate::parser::ast::*;
use crate::parser::token::Token;

/// Parse a type, including unions.
pub fn parse_type(parser: &mut Parser) -> Result<TypeExpr, ParseError> {
    let first = parse_type_atom(parser)?;
    if !parser.check(&Token::Pipe) {
        return Ok(first);
    }

    let mut members = vec![first];
    while parser.eat(&Token::Pipe) {
        members.push(parse_type_atom(parser)?);
    }
    Ok(TypeExpr::Union(members))
}

fn parse_type_atom(parser: &mut Parser) -> Result<TypeExpr, ParseError> {
    parser.enter()?;
    let result = parse_type_atom_inner(parser);
    parser.leave();
    result
}

fn parse_type_atom_inner(parser: &mut Parser) -> Result<TypeExpr, ParseError> {
    match parser.current().clone() {
        Token::Question => {
            parser.advance();
            if parser.eat(&Token::Extends) {
                Ok(TypeExpr::Wildcard(Wildcard::Extends(Box::new(parse_type(parser)?))))
            } else if parser.eat(&Token::Super) {
                Ok(TypeExpr::Wildcard(Wildcard::Super(Box::new(parse_type(parser)?))))
            } else {
                Ok(TypeExpr::Wildcard(Wildcard::Unbounded))
            }
        }
        Token::Identifier(name) => {
            parser.advance();
            let args = if parser.check(&Token::Less) {
                parse_type_args(parser)?
            } else {
                Vec::new()
            };
            Ok(TypeExpr::Named(NamedType { name, args }))
        }
        Token::Nil => {
            parser.advance();
            Ok(TypeExpr::named("Nil"))
        }
        _ => Err(parser.unexpected_token(&[Token::Identifier(String::new()), Token::Question])),
    }
}

/// Parse `<A, B>` type arguments; the current token must be `<`.
pub fn parse_type_args(parser: &mut Parser) -> Result<Vec<TypeExpr>, ParseError> {
    parser.expect(Token::Less)?;
    let mut args = Vec::new();
    if !parser.check(&Token::Greater) {
        loop {
            args.push(parse_type(parser)?);
            if !parser.eat(&Token::Comma) {
                break;
            }
        }
    }
    parser.expect(Token::Greater)?;
    Ok(args)
}

/// Try to parse type arguments followed directly by `(`, backtracking on failure.
///
/// Distinguishes `Box<Int>(1)` from the comparison `a < b`.
pub fn try_parse_call_type_args(parser: &mut Parser) -> Option<Vec<TypeExpr>> {
    let saved = parser.checkpoint();
    match parse_type_args(parser) {
        Ok(args) if parser.check(&Token::LeftParen) && parser.on_same_line() => Some(args),
        _ => {
            parser.restore(saved);
            None
        }
    }
}

/// Parse declared type parameters: `<out T extends Number, U...>`.
pub fn parse_type_params(parser: &mut Parser) -> Result<Vec<TypeParam>, ParseError> {
    parser.expect(Token::Less)?;
    let mut params = Vec::new();
    loop {
        let variance = if parser.eat(&Token::Out) {
            Variance::Out
        } else if parser.eat(&Token::In) {
            Variance::In
        } else {
            Variance::Invariant
        };
        let name = parser.expect_identifier()?;
        let bound = if parser.eat(&Token::Extends) {
            Some(parse_type(parser)?)
        } else {
            None
        };
        let variadic = parser.eat(&Token::DotDotDot);
        params.push(TypeParam {
            name,
            bound,
            variance,
            variadic,
        });
        if !parser.eat(&Token::Comma) {
            break;
        }
    }
    parser.expect(Token::Greater)?;
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(src: &str) -> TypeExpr {
        let mut parser = Parser::new(src).unwrap();
        parse_type(&mut parser).unwrap()
    }

    #[test]
    fn test_simple_and_generic() {
        assert_eq!(ty("Int"), TypeExpr::named("Int"));
        assert_eq!(
            ty("Map<String, List<Int>>"),
            TypeExpr::generic(
                "Map",
                vec![
                    TypeExpr::named("String"),
                    TypeExpr::generic("List", vec![TypeExpr::named("Int")])
                ]
            )
        );
    }

    #[test]
    fn test_union() {
        assert_eq!(
            ty("Int | String"),
            TypeExpr::Union(vec![TypeExpr::named("Int"), TypeExpr::named("String")])
        );
    }

    #[test]
    fn test_wildcards() {
        assert_eq!(ty("List<?>").to_string(), "List<?>");
        assert_eq!(ty("List<? super Int>").to_string(), "List<? super Int>");
    }

    #[test]
    fn test_type_params() {
        let mut parser = Parser::new("<out T extends Number, in U, V...>").unwrap();
        let params = parse_type_params(&mut parser).unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].variance, Variance::Out);
        assert_eq!(params[0].bound, Some(TypeExpr::named("Number")));
        assert_eq!(params[1].variance, Variance::In);
        assert!(params[2].variadic);
    }

    #[test]
    fn test_call_type_args_backtrack() {
        let mut parser = Parser::new("< b").unwrap();
        assert!(try_parse_call_type_args(&mut parser).is_none());
        assert_eq!(parser.current(), &Token::Less);
    }
}
