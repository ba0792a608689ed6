//! Type annotation AST nodes
//!
//! Polyloft types are only ever checked at runtime, so the tree is small:
//! - Named types with optional arguments (Box, List<Int>, Map<String, Int>)
//! - Union types (Int | String)
//! - Wildcards (?, ? extends Number, ? super Int), valid only in matching contexts
//! - Type parameters with bounds, variance and variadic markers

use std::fmt;

/// A type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `Name` or `Name<A, B>`
    Named(NamedType),

    /// `A | B | C`
    Union(Vec<TypeExpr>),

    /// `?`, `? extends X`, `? super X`
    Wildcard(Wildcard),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedType {
    pub name: String,
    pub args: Vec<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Wildcard {
    Unbounded,
    Extends(Box<TypeExpr>),
    Super(Box<TypeExpr>),
}

/// Declared variance of a type parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variance {
    #[default]
    Invariant,
    /// `in T`: consumer only
    In,
    /// `out T`: producer only
    Out,
}

/// Type parameter: `T`, `T extends Number`, `out T`, `T...`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub name: String,
    pub bound: Option<TypeExpr>,
    pub variance: Variance,
    pub variadic: bool,
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(NamedType {
            name: name.into(),
            args: Vec::new(),
        })
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Named(NamedType {
            name: name.into(),
            args,
        })
    }

    /// The head name of a named type (`List` for `List<Int>`).
    pub fn head_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Named(named) => Some(&named.name),
            _ => None,
        }
    }

    /// Whether `param` occurs anywhere inside this type.
    pub fn mentions(&self, param: &str) -> bool {
        match self {
            TypeExpr::Named(named) => {
                named.name == param || named.args.iter().any(|arg| arg.mentions(param))
            }
            TypeExpr::Union(members) => members.iter().any(|m| m.mentions(param)),
            TypeExpr::Wildcard(Wildcard::Unbounded) => false,
            TypeExpr::Wildcard(Wildcard::Extends(ty)) | TypeExpr::Wildcard(Wildcard::Super(ty)) => {
                ty.mentions(param)
            }
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(named) => {
                write!(f, "{}", named.name)?;
                if !named.args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in named.args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeExpr::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
            TypeExpr::Wildcard(Wildcard::Unbounded) => write!(f, "?"),
            TypeExpr::Wildcard(Wildcard::Extends(ty)) => write!(f, "? extends {}", ty),
            TypeExpr::Wildcard(Wildcard::Super(ty)) => write!(f, "? super {}", ty),
        }
    }
}

impl fmt::Display for Variance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variance::Invariant => Ok(()),
            Variance::In => write!(f, "in "),
            Variance::Out => write!(f, "out "),
        }
    }
}
