//! Overload resolution for methods, constructors and functions
//!
//! Resolution is purely by argument count: an exact arity match wins, then
//! a variadic signature whose fixed prefix fits.

use crate::parser::ast::Param;
use crate::vm::value::Value;
use crate::vm::VmError;
use std::sync::Arc;

/// Anything with a parameter list.
pub trait Signature {
    fn params(&self) -> &[Param];

    fn is_variadic(&self) -> bool {
        self.params().last().is_some_and(|p| p.variadic)
    }

    /// Number of parameters before the variadic tail.
    fn fixed_arity(&self) -> usize {
        let count = self.params().len();
        if self.is_variadic() {
            count - 1
        } else {
            count
        }
    }

    fn accepts(&self, argc: usize) -> bool {
        if self.is_variadic() {
            argc >= self.fixed_arity()
        } else {
            argc == self.params().len()
        }
    }
}

/// Pick the overload for `argc` arguments.
pub fn select_overload<S: Signature>(candidates: &[Arc<S>], argc: usize) -> Option<Arc<S>> {
    candidates
        .iter()
        .find(|c| !c.is_variadic() && c.params().len() == argc)
        .or_else(|| {
            candidates
                .iter()
                .find(|c| c.is_variadic() && argc >= c.fixed_arity())
        })
        .cloned()
}

/// Describe the accepted argument counts of a candidate set.
pub fn expected_arity<S: Signature>(candidates: &[Arc<S>]) -> String {
    let mut parts: Vec<String> = candidates
        .iter()
        .map(|c| {
            if c.is_variadic() {
                format!("at least {}", c.fixed_arity())
            } else {
                c.params().len().to_string()
            }
        })
        .collect();
    parts.dedup();
    parts.join(" or ")
}

/// Arity failure for a candidate set.
pub fn arity_error<S: Signature>(candidates: &[Arc<S>], argc: usize) -> VmError {
    VmError::Arity {
        expected: expected_arity(candidates),
        got: argc,
    }
}

/// Collect the variadic tail into a single Array argument.
pub fn pack_arguments(params: &[Param], mut args: Vec<Value>) -> Vec<Value> {
    match params.last() {
        Some(last) if last.variadic => {
            let fixed = params.len() - 1;
            let rest = if args.len() > fixed {
                args.split_off(fixed)
            } else {
                Vec::new()
            };
            args.push(Value::array(rest));
            args
        }
        _ => args,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::token::Span;

    struct Sig(Vec<Param>);

    impl Signature for Sig {
        fn params(&self) -> &[Param] {
            &self.0
        }
    }

    fn param(name: &str, variadic: bool) -> Param {
        Param {
            name: name.to_string(),
            type_annotation: None,
            variadic,
            span: Span::default(),
        }
    }

    fn sig(names: &[&str], variadic: bool) -> Arc<Sig> {
        let mut params: Vec<Param> = names.iter().map(|n| param(n, false)).collect();
        if variadic {
            params.push(param("rest", true));
        }
        Arc::new(Sig(params))
    }

    #[test]
    fn test_exact_arity_wins_over_variadic() {
        let candidates = vec![sig(&["a"], true), sig(&["a", "b"], false)];
        let chosen = select_overload(&candidates, 2).unwrap();
        assert!(!chosen.is_variadic());
    }

    #[test]
    fn test_variadic_accepts_fixed_prefix() {
        let candidates = vec![sig(&["a"], true)];
        assert!(select_overload(&candidates, 1).is_some());
        assert!(select_overload(&candidates, 4).is_some());
        assert!(select_overload(&candidates, 0).is_none());
    }

    #[test]
    fn test_arity_error_message() {
        let candidates = vec![sig(&["a"], false), sig(&["a", "b"], false)];
        let err = arity_error(&candidates, 3);
        assert_eq!(err.to_string(), "Arity mismatch: expected 1 or 2, got 3");
    }

    #[test]
    fn test_pack_arguments_collects_tail() {
        let params = vec![param("first", false), param("rest", true)];
        let packed = pack_arguments(&params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(packed.len(), 2);
        assert_eq!(packed[1].to_string(), "[2, 3]");

        let packed = pack_arguments(&params, vec![Value::Int(1)]);
        assert_eq!(packed[1].to_string(), "[]");
    }
}
