//! Array method handlers
//!
//! The array lock is never held while a user callback runs: callbacks
//! see a snapshot and may freely mutate the array they iterate.

use crate::vm::builtins::{arg, element_args, expect_args, expect_args_between, int_arg};
use crate::vm::interpreter::{compare, index_of, EvalResult, Interpreter};
use crate::vm::types::generics::type_name;
use crate::vm::value::Value;
use crate::vm::VmError;
use parking_lot::RwLock;
use std::cmp::Ordering;

pub const METHODS: &[&str] = &[
    "length", "size", "isEmpty", "get", "set", "push", "add", "pop", "shift", "unshift", "insert",
    "removeAt", "clear", "contains", "indexOf", "join", "slice", "concat", "reverse", "sort", "map",
    "filter", "reduce", "forEach", "find", "findIndex", "some", "every", "toString",
];

/// Call an array method
pub fn call(
    interp: &Interpreter,
    items: &RwLock<Vec<Value>>,
    name: &str,
    args: Vec<Value>,
) -> EvalResult<Value> {
    let value = match name {
        "length" | "size" => Value::Int(items.read().len() as i64),
        "isEmpty" => Value::Bool(items.read().is_empty()),
        "get" => {
            expect_args(&args, 1)?;
            let items = items.read();
            items[index_of(&args[0], items.len())?].clone()
        }
        "set" => {
            expect_args(&args, 2)?;
            let mut items = items.write();
            let index = index_of(&args[0], items.len())?;
            items[index] = args[1].clone();
            Value::Nil
        }
        "push" | "add" => {
            items.write().extend(args);
            Value::Nil
        }
        "pop" => items.write().pop().unwrap_or(Value::Nil),
        "shift" => {
            let mut items = items.write();
            if items.is_empty() {
                Value::Nil
            } else {
                items.remove(0)
            }
        }
        "unshift" => {
            let mut items = items.write();
            for (offset, value) in args.into_iter().enumerate() {
                items.insert(offset, value);
            }
            Value::Nil
        }
        "insert" => {
            expect_args(&args, 2)?;
            let mut items = items.write();
            let index = int_arg(&args, 0, "insert")?;
            if index < 0 || index as usize > items.len() {
                return Err(VmError::Index { index, len: items.len() }.into());
            }
            items.insert(index as usize, args[1].clone());
            Value::Nil
        }
        "removeAt" => {
            expect_args(&args, 1)?;
            let mut items = items.write();
            let index = index_of(&args[0], items.len())?;
            items.remove(index)
        }
        "clear" => {
            items.write().clear();
            Value::Nil
        }
        "contains" => {
            let needle = arg(&args, 0);
            Value::Bool(items.read().iter().any(|item| item.equals(&needle)))
        }
        "indexOf" => {
            let needle = arg(&args, 0);
            let position = items.read().iter().position(|item| item.equals(&needle));
            Value::Int(position.map_or(-1, |i| i as i64))
        }
        "join" => {
            let sep = match args.first() {
                Some(Value::Str(s)) => s.to_string(),
                Some(other) => interp.stringify(other)?,
                None => ",".to_string(),
            };
            let snapshot = items.read().clone();
            let parts = snapshot
                .iter()
                .map(|item| interp.stringify(item))
                .collect::<EvalResult<Vec<_>>>()?;
            Value::from(parts.join(&sep))
        }
        "slice" => {
            expect_args_between(&args, 1, 2)?;
            let items = items.read();
            let len = items.len() as i64;
            let start = resolve_bound(int_arg(&args, 0, "slice")?, len);
            let end = match args.get(1) {
                Some(_) => resolve_bound(int_arg(&args, 1, "slice")?, len),
                None => len,
            };
            let slice = if start < end {
                items[start as usize..end as usize].to_vec()
            } else {
                Vec::new()
            };
            Value::array(slice)
        }
        "concat" => {
            let mut out = items.read().clone();
            for other in &args {
                match other {
                    Value::Array(more) => out.extend(more.read().iter().cloned()),
                    value => out.push(value.clone()),
                }
            }
            Value::array(out)
        }
        "reverse" => {
            let mut out = items.read().clone();
            out.reverse();
            Value::array(out)
        }
        "sort" => {
            let snapshot = items.read().clone();
            let sorted = sort_values(interp, snapshot, args.first())?;
            *items.write() = sorted;
            Value::Nil
        }
        "map" => {
            let callback = callback_arg(&args, "map")?;
            let snapshot = items.read().clone();
            let mut out = Vec::with_capacity(snapshot.len());
            for (i, item) in snapshot.into_iter().enumerate() {
                out.push(interp.call_callback(callback, element_args(callback, item, i))?);
            }
            Value::array(out)
        }
        "filter" => {
            let callback = callback_arg(&args, "filter")?;
            let snapshot = items.read().clone();
            let mut out = Vec::new();
            for (i, item) in snapshot.into_iter().enumerate() {
                if interp
                    .call_callback(callback, element_args(callback, item.clone(), i))?
                    .is_truthy()
                {
                    out.push(item);
                }
            }
            Value::array(out)
        }
        "reduce" => {
            expect_args_between(&args, 1, 2)?;
            let callback = callback_arg(&args, "reduce")?;
            let snapshot = items.read().clone();
            let mut iter = snapshot.into_iter();
            let mut acc = match args.get(1) {
                Some(initial) => initial.clone(),
                None => iter.next().unwrap_or(Value::Nil),
            };
            for item in iter {
                acc = interp.call_callback(callback, vec![acc, item])?;
            }
            acc
        }
        "forEach" => {
            let callback = callback_arg(&args, "forEach")?;
            let snapshot = items.read().clone();
            for (i, item) in snapshot.into_iter().enumerate() {
                interp.call_callback(callback, element_args(callback, item, i))?;
            }
            Value::Nil
        }
        "find" | "findIndex" | "some" | "every" => {
            let callback = callback_arg(&args, name)?;
            let snapshot = items.read().clone();
            let mut hit = None;
            for (i, item) in snapshot.into_iter().enumerate() {
                if interp
                    .call_callback(callback, element_args(callback, item.clone(), i))?
                    .is_truthy()
                    != (name == "every")
                {
                    hit = Some((i, item));
                    break;
                }
            }
            match name {
                "find" => hit.map_or(Value::Nil, |(_, item)| item),
                "findIndex" => Value::Int(hit.map_or(-1, |(i, _)| i as i64)),
                "some" => Value::Bool(hit.is_some()),
                _ => Value::Bool(hit.is_none()),
            }
        }
        "toString" => {
            let snapshot = Value::array(items.read().clone());
            Value::from(interp.stringify(&snapshot)?)
        }
        _ => return Err(VmError::attribute("Array", name).into()),
    };
    Ok(value)
}

/// Negative indices count from the end; the result is clamped to `0..=len`.
fn resolve_bound(index: i64, len: i64) -> i64 {
    if index < 0 {
        (len + index).max(0)
    } else {
        index.min(len)
    }
}

pub(crate) fn callback_arg<'a>(args: &'a [Value], method: &str) -> Result<&'a Value, VmError> {
    match args.first() {
        Some(callee) if callee.is_callable() => Ok(callee),
        Some(other) => Err(VmError::type_mismatch(
            format!("Function for {}", method),
            type_name(other),
        )),
        None => Err(VmError::arity(1, 0)),
    }
}

/// Stable merge sort with an optional user comparator returning a
/// negative, zero or positive number.
pub(crate) fn sort_values(
    interp: &Interpreter,
    mut items: Vec<Value>,
    comparator: Option<&Value>,
) -> EvalResult<Vec<Value>> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = sort_values(interp, items, comparator)?;
    let right = sort_values(interp, right, comparator)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
        let order = match comparator {
            Some(callee) => ordering_of(&interp.call_callback(callee, vec![a.clone(), b.clone()])?)?,
            None => compare(a, b)?.unwrap_or(Ordering::Equal),
        };
        let next = if order == Ordering::Greater {
            right.next()
        } else {
            left.next()
        };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

fn ordering_of(result: &Value) -> Result<Ordering, VmError> {
    match result {
        Value::Int(i) => Ok(i.cmp(&0)),
        Value::Float(f) => Ok(f.partial_cmp(&0.0).unwrap_or(Ordering::Equal)),
        other => Err(VmError::type_mismatch("Int from comparator", type_name(other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_bound_handles_negative_indices() {
        assert_eq!(resolve_bound(-1, 5), 4);
        assert_eq!(resolve_bound(-9, 5), 0);
        assert_eq!(resolve_bound(7, 5), 5);
    }

    #[test]
    fn test_ordering_of_comparator_results() {
        assert_eq!(ordering_of(&Value::Int(-3)).ok(), Some(Ordering::Less));
        assert_eq!(ordering_of(&Value::Float(0.5)).ok(), Some(Ordering::Greater));
        assert!(ordering_of(&Value::str("x")).is_err());
    }
}
