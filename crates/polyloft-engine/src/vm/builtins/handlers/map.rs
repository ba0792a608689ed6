//! Map literal method handlers
//!
//! [`query`] holds the read-only methods shared with the `Map<K, V>`
//! collection.

use crate::vm::builtins::handlers::array::callback_arg;
use crate::vm::builtins::{arg, expect_args, expect_args_between};
use crate::vm::interpreter::{EvalResult, Interpreter};
use crate::vm::value::{Value, ValueMap};
use crate::vm::{VmError, VmResult};
use parking_lot::RwLock;
use std::sync::Arc;

pub const METHODS: &[&str] = &[
    "get", "set", "put", "has", "hasKey", "containsKey", "remove", "delete", "clear", "keys",
    "values", "entries", "size", "length", "isEmpty", "forEach", "toString",
];

/// Call a method on a `{k: v}` map
pub fn call(
    interp: &Interpreter,
    map: &Arc<RwLock<ValueMap>>,
    name: &str,
    args: Vec<Value>,
) -> EvalResult<Value> {
    let value = match name {
        "set" | "put" => {
            expect_args(&args, 2)?;
            let mut args = args.into_iter();
            let (key, value) = (args.next().unwrap_or(Value::Nil), args.next().unwrap_or(Value::Nil));
            map.write().insert(key, value);
            Value::Nil
        }
        "remove" | "delete" => {
            expect_args(&args, 1)?;
            map.write().remove(&args[0]).unwrap_or(Value::Nil)
        }
        "clear" => {
            *map.write() = ValueMap::new();
            Value::Nil
        }
        "forEach" => {
            let entries = entry_pairs(&map.read());
            for_each_entry(interp, &args, entries)?;
            Value::Nil
        }
        "toString" => Value::from(interp.stringify(&Value::Map(Arc::clone(map)))?),
        _ => match query(&map.read(), name, &args) {
            Some(result) => result?,
            None => return Err(VmError::attribute("Map", name).into()),
        },
    };
    Ok(value)
}

/// Read-only map methods; `None` when `name` is not one of them.
pub(crate) fn query(map: &ValueMap, name: &str, args: &[Value]) -> Option<VmResult<Value>> {
    let result = match name {
        "get" => expect_args_between(args, 1, 2)
            .map(|_| map.get(&args[0]).cloned().unwrap_or_else(|| arg(args, 1))),
        "has" | "hasKey" | "containsKey" => {
            expect_args(args, 1).map(|_| Value::Bool(map.contains_key(&args[0])))
        }
        "keys" => Ok(Value::array(map.keys())),
        "values" => Ok(Value::array(map.values())),
        "entries" => Ok(Value::array(
            entry_pairs(map)
                .into_iter()
                .map(|(k, v)| Value::array(vec![k, v]))
                .collect(),
        )),
        "size" | "length" => Ok(Value::Int(map.len() as i64)),
        "isEmpty" => Ok(Value::Bool(map.is_empty())),
        _ => return None,
    };
    Some(result)
}

pub(crate) fn entry_pairs(map: &ValueMap) -> Vec<(Value, Value)> {
    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

/// Call `args[0]` with `(key, value)` for every entry.
pub(crate) fn for_each_entry(
    interp: &Interpreter,
    args: &[Value],
    entries: Vec<(Value, Value)>,
) -> EvalResult<()> {
    let callback = callback_arg(args, "forEach")?;
    for (key, value) in entries {
        interp.call_callback(callback, vec![key, value])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ValueMap {
        [(Value::str("a"), Value::Int(1)), (Value::str("b"), Value::Int(2))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_get_with_default() {
        let map = sample();
        let hit = query(&map, "get", &[Value::str("a")]).and_then(Result::ok);
        assert_eq!(hit.and_then(|v| v.as_int()), Some(1));
        let miss = query(&map, "get", &[Value::str("z"), Value::Int(0)]).and_then(Result::ok);
        assert_eq!(miss.and_then(|v| v.as_int()), Some(0));
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let entries = query(&sample(), "entries", &[]).and_then(Result::ok);
        assert_eq!(entries.map(|v| v.to_string()).as_deref(), Some("[[a, 1], [b, 2]]"));
        assert!(query(&sample(), "push", &[]).is_none());
    }
}
