//! `List<T>`, `Set<T>`, `Deque<T>` and `Map<K, V>`
//!
//! Explicit type arguments (`List<Int>()`) are enforced on every insert.
//! Collections built without them accept anything and report element
//! types by inference.

use crate::vm::builtins::handlers::array::{callback_arg, sort_values};
use crate::vm::builtins::handlers::map;
use crate::vm::builtins::{arg, check_collection_element, element_args, expect_args, expect_args_between};
use crate::vm::interpreter::{index_of, EvalResult, Interpreter};
use crate::vm::object::{Collection, CollectionData, CollectionKind};
use crate::vm::types::generics::type_name;
use crate::vm::value::{NativeCall, Value, ValueMap};
use crate::vm::{VmError, VmResult};
use std::collections::VecDeque;
use std::sync::Arc;

const LIST_METHODS: &[&str] = &[
    "add", "push", "get", "set", "insert", "remove", "removeAt", "contains", "indexOf", "size",
    "length", "isEmpty", "clear", "toArray", "asArray", "forEach", "map", "filter", "sort",
    "toString",
];
const SET_METHODS: &[&str] = &[
    "add", "remove", "contains", "size", "length", "isEmpty", "clear", "toArray", "asArray",
    "forEach", "toString",
];
const DEQUE_METHODS: &[&str] = &[
    "addFirst", "addLast", "push", "removeFirst", "removeLast", "peekFirst", "peekLast", "get",
    "contains", "size", "length", "isEmpty", "clear", "toArray", "forEach", "toString",
];

pub fn methods(kind: CollectionKind) -> &'static [&'static str] {
    match kind {
        CollectionKind::List => LIST_METHODS,
        CollectionKind::Set => SET_METHODS,
        CollectionKind::Deque => DEQUE_METHODS,
        CollectionKind::Map => map::METHODS,
    }
}

/// `List<Int>(1, 2)`, `Set([1, 2])`, `Map<String, Int>({"a": 1})`, `Deque()`.
pub fn construct(interp: &Interpreter, kind: CollectionKind, call: NativeCall) -> EvalResult<Value> {
    let expected_args = if kind == CollectionKind::Map { 2 } else { 1 };
    if !call.type_args.is_empty() && call.type_args.len() != expected_args {
        return Err(VmError::Type(format!(
            "{} expects {} type argument(s), got {}",
            kind.name(),
            expected_args,
            call.type_args.len()
        ))
        .into());
    }
    let collection = Arc::new(Collection::new(kind, call.type_args));
    let mut args = call.args;

    if kind == CollectionKind::Map {
        match args.as_slice() {
            [] => {}
            [Value::Map(source)] => {
                for (key, value) in map::entry_pairs(&source.read()) {
                    insert(interp, &collection, key, value)?;
                }
            }
            [other] => {
                return Err(VmError::type_mismatch("Map literal for Map()", type_name(other)).into())
            }
            _ => return Err(VmError::Arity { expected: "0..1".to_string(), got: args.len() }.into()),
        }
        return Ok(Value::Collection(collection));
    }

    if let [Value::Array(source)] = args.as_slice() {
        let items = source.read().clone();
        args = items;
    }
    for item in args {
        push(interp, &collection, item)?;
    }
    Ok(Value::Collection(collection))
}

/// Call a collection method
pub fn call(
    interp: &Interpreter,
    collection: &Arc<Collection>,
    name: &str,
    args: Vec<Value>,
) -> EvalResult<Value> {
    if !methods(collection.kind).contains(&name) {
        return Err(VmError::attribute(collection.kind.name(), name).into());
    }
    match collection.kind {
        CollectionKind::Map => call_map(interp, collection, name, args),
        _ => call_sequence(interp, collection, name, args),
    }
}

fn call_sequence(
    interp: &Interpreter,
    collection: &Arc<Collection>,
    name: &str,
    args: Vec<Value>,
) -> EvalResult<Value> {
    let kind = collection.kind;
    let value = match name {
        "add" if kind == CollectionKind::Set => {
            expect_args(&args, 1)?;
            Value::Bool(push(interp, collection, args[0].clone())?)
        }
        "add" | "push" | "addLast" => {
            for item in args {
                push(interp, collection, item)?;
            }
            Value::Nil
        }
        "addFirst" => {
            expect_args(&args, 1)?;
            check_collection_element(interp, collection, None, &args[0])?;
            with_items(collection, |items| {
                items.push_front(args[0].clone());
                Ok(())
            })?;
            Value::Nil
        }
        "get" => {
            expect_args(&args, 1)?;
            with_items(collection, |items| {
                index_of(&args[0], items.len()).map(|i| items[i].clone())
            })?
        }
        "set" => {
            expect_args(&args, 2)?;
            check_collection_element(interp, collection, Some(&args[0]), &args[1])?;
            with_items(collection, |items| {
                index_of(&args[0], items.len()).map(|i| std::mem::replace(&mut items[i], args[1].clone()))
            })?
        }
        "insert" => {
            expect_args(&args, 2)?;
            check_collection_element(interp, collection, None, &args[1])?;
            with_items(collection, |items| match &args[0] {
                Value::Int(i) if *i >= 0 && (*i as usize) <= items.len() => {
                    items.insert(*i as usize, args[1].clone());
                    Ok(Value::Nil)
                }
                Value::Int(i) => Err(VmError::Index { index: *i, len: items.len() }),
                other => Err(VmError::type_mismatch("Int index", type_name(other))),
            })?
        }
        "remove" => {
            expect_args(&args, 1)?;
            with_items(collection, |items| {
                Ok(match items.iter().position(|item| item.equals(&args[0])) {
                    Some(i) => {
                        items.remove(i);
                        Value::Bool(true)
                    }
                    None => Value::Bool(false),
                })
            })?
        }
        "removeAt" => {
            expect_args(&args, 1)?;
            with_items(collection, |items| {
                index_of(&args[0], items.len()).map(|i| items.remove(i).unwrap_or(Value::Nil))
            })?
        }
        "removeFirst" => with_items(collection, |items| Ok(items.pop_front().unwrap_or(Value::Nil)))?,
        "removeLast" => with_items(collection, |items| Ok(items.pop_back().unwrap_or(Value::Nil)))?,
        "peekFirst" => with_items(collection, |items| Ok(items.front().cloned().unwrap_or(Value::Nil)))?,
        "peekLast" => with_items(collection, |items| Ok(items.back().cloned().unwrap_or(Value::Nil)))?,
        "contains" => {
            let needle = arg(&args, 0);
            Value::Bool(collection.items().iter().any(|item| item.equals(&needle)))
        }
        "indexOf" => {
            let needle = arg(&args, 0);
            let position = collection.items().iter().position(|item| item.equals(&needle));
            Value::Int(position.map_or(-1, |i| i as i64))
        }
        "size" | "length" => Value::Int(collection.len() as i64),
        "isEmpty" => Value::Bool(collection.is_empty()),
        "clear" => {
            with_items(collection, |items| {
                items.clear();
                Ok(())
            })?;
            Value::Nil
        }
        "toArray" | "asArray" => Value::array(collection.items()),
        "forEach" => {
            let callback = callback_arg(&args, "forEach")?;
            for (i, item) in collection.items().into_iter().enumerate() {
                interp.call_callback(callback, element_args(callback, item, i))?;
            }
            Value::Nil
        }
        "map" => {
            let callback = callback_arg(&args, "map")?;
            let mapped = Arc::new(Collection::new(kind, Vec::new()));
            for (i, item) in collection.items().into_iter().enumerate() {
                let value = interp.call_callback(callback, element_args(callback, item, i))?;
                push(interp, &mapped, value)?;
            }
            Value::Collection(mapped)
        }
        "filter" => {
            let callback = callback_arg(&args, "filter")?;
            let filtered = Arc::new(Collection::new(kind, collection.type_args.clone()));
            for (i, item) in collection.items().into_iter().enumerate() {
                if interp
                    .call_callback(callback, element_args(callback, item.clone(), i))?
                    .is_truthy()
                {
                    push(interp, &filtered, item)?;
                }
            }
            Value::Collection(filtered)
        }
        "sort" => {
            expect_args_between(&args, 0, 1)?;
            let sorted = sort_values(interp, collection.items(), args.first())?;
            with_items(collection, |items| {
                *items = sorted.into_iter().collect();
                Ok(())
            })?;
            Value::Nil
        }
        "toString" => Value::from(interp.stringify(&Value::Collection(Arc::clone(collection)))?),
        _ => return Err(VmError::attribute(kind.name(), name).into()),
    };
    Ok(value)
}

fn call_map(
    interp: &Interpreter,
    collection: &Arc<Collection>,
    name: &str,
    args: Vec<Value>,
) -> EvalResult<Value> {
    let value = match name {
        "set" | "put" => {
            expect_args(&args, 2)?;
            insert(interp, collection, args[0].clone(), args[1].clone())?;
            Value::Nil
        }
        "remove" | "delete" => {
            expect_args(&args, 1)?;
            with_map(collection, |data| Ok(data.remove(&args[0]).unwrap_or(Value::Nil)))?
        }
        "clear" => {
            with_map(collection, |data| {
                *data = ValueMap::new();
                Ok(())
            })?;
            Value::Nil
        }
        "forEach" => {
            let entries = with_map(collection, |data| Ok(map::entry_pairs(data)))?;
            map::for_each_entry(interp, &args, entries)?;
            Value::Nil
        }
        "toString" => Value::from(interp.stringify(&Value::Collection(Arc::clone(collection)))?),
        _ => {
            let result = with_map(collection, |data| Ok(map::query(data, name, &args)))?;
            match result {
                Some(result) => result?,
                None => return Err(VmError::attribute("Map", name).into()),
            }
        }
    };
    Ok(value)
}

/// Append to a sequence after the element check. Sets skip duplicates and
/// report whether the value was new.
fn push(interp: &Interpreter, collection: &Collection, item: Value) -> EvalResult<bool> {
    check_collection_element(interp, collection, None, &item)?;
    let is_set = collection.kind == CollectionKind::Set;
    let added = with_items(collection, |items| {
        if is_set && items.iter().any(|existing| existing.equals(&item)) {
            return Ok(false);
        }
        items.push_back(item);
        Ok(true)
    })?;
    Ok(added)
}

fn insert(interp: &Interpreter, collection: &Collection, key: Value, value: Value) -> EvalResult<()> {
    check_collection_element(interp, collection, Some(&key), &value)?;
    with_map(collection, |data| {
        data.insert(key, value);
        Ok(())
    })?;
    Ok(())
}

fn with_items<R>(
    collection: &Collection,
    f: impl FnOnce(&mut VecDeque<Value>) -> VmResult<R>,
) -> VmResult<R> {
    match &mut *collection.data.write() {
        CollectionData::Seq(items) => f(items),
        CollectionData::Map(_) => Err(storage_mismatch(collection)),
    }
}

fn with_map<R>(collection: &Collection, f: impl FnOnce(&mut ValueMap) -> VmResult<R>) -> VmResult<R> {
    match &mut *collection.data.write() {
        CollectionData::Map(data) => f(data),
        CollectionData::Seq(_) => Err(storage_mismatch(collection)),
    }
}

fn storage_mismatch(collection: &Collection) -> VmError {
    VmError::Runtime(format!("corrupt {} storage", collection.kind.name()))
}
