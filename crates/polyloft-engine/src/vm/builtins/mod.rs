//! Builtin functions, methods, modules and the exception prelude
//!
//! Globals (`print`, `List`, `async`, ...) and modules (`Sys`, `Math`) are
//! installed into the root scope of every runtime, followed by the
//! exception classes in `prelude.pf`. Methods on builtin values
//! (`"abc".length()`, `ch.recv()`, `p.then(cb)`) dispatch through
//! [`call_method`] to one handler module per value kind.

mod globals;
pub mod handlers;
mod modules;

use crate::parser::token::Span;
use crate::vm::context::{parse_program, RuntimeState};
use crate::vm::env::Env;
use crate::vm::error::EvalError;
use crate::vm::interpreter::{EvalResult, Interpreter};
use crate::vm::object::{Collection, CollectionKind};
use crate::vm::types::generics::{render_type, type_name, value_conforms};
use crate::vm::types::TypeBindings;
use crate::vm::value::Value;
use crate::vm::{VmError, VmResult};
use std::sync::Arc;

const PRELUDE: &str = include_str!("prelude.pf");

const SCALAR_METHODS: &[&str] = &["toString", "equals"];
const THREAD_METHODS: &[&str] = &["join", "isAlive", "id", "toString"];

/// Install globals, modules and the exception prelude into `globals`.
pub fn install(state: &Arc<RuntimeState>, globals: &Env) -> Result<(), EvalError> {
    globals::install(globals);
    modules::install(globals);
    let program = parse_program(PRELUDE)?;
    Interpreter::new(Arc::clone(state)).run_program(&program, globals)?;
    tracing::debug!(types = state.registry.len(), "builtins installed");
    Ok(())
}

/// Whether `value` has a builtin method called `name`.
pub fn has_method(value: &Value, name: &str) -> bool {
    let methods: &[&str] = match value {
        Value::Str(_) => handlers::string::METHODS,
        Value::Int(_) | Value::Float(_) => handlers::number::METHODS,
        Value::Nil | Value::Bool(_) => SCALAR_METHODS,
        Value::Array(_) => handlers::array::METHODS,
        Value::Map(_) => handlers::map::METHODS,
        Value::Collection(collection) => handlers::collection::methods(collection.kind),
        Value::Channel(_) => handlers::channel::METHODS,
        Value::Thread(_) => THREAD_METHODS,
        Value::Future(_) => handlers::future::METHODS,
        Value::Object(inst) => return handlers::object::has_instance_method(inst, name),
        Value::Class(_) => handlers::object::CLASS_METHODS,
        _ => &[],
    };
    methods.contains(&name)
}

/// Builtin length of strings, arrays, maps, collections and channels.
pub fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::Str(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.read().len()),
        Value::Map(map) => Some(map.read().len()),
        Value::Collection(collection) => Some(collection.len()),
        Value::Channel(channel) => Some(channel.len()),
        _ => None,
    }
}

/// Call the builtin method `name` on `receiver`.
pub fn call_method(
    interp: &Interpreter,
    receiver: &Value,
    name: &str,
    args: Vec<Value>,
    _site: Span,
) -> EvalResult<Value> {
    match receiver {
        Value::Str(s) => handlers::string::call(s, name, args),
        Value::Int(_) | Value::Float(_) => handlers::number::call(receiver, name, args),
        Value::Array(items) => handlers::array::call(interp, items, name, args),
        Value::Map(map) => handlers::map::call(interp, map, name, args),
        Value::Collection(collection) => handlers::collection::call(interp, collection, name, args),
        Value::Channel(channel) => handlers::channel::call(interp, channel, name, args),
        Value::Future(future) => handlers::future::call(interp, future, name, args),
        Value::Object(inst) => handlers::object::call_instance(inst, name, args),
        Value::Class(class) => handlers::object::call_class(class, name, args),
        Value::Thread(handle) => match name {
            "join" => interp.join_thread(handle),
            "isAlive" => Ok(Value::Bool(!handle.is_finished())),
            "id" => Ok(Value::Int(handle.id() as i64)),
            "toString" => Ok(Value::str(receiver.to_string())),
            _ => Err(unknown(receiver, name).into()),
        },
        Value::Nil | Value::Bool(_) => match name {
            "toString" => Ok(Value::str(receiver.to_string())),
            "equals" => Ok(Value::Bool(receiver.equals(&arg(&args, 0)))),
            _ => Err(unknown(receiver, name).into()),
        },
        _ => Err(unknown(receiver, name).into()),
    }
}

/// Validate an element (and, for maps, a key) against a collection's
/// declared type arguments.
pub fn check_collection_element(
    interp: &Interpreter,
    collection: &Collection,
    key: Option<&Value>,
    value: &Value,
) -> VmResult<()> {
    let bindings = TypeBindings::default();
    let reg = interp.registry();
    let declared = render_collection_type(collection);
    let (key_type, value_type) = match collection.kind {
        CollectionKind::Map => (collection.type_args.first(), collection.type_args.get(1)),
        _ => (None, collection.type_args.first()),
    };
    if let (Some(ty), Some(key)) = (key_type, key) {
        if !value_conforms(reg, key, ty, &bindings) {
            return Err(VmError::Type(format!(
                "{} key: expected {}, got {}",
                declared,
                render_type(ty),
                type_name(key)
            )));
        }
    }
    if let Some(ty) = value_type {
        if !value_conforms(reg, value, ty, &bindings) {
            return Err(VmError::Type(format!(
                "{} element: expected {}, got {}",
                declared,
                render_type(ty),
                type_name(value)
            )));
        }
    }
    Ok(())
}

fn render_collection_type(collection: &Collection) -> String {
    if collection.type_args.is_empty() {
        return collection.kind.name().to_string();
    }
    let args: Vec<String> = collection.type_args.iter().map(render_type).collect();
    format!("{}<{}>", collection.kind.name(), args.join(", "))
}

// ============================================================================
// Argument helpers
// ============================================================================

pub(crate) fn unknown(receiver: &Value, name: &str) -> VmError {
    VmError::attribute(type_name(receiver), name)
}

/// Argument `index`, or `nil` when absent.
pub(crate) fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Nil)
}

pub(crate) fn expect_args(args: &[Value], expected: usize) -> VmResult<()> {
    if args.len() != expected {
        return Err(VmError::arity(expected, args.len()));
    }
    Ok(())
}

pub(crate) fn expect_args_between(args: &[Value], min: usize, max: usize) -> VmResult<()> {
    if args.len() < min || args.len() > max {
        return Err(VmError::Arity {
            expected: format!("{}..{}", min, max),
            got: args.len(),
        });
    }
    Ok(())
}

pub(crate) fn int_arg(args: &[Value], index: usize, what: &str) -> VmResult<i64> {
    match args.get(index) {
        Some(Value::Int(i)) => Ok(*i),
        Some(other) => Err(VmError::type_mismatch(format!("Int for {}", what), type_name(other))),
        None => Err(VmError::arity(index + 1, args.len())),
    }
}

pub(crate) fn float_arg(args: &[Value], index: usize, what: &str) -> VmResult<f64> {
    match args.get(index) {
        Some(value @ (Value::Int(_) | Value::Float(_))) => Ok(value.as_float().unwrap_or(0.0)),
        Some(other) => Err(VmError::type_mismatch(format!("Number for {}", what), type_name(other))),
        None => Err(VmError::arity(index + 1, args.len())),
    }
}

pub(crate) fn str_arg<'a>(args: &'a [Value], index: usize, what: &str) -> VmResult<&'a str> {
    match args.get(index) {
        Some(Value::Str(s)) => Ok(s),
        Some(other) => Err(VmError::type_mismatch(format!("String for {}", what), type_name(other))),
        None => Err(VmError::arity(index + 1, args.len())),
    }
}

/// Arguments handed to a per-element callback: the element, plus its
/// index for user lambdas that want it.
pub(crate) fn element_args(callee: &Value, item: Value, index: usize) -> Vec<Value> {
    match callee {
        Value::Function(_) => vec![item, Value::Int(index as i64)],
        _ => vec![item],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::context::{EvalOptions, Runtime};

    #[test]
    fn test_has_method_per_kind() {
        assert!(has_method(&Value::str("abc"), "toUpperCase"));
        assert!(has_method(&Value::array(vec![]), "push"));
        assert!(has_method(&Value::Int(1), "toFixed"));
        assert!(!has_method(&Value::Int(1), "push"));
        assert!(!has_method(&Value::Nil, "length"));
    }

    #[test]
    fn test_length_counts_chars() {
        assert_eq!(length_of(&Value::str("héllo")), Some(5));
        assert_eq!(length_of(&Value::array(vec![Value::Nil, Value::Nil])), Some(2));
        assert_eq!(length_of(&Value::Int(3)), None);
    }

    #[test]
    fn test_prelude_registers_exception_hierarchy() {
        let runtime = Runtime::new(EvalOptions::default());
        let registry = runtime.registry();
        for name in [
            "Throwable",
            "Exception",
            "RuntimeError",
            "TypeError",
            "TimeoutError",
            "IndexError",
            "ValueError",
            "Tuple",
            "Pair",
        ] {
            assert!(registry.contains(name), "missing {}", name);
        }
        assert!(registry.is_subtype_of("TimeoutError", "Throwable"));
        assert!(registry.is_subtype_of("IndexError", "RuntimeError"));
        assert!(!registry.is_subtype_of("Exception", "RuntimeError"));
    }

    #[test]
    fn test_collection_element_check_names_declared_type() {
        let runtime = Runtime::new(EvalOptions::default());
        let err = runtime
            .eval_source("let xs = List<Int>(1, 2)\nxs.add(\"three\")")
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("List<Int>"), "{}", text);
        assert!(text.contains("expected Int, got String"), "{}", text);
    }
}
