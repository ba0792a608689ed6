//! The `Sys` and `Math` modules

use crate::parser::ast::{BindingKind, TypeExpr};
use crate::parser::parse_type_spec;
use crate::vm::builtins::{expect_args, expect_args_between, float_arg, int_arg, str_arg};
use crate::vm::env::Env;
use crate::vm::interpreter::{EvalResult, Interpreter};
use crate::vm::types::generics::{canonicalize, instance_of, type_name};
use crate::vm::value::{Module, NativeCall, NativeFunction, Value};
use crate::vm::VmError;
use rustc_hash::FxHashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub(super) fn install(globals: &Env) {
    globals.define("Sys", sys_module(), BindingKind::Const);
    globals.define("Math", math_module(), BindingKind::Const);
}

/// `instanceof(value, "List<String>")` or `instanceof(value, SomeClass)`.
pub(super) fn instance_of_spec(interp: &Interpreter, call: NativeCall) -> EvalResult<Value> {
    expect_args(&call.args, 2)?;
    let target = match &call.args[1] {
        Value::Str(spec) => parse_type_spec(spec)
            .map_err(|e| VmError::Type(format!("invalid type '{}': {}", spec, e)))?,
        Value::Class(class) => TypeExpr::named(class.name.clone()),
        Value::Interface(iface) => TypeExpr::named(iface.name.clone()),
        other => return Err(VmError::type_mismatch("type name or class", type_name(other)).into()),
    };
    let target = canonicalize(&target);
    Ok(Value::Bool(instance_of(interp.registry(), &call.args[0], &target)))
}

fn sys_module() -> Value {
    let mut members = FxHashMap::default();
    members.insert(
        "type".to_string(),
        NativeFunction::value("type", |_, call| {
            expect_args(&call.args, 1)?;
            Ok(Value::from(type_name(&call.args[0])))
        }),
    );
    members.insert(
        "instanceof".to_string(),
        NativeFunction::value("instanceof", instance_of_spec),
    );
    members.insert(
        "sleep".to_string(),
        NativeFunction::value("sleep", |_, call| {
            expect_args(&call.args, 1)?;
            let millis = int_arg(&call.args, 0, "sleep")?.max(0) as u64;
            std::thread::sleep(Duration::from_millis(millis));
            Ok(Value::Nil)
        }),
    );
    members.insert("time".to_string(), NativeFunction::value("time", |_, call| time(call)));
    members.insert(
        "random".to_string(),
        NativeFunction::value("random", |_, call| {
            expect_args(&call.args, 0)?;
            Ok(Value::Float(rand::random::<f64>()))
        }),
    );
    Module::value("Sys", members)
}

/// Milliseconds since the epoch; `Sys.time("float")` returns seconds as a Float.
fn time(call: NativeCall) -> EvalResult<Value> {
    expect_args_between(&call.args, 0, 1)?;
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| VmError::Runtime(format!("system clock before epoch: {}", e)))?;
    let as_float = match call.args.first() {
        Some(_) => str_arg(&call.args, 0, "Sys.time")? == "float",
        None => false,
    };
    Ok(if as_float {
        Value::Float(elapsed.as_secs_f64())
    } else {
        Value::Int(elapsed.as_millis() as i64)
    })
}

fn math_module() -> Value {
    let mut members = FxHashMap::default();
    members.insert("PI".to_string(), Value::Float(std::f64::consts::PI));
    members.insert("E".to_string(), Value::Float(std::f64::consts::E));

    let unary: [(&str, fn(f64) -> f64); 9] = [
        ("floor", f64::floor),
        ("ceil", f64::ceil),
        ("round", f64::round),
        ("sqrt", f64::sqrt),
        ("sin", f64::sin),
        ("cos", f64::cos),
        ("tan", f64::tan),
        ("log", f64::ln),
        ("exp", f64::exp),
    ];
    for (name, op) in unary {
        members.insert(
            name.to_string(),
            NativeFunction::value(name, move |_, call| {
                expect_args(&call.args, 1)?;
                Ok(Value::Float(op(float_arg(&call.args, 0, name)?)))
            }),
        );
    }

    members.insert(
        "abs".to_string(),
        NativeFunction::value("abs", |_, call| {
            expect_args(&call.args, 1)?;
            match &call.args[0] {
                Value::Int(i) => Ok(Value::Int(i.wrapping_abs())),
                _ => Ok(Value::Float(float_arg(&call.args, 0, "abs")?.abs())),
            }
        }),
    );
    members.insert(
        "pow".to_string(),
        NativeFunction::value("pow", |_, call| {
            expect_args(&call.args, 2)?;
            let base = float_arg(&call.args, 0, "pow")?;
            let exponent = float_arg(&call.args, 1, "pow")?;
            Ok(Value::Float(base.powf(exponent)))
        }),
    );
    members.insert("min".to_string(), NativeFunction::value("min", |_, call| extremum(call, "min")));
    members.insert("max".to_string(), NativeFunction::value("max", |_, call| extremum(call, "max")));
    members.insert(
        "random".to_string(),
        NativeFunction::value("random", |_, call| {
            expect_args(&call.args, 0)?;
            Ok(Value::Float(rand::random::<f64>()))
        }),
    );
    Module::value("Math", members)
}

/// `Math.min` / `Math.max` over one or more numbers. All-Int input stays Int.
fn extremum(call: NativeCall, which: &str) -> EvalResult<Value> {
    if call.args.is_empty() {
        return Err(VmError::Arity {
            expected: "1..".to_string(),
            got: 0,
        }
        .into());
    }
    let pick_max = which == "max";
    if call.args.iter().all(|v| matches!(v, Value::Int(_))) {
        let ints = call.args.iter().filter_map(Value::as_int);
        let best = if pick_max { ints.max() } else { ints.min() };
        return Ok(best.map_or(Value::Nil, Value::Int));
    }
    let mut best = float_arg(&call.args, 0, which)?;
    for i in 1..call.args.len() {
        let candidate = float_arg(&call.args, i, which)?;
        if (pick_max && candidate > best) || (!pick_max && candidate < best) {
            best = candidate;
        }
    }
    Ok(Value::Float(best))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(args: Vec<Value>) -> NativeCall {
        NativeCall {
            args,
            type_args: Vec::new(),
        }
    }

    #[test]
    fn test_extremum_keeps_ints() {
        let result = extremum(call(vec![Value::Int(3), Value::Int(9), Value::Int(-1)]), "max").ok();
        assert_eq!(result.and_then(|v| v.as_int()), Some(9));
    }

    #[test]
    fn test_extremum_mixed_numbers() {
        let result = extremum(call(vec![Value::Int(3), Value::Float(1.5)]), "min").ok();
        assert_eq!(result.and_then(|v| v.as_float()), Some(1.5));
    }

    #[test]
    fn test_extremum_requires_arguments() {
        assert!(extremum(call(Vec::new()), "min").is_err());
    }

    #[test]
    fn test_time_defaults_to_millis() {
        let value = time(call(Vec::new())).ok();
        assert!(matches!(value, Some(Value::Int(ms)) if ms > 0));
        let value = time(call(vec![Value::str("float")])).ok();
        assert!(matches!(value, Some(Value::Float(_))));
    }
}
