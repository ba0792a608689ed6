//! Number method handlers
//!
//! Implements built-in methods shared by Int and Float:
//! - abs, floor, ceil, round, sqrt, pow
//! - toInt, toFloat, toFixed(digits), toString

use crate::vm::builtins::{arg, expect_args, float_arg, int_arg};
use crate::vm::interpreter::EvalResult;
use crate::vm::value::{format_float, Value};
use crate::vm::VmError;

pub const METHODS: &[&str] = &[
    "abs", "floor", "ceil", "round", "sqrt", "pow", "toInt", "toFloat", "toFixed", "toString",
    "equals",
];

/// Call a number method
pub fn call(receiver: &Value, name: &str, args: Vec<Value>) -> EvalResult<Value> {
    let value = match (receiver, name) {
        (Value::Int(i), "abs") => Value::Int(i.wrapping_abs()),
        (Value::Int(i), "floor" | "ceil" | "round" | "toInt") => Value::Int(*i),
        (Value::Float(f), "abs") => Value::Float(f.abs()),
        (Value::Float(f), "floor") => Value::Float(f.floor()),
        (Value::Float(f), "ceil") => Value::Float(f.ceil()),
        (Value::Float(f), "round") => Value::Float(f.round()),
        (Value::Float(f), "toInt") => Value::Int(f.trunc() as i64),
        (_, "sqrt") => Value::Float(as_f64(receiver).sqrt()),
        (_, "pow") => {
            expect_args(&args, 1)?;
            match (receiver, &args[0]) {
                (Value::Int(base), Value::Int(exp)) if (0..=u32::MAX as i64).contains(exp) => {
                    Value::Int(base.wrapping_pow(*exp as u32))
                }
                _ => Value::Float(as_f64(receiver).powf(float_arg(&args, 0, "pow")?)),
            }
        }
        (_, "toFloat") => Value::Float(as_f64(receiver)),
        (_, "toFixed") => {
            let digits = int_arg(&args, 0, "toFixed")?.clamp(0, 20) as usize;
            Value::from(format!("{:.prec$}", as_f64(receiver), prec = digits))
        }
        (Value::Float(f), "toString") => Value::from(format_float(*f)),
        (_, "toString") => Value::str(receiver.to_string()),
        (_, "equals") => Value::Bool(receiver.equals(&arg(&args, 0))),
        _ => return Err(VmError::attribute(receiver.kind_name(), name).into()),
    };
    Ok(value)
}

fn as_f64(value: &Value) -> f64 {
    value.as_float().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_num(receiver: Value, name: &str, args: Vec<Value>) -> Value {
        match call(&receiver, name, args) {
            Ok(value) => value,
            Err(_) => panic!("{} failed", name),
        }
    }

    #[test]
    fn test_int_methods_stay_integral() {
        assert_eq!(call_num(Value::Int(-3), "abs", vec![]).as_int(), Some(3));
        assert_eq!(call_num(Value::Int(2), "pow", vec![Value::Int(10)]).as_int(), Some(1024));
        assert!(matches!(call_num(Value::Int(2), "pow", vec![Value::Float(0.5)]), Value::Float(_)));
    }

    #[test]
    fn test_float_formatting() {
        assert_eq!(call_num(Value::Float(3.14159), "toFixed", vec![Value::Int(2)]).as_str(), Some("3.14"));
        assert_eq!(call_num(Value::Float(2.7), "toInt", vec![]).as_int(), Some(2));
        assert_eq!(call_num(Value::Float(2.0), "toString", vec![]).as_str(), Some("2"));
    }
}
