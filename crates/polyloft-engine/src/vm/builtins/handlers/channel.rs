//! Channel method handlers

use crate::vm::builtins::{expect_args, int_arg};
use crate::vm::interpreter::{EvalResult, Interpreter};
use crate::vm::sync::Channel;
use crate::vm::types::generics::{render_type, type_name, value_conforms};
use crate::vm::types::TypeBindings;
use crate::vm::value::{NativeCall, Value};
use crate::vm::VmError;
use std::sync::Arc;

pub const METHODS: &[&str] = &[
    "send", "recv", "tryRecv", "close", "isClosed", "len", "length", "capacity", "toString",
];

/// `Channel<T>(capacity?)`
pub fn construct(call: NativeCall) -> EvalResult<Value> {
    if call.args.len() > 1 {
        return Err(VmError::Arity {
            expected: "0..1".to_string(),
            got: call.args.len(),
        }
        .into());
    }
    if call.type_args.len() > 1 {
        return Err(VmError::Type(format!(
            "Channel expects 1 type argument, got {}",
            call.type_args.len()
        ))
        .into());
    }
    let capacity = match call.args.first() {
        Some(_) => {
            let capacity = int_arg(&call.args, 0, "Channel capacity")?;
            if capacity < 0 {
                return Err(VmError::Type(format!("channel capacity must be >= 0, got {}", capacity)).into());
            }
            Some(capacity as usize)
        }
        None => None,
    };
    let element_type = call.type_args.into_iter().next();
    Ok(Value::Channel(Arc::new(Channel::new(element_type, capacity))))
}

/// Call a channel method
pub fn call(
    interp: &Interpreter,
    channel: &Arc<Channel>,
    name: &str,
    args: Vec<Value>,
) -> EvalResult<Value> {
    let value = match name {
        "send" => {
            expect_args(&args, 1)?;
            let value = args.into_iter().next().unwrap_or(Value::Nil);
            if let Some(ty) = &channel.element_type {
                if !value_conforms(interp.registry(), &value, ty, &TypeBindings::default()) {
                    return Err(VmError::Type(format!(
                        "Channel<{}>: expected {}, got {}",
                        render_type(ty),
                        render_type(ty),
                        type_name(&value)
                    ))
                    .into());
                }
            }
            channel.send(value)?;
            Value::Nil
        }
        "recv" => channel.recv().unwrap_or(Value::Nil),
        "tryRecv" => channel.try_recv().unwrap_or(Value::Nil),
        "close" => {
            channel.close();
            Value::Nil
        }
        "isClosed" => Value::Bool(channel.is_closed()),
        "len" | "length" => Value::Int(channel.len() as i64),
        "capacity" => channel
            .capacity()
            .map_or(Value::Nil, |cap| Value::Int(cap as i64)),
        "toString" => Value::str(Value::Channel(Arc::clone(channel)).to_string()),
        _ => return Err(VmError::attribute("Channel", name).into()),
    };
    Ok(value)
}
