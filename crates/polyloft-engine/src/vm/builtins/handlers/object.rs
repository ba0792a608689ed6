//! Builtin methods on class instances, enum constants, records and classes

use crate::vm::builtins::{expect_args, str_arg};
use crate::vm::interpreter::EvalResult;
use crate::vm::object::{ClassDef, ClassKind, Instance};
use crate::vm::value::{HashKey, Value};
use crate::vm::VmError;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

const INSTANCE_METHODS: &[&str] = &["toString", "equals", "hashCode", "getClass"];
const ENUM_METHODS: &[&str] = &["name", "ordinal"];
pub const CLASS_METHODS: &[&str] = &["values", "valueOf", "name", "toString"];

pub fn has_instance_method(inst: &Instance, name: &str) -> bool {
    INSTANCE_METHODS.contains(&name) || (inst.enum_tag.is_some() && ENUM_METHODS.contains(&name))
}

/// Methods every object answers to unless its class overrides them.
pub fn call_instance(inst: &Arc<Instance>, name: &str, args: Vec<Value>) -> EvalResult<Value> {
    let receiver = Value::Object(Arc::clone(inst));
    let value = match (name, &inst.enum_tag) {
        ("toString", _) => Value::from(receiver.to_string()),
        ("equals", _) => {
            expect_args(&args, 1)?;
            Value::Bool(receiver.equals(&args[0]))
        }
        ("hashCode", _) => {
            let mut hasher = FxHasher::default();
            HashKey::of(&receiver).hash(&mut hasher);
            Value::Int(hasher.finish() as i64)
        }
        ("getClass", _) => Value::Class(Arc::clone(&inst.class)),
        ("name", Some((constant, _))) => Value::str(constant),
        ("ordinal", Some((_, ordinal))) => Value::Int(*ordinal as i64),
        _ => return Err(VmError::attribute(inst.class.name.clone(), name).into()),
    };
    Ok(value)
}

/// `Color.values()`, `Color.valueOf("RED")`, `Point.name()`.
pub fn call_class(class: &Arc<ClassDef>, name: &str, args: Vec<Value>) -> EvalResult<Value> {
    let value = match name {
        "values" if class.kind == ClassKind::Enum => Value::array(class.enum_values.read().clone()),
        "valueOf" if class.kind == ClassKind::Enum => {
            expect_args(&args, 1)?;
            let wanted = str_arg(&args, 0, "valueOf")?;
            let found = class.enum_values.read().iter().find(|value| {
                matches!(value, Value::Object(inst)
                    if inst.enum_tag.as_ref().is_some_and(|(constant, _)| constant == wanted))
            }).cloned();
            match found {
                Some(value) => value,
                None => {
                    return Err(VmError::Runtime(format!(
                        "no enum constant {}.{}",
                        class.name, wanted
                    ))
                    .into())
                }
            }
        }
        "name" => Value::str(&class.name),
        "toString" => Value::from(Value::Class(Arc::clone(class)).to_string()),
        _ => return Err(VmError::attribute(class.name.clone(), name).into()),
    };
    Ok(value)
}
