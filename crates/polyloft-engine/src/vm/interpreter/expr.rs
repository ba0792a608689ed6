//! Expression evaluation, operators, member and index access

use super::{EvalResult, Interpreter};
use crate::parser::ast::{
    BinaryOperator, CallExpression, Expression, InterpolationPart, LambdaBody, LogicalOperator,
    UnaryOperator,
};
use crate::vm::builtins;
use crate::vm::env::Env;
use crate::vm::object::{ClassKind, CollectionData, CollectionKind, Instance};
use crate::vm::sync::Channel;
use crate::vm::types::generics::{bindings_for, canonicalize, instance_of, type_name};
use crate::vm::value::{BoundMethod, Function, FunctionBody, Value, ValueMap};
use crate::vm::{VmError, VmResult, MAX_SEQUENCE_LEN};
use std::cmp::Ordering;
use std::sync::Arc;

impl Interpreter {
    pub fn eval(&self, expr: &Expression, env: &Env) -> EvalResult<Value> {
        match expr {
            Expression::IntLiteral(lit) => Ok(Value::Int(lit.value)),
            Expression::FloatLiteral(lit) => Ok(Value::Float(lit.value)),
            Expression::StringLiteral(lit) => Ok(Value::str(&lit.value)),
            Expression::BooleanLiteral(lit) => Ok(Value::Bool(lit.value)),
            Expression::NilLiteral(_) => Ok(Value::Nil),

            Expression::Interpolated(interp) => {
                let mut out = String::new();
                for part in &interp.parts {
                    match part {
                        InterpolationPart::Text(text) => out.push_str(text),
                        InterpolationPart::Expression(inner) => {
                            let value = self.eval(inner, env)?;
                            out.push_str(&self.stringify(&value)?);
                        }
                    }
                }
                Ok(Value::from(out))
            }

            Expression::Identifier(ident) => Ok(self.lookup(&ident.name, env)?),

            Expression::This(_) => env
                .receiver()
                .map(|receiver| receiver.this)
                .ok_or_else(|| VmError::Runtime("'this' used outside of a method".to_string()).into()),

            Expression::Super(_) => Err(VmError::Runtime(
                "'super' must be called or followed by a member".to_string(),
            )
            .into()),

            Expression::Array(array) => {
                let items = array
                    .elements
                    .iter()
                    .map(|element| self.eval(element, env))
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(Value::array(items))
            }

            Expression::Map(map) => {
                let mut entries = ValueMap::new();
                for (key, value) in &map.entries {
                    let key = self.eval(key, env)?;
                    let value = self.eval(value, env)?;
                    entries.insert(key, value);
                }
                Ok(Value::map(entries))
            }

            Expression::Unary(unary) => {
                let operand = self.eval(&unary.operand, env)?;
                match unary.operator {
                    UnaryOperator::Not => Ok(Value::Bool(!operand.is_truthy())),
                    UnaryOperator::Negate => match operand {
                        Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
                        Value::Float(f) => Ok(Value::Float(-f)),
                        other => Err(VmError::Type(format!(
                            "bad operand type for unary -: {}",
                            type_name(&other)
                        ))
                        .into()),
                    },
                }
            }

            Expression::Binary(binary) => {
                let left = self.eval(&binary.left, env)?;
                let right = self.eval(&binary.right, env)?;
                self.binary_op(binary.operator, left, right)
            }

            Expression::Logical(logical) => {
                let left = self.eval(&logical.left, env)?.is_truthy();
                let result = match logical.operator {
                    LogicalOperator::And => left && self.eval(&logical.right, env)?.is_truthy(),
                    LogicalOperator::Or => left || self.eval(&logical.right, env)?.is_truthy(),
                };
                Ok(Value::Bool(result))
            }

            Expression::Conditional(cond) => {
                if self.eval(&cond.test, env)?.is_truthy() {
                    self.eval(&cond.consequent, env)
                } else {
                    self.eval(&cond.alternate, env)
                }
            }

            Expression::Call(call) => self.eval_call(call, env),

            Expression::Member(member) => {
                if let Expression::Super(_) = &*member.object {
                    return self.super_member(&member.property, env);
                }
                let object = self.eval(&member.object, env)?;
                self.get_member(&object, &member.property, env)
            }

            Expression::Index(index) => {
                let object = self.eval(&index.object, env)?;
                let key = self.eval(&index.index, env)?;
                self.get_index(&object, &key)
            }

            Expression::Lambda(lambda) => {
                let body = match &lambda.body {
                    LambdaBody::Expression(expr) => FunctionBody::Expression(Arc::clone(expr)),
                    LambdaBody::Block(block) => FunctionBody::Block(Arc::clone(block)),
                };
                Ok(Value::Function(Arc::new(Function {
                    name: "<lambda>".to_string(),
                    type_params: Vec::new(),
                    params: lambda.params.clone(),
                    return_type: lambda.return_type.as_ref().map(canonicalize),
                    body,
                    closure: env.clone(),
                })))
            }

            Expression::ThreadSpawn(spawn) => self.spawn_thread(&spawn.body, env),

            Expression::ThreadJoin(join) => match self.eval(&join.handle, env)? {
                Value::Thread(handle) => self.join_thread(&handle),
                other => Err(VmError::type_mismatch("Thread", type_name(&other)).into()),
            },

            Expression::Channel(chan) => {
                let capacity = match &chan.capacity {
                    Some(expr) => match self.eval(expr, env)? {
                        Value::Int(n) if n >= 0 => Some(n as usize),
                        other => {
                            return Err(VmError::Type(format!(
                                "channel capacity must be a non-negative Int, got {}",
                                other
                            ))
                            .into())
                        }
                    },
                    None => None,
                };
                let element_type = chan.element_type.as_ref().map(canonicalize);
                Ok(Value::Channel(Arc::new(Channel::new(element_type, capacity))))
            }

            Expression::InstanceOf(test) => {
                let value = self.eval(&test.value, env)?;
                Ok(Value::Bool(instance_of(
                    self.registry(),
                    &value,
                    &canonicalize(&test.target),
                )))
            }

            Expression::Range(range) => {
                let start = self.eval(&range.start, env)?;
                let end = self.eval(&range.end, env)?;
                match (start, end) {
                    (Value::Int(start), Value::Int(end)) => {
                        let len = (end as i128 - start as i128 + 1).max(0);
                        if len > MAX_SEQUENCE_LEN as i128 {
                            return Err(
                                VmError::SizeLimit(format!("range {}...{}", start, end)).into()
                            );
                        }
                        Ok(Value::array((start..=end).map(Value::Int).collect()))
                    }
                    (start, end) => Err(VmError::Type(format!(
                        "range bounds must be Int, got {} and {}",
                        type_name(&start),
                        type_name(&end)
                    ))
                    .into()),
                }
            }
        }
    }

    /// Resolve an identifier: local scopes, then import aliases.
    fn lookup(&self, name: &str, env: &Env) -> VmResult<Value> {
        if let Some(value) = env.lookup(name) {
            return Ok(value);
        }
        if let Some(module) = env.resolve_import(name) {
            if let Some(value) = env.lookup(&module) {
                return Ok(value);
            }
        }
        Err(VmError::Undefined(name.to_string()))
    }

    fn eval_args(&self, args: &[Expression], env: &Env) -> EvalResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg, env)).collect()
    }

    fn eval_call(&self, call: &CallExpression, env: &Env) -> EvalResult<Value> {
        let site = call.span;
        match &*call.callee {
            Expression::Super(_) => {
                let args = self.eval_args(&call.arguments, env)?;
                self.call_super_constructor(args, env, site)
            }
            Expression::Member(member) => {
                if let Expression::Super(_) = &*member.object {
                    let args = self.eval_args(&call.arguments, env)?;
                    return self.call_super_method(&member.property, args, env, site);
                }
                let object = self.eval(&member.object, env)?;
                let args = self.eval_args(&call.arguments, env)?;
                self.call_method(&object, &member.property, args, &call.type_args, env, site)
            }
            callee => {
                let function = self.eval(callee, env)?;
                let args = self.eval_args(&call.arguments, env)?;
                self.call_value(&function, args, &call.type_args, site)
            }
        }
    }

    // ========================================================================
    // Operators
    // ========================================================================

    pub fn binary_op(&self, op: BinaryOperator, left: Value, right: Value) -> EvalResult<Value> {
        use BinaryOperator::*;
        let result = match op {
            Equal => Value::Bool(left.equals(&right)),
            NotEqual => Value::Bool(!left.equals(&right)),
            Less | LessEqual | Greater | GreaterEqual => {
                let ordering = compare(&left, &right)?;
                Value::Bool(match (op, ordering) {
                    (_, None) => false,
                    (Less, Some(o)) => o == Ordering::Less,
                    (LessEqual, Some(o)) => o != Ordering::Greater,
                    (Greater, Some(o)) => o == Ordering::Greater,
                    (_, Some(o)) => o != Ordering::Less,
                })
            }
            Add => match (&left, &right) {
                (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(*b)),
                (Value::Str(_), _) | (_, Value::Str(_)) => {
                    let mut out = self.stringify(&left)?;
                    out.push_str(&self.stringify(&right)?);
                    Value::from(out)
                }
                (Value::Array(a), Value::Array(b)) => {
                    let mut items = a.read().clone();
                    items.extend(b.read().iter().cloned());
                    Value::array(items)
                }
                _ => arithmetic(op, &left, &right, |a, b| a + b)?,
            },
            Subtract => match (&left, &right) {
                (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_sub(*b)),
                _ => arithmetic(op, &left, &right, |a, b| a - b)?,
            },
            Multiply => match (&left, &right) {
                (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_mul(*b)),
                (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
                    let count = usize::try_from((*n).max(0)).unwrap_or(usize::MAX);
                    match s.len().checked_mul(count) {
                        Some(len) if len <= MAX_SEQUENCE_LEN => Value::from(s.repeat(count)),
                        _ => {
                            return Err(VmError::SizeLimit(format!(
                                "string repeated {} times",
                                n
                            ))
                            .into())
                        }
                    }
                }
                _ => arithmetic(op, &left, &right, |a, b| a * b)?,
            },
            Divide => match (&left, &right) {
                (Value::Int(_), Value::Int(0)) => return Err(VmError::DivisionByZero.into()),
                (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_div(*b)),
                _ => arithmetic(op, &left, &right, |a, b| a / b)?,
            },
            Modulo => match (&left, &right) {
                (Value::Int(_), Value::Int(0)) => return Err(VmError::DivisionByZero.into()),
                (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_rem(*b)),
                _ => arithmetic(op, &left, &right, |a, b| a % b)?,
            },
        };
        Ok(result)
    }

    // ========================================================================
    // Members
    // ========================================================================

    pub fn get_member(&self, object: &Value, name: &str, env: &Env) -> EvalResult<Value> {
        match object {
            Value::Object(inst) => {
                if let Some(value) = inst.field(name) {
                    if let Some((declaring, field)) = inst.class.find_field(name) {
                        self.check_access(field.visibility, name, &declaring.name, env)?;
                    }
                    return Ok(value);
                }
                let candidates = inst.class.find_methods(name);
                if let Some(method) = candidates.first() {
                    self.check_access(method.visibility, name, &method.owner, env)?;
                    return Ok(Value::BoundMethod(Arc::new(BoundMethod::Instance {
                        receiver: Arc::clone(inst),
                        lookup: Arc::clone(&inst.class),
                        name: name.to_string(),
                    })));
                }
                if builtins::has_method(object, name) {
                    return Ok(builtin_method(object, name));
                }
                Err(VmError::attribute(inst.class.name.clone(), name).into())
            }
            Value::Class(class) => {
                if let Some(value) = class.get_static(name) {
                    return Ok(value);
                }
                if !class.find_static_methods(name).is_empty() {
                    return Ok(Value::BoundMethod(Arc::new(BoundMethod::Static {
                        class: Arc::clone(class),
                        name: name.to_string(),
                    })));
                }
                if builtins::has_method(object, name) {
                    return Ok(builtin_method(object, name));
                }
                Err(VmError::attribute(class.name.clone(), name).into())
            }
            Value::Interface(iface) => iface
                .get_static(name)
                .ok_or_else(|| VmError::attribute(iface.name.clone(), name).into()),
            Value::Module(module) => module
                .members
                .get(name)
                .cloned()
                .ok_or_else(|| VmError::attribute(module.name.clone(), name).into()),
            Value::Map(map) => {
                if let Some(value) = map.read().get(&Value::str(name)) {
                    return Ok(value.clone());
                }
                if builtins::has_method(object, name) {
                    return Ok(builtin_method(object, name));
                }
                Ok(Value::Nil)
            }
            _ => {
                if matches!(name, "length" | "size") {
                    if let Some(len) = builtins::length_of(object) {
                        return Ok(Value::Int(len as i64));
                    }
                }
                if builtins::has_method(object, name) {
                    return Ok(builtin_method(object, name));
                }
                Err(VmError::attribute(object.kind_name(), name).into())
            }
        }
    }

    pub(crate) fn set_member(
        &self,
        object: &Value,
        name: &str,
        value: Value,
        env: &Env,
    ) -> EvalResult<()> {
        match object {
            Value::Object(inst) => self.assign_field(inst, name, value, env),
            Value::Class(class) => {
                let owner = class
                    .static_owner(name)
                    .ok_or_else(|| VmError::attribute(class.name.clone(), name))?;
                let (kind, declared) = {
                    let statics = owner.statics.read();
                    match statics.get(name) {
                        Some(slot) => (slot.kind, slot.type_annotation.clone()),
                        None => return Err(VmError::attribute(class.name.clone(), name).into()),
                    }
                };
                if kind.is_immutable() {
                    return Err(VmError::Immutable {
                        kind: "constant",
                        name: format!("{}.{}", owner.name, name),
                    }
                    .into());
                }
                if let Some(ty) = &declared {
                    self.check_value(&value, ty, &Default::default(), || {
                        format!("static field '{}' of {}", name, owner.name)
                    })?;
                }
                if let Some(slot) = owner.statics.write().get_mut(name) {
                    slot.value = value;
                }
                Ok(())
            }
            Value::Interface(iface) => Err(VmError::Immutable {
                kind: "interface field",
                name: format!("{}.{}", iface.name, name),
            }
            .into()),
            Value::Map(map) => {
                map.write().insert(Value::str(name), value);
                Ok(())
            }
            other => Err(VmError::Type(format!(
                "cannot set attribute '{}' on {}",
                name,
                type_name(other)
            ))
            .into()),
        }
    }

    fn assign_field(&self, inst: &Arc<Instance>, name: &str, value: Value, env: &Env) -> EvalResult<()> {
        if inst.class.kind == ClassKind::Record {
            return Err(VmError::Immutable {
                kind: "record component",
                name: name.to_string(),
            }
            .into());
        }
        if let Some((declaring, field)) = inst.class.find_field(name) {
            self.check_access(field.visibility, name, &declaring.name, env)?;
            if field.kind.is_immutable() && !inst.is_constructing() {
                let kind = match field.kind {
                    crate::parser::ast::BindingKind::Const => "constant",
                    _ => "final field",
                };
                return Err(VmError::Immutable {
                    kind,
                    name: name.to_string(),
                }
                .into());
            }
            if let Some(ty) = &field.type_annotation {
                let bindings = bindings_for(inst, &declaring.name);
                self.check_value(&value, ty, &bindings, || {
                    format!("field '{}' of {}", name, inst.class.name)
                })?;
            }
        }
        inst.set_field(name, value);
        Ok(())
    }

    // ========================================================================
    // Indexing
    // ========================================================================

    pub fn get_index(&self, object: &Value, key: &Value) -> EvalResult<Value> {
        match object {
            Value::Array(items) => {
                let items = items.read();
                let index = index_of(key, items.len())?;
                Ok(items[index].clone())
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let index = index_of(key, chars.len())?;
                Ok(Value::str(chars[index].to_string()))
            }
            Value::Map(map) => Ok(map.read().get(key).cloned().unwrap_or(Value::Nil)),
            Value::Collection(collection) => match &*collection.data.read() {
                CollectionData::Seq(items) => {
                    let index = index_of(key, items.len())?;
                    Ok(items[index].clone())
                }
                CollectionData::Map(map) => Ok(map.get(key).cloned().unwrap_or(Value::Nil)),
            },
            other => Err(VmError::Type(format!("'{}' object is not indexable", type_name(other))).into()),
        }
    }

    pub(crate) fn set_index(&self, object: &Value, key: Value, value: Value) -> EvalResult<()> {
        match object {
            Value::Array(items) => {
                let mut items = items.write();
                let index = index_of(&key, items.len())?;
                items[index] = value;
                Ok(())
            }
            Value::Map(map) => {
                map.write().insert(key, value);
                Ok(())
            }
            Value::Collection(collection) if collection.kind != CollectionKind::Set => {
                builtins::check_collection_element(self, collection, Some(&key), &value)?;
                match &mut *collection.data.write() {
                    CollectionData::Seq(items) => {
                        let index = index_of(&key, items.len())?;
                        items[index] = value;
                    }
                    CollectionData::Map(map) => {
                        map.insert(key, value);
                    }
                }
                Ok(())
            }
            other => Err(VmError::Type(format!(
                "'{}' object does not support item assignment",
                type_name(other)
            ))
            .into()),
        }
    }
}

fn builtin_method(receiver: &Value, name: &str) -> Value {
    Value::BoundMethod(Arc::new(BoundMethod::Builtin {
        receiver: receiver.clone(),
        name: name.to_string(),
    }))
}

/// Validate an index against a sequence length.
pub(crate) fn index_of(key: &Value, len: usize) -> VmResult<usize> {
    match key {
        Value::Int(i) if *i >= 0 && (*i as usize) < len => Ok(*i as usize),
        Value::Int(i) => Err(VmError::Index { index: *i, len }),
        other => Err(VmError::type_mismatch("Int index", type_name(other))),
    }
}

fn arithmetic(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
    apply: impl Fn(f64, f64) -> f64,
) -> VmResult<Value> {
    match (left, right) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (a, b) = (left.as_float().unwrap_or(0.0), right.as_float().unwrap_or(0.0));
            Ok(Value::Float(apply(a, b)))
        }
        _ => Err(VmError::Type(format!(
            "unsupported operand types for {}: {} and {}",
            op.symbol(),
            type_name(left),
            type_name(right)
        ))),
    }
}

/// Order numbers with numbers and strings with strings.
pub(crate) fn compare(left: &Value, right: &Value) -> VmResult<Option<Ordering>> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (a, b) = (left.as_float().unwrap_or(0.0), right.as_float().unwrap_or(0.0));
            Ok(a.partial_cmp(&b))
        }
        _ => Err(VmError::Type(format!(
            "cannot compare {} and {}",
            type_name(left),
            type_name(right)
        ))),
    }
}
