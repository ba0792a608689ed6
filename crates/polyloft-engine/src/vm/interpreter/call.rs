//! Calls: functions, methods, constructors and builtins
//!
//! Every user-defined body runs through [`Interpreter::invoke`], which owns
//! the frame lifecycle: variadic packing, parameter checks, defers, the
//! return type check and the trace line added to faults.

use super::{EvalResult, Flow, Interpreter, Signal};
use crate::parser::ast::{BindingKind, Param, TypeExpr, TypeParam, Visibility};
use crate::parser::token::Span;
use crate::vm::builtins;
use crate::vm::env::{Env, Receiver};
use crate::vm::object::{ClassKind, Instance, MethodDef};
use crate::vm::overload::{arity_error, pack_arguments, select_overload, Signature};
use crate::vm::types::generics::{
    any_type, bindings_for, canonical_name, canonicalize, check_bounds, infer_type_args, render_type,
    substitute, type_name, value_conforms,
};
use crate::vm::types::TypeBindings;
use crate::vm::value::{BoundMethod, Function, FunctionBody, Value};
use crate::vm::{VmError, VmResult};
use std::sync::Arc;

/// One call of a user-defined body.
pub struct Invocation<'a> {
    /// Frame name, also used in fault traces
    pub name: String,
    pub params: &'a [Param],
    pub return_type: Option<&'a TypeExpr>,
    pub body: &'a FunctionBody,
    pub closure: &'a Env,
    pub receiver: Option<Receiver>,
    /// Type parameter bindings used by parameter and return checks
    pub bindings: TypeBindings,
    /// Extra bindings visible to the body (record components)
    pub locals: Vec<(String, Value)>,
}

impl Interpreter {
    /// Call any callable value.
    pub fn call_value(
        &self,
        callee: &Value,
        args: Vec<Value>,
        type_args: &[TypeExpr],
        site: Span,
    ) -> EvalResult<Value> {
        match callee {
            Value::Function(function) => self.call_function(function, args, type_args, site),
            Value::Native(native) => (native.func)(
                self,
                crate::vm::value::NativeCall {
                    args,
                    type_args: type_args.iter().map(canonicalize).collect(),
                },
            ),
            Value::BoundMethod(bound) => match &**bound {
                BoundMethod::Instance {
                    receiver,
                    lookup,
                    name,
                } => {
                    let candidates = lookup.find_methods(name);
                    let method = select_overload(&candidates, args.len())
                        .ok_or_else(|| arity_error(&candidates, args.len()))?;
                    self.invoke_method(receiver, &method, args, site)
                }
                BoundMethod::Static { class, name } => {
                    let candidates = class.find_static_methods(name);
                    let method = select_overload(&candidates, args.len())
                        .ok_or_else(|| arity_error(&candidates, args.len()))?;
                    self.invoke_static(&method, args, site)
                }
                BoundMethod::Builtin { receiver, name } => {
                    builtins::call_method(self, receiver, name, args, site)
                }
            },
            Value::Class(class) => self.instantiate(class, type_args, args, site),
            other => Err(VmError::NotCallable(type_name(other)).into()),
        }
    }

    /// Call a callback from a builtin; extra arguments beyond the
    /// lambda's parameter count are dropped.
    pub fn call_callback(&self, callee: &Value, mut args: Vec<Value>) -> EvalResult<Value> {
        if let Value::Function(function) = callee {
            if !function.is_variadic() && args.len() > function.params.len() {
                args.truncate(function.params.len());
            }
        }
        self.call_value(callee, args, &[], Span::default())
    }

    fn call_function(
        &self,
        function: &Arc<Function>,
        args: Vec<Value>,
        type_args: &[TypeExpr],
        site: Span,
    ) -> EvalResult<Value> {
        if !function.accepts(args.len()) {
            return Err(arity_error(std::slice::from_ref(function), args.len()).into());
        }
        let bindings =
            self.function_bindings(&function.type_params, &function.params, &args, type_args)?;
        self.invoke(
            Invocation {
                name: function.name.clone(),
                params: &function.params,
                return_type: function.return_type.as_ref(),
                body: &function.body,
                closure: &function.closure,
                receiver: None,
                bindings,
                locals: Vec::new(),
            },
            args,
            site,
        )
    }

    /// Bind a generic function's type parameters for one call.
    ///
    /// Explicit arguments bind as given. Otherwise they are inferred from
    /// the arguments for the bound check, and the parameters then check
    /// against their bounds only.
    fn function_bindings(
        &self,
        type_params: &[TypeParam],
        params: &[Param],
        args: &[Value],
        explicit: &[TypeExpr],
    ) -> VmResult<TypeBindings> {
        let mut bindings = TypeBindings::default();
        if type_params.is_empty() {
            return Ok(bindings);
        }
        let actual: Vec<TypeExpr> = if explicit.is_empty() {
            infer_type_args(type_params, params, args)
        } else {
            explicit.iter().map(canonicalize).collect()
        };
        check_bounds(self.registry(), type_params, &actual)?;
        for (param, ty) in type_params.iter().zip(&actual) {
            let bound = if explicit.is_empty() {
                param.bound.clone().unwrap_or_else(any_type)
            } else {
                ty.clone()
            };
            bindings.insert(param.name.clone(), bound);
        }
        Ok(bindings)
    }

    /// Call a method on an object, checking visibility from `env`.
    pub fn call_method(
        &self,
        object: &Value,
        name: &str,
        args: Vec<Value>,
        type_args: &[TypeExpr],
        env: &Env,
        site: Span,
    ) -> EvalResult<Value> {
        match object {
            Value::Object(inst) => {
                let candidates = inst.class.find_methods(name);
                if !candidates.is_empty() {
                    let method = select_overload(&candidates, args.len())
                        .ok_or_else(|| arity_error(&candidates, args.len()))?;
                    self.check_access(method.visibility, name, &method.owner, env)?;
                    return self.invoke_method(inst, &method, args, site);
                }
                if let Some(field) = inst.field(name) {
                    if let Some((declaring, decl)) = inst.class.find_field(name) {
                        self.check_access(decl.visibility, name, &declaring.name, env)?;
                    }
                    return self.call_value(&field, args, type_args, site);
                }
                builtins::call_method(self, object, name, args, site)
            }
            Value::Class(class) => {
                let candidates = class.find_static_methods(name);
                if !candidates.is_empty() {
                    let method = select_overload(&candidates, args.len())
                        .ok_or_else(|| arity_error(&candidates, args.len()))?;
                    self.check_access(method.visibility, name, &method.owner, env)?;
                    return self.invoke_static(&method, args, site);
                }
                match class.get_static(name) {
                    Some(value) => self.call_value(&value, args, type_args, site),
                    None => builtins::call_method(self, object, name, args, site),
                }
            }
            Value::Interface(iface) => match iface.get_static(name) {
                Some(value) => self.call_value(&value, args, type_args, site),
                None => Err(VmError::attribute(iface.name.clone(), name).into()),
            },
            Value::Module(module) => match module.members.get(name) {
                Some(member) => self.call_value(member, args, type_args, site),
                None => Err(VmError::attribute(module.name.clone(), name).into()),
            },
            Value::Map(map) => {
                let entry = map.read().get(&Value::str(name)).cloned();
                match entry {
                    Some(value) if value.is_callable() => self.call_value(&value, args, type_args, site),
                    _ => builtins::call_method(self, object, name, args, site),
                }
            }
            other => builtins::call_method(self, other, name, args, site),
        }
    }

    /// Run `method` with `inst` as the receiver.
    pub(crate) fn invoke_method(
        &self,
        inst: &Arc<Instance>,
        method: &Arc<MethodDef>,
        args: Vec<Value>,
        site: Span,
    ) -> EvalResult<Value> {
        let body = method.body.as_ref().ok_or_else(|| {
            VmError::Runtime(format!("method '{}' of {} has no body", method.name, method.owner))
        })?;
        if !method.accepts(args.len()) {
            return Err(arity_error(std::slice::from_ref(method), args.len()).into());
        }

        let declaring = inst
            .class
            .lineage()
            .into_iter()
            .find(|class| class.name == method.owner)
            .unwrap_or_else(|| Arc::clone(&inst.class));
        let mut bindings = if declaring.name == method.owner {
            bindings_for(inst, &method.owner)
        } else {
            TypeBindings::default()
        };
        for param in &method.type_params {
            bindings.insert(param.name.clone(), param.bound.clone().unwrap_or_else(any_type));
        }

        let locals = if inst.class.kind == ClassKind::Record {
            inst.class
                .components
                .iter()
                .map(|c| (c.name.clone(), inst.field(&c.name).unwrap_or(Value::Nil)))
                .collect()
        } else {
            Vec::new()
        };

        self.invoke(
            Invocation {
                name: format!("{}.{}", inst.class.name, method.name),
                params: &method.params,
                return_type: method.return_type.as_ref(),
                body,
                closure: &method.closure,
                receiver: Some(Receiver {
                    this: Value::Object(Arc::clone(inst)),
                    class: declaring,
                }),
                bindings,
                locals,
            },
            args,
            site,
        )
    }

    fn invoke_static(&self, method: &Arc<MethodDef>, args: Vec<Value>, site: Span) -> EvalResult<Value> {
        let body = method.body.as_ref().ok_or_else(|| {
            VmError::Runtime(format!("method '{}' of {} has no body", method.name, method.owner))
        })?;
        let bindings = method
            .type_params
            .iter()
            .map(|p| (p.name.clone(), p.bound.clone().unwrap_or_else(any_type)))
            .collect();
        self.invoke(
            Invocation {
                name: format!("{}.{}", method.owner, method.name),
                params: &method.params,
                return_type: method.return_type.as_ref(),
                body,
                closure: &method.closure,
                receiver: None,
                bindings,
                locals: Vec::new(),
            },
            args,
            site,
        )
    }

    /// Run a user-defined body in a new frame.
    pub fn invoke(&self, invocation: Invocation<'_>, args: Vec<Value>, site: Span) -> EvalResult<Value> {
        let _depth = self.enter()?;
        self.invoke_frame(&invocation, args).map_err(|signal| match signal {
            Signal::Fault(mut fault) => {
                fault.push_frame(&invocation.name, site);
                Signal::Fault(fault)
            }
            thrown => thrown,
        })
    }

    fn invoke_frame(&self, invocation: &Invocation<'_>, args: Vec<Value>) -> EvalResult<Value> {
        let args = pack_arguments(invocation.params, args);
        let env = invocation
            .closure
            .frame(&invocation.name, invocation.receiver.clone());
        for (name, value) in &invocation.locals {
            env.define(name.clone(), value.clone(), BindingKind::Final);
        }
        for (param, arg) in invocation.params.iter().zip(args) {
            if let Some(ty) = &param.type_annotation {
                self.check_argument(&invocation.name, param, &arg, ty, &invocation.bindings)?;
            }
            env.define(param.name.clone(), arg, BindingKind::Var);
        }

        let outcome = match invocation.body {
            FunctionBody::Block(block) => self.exec_block(block, &env),
            FunctionBody::Expression(expr) => match self.eval(expr, &env) {
                Ok(value) => Ok(Flow::Value(value)),
                Err(Signal::Throw(exception)) => Ok(Flow::Thrown(exception)),
                Err(Signal::Fault(fault)) => Err(fault),
            },
        };
        let value = match self.finish_frame(&env, outcome)? {
            Flow::Value(value) | Flow::Return(value) => value,
            Flow::Thrown(exception) => return Err(Signal::Throw(exception)),
            Flow::Break => return Err(VmError::ControlOutsideLoop("break").into()),
            Flow::Continue => return Err(VmError::ControlOutsideLoop("continue").into()),
        };

        match invocation.return_type {
            Some(ty) if is_void(ty) => Ok(Value::Nil),
            Some(ty) => {
                self.check_value(&value, ty, &invocation.bindings, || {
                    format!("return value of {}", invocation.name)
                })?;
                Ok(value)
            }
            None => Ok(value),
        }
    }

    fn check_argument(
        &self,
        function: &str,
        param: &Param,
        arg: &Value,
        ty: &TypeExpr,
        bindings: &TypeBindings,
    ) -> VmResult<()> {
        let describe = || format!("argument '{}' of {}", param.name, function);
        if param.variadic {
            if let Value::Array(items) = arg {
                for item in items.read().iter() {
                    self.check_value(item, ty, bindings, describe)?;
                }
            }
            return Ok(());
        }
        self.check_value(arg, ty, bindings, describe)
    }

    /// Fail with `<what>: expected T, got U` unless `value` conforms to `ty`.
    pub(crate) fn check_value(
        &self,
        value: &Value,
        ty: &TypeExpr,
        bindings: &TypeBindings,
        what: impl FnOnce() -> String,
    ) -> VmResult<()> {
        if value_conforms(self.registry(), value, ty, bindings) {
            return Ok(());
        }
        Err(VmError::Type(format!(
            "{}: expected {}, got {}",
            what(),
            render_type(&substitute(ty, bindings)),
            type_name(value)
        )))
    }

    /// Enforce member visibility against the class of the running method.
    pub(crate) fn check_access(
        &self,
        visibility: Visibility,
        member: &str,
        declaring: &str,
        env: &Env,
    ) -> VmResult<()> {
        let label = match visibility {
            Visibility::Public => return Ok(()),
            Visibility::Private => "private",
            Visibility::Protected => "protected",
        };
        let caller = env.receiver().map(|receiver| receiver.class);
        let allowed = match (visibility, &caller) {
            (_, None) => false,
            (Visibility::Private, Some(caller)) => caller.name == declaring,
            (_, Some(caller)) => {
                caller.is_a(declaring) || self.registry().is_subtype_of(declaring, &caller.name)
            }
        };
        if allowed {
            Ok(())
        } else {
            Err(VmError::Visibility {
                visibility: label,
                member: member.to_string(),
                class: declaring.to_string(),
            })
        }
    }

    // ========================================================================
    // super
    // ========================================================================

    fn current_receiver(&self, env: &Env) -> VmResult<(Arc<Instance>, Receiver)> {
        let receiver = env
            .receiver()
            .ok_or_else(|| VmError::Runtime("'super' used outside of a method".to_string()))?;
        match &receiver.this {
            Value::Object(inst) => Ok((Arc::clone(inst), receiver.clone())),
            _ => Err(VmError::Runtime("'super' used outside of a method".to_string())),
        }
    }

    /// `super(args)` inside a constructor.
    pub(crate) fn call_super_constructor(
        &self,
        args: Vec<Value>,
        env: &Env,
        site: Span,
    ) -> EvalResult<Value> {
        let (inst, receiver) = self.current_receiver(env)?;
        let parent = receiver.class.parent.clone().ok_or_else(|| {
            VmError::Runtime(format!("class {} has no parent class", receiver.class.name))
        })?;
        let table = parent.constructor_table();
        if table.is_empty() {
            if args.is_empty() {
                return Ok(Value::Nil);
            }
            return Err(VmError::NoConstructor {
                class: parent.name.clone(),
                got: args.len(),
            }
            .into());
        }
        let constructor = select_overload(&table, args.len()).ok_or_else(|| VmError::NoConstructor {
            class: parent.name.clone(),
            got: args.len(),
        })?;
        self.invoke_method(&inst, &constructor, args, site)?;
        Ok(Value::Nil)
    }

    /// `super.name(args)`
    pub(crate) fn call_super_method(
        &self,
        name: &str,
        args: Vec<Value>,
        env: &Env,
        site: Span,
    ) -> EvalResult<Value> {
        let (inst, receiver) = self.current_receiver(env)?;
        let parent = receiver.class.parent.clone().ok_or_else(|| {
            VmError::Runtime(format!("class {} has no parent class", receiver.class.name))
        })?;
        let candidates = parent.find_methods(name);
        if candidates.is_empty() {
            return builtins::call_method(self, &Value::Object(inst), name, args, site);
        }
        let method = select_overload(&candidates, args.len())
            .ok_or_else(|| arity_error(&candidates, args.len()))?;
        self.invoke_method(&inst, &method, args, site)
    }

    /// `super.name` without a call.
    pub(crate) fn super_member(&self, name: &str, env: &Env) -> EvalResult<Value> {
        let (inst, receiver) = self.current_receiver(env)?;
        let parent = receiver.class.parent.clone().ok_or_else(|| {
            VmError::Runtime(format!("class {} has no parent class", receiver.class.name))
        })?;
        if parent.find_methods(name).is_empty() {
            return Err(VmError::attribute(parent.name.clone(), name).into());
        }
        Ok(Value::BoundMethod(Arc::new(BoundMethod::Instance {
            receiver: inst,
            lookup: parent,
            name: name.to_string(),
        })))
    }
}

fn is_void(ty: &TypeExpr) -> bool {
    ty.head_name().map(canonical_name).as_deref() == Some("Void")
}
