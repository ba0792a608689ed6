//! Type declarations and instance construction

use super::{EvalResult, Interpreter};
use crate::parser::ast::{
    ClassDecl, ConstructorDecl, EnumDecl, FieldDecl, FunctionDecl, InterfaceDecl, MethodDecl,
    Param, RecordDecl, TypeExpr, Visibility,
};
use crate::parser::token::Span;
use crate::vm::env::{Env, Receiver};
use crate::vm::object::{
    ClassDef, ClassKind, FieldDef, Instance, InterfaceDef, MethodDef, MethodTable, StaticSlot,
};
use crate::vm::overload::select_overload;
use crate::vm::types::generics::{
    bind_params, bindings_for, canonicalize, check_bounds, check_variance, infer_type_args, is_any,
};
use crate::vm::types::TypeBindings;
use crate::vm::value::{FunctionBody, Value};
use crate::vm::{VmError, VmResult};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

fn canonical_params(params: &[Param]) -> Vec<Param> {
    params
        .iter()
        .map(|p| Param {
            type_annotation: p.type_annotation.as_ref().map(canonicalize),
            ..p.clone()
        })
        .collect()
}

fn type_head(ty: &TypeExpr) -> VmResult<&str> {
    ty.head_name()
        .ok_or_else(|| VmError::Type(format!("invalid supertype {:?}", ty)))
}

fn permits(permitted: &[String], name: &str) -> bool {
    permitted.is_empty() || permitted.iter().any(|p| p == name)
}

impl Interpreter {
    // ========================================================================
    // Resolution
    // ========================================================================

    fn resolve_parent(&self, ty: &TypeExpr, child: &str, env: &Env) -> VmResult<Arc<ClassDef>> {
        let name = type_head(ty)?;
        let parent = match self.registry().class(name) {
            Some(class) => class,
            None => match env.lookup(name) {
                Some(Value::Class(class)) => class,
                Some(Value::Interface(_)) => {
                    return Err(VmError::Type(format!(
                        "class {} cannot extend interface {}; use implements",
                        child, name
                    )))
                }
                _ => return Err(VmError::Undefined(name.to_string())),
            },
        };
        if parent.kind != ClassKind::Class {
            return Err(VmError::Type(format!(
                "class {} cannot extend {} {}",
                child,
                parent.kind.keyword().to_lowercase(),
                parent.name
            )));
        }
        if parent.is_sealed && !permits(&parent.permits, child) {
            return Err(VmError::SealedPermit(format!(
                "class {} is sealed and does not permit {} to inherit",
                parent.name, child
            )));
        }
        Ok(parent)
    }

    fn resolve_interfaces(
        &self,
        types: &[TypeExpr],
        dependent: &str,
        env: &Env,
    ) -> VmResult<Vec<Arc<InterfaceDef>>> {
        let mut resolved = Vec::with_capacity(types.len());
        for ty in types {
            let name = type_head(ty)?;
            let iface = match self.registry().interface(name) {
                Some(iface) => iface,
                None => match env.lookup(name) {
                    Some(Value::Interface(iface)) => iface,
                    Some(Value::Class(_)) => {
                        return Err(VmError::Type(format!("{} is not an interface", name)))
                    }
                    _ => return Err(VmError::Undefined(name.to_string())),
                },
            };
            if iface.is_sealed && !permits(&iface.permits, dependent) {
                return Err(VmError::SealedPermit(format!(
                    "interface {} is sealed and does not permit {} to implement it",
                    iface.name, dependent
                )));
            }
            resolved.push(iface);
        }
        Ok(resolved)
    }

    // ========================================================================
    // Members
    // ========================================================================

    fn method_def(
        &self,
        function: &FunctionDecl,
        owner: &str,
        visibility: Visibility,
        is_static: bool,
        has_body: bool,
        env: &Env,
    ) -> MethodDef {
        MethodDef {
            name: function.name.clone(),
            owner: owner.to_string(),
            type_params: function.type_params.clone(),
            params: canonical_params(&function.params),
            return_type: function.return_type.as_ref().map(canonicalize),
            body: has_body.then(|| FunctionBody::Block(Arc::clone(&function.body))),
            visibility,
            is_static,
            closure: env.clone(),
        }
    }

    /// Split method declarations into instance and static tables.
    fn method_tables(&self, methods: &[MethodDecl], owner: &str, env: &Env) -> (MethodTable, MethodTable) {
        let mut instance = MethodTable::default();
        let mut statics = MethodTable::default();
        for method in methods {
            let def = Arc::new(self.method_def(
                &method.function,
                owner,
                method.modifiers.visibility,
                method.modifiers.is_static,
                method.has_body && !method.modifiers.is_abstract,
                env,
            ));
            let table = if method.modifiers.is_static {
                &mut statics
            } else {
                &mut instance
            };
            table.entry(def.name.clone()).or_default().push(def);
        }
        (instance, statics)
    }

    fn constructor_defs(&self, constructors: &[ConstructorDecl], owner: &str, env: &Env) -> Vec<Arc<MethodDef>> {
        constructors
            .iter()
            .map(|ctor| {
                Arc::new(MethodDef {
                    name: owner.to_string(),
                    owner: owner.to_string(),
                    type_params: Vec::new(),
                    params: canonical_params(&ctor.params),
                    return_type: None,
                    body: Some(FunctionBody::Block(Arc::clone(&ctor.body))),
                    visibility: Visibility::Public,
                    is_static: false,
                    closure: env.clone(),
                })
            })
            .collect()
    }

    fn field_defs(fields: &[FieldDecl]) -> Vec<FieldDef> {
        fields
            .iter()
            .filter(|f| !f.modifiers.is_static)
            .map(|f| FieldDef {
                name: f.name.clone(),
                kind: f.kind,
                visibility: f.modifiers.visibility,
                type_annotation: f.type_annotation.as_ref().map(canonicalize),
                initializer: f.initializer.clone(),
            })
            .collect()
    }

    /// Evaluate static field initializers into `statics`.
    fn init_statics<'a>(
        &self,
        fields: impl IntoIterator<Item = &'a FieldDecl>,
        owner: &str,
        statics: &RwLock<FxHashMap<String, StaticSlot>>,
        env: &Env,
    ) -> EvalResult<()> {
        for field in fields {
            let value = match &field.initializer {
                Some(init) => self.eval(init, env)?,
                None => Value::Nil,
            };
            let declared = field.type_annotation.as_ref().map(canonicalize);
            if let Some(ty) = &declared {
                self.check_value(&value, ty, &TypeBindings::default(), || {
                    format!("static field '{}' of {}", field.name, owner)
                })?;
            }
            statics.write().insert(
                field.name.clone(),
                StaticSlot {
                    value,
                    kind: field.kind,
                    type_annotation: declared,
                },
            );
        }
        Ok(())
    }

    /// A concrete class must implement every abstract method it inherits.
    fn check_implemented(&self, class: &Arc<ClassDef>) -> VmResult<()> {
        for iface in class.all_interfaces() {
            for (name, overloads) in &iface.methods {
                if overloads.iter().any(|m| m.is_abstract()) && class.find_methods(name).is_empty() {
                    return Err(VmError::Type(format!(
                        "class {} must implement abstract method '{}' of interface {}",
                        class.name, name, iface.name
                    )));
                }
            }
        }
        for ancestor in class.lineage() {
            for (name, overloads) in &ancestor.methods {
                if overloads.iter().any(|m| m.is_abstract()) && class.find_methods(name).is_empty() {
                    return Err(VmError::Type(format!(
                        "class {} must implement abstract method '{}' of {}",
                        class.name, name, ancestor.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn publish_class(&self, class: &Arc<ClassDef>, env: &Env) {
        self.registry().register_class(Arc::clone(class));
        env.define(
            class.name.clone(),
            Value::Class(Arc::clone(class)),
            crate::parser::ast::BindingKind::Const,
        );
        tracing::debug!(name = %class.name, kind = class.kind.keyword(), "declared type");
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    pub(crate) fn declare_class(&self, decl: &ClassDecl, env: &Env) -> EvalResult<()> {
        let (parent, parent_args) = match &decl.parent {
            Some(ty) => {
                let parent = self.resolve_parent(ty, &decl.name, env)?;
                let args = match ty {
                    TypeExpr::Named(named) => named.args.iter().map(canonicalize).collect(),
                    _ => Vec::new(),
                };
                (Some(parent), args)
            }
            None => (None, Vec::new()),
        };
        let interfaces = self.resolve_interfaces(&decl.interfaces, &decl.name, env)?;
        let (methods, static_methods) = self.method_tables(&decl.methods, &decl.name, env);
        check_variance(&decl.type_params, methods.values().flatten().map(|m| m.as_ref()))?;

        let class = Arc::new(ClassDef {
            name: decl.name.clone(),
            kind: ClassKind::Class,
            type_params: decl.type_params.clone(),
            parent,
            parent_args,
            interfaces,
            is_abstract: decl.is_abstract,
            is_sealed: decl.is_sealed,
            permits: decl.permits.clone(),
            fields: Self::field_defs(&decl.fields),
            methods,
            static_methods,
            constructors: self.constructor_defs(&decl.constructors, &decl.name, env),
            statics: RwLock::new(FxHashMap::default()),
            components: Vec::new(),
            enum_values: RwLock::new(Vec::new()),
            closure: env.clone(),
        });
        if !class.is_abstract {
            self.check_implemented(&class)?;
        }
        self.publish_class(&class, env);
        self.init_statics(
            decl.fields.iter().filter(|f| f.modifiers.is_static),
            &class.name,
            &class.statics,
            env,
        )
    }

    pub(crate) fn declare_interface(&self, decl: &InterfaceDecl, env: &Env) -> EvalResult<()> {
        let parents = self.resolve_interfaces(&decl.parents, &decl.name, env)?;
        let mut methods = MethodTable::default();
        for method in &decl.methods {
            let def = Arc::new(self.method_def(
                &method.function,
                &decl.name,
                method.modifiers.visibility,
                method.modifiers.is_static,
                method.has_body,
                env,
            ));
            methods.entry(def.name.clone()).or_default().push(def);
        }
        check_variance(&decl.type_params, methods.values().flatten().map(|m| m.as_ref()))?;

        let iface = Arc::new(InterfaceDef {
            name: decl.name.clone(),
            type_params: decl.type_params.clone(),
            parents,
            is_sealed: decl.is_sealed,
            permits: decl.permits.clone(),
            methods,
            statics: RwLock::new(FxHashMap::default()),
        });
        self.registry().register_interface(Arc::clone(&iface));
        env.define(
            decl.name.clone(),
            Value::Interface(Arc::clone(&iface)),
            crate::parser::ast::BindingKind::Const,
        );
        tracing::debug!(name = %decl.name, kind = "Interface", "declared type");
        self.init_statics(&decl.static_fields, &decl.name, &iface.statics, env)
    }

    pub(crate) fn declare_enum(&self, decl: &EnumDecl, env: &Env) -> EvalResult<()> {
        let interfaces = self.resolve_interfaces(&decl.interfaces, &decl.name, env)?;
        let (methods, static_methods) = self.method_tables(&decl.methods, &decl.name, env);
        let class = Arc::new(ClassDef {
            name: decl.name.clone(),
            kind: ClassKind::Enum,
            type_params: Vec::new(),
            parent: None,
            parent_args: Vec::new(),
            interfaces,
            is_abstract: false,
            is_sealed: decl.is_sealed,
            permits: decl.permits.clone(),
            fields: Self::field_defs(&decl.fields),
            methods,
            static_methods,
            constructors: self.constructor_defs(&decl.constructors, &decl.name, env),
            statics: RwLock::new(FxHashMap::default()),
            components: Vec::new(),
            enum_values: RwLock::new(Vec::new()),
            closure: env.clone(),
        });
        self.check_implemented(&class)?;
        self.publish_class(&class, env);

        for (ordinal, constant) in decl.values.iter().enumerate() {
            let args = constant
                .arguments
                .iter()
                .map(|arg| self.eval(arg, env))
                .collect::<EvalResult<Vec<_>>>()?;
            let inst = Arc::new(Instance::enum_constant(
                Arc::clone(&class),
                constant.name.clone(),
                ordinal,
            ));
            let constructor = if class.constructors.is_empty() {
                if !args.is_empty() {
                    return Err(VmError::NoConstructor {
                        class: class.name.clone(),
                        got: args.len(),
                    }
                    .into());
                }
                None
            } else {
                Some(select_overload(&class.constructors, args.len()).ok_or_else(|| {
                    VmError::NoConstructor {
                        class: class.name.clone(),
                        got: args.len(),
                    }
                })?)
            };
            inst.set_constructing(true);
            let built = self.construct(&inst, constructor.as_ref(), args, constant.span);
            inst.set_constructing(false);
            built?;

            let value = Value::Object(inst);
            class.enum_values.write().push(value.clone());
            class.statics.write().insert(
                constant.name.clone(),
                StaticSlot {
                    value,
                    kind: crate::parser::ast::BindingKind::Const,
                    type_annotation: None,
                },
            );
        }

        self.init_statics(
            decl.fields.iter().filter(|f| f.modifiers.is_static),
            &class.name,
            &class.statics,
            env,
        )
    }

    pub(crate) fn declare_record(&self, decl: &RecordDecl, env: &Env) -> EvalResult<()> {
        let interfaces = self.resolve_interfaces(&decl.interfaces, &decl.name, env)?;
        let (methods, static_methods) = self.method_tables(&decl.methods, &decl.name, env);
        check_variance(&decl.type_params, methods.values().flatten().map(|m| m.as_ref()))?;
        let class = Arc::new(ClassDef {
            name: decl.name.clone(),
            kind: ClassKind::Record,
            type_params: decl.type_params.clone(),
            parent: None,
            parent_args: Vec::new(),
            interfaces,
            is_abstract: false,
            is_sealed: false,
            permits: Vec::new(),
            fields: Vec::new(),
            methods,
            static_methods,
            constructors: Vec::new(),
            statics: RwLock::new(FxHashMap::default()),
            components: canonical_params(&decl.components),
            enum_values: RwLock::new(Vec::new()),
            closure: env.clone(),
        });
        self.check_implemented(&class)?;
        self.publish_class(&class, env);
        Ok(())
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// `Name(args)` / `Name<T>(args)`
    pub fn instantiate(
        &self,
        class: &Arc<ClassDef>,
        type_args: &[TypeExpr],
        args: Vec<Value>,
        site: Span,
    ) -> EvalResult<Value> {
        match class.kind {
            ClassKind::Enum => {
                return Err(VmError::Type(format!("cannot instantiate enum {}", class.name)).into())
            }
            ClassKind::Record => return self.construct_record(class, type_args, args),
            ClassKind::Class => {}
        }
        if class.is_abstract {
            return Err(VmError::AbstractInstantiation(class.name.clone()).into());
        }

        let table = class.constructor_table();
        let constructor = if table.is_empty() {
            if !args.is_empty() {
                return Err(VmError::NoConstructor {
                    class: class.name.clone(),
                    got: args.len(),
                }
                .into());
            }
            None
        } else {
            Some(
                select_overload(&table, args.len()).ok_or_else(|| VmError::NoConstructor {
                    class: class.name.clone(),
                    got: args.len(),
                })?,
            )
        };

        let ctor_params = constructor.as_ref().map(|c| c.params.as_slice()).unwrap_or(&[]);
        let type_args = self.class_type_args(class, type_args, ctor_params, &args)?;
        check_bounds(self.registry(), &class.type_params, &type_args)?;

        let inst = Arc::new(Instance::new(Arc::clone(class), type_args));
        inst.set_constructing(true);
        let built = self.construct(&inst, constructor.as_ref(), args, site);
        inst.set_constructing(false);
        built?;
        Ok(Value::Object(inst))
    }

    /// Explicit type arguments, or those inferred from constructor
    /// parameters annotated with a bare type parameter.
    fn class_type_args(
        &self,
        class: &ClassDef,
        explicit: &[TypeExpr],
        params: &[Param],
        args: &[Value],
    ) -> VmResult<Vec<TypeExpr>> {
        if !explicit.is_empty() {
            let variadic = class.type_params.last().is_some_and(|p| p.variadic);
            let expected = class.type_params.len();
            let count_ok = if variadic {
                explicit.len() + 1 >= expected
            } else {
                explicit.len() == expected
            };
            if !count_ok {
                return Err(VmError::Type(format!(
                    "{} expects {} type argument(s), got {}",
                    class.name,
                    expected,
                    explicit.len()
                )));
            }
            return Ok(explicit.iter().map(canonicalize).collect());
        }
        if class.type_params.is_empty() {
            return Ok(Vec::new());
        }
        let inferred = infer_type_args(&class.type_params, params, args);
        if inferred.iter().all(is_any) {
            return Ok(Vec::new());
        }
        Ok(inferred)
    }

    /// Initialize fields parent-first, then run the constructor.
    fn construct(
        &self,
        inst: &Arc<Instance>,
        constructor: Option<&Arc<MethodDef>>,
        args: Vec<Value>,
        site: Span,
    ) -> EvalResult<()> {
        self.init_fields(inst)?;
        if let Some(constructor) = constructor {
            self.invoke_method(inst, constructor, args, site)?;
        }
        Ok(())
    }

    fn init_fields(&self, inst: &Arc<Instance>) -> EvalResult<()> {
        for class in inst.class.lineage().into_iter().rev() {
            if class.fields.is_empty() {
                continue;
            }
            let env = class.closure.frame(
                &format!("{}.<init>", class.name),
                Some(Receiver {
                    this: Value::Object(Arc::clone(inst)),
                    class: Arc::clone(&class),
                }),
            );
            let bindings = bindings_for(inst, &class.name);
            for field in &class.fields {
                let value = match &field.initializer {
                    Some(init) => self.eval(init, &env)?,
                    None => Value::Nil,
                };
                if let Some(ty) = &field.type_annotation {
                    self.check_value(&value, ty, &bindings, || {
                        format!("field '{}' of {}", field.name, inst.class.name)
                    })?;
                }
                inst.set_field(field.name.clone(), value);
            }
        }
        Ok(())
    }

    fn construct_record(
        &self,
        class: &Arc<ClassDef>,
        explicit: &[TypeExpr],
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        if args.len() != class.components.len() {
            return Err(VmError::arity(class.components.len(), args.len()).into());
        }
        let type_args = self.class_type_args(class, explicit, &class.components, &args)?;
        check_bounds(self.registry(), &class.type_params, &type_args)?;
        let bindings = bind_params(&class.type_params, &type_args);

        let inst = Instance::new(Arc::clone(class), type_args);
        for (component, value) in class.components.iter().zip(args) {
            if let Some(ty) = &component.type_annotation {
                self.check_value(&value, ty, &bindings, || {
                    format!("component '{}' of {}", component.name, class.name)
                })?;
            }
            inst.set_field(component.name.clone(), value);
        }
        Ok(Value::Object(Arc::new(inst)))
    }
}
