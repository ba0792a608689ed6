//! Lexical environments
//!
//! An environment is a chain of scopes. Scopes created for a function call
//! additionally carry a frame: the defer stack and, for methods, the
//! receiver that `this` and `super` resolve against.

use crate::parser::ast::{BindingKind, Expression, TypeExpr};
use crate::parser::token::Span;
use crate::vm::object::ClassDef;
use crate::vm::value::Value;
use crate::vm::{VmError, VmResult};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Shared handle to an environment.
pub type Env = Arc<Environment>;

/// A single named binding.
#[derive(Clone)]
pub struct Binding {
    pub value: Value,
    pub kind: BindingKind,
    /// Declared type, validated on every assignment
    pub type_annotation: Option<TypeExpr>,
}

#[derive(Default)]
struct Scope {
    vars: FxHashMap<String, Binding>,
    /// alias -> module name
    imports: FxHashMap<String, String>,
}

/// The object a method runs against.
#[derive(Clone)]
pub struct Receiver {
    pub this: Value,
    /// Class that declared the running method (not the runtime class)
    pub class: Arc<ClassDef>,
}

/// A call registered with `defer`.
#[derive(Clone)]
pub struct Deferred {
    pub call: Expression,
    pub env: Env,
    pub span: Span,
}

/// Per-call state.
pub struct Frame {
    pub name: String,
    pub receiver: Option<Receiver>,
    defers: Mutex<Vec<Deferred>>,
}

/// One scope in the environment chain.
pub struct Environment {
    parent: Option<Env>,
    scope: RwLock<Scope>,
    frame: Option<Frame>,
}

impl Environment {
    /// Create a root environment that is also the top-level frame.
    pub fn root() -> Env {
        Arc::new(Environment {
            parent: None,
            scope: RwLock::new(Scope::default()),
            frame: Some(Frame::new("<main>", None)),
        })
    }

    /// New block scope. Imports are copied so nested scopes see them
    /// without being able to change the parent's.
    pub fn child(self: &Arc<Self>) -> Env {
        let imports = self.scope.read().imports.clone();
        Arc::new(Environment {
            parent: Some(Arc::clone(self)),
            scope: RwLock::new(Scope {
                vars: FxHashMap::default(),
                imports,
            }),
            frame: None,
        })
    }

    /// New scope that starts a call frame.
    pub fn frame(self: &Arc<Self>, name: &str, receiver: Option<Receiver>) -> Env {
        let imports = self.scope.read().imports.clone();
        Arc::new(Environment {
            parent: Some(Arc::clone(self)),
            scope: RwLock::new(Scope {
                vars: FxHashMap::default(),
                imports,
            }),
            frame: Some(Frame::new(name, receiver)),
        })
    }

    /// Introduce a binding in this scope, shadowing any outer one.
    pub fn define(&self, name: impl Into<String>, value: Value, kind: BindingKind) {
        self.define_typed(name, value, kind, None);
    }

    pub fn define_typed(
        &self,
        name: impl Into<String>,
        value: Value,
        kind: BindingKind,
        type_annotation: Option<TypeExpr>,
    ) {
        self.scope.write().vars.insert(
            name.into(),
            Binding {
                value,
                kind,
                type_annotation,
            },
        );
    }

    /// Whether `name` is bound directly in this scope.
    pub fn has_local(&self, name: &str) -> bool {
        self.scope.read().vars.contains_key(name)
    }

    /// Nearest binding for `name`.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut env = self;
        loop {
            if let Some(binding) = env.scope.read().vars.get(name) {
                return Some(binding.value.clone());
            }
            match &env.parent {
                Some(parent) => env = parent,
                None => return None,
            }
        }
    }

    pub fn get(&self, name: &str) -> VmResult<Value> {
        self.lookup(name)
            .ok_or_else(|| VmError::Undefined(name.to_string()))
    }

    /// Declared type of the nearest binding for `name`.
    pub fn declared_type(&self, name: &str) -> Option<TypeExpr> {
        let mut env = self;
        loop {
            if let Some(binding) = env.scope.read().vars.get(name) {
                return binding.type_annotation.clone();
            }
            env = env.parent.as_deref()?;
        }
    }

    /// Mutate the nearest existing binding.
    pub fn set(&self, name: &str, value: Value) -> VmResult<()> {
        let mut env = self;
        loop {
            {
                let mut scope = env.scope.write();
                if let Some(binding) = scope.vars.get_mut(name) {
                    return match binding.kind {
                        BindingKind::Const => Err(VmError::Immutable {
                            kind: "constant",
                            name: name.to_string(),
                        }),
                        BindingKind::Final => Err(VmError::Immutable {
                            kind: "final variable",
                            name: name.to_string(),
                        }),
                        BindingKind::Let | BindingKind::Var => {
                            binding.value = value;
                            Ok(())
                        }
                    };
                }
            }
            match &env.parent {
                Some(parent) => env = parent,
                None => return Err(VmError::Undefined(name.to_string())),
            }
        }
    }

    // ========================================================================
    // Imports
    // ========================================================================

    pub fn add_import(&self, alias: impl Into<String>, module: impl Into<String>) {
        self.scope.write().imports.insert(alias.into(), module.into());
    }

    /// Module name an alias refers to in this scope.
    pub fn resolve_import(&self, alias: &str) -> Option<String> {
        self.scope.read().imports.get(alias).cloned()
    }

    // ========================================================================
    // Frames
    // ========================================================================

    fn nearest_frame(&self) -> Option<&Frame> {
        let mut env = self;
        loop {
            if let Some(frame) = &env.frame {
                return Some(frame);
            }
            env = env.parent.as_deref()?;
        }
    }

    /// Register a deferred call on the nearest enclosing frame.
    pub fn push_defer(&self, deferred: Deferred) {
        if let Some(frame) = self.nearest_frame() {
            frame.defers.lock().push(deferred);
        }
    }

    /// Drain this frame's defer stack in registration order.
    pub fn take_defers(&self) -> Vec<Deferred> {
        match &self.frame {
            Some(frame) => std::mem::take(&mut *frame.defers.lock()),
            None => Vec::new(),
        }
    }

    /// Name of the nearest enclosing frame.
    pub fn frame_name(&self) -> String {
        self.nearest_frame()
            .map(|frame| frame.name.clone())
            .unwrap_or_default()
    }

    /// Receiver of the nearest enclosing method, looking through lambda frames.
    pub fn receiver(&self) -> Option<Receiver> {
        let mut env = self;
        loop {
            if let Some(Frame {
                receiver: Some(receiver),
                ..
            }) = &env.frame
            {
                return Some(receiver.clone());
            }
            env = env.parent.as_deref()?;
        }
    }

    /// Flatten every visible binding into a fresh root frame.
    ///
    /// Values are shared; only the scope structure is copied.
    pub fn snapshot(&self) -> Env {
        let mut chain = Vec::new();
        let mut env = Some(self);
        while let Some(current) = env {
            chain.push(current);
            env = current.parent.as_deref();
        }

        let mut flat = Scope::default();
        for env in chain.iter().rev() {
            let scope = env.scope.read();
            for (name, binding) in &scope.vars {
                flat.vars.insert(name.clone(), binding.clone());
            }
            for (alias, module) in &scope.imports {
                flat.imports.insert(alias.clone(), module.clone());
            }
        }

        Arc::new(Environment {
            parent: None,
            scope: RwLock::new(flat),
            frame: Some(Frame::new("<thread>", self.receiver())),
        })
    }
}

impl Frame {
    fn new(name: &str, receiver: Option<Receiver>) -> Self {
        Self {
            name: name.to_string(),
            receiver,
            defers: Mutex::new(Vec::new()),
        }
    }
}
