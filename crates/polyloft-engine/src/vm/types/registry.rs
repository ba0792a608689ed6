//! Type Registry
//!
//! Every class, enum, record and interface declaration is registered here
//! by name. The registry belongs to a single `Runtime`, so runtimes never
//! observe each other's declarations.

use crate::vm::object::{ClassDef, InterfaceDef};
use dashmap::DashMap;
use std::sync::Arc;

/// Declared types of one runtime.
#[derive(Default)]
pub struct TypeRegistry {
    classes: DashMap<String, Arc<ClassDef>>,
    interfaces: DashMap<String, Arc<InterfaceDef>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or redefine) a class, enum or record.
    pub fn register_class(&self, class: Arc<ClassDef>) {
        self.interfaces.remove(&class.name);
        self.classes.insert(class.name.clone(), class);
    }

    /// Register (or redefine) an interface.
    pub fn register_interface(&self, iface: Arc<InterfaceDef>) {
        self.classes.remove(&iface.name);
        self.interfaces.insert(iface.name.clone(), iface);
    }

    pub fn class(&self, name: &str) -> Option<Arc<ClassDef>> {
        self.classes.get(name).map(|entry| entry.value().clone())
    }

    pub fn interface(&self, name: &str) -> Option<Arc<InterfaceDef>> {
        self.interfaces.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name) || self.interfaces.contains_key(name)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.classes.len() + self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether type `sub` is `sup`, inherits from it, or implements it.
    pub fn is_subtype_of(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }
        if let Some(class) = self.class(sub) {
            return class.is_a(sup);
        }
        if let Some(iface) = self.interface(sub) {
            return iface.extends(sup);
        }
        false
    }

    /// Remove every declaration.
    pub fn clear(&self) {
        self.classes.clear();
        self.interfaces.clear();
    }
}
