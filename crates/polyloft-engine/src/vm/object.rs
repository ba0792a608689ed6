//! Object model: class, interface, enum and record definitions, instances
//! and builtin collections

use crate::parser::ast::{BindingKind, Expression, Param, TypeExpr, TypeParam, Visibility};
use crate::vm::env::Env;
use crate::vm::overload::Signature;
use crate::vm::value::{FunctionBody, Value, ValueMap};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What kind of declaration produced a [`ClassDef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Enum,
    Record,
}

impl ClassKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            ClassKind::Class => "Class",
            ClassKind::Enum => "Enum",
            ClassKind::Record => "Record",
        }
    }
}

/// Instance field declaration.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub kind: BindingKind,
    pub visibility: Visibility,
    pub type_annotation: Option<TypeExpr>,
    pub initializer: Option<Expression>,
}

/// Method or constructor.
pub struct MethodDef {
    pub name: String,
    /// Name of the declaring class or interface
    pub owner: String,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    /// `None` for abstract methods and interface methods without a default
    pub body: Option<FunctionBody>,
    pub visibility: Visibility,
    pub is_static: bool,
    /// Scope the declaring type was evaluated in
    pub closure: Env,
}

impl MethodDef {
    pub fn is_abstract(&self) -> bool {
        self.body.is_none()
    }
}

impl Signature for MethodDef {
    fn params(&self) -> &[Param] {
        &self.params
    }
}

/// Static field storage.
#[derive(Debug, Clone)]
pub struct StaticSlot {
    pub value: Value,
    pub kind: BindingKind,
    pub type_annotation: Option<TypeExpr>,
}

pub type MethodTable = FxHashMap<String, Vec<Arc<MethodDef>>>;

/// Runtime definition of a class, enum or record.
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<TypeParam>,
    pub parent: Option<Arc<ClassDef>>,
    /// Type arguments passed to the parent: `class IntBox < Box<Int>`
    pub parent_args: Vec<TypeExpr>,
    pub interfaces: Vec<Arc<InterfaceDef>>,
    pub is_abstract: bool,
    pub is_sealed: bool,
    pub permits: Vec<String>,
    pub fields: Vec<FieldDef>,
    pub methods: MethodTable,
    pub static_methods: MethodTable,
    pub constructors: Vec<Arc<MethodDef>>,
    pub statics: RwLock<FxHashMap<String, StaticSlot>>,
    /// Record components, in declaration order
    pub components: Vec<Param>,
    /// Enum constants, in ordinal order
    pub enum_values: RwLock<Vec<Value>>,
    /// Scope the declaration was evaluated in
    pub closure: Env,
}

impl ClassDef {
    /// This class followed by its ancestors, nearest first.
    pub fn lineage(self: &Arc<Self>) -> Vec<Arc<ClassDef>> {
        let mut chain = vec![Arc::clone(self)];
        let mut current = self.parent.clone();
        while let Some(class) = current {
            current = class.parent.clone();
            chain.push(class);
        }
        chain
    }

    /// Whether this class is `name`, inherits from it, or implements it.
    pub fn is_a(&self, name: &str) -> bool {
        if self.name == name {
            return true;
        }
        if self.interfaces.iter().any(|iface| iface.extends(name)) {
            return true;
        }
        match &self.parent {
            Some(parent) => parent.is_a(name),
            None => false,
        }
    }

    /// Every interface implemented by this class or an ancestor,
    /// including inherited interface parents.
    pub fn all_interfaces(&self) -> Vec<Arc<InterfaceDef>> {
        let mut out: Vec<Arc<InterfaceDef>> = Vec::new();
        let mut class = Some(self);
        while let Some(current) = class {
            for iface in &current.interfaces {
                iface.collect_into(&mut out);
            }
            class = current.parent.as_deref();
        }
        out
    }

    /// Instance-method overloads named `name`, nearest class first, then
    /// interface default bodies.
    pub fn find_methods(self: &Arc<Self>, name: &str) -> Vec<Arc<MethodDef>> {
        let mut found = Vec::new();
        for class in self.lineage() {
            if let Some(overloads) = class.methods.get(name) {
                found.extend(overloads.iter().filter(|m| !m.is_abstract()).cloned());
            }
        }
        for iface in self.all_interfaces() {
            if let Some(overloads) = iface.methods.get(name) {
                found.extend(overloads.iter().filter(|m| !m.is_abstract()).cloned());
            }
        }
        found
    }

    /// Whether any instance method (concrete or abstract) named `name` exists.
    pub fn declares_method(self: &Arc<Self>, name: &str) -> bool {
        self.lineage().iter().any(|c| c.methods.contains_key(name))
            || self
                .all_interfaces()
                .iter()
                .any(|i| i.methods.contains_key(name))
    }

    pub fn find_static_methods(self: &Arc<Self>, name: &str) -> Vec<Arc<MethodDef>> {
        self.lineage()
            .iter()
            .filter_map(|class| class.static_methods.get(name))
            .flat_map(|overloads| overloads.iter().cloned())
            .collect()
    }

    /// Nearest class (this one or an ancestor) that owns a static field `name`.
    pub fn static_owner(self: &Arc<Self>, name: &str) -> Option<Arc<ClassDef>> {
        self.lineage()
            .into_iter()
            .find(|class| class.statics.read().contains_key(name))
    }

    pub fn get_static(self: &Arc<Self>, name: &str) -> Option<Value> {
        self.static_owner(name)
            .and_then(|class| class.statics.read().get(name).map(|slot| slot.value.clone()))
    }

    /// Constructors used to build instances of this class: its own, or the
    /// nearest ancestor's when it declares none.
    pub fn constructor_table(self: &Arc<Self>) -> Vec<Arc<MethodDef>> {
        self.lineage()
            .into_iter()
            .find(|class| !class.constructors.is_empty())
            .map(|class| class.constructors.clone())
            .unwrap_or_default()
    }

    /// Field declaration for `name` and the class that declares it.
    pub fn find_field(self: &Arc<Self>, name: &str) -> Option<(Arc<ClassDef>, FieldDef)> {
        for class in self.lineage() {
            if let Some(field) = class.fields.iter().find(|f| f.name == name) {
                return Some((class.clone(), field.clone()));
            }
        }
        None
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Runtime definition of an interface.
pub struct InterfaceDef {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub parents: Vec<Arc<InterfaceDef>>,
    pub is_sealed: bool,
    pub permits: Vec<String>,
    pub methods: MethodTable,
    pub statics: RwLock<FxHashMap<String, StaticSlot>>,
}

impl InterfaceDef {
    /// Whether this interface is `name` or extends it.
    pub fn extends(&self, name: &str) -> bool {
        self.name == name || self.parents.iter().any(|p| p.extends(name))
    }

    fn collect_into(self: &Arc<Self>, out: &mut Vec<Arc<InterfaceDef>>) {
        if out.iter().any(|seen| Arc::ptr_eq(seen, self)) {
            return;
        }
        out.push(Arc::clone(self));
        for parent in &self.parents {
            parent.collect_into(out);
        }
    }

    /// This interface and every interface it extends.
    pub fn with_parents(self: &Arc<Self>) -> Vec<Arc<InterfaceDef>> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    pub fn get_static(self: &Arc<Self>, name: &str) -> Option<Value> {
        self.with_parents()
            .iter()
            .find_map(|iface| iface.statics.read().get(name).map(|slot| slot.value.clone()))
    }
}

impl fmt::Debug for InterfaceDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceDef")
            .field("name", &self.name)
            .finish()
    }
}

// ============================================================================
// Instances
// ============================================================================

/// Instance of a class, enum constant or record value.
pub struct Instance {
    pub class: Arc<ClassDef>,
    /// Explicit or inferred type arguments, one per class type parameter
    pub type_args: Vec<TypeExpr>,
    /// `(name, ordinal)` for enum constants
    pub enum_tag: Option<(String, usize)>,
    fields: RwLock<FxHashMap<String, Value>>,
    constructing: AtomicBool,
}

impl Instance {
    pub fn new(class: Arc<ClassDef>, type_args: Vec<TypeExpr>) -> Self {
        Self {
            class,
            type_args,
            enum_tag: None,
            fields: RwLock::new(FxHashMap::default()),
            constructing: AtomicBool::new(false),
        }
    }

    pub fn enum_constant(class: Arc<ClassDef>, name: String, ordinal: usize) -> Self {
        Self {
            enum_tag: Some((name, ordinal)),
            ..Self::new(class, Vec::new())
        }
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.read().contains_key(name)
    }

    pub fn set_field(&self, name: impl Into<String>, value: Value) {
        self.fields.write().insert(name.into(), value);
    }

    pub fn is_constructing(&self) -> bool {
        self.constructing.load(Ordering::Acquire)
    }

    pub fn set_constructing(&self, constructing: bool) {
        self.constructing.store(constructing, Ordering::Release);
    }

    /// Rendering used when no user `toString` exists.
    pub fn fmt_default(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((name, _)) = &self.enum_tag {
            return write!(f, "{}.{}", self.class.name, name);
        }
        if self.class.kind == ClassKind::Record {
            write!(f, "{}(", self.class.name)?;
            for (i, component) in self.class.components.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                let value = self.field(&component.name).unwrap_or(Value::Nil);
                write!(f, "{}={}", component.name, value)?;
            }
            return write!(f, ")");
        }
        write!(f, "{}@{:x}", self.class.name, self as *const Instance as usize)
    }
}

// ============================================================================
// Builtin collections
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Set,
    Map,
    Deque,
}

impl CollectionKind {
    pub fn name(&self) -> &'static str {
        match self {
            CollectionKind::List => "List",
            CollectionKind::Set => "Set",
            CollectionKind::Map => "Map",
            CollectionKind::Deque => "Deque",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "List" => Some(CollectionKind::List),
            "Set" => Some(CollectionKind::Set),
            "Map" => Some(CollectionKind::Map),
            "Deque" => Some(CollectionKind::Deque),
            _ => None,
        }
    }
}

pub enum CollectionData {
    Seq(VecDeque<Value>),
    Map(ValueMap),
}

/// `List<T>`, `Set<T>`, `Map<K, V>` or `Deque<T>`.
pub struct Collection {
    pub kind: CollectionKind,
    /// Explicit type arguments; empty when the collection was built without them
    pub type_args: Vec<TypeExpr>,
    pub data: RwLock<CollectionData>,
}

impl Collection {
    pub fn new(kind: CollectionKind, type_args: Vec<TypeExpr>) -> Self {
        let data = match kind {
            CollectionKind::Map => CollectionData::Map(ValueMap::new()),
            _ => CollectionData::Seq(VecDeque::new()),
        };
        Self {
            kind,
            type_args,
            data: RwLock::new(data),
        }
    }

    pub fn len(&self) -> usize {
        match &*self.data.read() {
            CollectionData::Seq(items) => items.len(),
            CollectionData::Map(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements for sequences, values for maps.
    pub fn items(&self) -> Vec<Value> {
        match &*self.data.read() {
            CollectionData::Seq(items) => items.iter().cloned().collect(),
            CollectionData::Map(map) => map.values(),
        }
    }

    pub fn keys(&self) -> Vec<Value> {
        match &*self.data.read() {
            CollectionData::Seq(_) => Vec::new(),
            CollectionData::Map(map) => map.keys(),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.data.read() {
            CollectionData::Seq(items) => {
                let (open, close) = match self.kind {
                    CollectionKind::Set => ("{", "}"),
                    _ => ("[", "]"),
                };
                write!(f, "{}", open)?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "{}", close)
            }
            CollectionData::Map(map) => write!(f, "{}", Value::map(map.clone())),
        }
    }
}
