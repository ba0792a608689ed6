//! Runtime values
//!
//! Scalars are stored inline. Everything with identity (arrays, maps,
//! instances, channels, futures, ...) is reference counted so that values
//! can be shared freely between threads; interior state sits behind
//! `parking_lot` locks.

use crate::parser::ast::{Block, Expression, Param, TypeExpr, TypeParam};
use crate::vm::env::Env;
use crate::vm::future::FutureCell;
use crate::vm::interpreter::{Interpreter, Signal};
use crate::vm::object::{ClassDef, ClassKind, Collection, Instance, InterfaceDef};
use crate::vm::overload::Signature;
use crate::vm::sync::{Channel, ThreadHandle};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// A Polyloft runtime value.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    /// `[1, 2, 3]`
    Array(Arc<RwLock<Vec<Value>>>),
    /// `{"a": 1}`, insertion ordered
    Map(Arc<RwLock<ValueMap>>),
    /// Declared function or lambda (closure)
    Function(Arc<Function>),
    /// Builtin function
    Native(Arc<NativeFunction>),
    /// Method looked up on a receiver but not yet called
    BoundMethod(Arc<BoundMethod>),
    /// Class, enum or record definition
    Class(Arc<ClassDef>),
    Interface(Arc<InterfaceDef>),
    /// Instance of a class, enum value or record value
    Object(Arc<Instance>),
    /// Builtin generic collection (List, Set, Map, Deque)
    Collection(Arc<Collection>),
    Thread(Arc<ThreadHandle>),
    Channel(Arc<Channel>),
    /// Promise or CompletableFuture
    Future(Arc<FutureCell>),
    /// Builtin module such as `Sys` or `Math`
    Module(Arc<Module>),
}

impl Value {
    pub fn str(s: impl AsRef<str>) -> Value {
        Value::Str(Arc::from(s.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Arc::new(RwLock::new(items)))
    }

    pub fn map(map: ValueMap) -> Value {
        Value::Map(Arc::new(RwLock::new(map)))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// `nil`, `false`, zero and the empty string are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_) | Value::Native(_) | Value::BoundMethod(_) | Value::Class(_)
        )
    }

    /// Short name of the value's runtime shape, used in error messages.
    pub fn kind_name(&self) -> String {
        match self {
            Value::Nil => "Nil".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Float(_) => "Float".to_string(),
            Value::Str(_) => "String".to_string(),
            Value::Array(_) => "Array".to_string(),
            Value::Map(_) => "Map".to_string(),
            Value::Function(_) | Value::Native(_) | Value::BoundMethod(_) => {
                "Function".to_string()
            }
            Value::Class(class) => class.name.clone(),
            Value::Interface(iface) => iface.name.clone(),
            Value::Object(inst) => inst.class.name.clone(),
            Value::Collection(c) => c.kind.name().to_string(),
            Value::Thread(_) => "Thread".to_string(),
            Value::Channel(_) => "Channel".to_string(),
            Value::Future(f) => f.kind.name().to_string(),
            Value::Module(m) => m.name.clone(),
        }
    }

    /// Language-level equality (`==`).
    ///
    /// Numbers compare across Int/Float, arrays and records compare
    /// structurally, everything else by identity.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.read(), b.read());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                a.class.kind == ClassKind::Record
                    && Arc::ptr_eq(&a.class, &b.class)
                    && a.class.components.iter().all(|c| {
                        match (a.field(&c.name), b.field(&c.name)) {
                            (Some(x), Some(y)) => x.equals(&y),
                            _ => false,
                        }
                    })
            }
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Arc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Arc::ptr_eq(a, b),
            (Value::Interface(a), Value::Interface(b)) => Arc::ptr_eq(a, b),
            (Value::Collection(a), Value::Collection(b)) => Arc::ptr_eq(a, b),
            (Value::Thread(a), Value::Thread(b)) => Arc::ptr_eq(a, b),
            (Value::Channel(a), Value::Channel(b)) => Arc::ptr_eq(a, b),
            (Value::Future(a), Value::Future(b)) => Arc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

/// Render a float the way `%g` does for common magnitudes: `3`, `3.5`, `1e+21`.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    let abs = f.abs();
    if abs != 0.0 && !(1e-4..1e21).contains(&abs) {
        return format!("{:e}", f);
    }
    format!("{}", f)
}

/// Plain rendering without invoking user `toString` methods.
///
/// The interpreter's `stringify` layers user methods on top of this.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => write!(f, "<function {}>", func.name),
            Value::Native(func) => write!(f, "<builtin {}>", func.name),
            Value::BoundMethod(bound) => write!(f, "<method {}>", bound.name()),
            Value::Class(class) => write!(f, "class {}", class.name),
            Value::Interface(iface) => write!(f, "interface {}", iface.name),
            Value::Object(inst) => inst.fmt_default(f),
            Value::Collection(c) => write!(f, "{}", c),
            Value::Thread(t) => write!(f, "Thread#{}", t.id()),
            Value::Channel(ch) => write!(f, "Channel{{len={}, closed={}}}", ch.len(), ch.is_closed()),
            Value::Future(fut) => write!(f, "{}", fut),
            Value::Module(m) => write!(f, "module {}", m.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

// ============================================================================
// Maps
// ============================================================================

/// Hashable projection of a value used as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Nil,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(Arc<str>),
    Identity(usize),
}

impl HashKey {
    pub fn of(value: &Value) -> HashKey {
        match value {
            Value::Nil => HashKey::Nil,
            Value::Bool(b) => HashKey::Bool(*b),
            Value::Int(i) => HashKey::Int(*i),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => HashKey::Int(*f as i64),
            Value::Float(f) => HashKey::Float(f.to_bits()),
            Value::Str(s) => HashKey::Str(s.clone()),
            Value::Object(inst) if inst.class.kind == ClassKind::Record => {
                HashKey::Str(Arc::from(value.to_string()))
            }
            other => HashKey::Identity(identity(other)),
        }
    }
}

fn identity(value: &Value) -> usize {
    match value {
        Value::Array(a) => Arc::as_ptr(a) as *const () as usize,
        Value::Map(m) => Arc::as_ptr(m) as *const () as usize,
        Value::Function(f) => Arc::as_ptr(f) as *const () as usize,
        Value::Native(f) => Arc::as_ptr(f) as *const () as usize,
        Value::BoundMethod(b) => Arc::as_ptr(b) as *const () as usize,
        Value::Class(c) => Arc::as_ptr(c) as *const () as usize,
        Value::Interface(i) => Arc::as_ptr(i) as *const () as usize,
        Value::Object(o) => Arc::as_ptr(o) as *const () as usize,
        Value::Collection(c) => Arc::as_ptr(c) as *const () as usize,
        Value::Thread(t) => Arc::as_ptr(t) as *const () as usize,
        Value::Channel(c) => Arc::as_ptr(c) as *const () as usize,
        Value::Future(f) => Arc::as_ptr(f) as *const () as usize,
        Value::Module(m) => Arc::as_ptr(m) as *const () as usize,
        _ => 0,
    }
}

/// Insertion-ordered map keyed by value.
#[derive(Clone, Default)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
    index: FxHashMap<HashKey, usize>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.index
            .get(&HashKey::of(key))
            .map(|&slot| &self.entries[slot].1)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.index.contains_key(&HashKey::of(key))
    }

    /// Insert or overwrite, returning the previous value.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        let hash = HashKey::of(&key);
        match self.index.get(&hash) {
            Some(&slot) => Some(std::mem::replace(&mut self.entries[slot].1, value)),
            None => {
                self.index.insert(hash, self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let slot = self.index.remove(&HashKey::of(key))?;
        let (_, value) = self.entries.remove(slot);
        for idx in self.index.values_mut() {
            if *idx > slot {
                *idx -= 1;
            }
        }
        Some(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, v)| v.clone()).collect()
    }
}

impl FromIterator<(Value, Value)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

// ============================================================================
// Callables
// ============================================================================

/// Body of a user function.
#[derive(Debug, Clone)]
pub enum FunctionBody {
    Block(Arc<Block>),
    /// Expression lambdas: `(x) => x * 2`
    Expression(Arc<Expression>),
}

/// A user-defined function or lambda together with its captured scope.
pub struct Function {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: FunctionBody,
    pub closure: Env,
}

impl Signature for Function {
    fn params(&self) -> &[Param] {
        &self.params
    }
}

/// Arguments handed to a builtin.
pub struct NativeCall {
    pub args: Vec<Value>,
    /// Explicit type arguments, as in `List<Int>(1, 2)`
    pub type_args: Vec<TypeExpr>,
}

/// Signature of builtin function bodies.
pub type NativeFn = dyn Fn(&Interpreter, NativeCall) -> Result<Value, Signal> + Send + Sync;

/// A builtin function.
pub struct NativeFunction {
    pub name: String,
    pub func: Box<NativeFn>,
}

impl NativeFunction {
    pub fn value<F>(name: impl Into<String>, func: F) -> Value
    where
        F: Fn(&Interpreter, NativeCall) -> Result<Value, Signal> + Send + Sync + 'static,
    {
        Value::Native(Arc::new(NativeFunction {
            name: name.into(),
            func: Box::new(func),
        }))
    }
}

/// A method resolved against its receiver.
pub enum BoundMethod {
    /// User method; overloads are picked by arity at call time starting from `lookup`
    Instance {
        receiver: Arc<Instance>,
        lookup: Arc<ClassDef>,
        name: String,
    },
    /// `Name.method` on a class, enum or record
    Static { class: Arc<ClassDef>, name: String },
    /// Builtin method on a builtin value (`"abc".length`)
    Builtin { receiver: Value, name: String },
}

impl BoundMethod {
    pub fn name(&self) -> &str {
        match self {
            BoundMethod::Instance { name, .. }
            | BoundMethod::Static { name, .. }
            | BoundMethod::Builtin { name, .. } => name,
        }
    }
}

/// A builtin module: a named bag of functions and constants.
pub struct Module {
    pub name: String,
    pub members: FxHashMap<String, Value>,
}

impl Module {
    pub fn value(name: impl Into<String>, members: FxHashMap<String, Value>) -> Value {
        Value::Module(Arc::new(Module {
            name: name.into(),
            members,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(Value::str("x").is_truthy());
        assert!(Value::array(vec![]).is_truthy());
    }

    #[test]
    fn test_numeric_equality_crosses_int_and_float() {
        assert!(Value::Int(2).equals(&Value::Float(2.0)));
        assert!(!Value::Int(2).equals(&Value::str("2")));
    }

    #[test]
    fn test_array_equality_is_structural() {
        let a = Value::array(vec![Value::Int(1), Value::str("x")]);
        let b = Value::array(vec![Value::Int(1), Value::str("x")]);
        assert!(a.equals(&b));
        assert!(a.equals(&a));
    }

    #[test]
    fn test_value_map_keeps_insertion_order() {
        let mut map = ValueMap::new();
        map.insert(Value::str("b"), Value::Int(1));
        map.insert(Value::str("a"), Value::Int(2));
        map.insert(Value::str("b"), Value::Int(3));
        assert_eq!(map.len(), 2);
        assert_eq!(Value::map(map.clone()).to_string(), "{b: 3, a: 2}");
        map.remove(&Value::str("b"));
        assert_eq!(map.get(&Value::str("a")).and_then(Value::as_int), Some(2));
        assert!(!map.contains_key(&Value::str("b")));
    }

    #[test]
    fn test_float_formatting() {
        assert_eq!(format_float(3.0), "3");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(Value::Float(0.1).to_string(), "0.1");
    }
}
