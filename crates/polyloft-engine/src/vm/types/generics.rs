//! Generic type engine
//!
//! Types are only ever checked at runtime. This module answers four
//! questions about them:
//! - what is the runtime type of a value (and how is it rendered),
//! - is one type a subtype of another,
//! - does a value match a (possibly parameterized, wildcarded) type,
//! - do declared bounds and variance annotations hold.

use crate::parser::ast::{NamedType, TypeExpr, TypeParam, Variance, Wildcard};
use crate::vm::object::{ClassKind, CollectionData, Instance, MethodDef};
use crate::vm::types::TypeRegistry;
use crate::vm::value::Value;
use crate::vm::{VmError, VmResult};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Type parameter name -> bound type argument.
pub type TypeBindings = FxHashMap<String, TypeExpr>;

static ALIASES: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("int", "Int"),
        ("integer", "Int"),
        ("float", "Float"),
        ("double", "Float"),
        ("string", "String"),
        ("str", "String"),
        ("bool", "Bool"),
        ("boolean", "Bool"),
        ("any", "Any"),
        ("number", "Number"),
        ("void", "Void"),
        ("nil", "Nil"),
    ]
    .into_iter()
    .collect()
});

/// Canonical spelling of a type name (`integer` -> `Int`).
pub fn canonical_name(name: &str) -> String {
    match ALIASES.get(name.to_ascii_lowercase().as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => name.to_string(),
    }
}

/// Canonicalize every name inside a type.
pub fn canonicalize(ty: &TypeExpr) -> TypeExpr {
    match ty {
        TypeExpr::Named(named) => TypeExpr::Named(NamedType {
            name: canonical_name(&named.name),
            args: named.args.iter().map(canonicalize).collect(),
        }),
        TypeExpr::Union(members) => TypeExpr::Union(members.iter().map(canonicalize).collect()),
        TypeExpr::Wildcard(w) => TypeExpr::Wildcard(map_wildcard(w, canonicalize)),
    }
}

fn map_wildcard(w: &Wildcard, f: impl Fn(&TypeExpr) -> TypeExpr) -> Wildcard {
    match w {
        Wildcard::Unbounded => Wildcard::Unbounded,
        Wildcard::Extends(ty) => Wildcard::Extends(Box::new(f(ty))),
        Wildcard::Super(ty) => Wildcard::Super(Box::new(f(ty))),
    }
}

pub fn any_type() -> TypeExpr {
    TypeExpr::named("Any")
}

pub fn is_any(ty: &TypeExpr) -> bool {
    matches!(ty, TypeExpr::Named(named) if named.args.is_empty() && canonical_name(&named.name) == "Any")
}

/// Replace bound type parameters inside `ty`.
pub fn substitute(ty: &TypeExpr, bindings: &TypeBindings) -> TypeExpr {
    match ty {
        TypeExpr::Named(named) if named.args.is_empty() => match bindings.get(&named.name) {
            Some(bound) => bound.clone(),
            None => ty.clone(),
        },
        TypeExpr::Named(named) => TypeExpr::Named(NamedType {
            name: named.name.clone(),
            args: named.args.iter().map(|a| substitute(a, bindings)).collect(),
        }),
        TypeExpr::Union(members) => {
            TypeExpr::Union(members.iter().map(|m| substitute(m, bindings)).collect())
        }
        TypeExpr::Wildcard(w) => TypeExpr::Wildcard(map_wildcard(w, |t| substitute(t, bindings))),
    }
}

/// Bind each parameter to its argument; missing arguments bind to `Any`.
pub fn bind_params(params: &[TypeParam], args: &[TypeExpr]) -> TypeBindings {
    params
        .iter()
        .enumerate()
        .map(|(i, p)| (p.name.clone(), args.get(i).cloned().unwrap_or_else(any_type)))
        .collect()
}

/// Bindings seen by methods declared in `owner` when called on `inst`.
///
/// Walks from the runtime class up to `owner`, threading the arguments a
/// subclass passes to its parent (`class IntBox < Box<Int>`).
pub fn bindings_for(inst: &Instance, owner: &str) -> TypeBindings {
    let mut class = inst.class.clone();
    let mut args = inst.type_args.clone();
    loop {
        let bindings = bind_params(&class.type_params, &args);
        if class.name == owner {
            return bindings;
        }
        match class.parent.clone() {
            Some(parent) => {
                args = class
                    .parent_args
                    .iter()
                    .map(|a| substitute(a, &bindings))
                    .collect();
                class = parent;
            }
            None => return TypeBindings::default(),
        }
    }
}

// ============================================================================
// Runtime types and rendering
// ============================================================================

/// Runtime type of a value, with recorded or inferred type arguments.
pub fn runtime_type(value: &Value) -> TypeExpr {
    match value {
        Value::Object(inst) => match inst.class.kind {
            ClassKind::Class if !all_any(&inst.type_args) => {
                TypeExpr::generic(inst.class.name.clone(), inst.type_args.clone())
            }
            _ => TypeExpr::named(inst.class.name.clone()),
        },
        Value::Collection(c) => {
            let args = if !c.type_args.is_empty() && !all_any(&c.type_args) {
                c.type_args.clone()
            } else {
                match element_slots(value) {
                    Some(slots) => slots
                        .iter()
                        .map(|slot| infer_element_type(slot))
                        .collect::<Option<Vec<_>>>()
                        .unwrap_or_default(),
                    None => Vec::new(),
                }
            };
            TypeExpr::generic(c.kind.name(), args)
        }
        Value::Channel(ch) => match &ch.element_type {
            Some(ty) => TypeExpr::generic("Channel", vec![ty.clone()]),
            None => TypeExpr::named("Channel"),
        },
        other => TypeExpr::named(other.kind_name()),
    }
}

fn all_any(args: &[TypeExpr]) -> bool {
    args.iter().all(is_any)
}

/// Common type of a list of values; `None` when empty.
///
/// Mixed `Int`/`Float` collapses to `Number`; other mixes become a union.
pub fn infer_element_type(values: &[Value]) -> Option<TypeExpr> {
    let mut seen: Vec<TypeExpr> = Vec::new();
    for value in values {
        let ty = runtime_type(value);
        if !seen.contains(&ty) {
            seen.push(ty);
        }
    }
    match seen.len() {
        0 => None,
        1 => seen.pop(),
        _ if is_number_union(&seen) => Some(TypeExpr::named("Number")),
        _ => Some(TypeExpr::Union(seen)),
    }
}

fn is_number_union(members: &[TypeExpr]) -> bool {
    let names: Vec<String> = members
        .iter()
        .filter_map(|m| match m {
            TypeExpr::Named(named) if named.args.is_empty() => Some(canonical_name(&named.name)),
            _ => None,
        })
        .collect();
    members.len() == 2
        && names.len() == 2
        && names.iter().any(|n| n == "Int")
        && names.iter().any(|n| n == "Float")
}

/// Render a type as `Name<Arg1, Arg2>`, collapsing `Int | Float` to `Number`.
pub fn render_type(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Named(named) => {
            let name = canonical_name(&named.name);
            if named.args.is_empty() {
                name
            } else {
                let args: Vec<String> = named.args.iter().map(render_type).collect();
                format!("{}<{}>", name, args.join(", "))
            }
        }
        TypeExpr::Union(members) if is_number_union(members) => "Number".to_string(),
        TypeExpr::Union(members) => members
            .iter()
            .map(render_type)
            .collect::<Vec<_>>()
            .join(" | "),
        TypeExpr::Wildcard(Wildcard::Unbounded) => "?".to_string(),
        TypeExpr::Wildcard(Wildcard::Extends(inner)) => format!("? extends {}", render_type(inner)),
        TypeExpr::Wildcard(Wildcard::Super(inner)) => format!("? super {}", render_type(inner)),
    }
}

/// Type name of a value as reported by `Sys.type`.
pub fn type_name(value: &Value) -> String {
    match value {
        Value::Object(inst) if inst.class.kind == ClassKind::Class && !inst.type_args.is_empty() => {
            let args: Vec<String> = inst
                .type_args
                .iter()
                .enumerate()
                .map(|(i, arg)| {
                    let variance = inst
                        .class
                        .type_params
                        .get(i)
                        .map(|p| p.variance)
                        .unwrap_or_default();
                    format!("{}{}", variance, render_type(arg))
                })
                .collect();
            format!("{}<{}>", inst.class.name, args.join(", "))
        }
        Value::Class(class) => format!("{} {}", class.kind.keyword(), class.name),
        Value::Interface(iface) => format!("Interface {}", iface.name),
        other => render_type(&runtime_type(other)),
    }
}

// ============================================================================
// Subtyping and matching
// ============================================================================

/// Whether `actual` can stand where `expected` is required.
pub fn is_subtype(reg: &TypeRegistry, actual: &TypeExpr, expected: &TypeExpr) -> bool {
    if is_any(actual) || is_any(expected) {
        return true;
    }
    match (actual, expected) {
        (TypeExpr::Union(members), _) => members.iter().all(|m| is_subtype(reg, m, expected)),
        (_, TypeExpr::Union(members)) => members.iter().any(|m| is_subtype(reg, actual, m)),
        (_, TypeExpr::Wildcard(w)) => match w {
            Wildcard::Unbounded => true,
            Wildcard::Extends(bound) => is_subtype(reg, actual, bound),
            Wildcard::Super(bound) => is_subtype(reg, bound, actual),
        },
        (TypeExpr::Wildcard(Wildcard::Extends(inner)), _) => is_subtype(reg, inner, expected),
        (TypeExpr::Wildcard(_), _) => false,
        (TypeExpr::Named(a), TypeExpr::Named(e)) => {
            let (an, en) = (canonical_name(&a.name), canonical_name(&e.name));
            let head = an == en
                || (en == "Number" && (an == "Int" || an == "Float"))
                || reg.is_subtype_of(&an, &en);
            head && args_compatible(reg, &a.args, &e.args)
        }
    }
}

fn args_compatible(reg: &TypeRegistry, actual: &[TypeExpr], requested: &[TypeExpr]) -> bool {
    if actual.is_empty() || requested.is_empty() {
        return true;
    }
    actual.len() == requested.len()
        && actual
            .iter()
            .zip(requested)
            .all(|(a, r)| arg_matches(reg, a, r))
}

/// Match one type-argument slot.
///
/// Exact names only, except `Int`/`Float` where `Number` is requested;
/// wildcards follow their bound and `Any` matches both ways.
pub fn arg_matches(reg: &TypeRegistry, actual: &TypeExpr, requested: &TypeExpr) -> bool {
    if is_any(actual) || is_any(requested) {
        return true;
    }
    match requested {
        TypeExpr::Wildcard(Wildcard::Unbounded) => return true,
        TypeExpr::Wildcard(Wildcard::Extends(bound)) => return is_subtype(reg, actual, bound),
        TypeExpr::Wildcard(Wildcard::Super(bound)) => return is_subtype(reg, bound, actual),
        _ => {}
    }
    if let TypeExpr::Union(members) = actual {
        return members.iter().all(|m| arg_matches(reg, m, requested));
    }
    if let TypeExpr::Union(members) = requested {
        return members.iter().any(|m| arg_matches(reg, actual, m));
    }
    match (actual, requested) {
        (TypeExpr::Named(a), TypeExpr::Named(r)) => {
            let (an, rn) = (canonical_name(&a.name), canonical_name(&r.name));
            let head = an == rn || (rn == "Number" && (an == "Int" || an == "Float"));
            head && args_compatible(reg, &a.args, &r.args)
        }
        _ => false,
    }
}

fn head_matches(value: &Value, name: &str) -> bool {
    if name == "Any" {
        return true;
    }
    match value {
        Value::Nil => name == "Nil",
        Value::Bool(_) => name == "Bool",
        Value::Int(_) => name == "Int" || name == "Number",
        Value::Float(_) => name == "Float" || name == "Number",
        Value::Str(_) => name == "String",
        Value::Array(_) => name == "Array",
        Value::Map(_) => name == "Map",
        Value::Function(_) | Value::Native(_) | Value::BoundMethod(_) => name == "Function",
        Value::Object(inst) => inst.class.is_a(name),
        Value::Collection(c) => c.kind.name() == name,
        Value::Thread(_) => name == "Thread",
        Value::Channel(_) => name == "Channel",
        Value::Future(f) => f.kind.name() == name,
        Value::Class(_) => name == "Class",
        Value::Interface(_) => name == "Interface",
        Value::Module(m) => m.name == name,
    }
}

/// Recorded type arguments of `value` as seen from type `target`.
fn declared_args(value: &Value, target: &str) -> Option<Vec<TypeExpr>> {
    match value {
        Value::Object(inst) => {
            let mut class = inst.class.clone();
            let mut args = inst.type_args.clone();
            loop {
                if class.name == target {
                    return if args.is_empty() || all_any(&args) {
                        None
                    } else {
                        Some(args)
                    };
                }
                let bindings = bind_params(&class.type_params, &args);
                let parent = class.parent.clone()?;
                args = class
                    .parent_args
                    .iter()
                    .map(|a| substitute(a, &bindings))
                    .collect();
                class = parent;
            }
        }
        Value::Collection(c) if !c.type_args.is_empty() && !all_any(&c.type_args) => {
            Some(c.type_args.clone())
        }
        Value::Channel(ch) => ch.element_type.clone().map(|ty| vec![ty]),
        _ => None,
    }
}

/// Elements grouped per type-argument slot, for inference.
fn element_slots(value: &Value) -> Option<Vec<Vec<Value>>> {
    match value {
        Value::Array(items) => Some(vec![items.read().clone()]),
        Value::Map(map) => {
            let map = map.read();
            Some(vec![map.keys(), map.values()])
        }
        Value::Collection(c) => match &*c.data.read() {
            CollectionData::Seq(items) => Some(vec![items.iter().cloned().collect()]),
            CollectionData::Map(map) => Some(vec![map.keys(), map.values()]),
        },
        _ => None,
    }
}

fn element_matches(reg: &TypeRegistry, elem: &Value, requested: &TypeExpr) -> bool {
    match requested {
        TypeExpr::Wildcard(Wildcard::Unbounded) => true,
        TypeExpr::Wildcard(Wildcard::Extends(bound)) => instance_of(reg, elem, bound),
        TypeExpr::Wildcard(Wildcard::Super(bound)) => is_subtype(reg, bound, &runtime_type(elem)),
        other => instance_of(reg, elem, other),
    }
}

/// `value instanceof target`.
pub fn instance_of(reg: &TypeRegistry, value: &Value, target: &TypeExpr) -> bool {
    match target {
        TypeExpr::Union(members) => members.iter().any(|m| instance_of(reg, value, m)),
        TypeExpr::Wildcard(Wildcard::Unbounded) => true,
        TypeExpr::Wildcard(Wildcard::Extends(bound)) => instance_of(reg, value, bound),
        TypeExpr::Wildcard(Wildcard::Super(bound)) => {
            is_subtype(reg, bound, &runtime_type(value))
        }
        TypeExpr::Named(named) => {
            let name = canonical_name(&named.name);
            if !head_matches(value, &name) {
                return false;
            }
            if named.args.is_empty() {
                return true;
            }
            if let Some(actual) = declared_args(value, &name) {
                return actual.len() == named.args.len()
                    && actual
                        .iter()
                        .zip(&named.args)
                        .all(|(a, r)| arg_matches(reg, a, r));
            }
            match element_slots(value) {
                Some(slots) => {
                    slots.len() == named.args.len()
                        && slots.iter().zip(&named.args).all(|(elems, requested)| {
                            elems.iter().all(|e| element_matches(reg, e, requested))
                        })
                }
                None => true,
            }
        }
    }
}

/// Whether `value` may be stored where `declared` is required.
///
/// Bound type parameters are substituted first. `nil` is accepted
/// everywhere and an Int is accepted where a Float is declared.
pub fn value_conforms(
    reg: &TypeRegistry,
    value: &Value,
    declared: &TypeExpr,
    bindings: &TypeBindings,
) -> bool {
    if value.is_nil() {
        return true;
    }
    conforms(reg, value, &substitute(declared, bindings))
}

fn conforms(reg: &TypeRegistry, value: &Value, ty: &TypeExpr) -> bool {
    match ty {
        // Unbound type parameters and undeclared names check nothing
        TypeExpr::Named(named) if !is_known_type(reg, &canonical_name(&named.name)) => true,
        TypeExpr::Named(named) if named.args.is_empty() => match canonical_name(&named.name).as_str() {
            "Any" => true,
            "Void" => value.is_nil(),
            "Float" => matches!(value, Value::Float(_) | Value::Int(_)),
            _ => instance_of(reg, value, ty),
        },
        TypeExpr::Union(members) => members.iter().any(|m| conforms(reg, value, m)),
        _ => instance_of(reg, value, ty),
    }
}

const BUILTIN_TYPES: &[&str] = &[
    "Int",
    "Float",
    "Number",
    "String",
    "Bool",
    "Nil",
    "Void",
    "Any",
    "Array",
    "Map",
    "Function",
    "List",
    "Set",
    "Deque",
    "Thread",
    "Channel",
    "Promise",
    "CompletableFuture",
    "Class",
    "Interface",
];

/// Whether `name` is a builtin type or declared in `reg`.
pub fn is_known_type(reg: &TypeRegistry, name: &str) -> bool {
    BUILTIN_TYPES.contains(&name) || reg.contains(name)
}

/// Infer class or function type arguments from a call's arguments.
///
/// A parameter annotated with a bare type parameter `T` binds `T` to the
/// runtime type of its argument; anything else infers `Any`.
pub fn infer_type_args(
    type_params: &[TypeParam],
    params: &[crate::parser::ast::Param],
    args: &[Value],
) -> Vec<TypeExpr> {
    type_params
        .iter()
        .map(|tp| {
            params
                .iter()
                .zip(args)
                .find(|(param, _)| {
                    !param.variadic
                        && matches!(&param.type_annotation,
                            Some(TypeExpr::Named(named)) if named.args.is_empty() && named.name == tp.name)
                })
                .filter(|(_, arg)| !arg.is_nil())
                .map(|(_, arg)| runtime_type(arg))
                .unwrap_or_else(any_type)
        })
        .collect()
}

// ============================================================================
// Declaration checks
// ============================================================================

/// Verify each type argument against its parameter's bound.
pub fn check_bounds(reg: &TypeRegistry, params: &[TypeParam], args: &[TypeExpr]) -> VmResult<()> {
    for (param, arg) in params.iter().zip(args) {
        let Some(bound) = &param.bound else {
            continue;
        };
        if is_any(arg) {
            continue;
        }
        if !is_subtype(reg, arg, bound) {
            return Err(VmError::Bound {
                actual: render_type(arg),
                bound: render_type(bound),
            });
        }
    }
    Ok(())
}

/// Covariant (`out`) parameters may not appear in method parameters;
/// contravariant (`in`) parameters may not appear in return types.
pub fn check_variance<'a>(
    type_params: &[TypeParam],
    methods: impl IntoIterator<Item = &'a MethodDef>,
) -> VmResult<()> {
    for method in methods {
        if method.is_static {
            continue;
        }
        for tp in type_params {
            match tp.variance {
                Variance::Out => {
                    let used = method
                        .params
                        .iter()
                        .filter_map(|p| p.type_annotation.as_ref())
                        .any(|ty| ty.mentions(&tp.name));
                    if used {
                        return Err(VmError::Variance(format!(
                            "covariant type parameter '{}' (declared with 'out') cannot be used in parameter position of method '{}'",
                            tp.name, method.name
                        )));
                    }
                }
                Variance::In => {
                    if method
                        .return_type
                        .as_ref()
                        .is_some_and(|ty| ty.mentions(&tp.name))
                    {
                        return Err(VmError::Variance(format!(
                            "contravariant type parameter '{}' (declared with 'in') cannot be used in return position of method '{}'",
                            tp.name, method.name
                        )));
                    }
                }
                Variance::Invariant => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_type_spec;
    use crate::vm::object::{Collection, CollectionKind};
    use std::sync::Arc;

    fn ty(spec: &str) -> TypeExpr {
        parse_type_spec(spec).unwrap()
    }

    fn list(type_args: Vec<TypeExpr>, items: Vec<Value>) -> Value {
        let collection = Collection::new(CollectionKind::List, type_args);
        if let CollectionData::Seq(seq) = &mut *collection.data.write() {
            seq.extend(items);
        }
        Value::Collection(Arc::new(collection))
    }

    #[test]
    fn test_aliases_are_case_insensitive() {
        assert_eq!(canonical_name("integer"), "Int");
        assert_eq!(canonical_name("Boolean"), "Bool");
        assert_eq!(canonical_name("DOUBLE"), "Float");
        assert_eq!(canonical_name("Widget"), "Widget");
    }

    #[test]
    fn test_render_collapses_number_union() {
        assert_eq!(render_type(&ty("Int | Float")), "Number");
        assert_eq!(render_type(&ty("Map<string, List<int>>")), "Map<String, List<Int>>");
        assert_eq!(render_type(&ty("Int | String")), "Int | String");
    }

    #[test]
    fn test_primitive_instance_of() {
        let reg = TypeRegistry::new();
        assert!(instance_of(&reg, &Value::Int(1), &ty("Number")));
        assert!(instance_of(&reg, &Value::Float(1.5), &ty("Int | Float")));
        assert!(!instance_of(&reg, &Value::str("x"), &ty("Int")));
        assert!(instance_of(&reg, &Value::str("x"), &ty("any")));
    }

    #[test]
    fn test_list_inference_from_elements() {
        let reg = TypeRegistry::new();
        let strings = list(vec![], vec![Value::str("a"), Value::str("b")]);
        assert!(instance_of(&reg, &strings, &ty("List<?>")));
        assert!(instance_of(&reg, &strings, &ty("List<String>")));
        assert!(!instance_of(&reg, &strings, &ty("List<Int>")));

        let empty = list(vec![], vec![]);
        assert!(instance_of(&reg, &empty, &ty("List<Int>")));
    }

    #[test]
    fn test_declared_arguments_take_precedence() {
        let reg = TypeRegistry::new();
        let ints = list(vec![ty("Int")], vec![]);
        assert!(instance_of(&reg, &ints, &ty("List<Int>")));
        assert!(instance_of(&reg, &ints, &ty("List<? extends Number>")));
        assert!(instance_of(&reg, &ints, &ty("List<? super Int>")));
        assert!(!instance_of(&reg, &ints, &ty("List<String>")));
    }

    #[test]
    fn test_union_arguments() {
        let reg = TypeRegistry::new();
        let mixed = list(vec![ty("Int | String")], vec![]);
        assert!(instance_of(&reg, &mixed, &ty("List<Int | String | Float>")));
        assert!(!instance_of(&reg, &mixed, &ty("List<Int>")));
    }

    #[test]
    fn test_type_name_of_collections() {
        let mixed = list(vec![], vec![Value::Int(1), Value::Float(2.5)]);
        assert_eq!(type_name(&mixed), "List<Number>");
        assert_eq!(type_name(&list(vec![], vec![])), "List");
        assert_eq!(type_name(&Value::str("s")), "String");
        assert_eq!(type_name(&Value::array(vec![])), "Array");
    }

    #[test]
    fn test_value_conforms_widens_int_to_float() {
        let reg = TypeRegistry::new();
        let bindings = TypeBindings::default();
        assert!(value_conforms(&reg, &Value::Int(1), &ty("Float"), &bindings));
        assert!(!value_conforms(&reg, &Value::Float(1.0), &ty("Int"), &bindings));
        assert!(value_conforms(&reg, &Value::Nil, &ty("String"), &bindings));
    }

    #[test]
    fn test_substitution_of_bound_parameters() {
        let reg = TypeRegistry::new();
        let mut bindings = TypeBindings::default();
        bindings.insert("T".to_string(), ty("String"));
        assert!(!value_conforms(&reg, &Value::Int(42), &ty("T"), &bindings));
        assert!(value_conforms(&reg, &Value::str("ok"), &ty("T"), &bindings));
        bindings.insert("T".to_string(), any_type());
        assert!(value_conforms(&reg, &Value::Int(42), &ty("T"), &bindings));
    }

    #[test]
    fn test_unknown_names_conform_to_anything() {
        let reg = TypeRegistry::new();
        let bindings = TypeBindings::default();
        assert!(value_conforms(&reg, &Value::Int(1), &ty("T"), &bindings));
        assert!(!value_conforms(&reg, &Value::Int(1), &ty("String"), &bindings));
    }

    #[test]
    fn test_check_bounds() {
        let reg = TypeRegistry::new();
        let params = vec![TypeParam {
            name: "T".to_string(),
            bound: Some(ty("Number")),
            variance: Variance::Invariant,
            variadic: false,
        }];
        assert!(check_bounds(&reg, &params, &[ty("Int")]).is_ok());
        let err = check_bounds(&reg, &params, &[ty("String")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "type String does not satisfy constraint: must extends Number"
        );
    }
}
