//! Global builtin functions and constructors

use crate::parser::ast::BindingKind;
use crate::vm::builtins::handlers::{channel, collection, future, string};
use crate::vm::builtins::{expect_args, expect_args_between, int_arg, length_of, modules};
use crate::vm::env::Env;
use crate::vm::interpreter::{EvalResult, Interpreter};
use crate::vm::object::CollectionKind;
use crate::vm::types::generics::type_name;
use crate::vm::value::{NativeCall, NativeFunction, Value};
use crate::vm::{VmError, MAX_SEQUENCE_LEN};

pub(super) fn install(globals: &Env) {
    let define = |name: &str, value: Value| globals.define(name, value, BindingKind::Const);

    define("print", NativeFunction::value("print", |interp, call| {
        let text = render_args(interp, &call.args)?;
        interp.state().write_output(&text);
        Ok(Value::Nil)
    }));
    define("println", NativeFunction::value("println", |interp, call| {
        let mut text = render_args(interp, &call.args)?;
        text.push('\n');
        interp.state().write_output(&text);
        Ok(Value::Nil)
    }));

    define("str", NativeFunction::value("str", |interp, call| {
        expect_args(&call.args, 1)?;
        Ok(Value::from(interp.stringify(&call.args[0])?))
    }));
    define("int", NativeFunction::value("int", |_, call| to_int(call)));
    define("float", NativeFunction::value("float", |_, call| to_float(call)));
    define("bool", NativeFunction::value("bool", |_, call| {
        expect_args(&call.args, 1)?;
        Ok(Value::Bool(call.args[0].is_truthy()))
    }));
    define("len", NativeFunction::value("len", |_, call| {
        expect_args(&call.args, 1)?;
        match length_of(&call.args[0]) {
            Some(len) => Ok(Value::Int(len as i64)),
            None => Err(VmError::type_mismatch("String, Array, Map or collection", type_name(&call.args[0])).into()),
        }
    }));
    define("range", NativeFunction::value("range", |_, call| range(call)));
    define("instanceof", NativeFunction::value("instanceof", modules::instance_of_spec));

    for kind in [
        CollectionKind::List,
        CollectionKind::Set,
        CollectionKind::Map,
        CollectionKind::Deque,
    ] {
        define(
            kind.name(),
            NativeFunction::value(kind.name(), move |interp, call| collection::construct(interp, kind, call)),
        );
    }
    define("Channel", NativeFunction::value("Channel", |_, call| channel::construct(call)));

    define("async", NativeFunction::value("async", future::spawn_async));
    define("Promise", NativeFunction::value("Promise", future::promise));
    define(
        "CompletableFuture",
        NativeFunction::value("CompletableFuture", |_, call| future::completable(call)),
    );
}

/// Arguments rendered with `toString` and joined by a space.
fn render_args(interp: &Interpreter, args: &[Value]) -> EvalResult<String> {
    let parts = args
        .iter()
        .map(|value| interp.stringify(value))
        .collect::<EvalResult<Vec<_>>>()?;
    Ok(parts.join(" "))
}

fn to_int(call: NativeCall) -> EvalResult<Value> {
    expect_args(&call.args, 1)?;
    let value = match &call.args[0] {
        Value::Int(i) => Some(*i),
        Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Str(s) => string::parse_int(s),
        _ => None,
    };
    value.map(Value::Int).ok_or_else(|| {
        VmError::type_mismatch("Int-convertible value", type_name(&call.args[0])).into()
    })
}

fn to_float(call: NativeCall) -> EvalResult<Value> {
    expect_args(&call.args, 1)?;
    let value = match &call.args[0] {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Str(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.map(Value::Float).ok_or_else(|| {
        VmError::type_mismatch("Float-convertible value", type_name(&call.args[0])).into()
    })
}

/// `range(end)`, `range(start, end)` or `range(start, end, step)`; `end` is exclusive.
fn range(call: NativeCall) -> EvalResult<Value> {
    expect_args_between(&call.args, 1, 3)?;
    let args = &call.args;
    let (start, end) = match args.len() {
        1 => (0, int_arg(args, 0, "range")?),
        _ => (int_arg(args, 0, "range")?, int_arg(args, 1, "range")?),
    };
    let step = match args.get(2) {
        Some(_) => int_arg(args, 2, "range")?,
        None => 1,
    };
    if step == 0 {
        return Err(VmError::Runtime("range() step must not be zero".to_string()).into());
    }
    let span = if step > 0 {
        end as i128 - start as i128
    } else {
        start as i128 - end as i128
    };
    let len = (span.max(0) + step.unsigned_abs() as i128 - 1) / step.unsigned_abs() as i128;
    if len > MAX_SEQUENCE_LEN as i128 {
        return Err(VmError::SizeLimit(format!("range({}, {}, {})", start, end, step)).into());
    }
    let mut items = Vec::with_capacity(len as usize);
    let mut current = start;
    while (step > 0 && current < end) || (step < 0 && current > end) {
        items.push(Value::Int(current));
        current = match current.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(Value::array(items))
}
