use super::Args;
use crate::errors::EvalResult;
use crate::value::Value;
use crate::Vm;

pub(super) fn is_string(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::Bool(matches!(args.value(vm, 0)?, Value::Str(_))))
}

pub(super) fn is_number(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::Bool(matches!(args.value(vm, 0)?, Value::Num(_))))
}

pub(super) fn is_boolean(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::Bool(matches!(args.value(vm, 0)?, Value::Bool(_))))
}

pub(super) fn is_object(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::Bool(matches!(args.value(vm, 0)?, Value::Object(_))))
}

pub(super) fn is_array(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::Bool(matches!(args.value(vm, 0)?, Value::Array(_))))
}

pub(super) fn is_function(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::Bool(matches!(args.value(vm, 0)?, Value::Function(_))))
}

pub(super) fn type_of(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::str(args.value(vm, 0)?.type_name()))
}

/// Characters of a string, elements of an array, visible fields of an
/// object or parameters of a function.
pub(super) fn length(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let len = match args.value(vm, 0)? {
        Value::Str(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(obj) => vm.field_names(obj, false).len(),
        Value::Function(func) => func.param_names().len(),
        other => return Err(args.wrong_type(0, "string, array, object or function", &other)),
    };
    Ok(Value::Num(len as f64))
}

pub(super) fn equals(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let a = args.value(vm, 0)?;
    let b = args.value(vm, 1)?;
    Ok(Value::Bool(vm.equals(&a, &b)?))
}
