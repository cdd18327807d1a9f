use super::Args;
use crate::errors::{EvalError, EvalResult};
use crate::value::{FuncValue, Value};
use crate::Vm;
use std::rc::Rc;

/// `manifestJsonEx` with four-space indentation.
pub(super) fn manifest_json(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let value = args.value(vm, 0)?;
    Ok(Value::str(&vm.manifest_json(&value, "    ", "\n", ": ")?))
}

pub(super) fn manifest_json_ex(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let value = args.value(vm, 0)?;
    let indent = args.string(vm, 1)?;
    let newline = if args.is_given(2) {
        args.string(vm, 2)?
    } else {
        Rc::from("\n")
    };
    let key_val_sep = if args.is_given(3) {
        args.string(vm, 3)?
    } else {
        Rc::from(": ")
    };
    Ok(Value::str(&vm.manifest_json(&value, &indent, &newline, &key_val_sep)?))
}

pub(super) fn manifest_json_minified(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let value = args.value(vm, 0)?;
    Ok(Value::str(&vm.manifest_json(&value, "", "", ":")?))
}

/// Look up a host function registered with the VM.
pub(super) fn native(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let name = args.string(vm, 0)?;
    match vm.native(&name) {
        Some(native) => Ok(Value::Function(Rc::new(FuncValue::Native(native)))),
        None => Err(EvalError::new(format!("Unrecognized native function name: {name}"))),
    }
}

/// No external variables are ever defined.
pub(super) fn ext_var(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let name = args.string(vm, 0)?;
    Err(EvalError::new(format!("Undefined external variable: {name}")))
}

pub(super) fn trace(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let message = args.string(vm, 0)?;
    tracing::info!(message = %message, "std.trace");
    args.value(vm, 1)
}

pub(super) fn assert_equal(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let a = args.value(vm, 0)?;
    let b = args.value(vm, 1)?;
    if vm.equals(&a, &b)? {
        return Ok(Value::Bool(true));
    }
    let a = vm.manifest_single_line(&a)?;
    let b = vm.manifest_single_line(&b)?;
    Err(EvalError::new(format!("Assertion failed. {a} != {b}")))
}
