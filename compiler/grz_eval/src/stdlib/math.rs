use super::Args;
use crate::errors::{EvalError, EvalErrorKind, EvalResult};
use crate::value::Value;
use crate::Vm;
use grz_ir::BinaryOp;

fn finite(n: f64) -> EvalResult<Value> {
    if n.is_finite() {
        Ok(Value::Num(n))
    } else {
        Err(EvalError::from_kind(EvalErrorKind::NotFinite))
    }
}

pub(super) fn abs(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::Num(args.number(vm, 0)?.abs()))
}

pub(super) fn sign(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let n = args.number(vm, 0)?;
    let sign = if n > 0.0 {
        1.0
    } else if n < 0.0 {
        -1.0
    } else {
        0.0
    };
    Ok(Value::Num(sign))
}

pub(super) fn max(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let a = args.number(vm, 0)?;
    let b = args.number(vm, 1)?;
    Ok(Value::Num(a.max(b)))
}

pub(super) fn min(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let a = args.number(vm, 0)?;
    let b = args.number(vm, 1)?;
    Ok(Value::Num(a.min(b)))
}

pub(super) fn pow(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let x = args.number(vm, 0)?;
    let n = args.number(vm, 1)?;
    finite(x.powf(n))
}

pub(super) fn floor(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::Num(args.number(vm, 0)?.floor()))
}

pub(super) fn ceil(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::Num(args.number(vm, 0)?.ceil()))
}

pub(super) fn sqrt(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    finite(args.number(vm, 0)?.sqrt())
}

/// Half-way cases round up.
pub(super) fn round(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::Num((args.number(vm, 0)? + 0.5).floor()))
}

/// `a % b`: remainder for numbers, formatting for strings.
pub(super) fn modulo(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let a = args.value(vm, 0)?;
    let b = args.value(vm, 1)?;
    match a {
        Value::Num(_) | Value::Str(_) => vm.apply_binary(BinaryOp::Mod, &a, &b),
        other => Err(args.wrong_type(0, "number or string", &other)),
    }
}

fn integral(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Option<f64>> {
    let n = args.number(vm, 0)?;
    Ok((n.fract() == 0.0).then_some(n))
}

pub(super) fn is_integer(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::Bool(integral(vm, args)?.is_some()))
}

pub(super) fn is_decimal(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::Bool(integral(vm, args)?.is_none()))
}

pub(super) fn is_even(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::Bool(integral(vm, args)?.is_some_and(|n| n % 2.0 == 0.0)))
}

pub(super) fn is_odd(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::Bool(integral(vm, args)?.is_some_and(|n| n % 2.0 != 0.0)))
}

pub(super) fn clamp(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let x = args.number(vm, 0)?;
    let min = args.number(vm, 1)?;
    let max = args.number(vm, 2)?;
    let clamped = if x < min {
        min
    } else if x > max {
        max
    } else {
        x
    };
    Ok(Value::Num(clamped))
}

pub(super) fn exp(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    finite(args.number(vm, 0)?.exp())
}

pub(super) fn log(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    finite(args.number(vm, 0)?.ln())
}
