use super::{array_of, force_all, Args};
use crate::errors::{EvalError, EvalResult};
use crate::value::Value;
use crate::Vm;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::Digest;

/// Bytes of a string (UTF-8) or of an array of byte numbers.
fn bytes_arg(vm: &mut Vm, args: &Args<'_>, idx: usize) -> EvalResult<Vec<u8>> {
    match args.value(vm, idx)? {
        Value::Str(s) => Ok(s.as_bytes().to_vec()),
        Value::Array(items) => force_all(vm, &items)?
            .into_iter()
            .map(|item| match item {
                Value::Num(n) if n.fract() == 0.0 && (0.0..=255.0).contains(&n) => Ok(n as u8),
                other => Err(EvalError::new(format!(
                    "std.{}: expected an array of bytes (integers 0-255), found {}",
                    args.name(),
                    describe_byte(&other)
                ))),
            })
            .collect(),
        other => Err(args.wrong_type(idx, "string or array of bytes", &other)),
    }
}

fn describe_byte(value: &Value) -> String {
    match value {
        Value::Num(n) => format!("{n}"),
        other => other.type_name().to_string(),
    }
}

fn byte_array(vm: &mut Vm, bytes: &[u8]) -> Value {
    array_of(vm, bytes.iter().map(|b| Value::Num(f64::from(*b))))
}

fn decode(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Vec<u8>> {
    let text = args.string(vm, 0)?;
    STANDARD
        .decode(text.as_bytes())
        .map_err(|err| EvalError::new(format!("std.{}: invalid base64: {err}", args.name())))
}

pub(super) fn base64(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let bytes = bytes_arg(vm, args, 0)?;
    Ok(Value::str(&STANDARD.encode(bytes)))
}

pub(super) fn base64_decode(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let bytes = decode(vm, args)?;
    Ok(Value::str(&String::from_utf8_lossy(&bytes)))
}

pub(super) fn base64_decode_bytes(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let bytes = decode(vm, args)?;
    Ok(byte_array(vm, &bytes))
}

pub(super) fn encode_utf8(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let s = args.string(vm, 0)?;
    Ok(byte_array(vm, s.as_bytes()))
}

pub(super) fn decode_utf8(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let bytes = bytes_arg(vm, args, 0)?;
    Ok(Value::str(&String::from_utf8_lossy(&bytes)))
}

/// Lower-case hex digest of the UTF-8 bytes of a string argument.
fn hex_digest<D: Digest>(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let s = args.string(vm, 0)?;
    let digest = D::digest(s.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    Ok(Value::str(&hex))
}

pub(super) fn md5(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    hex_digest::<md5::Md5>(vm, args)
}

pub(super) fn sha1(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    hex_digest::<sha1::Sha1>(vm, args)
}

pub(super) fn sha256(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    hex_digest::<sha2::Sha256>(vm, args)
}

pub(super) fn sha512(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    hex_digest::<sha2::Sha512>(vm, args)
}
