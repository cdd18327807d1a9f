use super::{array_of, force_all, Args};
use crate::errors::{EvalError, EvalResult};
use crate::interpreter::to_integer;
use crate::manifest::escape_json_string;
use crate::value::Value;
use crate::Vm;

/// Whitespace removed by `std.trim`.
const TRIM_CHARS: &[char] = &[' ', '\t', '\n', '\u{c}', '\r', '\u{85}', '\u{a0}'];

pub(super) fn to_string(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let value = args.value(vm, 0)?;
    Ok(Value::str(&vm.to_string(&value)?))
}

pub(super) fn codepoint(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let s = args.string(vm, 0)?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::Num(f64::from(u32::from(c)))),
        _ => Err(EvalError::new(format!(
            "codepoint takes a string of length 1, got length {}",
            s.chars().count()
        ))),
    }
}

pub(super) fn char(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let n = args.number(vm, 0)?;
    let c = u32::try_from(to_integer(n)?)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| EvalError::new(format!("Invalid unicode codepoint, got {n}")))?;
    Ok(Value::str(c.encode_utf8(&mut [0; 4])))
}

pub(super) fn substr(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let s = args.string(vm, 0)?;
    let from = to_integer(args.number(vm, 1)?)?;
    let len = to_integer(args.number(vm, 2)?)?;
    if from < 0 {
        return Err(EvalError::new(format!("substr second parameter should be greater than zero, got {from}")));
    }
    if len < 0 {
        return Err(EvalError::new(format!("substr third parameter should be greater than zero, got {len}")));
    }
    let out: String = s.chars().skip(from as usize).take(len as usize).collect();
    Ok(Value::str(&out))
}

pub(super) fn starts_with(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let a = args.string(vm, 0)?;
    let b = args.string(vm, 1)?;
    Ok(Value::Bool(a.starts_with(&*b)))
}

pub(super) fn ends_with(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let a = args.string(vm, 0)?;
    let b = args.string(vm, 1)?;
    Ok(Value::Bool(a.ends_with(&*b)))
}

pub(super) fn split(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let s = args.string(vm, 0)?;
    let sep = args.string(vm, 1)?;
    split_impl(vm, &s, &sep, None)
}

pub(super) fn split_limit(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let s = args.string(vm, 0)?;
    let sep = args.string(vm, 1)?;
    let max = to_integer(args.number(vm, 2)?)?;
    let limit = usize::try_from(max).ok();
    split_impl(vm, &s, &sep, limit)
}

fn split_impl(vm: &mut Vm, s: &str, sep: &str, max_splits: Option<usize>) -> EvalResult<Value> {
    if sep.is_empty() {
        return Err(EvalError::new("std.split: separator must not be empty"));
    }
    let parts: Vec<Value> = match max_splits {
        Some(max) => s.splitn(max + 1, sep).map(Value::str).collect(),
        None => s.split(sep).map(Value::str).collect(),
    };
    Ok(array_of(vm, parts))
}

pub(super) fn str_replace(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let s = args.string(vm, 0)?;
    let from = args.string(vm, 1)?;
    let to = args.string(vm, 2)?;
    if from.is_empty() {
        return Err(EvalError::new("'from' string must not be zero length."));
    }
    Ok(Value::str(&s.replace(&*from, &to)))
}

pub(super) fn ascii_upper(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::str(&args.string(vm, 0)?.to_ascii_uppercase()))
}

pub(super) fn ascii_lower(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::str(&args.string(vm, 0)?.to_ascii_lowercase()))
}

pub(super) fn string_chars(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let s = args.string(vm, 0)?;
    let chars: Vec<Value> = s.chars().map(|c| Value::str(c.encode_utf8(&mut [0; 4]))).collect();
    Ok(array_of(vm, chars))
}

/// Join strings with a string separator, or arrays with an array
/// separator. `null` elements are skipped.
pub(super) fn join(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let sep = args.value(vm, 0)?;
    let items = args.array(vm, 1)?;
    let items = force_all(vm, &items)?;
    match sep {
        Value::Str(sep) => {
            let mut out = String::new();
            let mut first = true;
            for item in items {
                match item {
                    Value::Null => continue,
                    Value::Str(s) => {
                        if !first {
                            out.push_str(&sep);
                        }
                        out.push_str(&s);
                        first = false;
                    }
                    other => {
                        return Err(EvalError::new(format!(
                            "expected string but arr[i] was {}",
                            other.type_name()
                        )));
                    }
                }
            }
            Ok(Value::str(&out))
        }
        Value::Array(sep) => {
            let mut out = Vec::new();
            let mut first = true;
            for item in items {
                match item {
                    Value::Null => continue,
                    Value::Array(elems) => {
                        if !first {
                            out.extend(sep.iter().copied());
                        }
                        out.extend(elems.iter().copied());
                        first = false;
                    }
                    other => {
                        return Err(EvalError::new(format!(
                            "expected array but arr[i] was {}",
                            other.type_name()
                        )));
                    }
                }
            }
            Ok(Value::Array(out.into()))
        }
        other => Err(args.wrong_type(0, "string or array", &other)),
    }
}

/// Concatenate strings, each followed by a newline.
pub(super) fn lines(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let items = args.array(vm, 0)?;
    let mut out = String::new();
    for item in force_all(vm, &items)? {
        match item {
            Value::Null => {}
            Value::Str(s) => {
                out.push_str(&s);
                out.push('\n');
            }
            other => return Err(args.wrong_type(0, "array of strings", &other)),
        }
    }
    Ok(Value::str(&out))
}

pub(super) fn trim(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::str(args.string(vm, 0)?.trim_matches(TRIM_CHARS)))
}

pub(super) fn strip_chars(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let s = args.string(vm, 0)?;
    let chars: Vec<char> = args.string(vm, 1)?.chars().collect();
    Ok(Value::str(s.trim_matches(&chars[..])))
}

pub(super) fn lstrip_chars(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let s = args.string(vm, 0)?;
    let chars: Vec<char> = args.string(vm, 1)?.chars().collect();
    Ok(Value::str(s.trim_start_matches(&chars[..])))
}

pub(super) fn rstrip_chars(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let s = args.string(vm, 0)?;
    let chars: Vec<char> = args.string(vm, 1)?.chars().collect();
    Ok(Value::str(s.trim_end_matches(&chars[..])))
}

pub(super) fn format(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let format = args.string(vm, 0)?;
    let vals = args.value(vm, 1)?;
    Ok(Value::str(&vm.format_string(&format, &vals)?))
}

pub(super) fn escape_string_json(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let value = args.value(vm, 0)?;
    let s = vm.to_string(&value)?;
    let mut out = String::with_capacity(s.len() + 2);
    escape_json_string(&s, &mut out);
    Ok(Value::str(&out))
}

pub(super) fn parse_int(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let s = args.string(vm, 0)?;
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, &*s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EvalError::new(format!("{s:?} is not a base 10 integer")));
    }
    let magnitude = digits
        .bytes()
        .fold(0.0, |acc, b| acc * 10.0 + f64::from(b - b'0'));
    Ok(Value::Num(if negative { -magnitude } else { magnitude }))
}

pub(super) fn parse_json(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let s = args.string(vm, 0)?;
    let json: serde_json::Value = serde_json::from_str(&s)
        .map_err(|err| EvalError::new(format!("failed to parse JSON: {err}")))?;
    Ok(vm.from_json(&json))
}

pub(super) fn is_empty(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    Ok(Value::Bool(args.string(vm, 0)?.is_empty()))
}

/// Character indices of every (possibly overlapping) occurrence of `pat`.
pub(super) fn find_substr(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let pat: Vec<char> = args.string(vm, 0)?.chars().collect();
    let s: Vec<char> = args.string(vm, 1)?.chars().collect();
    let found: Vec<Value> = if pat.is_empty() || pat.len() > s.len() {
        Vec::new()
    } else {
        s.windows(pat.len())
            .enumerate()
            .filter(|(_, window)| *window == pat.as_slice())
            .map(|(i, _)| Value::Num(i as f64))
            .collect()
    };
    Ok(array_of(vm, found))
}

pub(super) fn equals_ignore_case(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let a = args.string(vm, 0)?;
    let b = args.string(vm, 1)?;
    Ok(Value::Bool(a.to_ascii_lowercase() == b.to_ascii_lowercase()))
}
