//! Indexing and slicing.

use super::Vm;
use crate::errors::{index_out_of_bounds, type_mismatch, EvalError, EvalErrorKind, EvalResult};
use crate::heap::ThunkId;
use crate::value::Value;

impl Vm {
    /// `target[index]` for objects, arrays and strings.
    pub(crate) fn index_value(&mut self, target: &Value, index: &Value) -> EvalResult<Value> {
        match (target, index) {
            (Value::Object(obj), Value::Str(name)) => self.get_field(*obj, name),
            (Value::Object(_), other) => {
                Err(type_mismatch("object index", "string", other.type_name()))
            }
            (Value::Array(items), Value::Num(n)) => {
                let idx = to_integer(*n)?;
                match usize::try_from(idx).ok().and_then(|i| items.get(i)) {
                    Some(thunk) => self.force(*thunk),
                    None => Err(index_out_of_bounds(idx, items.len())),
                }
            }
            (Value::Array(_), other) => {
                Err(type_mismatch("array index", "number", other.type_name()))
            }
            (Value::Str(s), Value::Num(n)) => {
                let idx = to_integer(*n)?;
                let len = s.chars().count();
                match usize::try_from(idx).ok().and_then(|i| s.chars().nth(i)) {
                    Some(c) => Ok(Value::str(c.encode_utf8(&mut [0; 4]))),
                    None => Err(index_out_of_bounds(idx, len)),
                }
            }
            (Value::Str(_), other) => {
                Err(type_mismatch("string index", "number", other.type_name()))
            }
            (other, _) => Err(EvalError::new(format!(
                "value of type {} cannot be indexed",
                other.type_name()
            ))),
        }
    }

    /// `target[start:end:step]`; `null` bounds take their defaults and
    /// negative bounds count from the end.
    pub(crate) fn slice_value(
        &mut self,
        target: &Value,
        start: &Value,
        end: &Value,
        step: &Value,
    ) -> EvalResult<Value> {
        let len = match target {
            Value::Array(items) => items.len(),
            Value::Str(s) => s.chars().count(),
            other => {
                return Err(type_mismatch("slice", "array or string", other.type_name()));
            }
        };
        let start = slice_bound(start, 0, len, "start")?;
        let end = slice_bound(end, len, len, "end")?;
        let step = match step {
            Value::Null => 1,
            Value::Num(n) => {
                let step = to_integer(*n)?;
                if step <= 0 {
                    return Err(EvalError::new(format!(
                        "slice step must be greater than zero, got {step}"
                    )));
                }
                step as usize
            }
            other => return Err(type_mismatch("slice step", "number", other.type_name())),
        };

        let picked = (start..end.max(start)).step_by(step);
        match target {
            Value::Array(items) => {
                let thunks: Vec<ThunkId> = picked.map(|i| items[i]).collect();
                Ok(Value::Array(thunks.into()))
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let out: String = picked.map(|i| chars[i]).collect();
                Ok(Value::str(&out))
            }
            _ => Ok(Value::Null),
        }
    }
}

/// Convert a number used as an index, rejecting fractions.
pub(crate) fn to_integer(n: f64) -> EvalResult<i64> {
    if n.fract() != 0.0 || !n.is_finite() {
        return Err(EvalError::from_kind(EvalErrorKind::NotInteger { value: n }));
    }
    Ok(n as i64)
}

fn slice_bound(value: &Value, default: usize, len: usize, what: &str) -> EvalResult<usize> {
    match value {
        Value::Null => Ok(default),
        Value::Num(n) => {
            let idx = to_integer(*n)?;
            let resolved = if idx < 0 { len as i64 + idx } else { idx };
            Ok(resolved.clamp(0, len as i64) as usize)
        }
        other => Err(type_mismatch(
            &format!("slice {what}"),
            "number",
            other.type_name(),
        )),
    }
}
