//! Operator semantics.
//!
//! Number-only operators are free functions. Equality and ordering need to
//! force array elements and object fields, so they live on [`Vm`].

use crate::errors::{binary_types, division_by_zero, EvalError, EvalErrorKind, EvalResult};
use crate::value::Value;
use crate::Vm;
use grz_ir::{BinaryOp, UnaryOp};
use std::cmp::Ordering;

pub(crate) fn unary(op: UnaryOp, value: &Value) -> EvalResult<Value> {
    match (op, value) {
        (UnaryOp::Neg, Value::Num(n)) => Ok(Value::Num(-n)),
        (UnaryOp::Plus, Value::Num(n)) => Ok(Value::Num(*n)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::BitNot, Value::Num(n)) => Ok(Value::Num(!(*n as i64) as f64)),
        (op, other) => Err(EvalError::from_kind(EvalErrorKind::UnaryType {
            op,
            got: other.type_name(),
        })),
    }
}

/// Arithmetic, shift and bitwise operators on two numbers.
pub(crate) fn arithmetic(op: BinaryOp, a: f64, b: f64) -> EvalResult<Value> {
    let result = match op {
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(division_by_zero());
            }
            a / b
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(division_by_zero());
            }
            a % b
        }
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Shl | BinaryOp::Shr => {
            let shift = b as i64;
            if shift < 0 {
                return Err(EvalError::new(format!(
                    "shift by negative exponent: {shift}"
                )));
            }
            // Shifting every bit out leaves 0, or -1 for a negative `>>`.
            let shift = u32::try_from(shift).unwrap_or(u32::MAX);
            let value = a as i64;
            if op == BinaryOp::Shl {
                value.checked_shl(shift).unwrap_or(0) as f64
            } else {
                value.checked_shr(shift).unwrap_or(value >> 63) as f64
            }
        }
        BinaryOp::BitAnd => ((a as i64) & (b as i64)) as f64,
        BinaryOp::BitXor => ((a as i64) ^ (b as i64)) as f64,
        BinaryOp::BitOr => ((a as i64) | (b as i64)) as f64,
        _ => return Err(binary_types(op, "number", "number")),
    };
    if result.is_finite() {
        Ok(Value::Num(result))
    } else {
        Err(EvalError::from_kind(EvalErrorKind::NotFinite))
    }
}

/// Whether `ordering` (left compared to right) satisfies a comparison operator.
pub(crate) fn ordering_satisfies(op: BinaryOp, ordering: Ordering) -> bool {
    match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::LtEq => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::GtEq => ordering != Ordering::Less,
        _ => false,
    }
}

impl Vm {
    /// Deep equality. Objects compare their visible fields only; functions
    /// cannot be compared.
    pub(crate) fn equals(&mut self, a: &Value, b: &Value) -> EvalResult<bool> {
        match (a, b) {
            (Value::Null, Value::Null) => Ok(true),
            (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
            (Value::Num(x), Value::Num(y)) => Ok(x == y),
            (Value::Str(x), Value::Str(y)) => Ok(x == y),
            (Value::Array(xs), Value::Array(ys)) => {
                if xs.len() != ys.len() {
                    return Ok(false);
                }
                for (x, y) in xs.iter().zip(ys.iter()) {
                    let x = self.force(*x)?;
                    let y = self.force(*y)?;
                    if !self.equals(&x, &y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Object(x), Value::Object(y)) => {
                let fields = self.field_names(*x, false);
                if fields != self.field_names(*y, false) {
                    return Ok(false);
                }
                for name in &fields {
                    let xv = self.get_field(*x, name)?;
                    let yv = self.get_field(*y, name)?;
                    if !self.equals(&xv, &yv)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Function(_), Value::Function(_)) => Err(EvalError::new(
                "cannot test equality of functions",
            )),
            _ => Ok(false),
        }
    }

    /// Ordering for `<`-family operators and `std.sort`: numbers, strings
    /// (by code point) and arrays (lexicographically).
    pub(crate) fn compare(&mut self, a: &Value, b: &Value, op: BinaryOp) -> EvalResult<Ordering> {
        match (a, b) {
            (Value::Num(x), Value::Num(y)) => Ok(x.partial_cmp(y).unwrap_or(Ordering::Equal)),
            (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
            (Value::Array(xs), Value::Array(ys)) => {
                for (x, y) in xs.iter().zip(ys.iter()) {
                    let x = self.force(*x)?;
                    let y = self.force(*y)?;
                    let ordering = self.compare(&x, &y, op)?;
                    if ordering != Ordering::Equal {
                        return Ok(ordering);
                    }
                }
                Ok(xs.len().cmp(&ys.len()))
            }
            _ => Err(binary_types(op, a.type_name(), b.type_name())),
        }
    }
}
