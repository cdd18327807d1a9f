//! Rendering values as JSON text and converting to and from `serde_json`.

use crate::errors::{manifest_error, EvalError, EvalErrorKind, EvalResult};
use crate::format::general;
use crate::heap::ThunkId;
use crate::value::Value;
use crate::Vm;
use serde_json::Value as JsonValue;
use std::rc::Rc;

/// Layout of manifested JSON.
struct JsonStyle<'a> {
    indent: &'a str,
    newline: &'a str,
    key_val_sep: &'a str,
    item_sep: &'a str,
    empty_array: &'a str,
    empty_object: &'a str,
}

/// Layout of the VM's final output and of `error` messages.
const OUTPUT: JsonStyle<'static> = JsonStyle {
    indent: "   ",
    newline: "\n",
    key_val_sep: ": ",
    item_sep: ",",
    empty_array: "[ ]",
    empty_object: "{ }",
};

/// Layout used by `std.toString` and string concatenation.
const SINGLE_LINE: JsonStyle<'static> = JsonStyle {
    indent: "",
    newline: "",
    key_val_sep: ": ",
    item_sep: ", ",
    empty_array: "[ ]",
    empty_object: "{ }",
};

impl Vm {
    /// Multi-line JSON with three-space indentation.
    pub(crate) fn manifest_output(&mut self, value: &Value) -> EvalResult<String> {
        let mut out = String::new();
        self.write_json(value, &OUTPUT, "", &mut out)?;
        Ok(out)
    }

    pub(crate) fn manifest_single_line(&mut self, value: &Value) -> EvalResult<String> {
        let mut out = String::new();
        self.write_json(value, &SINGLE_LINE, "", &mut out)?;
        Ok(out)
    }

    /// `std.manifestJsonEx` layout.
    pub(crate) fn manifest_json(
        &mut self,
        value: &Value,
        indent: &str,
        newline: &str,
        key_val_sep: &str,
    ) -> EvalResult<String> {
        let style = JsonStyle {
            indent,
            newline,
            key_val_sep,
            item_sep: ",",
            empty_array: "[]",
            empty_object: "{}",
        };
        let mut out = String::new();
        self.write_json(value, &style, "", &mut out)?;
        Ok(out)
    }

    fn write_json(
        &mut self,
        value: &Value,
        style: &JsonStyle<'_>,
        cindent: &str,
        out: &mut String,
    ) -> EvalResult<()> {
        match value {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Num(n) if n.is_finite() => out.push_str(&format_number(*n)),
            Value::Num(_) => return Err(EvalError::from_kind(EvalErrorKind::NotFinite)),
            Value::Str(s) => escape_json_string(s, out),
            Value::Function(_) => return Err(manifest_error("couldn't manifest function as JSON")),
            Value::Array(items) => {
                if items.is_empty() {
                    out.push_str(style.empty_array);
                    return Ok(());
                }
                let inner = format!("{cindent}{}", style.indent);
                out.push('[');
                out.push_str(style.newline);
                for (i, thunk) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(style.item_sep);
                        out.push_str(style.newline);
                    }
                    out.push_str(&inner);
                    let item = self.force(*thunk)?;
                    grz_stack::grow_if_needed(|| self.write_json(&item, style, &inner, out))?;
                }
                out.push_str(style.newline);
                out.push_str(cindent);
                out.push(']');
            }
            Value::Object(obj) => {
                self.ensure_asserts(*obj)?;
                let names = self.field_names(*obj, false);
                if names.is_empty() {
                    out.push_str(style.empty_object);
                    return Ok(());
                }
                let inner = format!("{cindent}{}", style.indent);
                out.push('{');
                out.push_str(style.newline);
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        out.push_str(style.item_sep);
                        out.push_str(style.newline);
                    }
                    out.push_str(&inner);
                    escape_json_string(name, out);
                    out.push_str(style.key_val_sep);
                    let field = self.get_field(*obj, name)?;
                    grz_stack::grow_if_needed(|| self.write_json(&field, style, &inner, out))?;
                }
                out.push_str(style.newline);
                out.push_str(cindent);
                out.push('}');
            }
        }
        Ok(())
    }

    /// Manifest a value for a native function.
    pub(crate) fn to_json(&mut self, value: &Value) -> EvalResult<JsonValue> {
        Ok(match value {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Num(n) => number_to_json(*n),
            Value::Str(s) => JsonValue::String(s.to_string()),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for thunk in items.iter() {
                    let item = self.force(*thunk)?;
                    out.push(self.to_json(&item)?);
                }
                JsonValue::Array(out)
            }
            Value::Object(obj) => {
                self.ensure_asserts(*obj)?;
                let mut map = serde_json::Map::new();
                for name in self.field_names(*obj, false) {
                    let field = self.get_field(*obj, &name)?;
                    map.insert(name.to_string(), self.to_json(&field)?);
                }
                JsonValue::Object(map)
            }
            Value::Function(_) => return Err(manifest_error("couldn't manifest function as JSON")),
        })
    }

    /// Convert a native function's result (or `std.parseJson` input) back
    /// into a value.
    pub(crate) fn from_json(&mut self, value: &JsonValue) -> Value {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Num(n.as_f64().unwrap_or_default()),
            JsonValue::String(s) => Value::str(s),
            JsonValue::Array(items) => {
                let thunks: Vec<ThunkId> = items
                    .iter()
                    .map(|item| {
                        let value = self.from_json(item);
                        self.heap.alloc_ready(value)
                    })
                    .collect();
                Value::Array(thunks.into())
            }
            JsonValue::Object(map) => {
                let fields: Vec<(Rc<str>, ThunkId)> = map
                    .iter()
                    .map(|(key, item)| {
                        let value = self.from_json(item);
                        (Rc::from(key.as_str()), self.heap.alloc_ready(value))
                    })
                    .collect();
                Value::Object(self.make_object(fields))
            }
        }
    }
}

fn number_to_json(n: f64) -> JsonValue {
    // Integral values within the exactly representable range stay integers
    // so host functions see `3`, not `3.0`.
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        JsonValue::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(JsonValue::Null, JsonValue::Number)
    }
}

/// Number text in manifested output: integers without a fraction, anything
/// else with 17 significant digits.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        return format!("{n:.0}");
    }
    let digits = general(n.abs(), 17, false, false);
    if n < 0.0 {
        format!("-{digits}")
    } else {
        digits
    }
}

/// Append `s` as a quoted JSON string.
pub(crate) fn escape_json_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c < '\u{20}' || ('\u{7f}'..='\u{9f}').contains(&c) => {
                out.push_str(&format!("\\u{:04x}", u32::from(c)));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
