//! `%`-style string formatting (`"%5.2f" % x`, `std.format`).
//!
//! Supports `%(name)` keys when formatting with an object, the flags
//! `# 0 - + <space>`, `*` widths and precisions, and the conversions
//! `d i u o x X e E f F g G c s %`. Length modifiers `h l L` are accepted and
//! ignored.

use crate::errors::{type_mismatch, EvalError, EvalResult};
use crate::heap::{ObjId, ThunkId};
use crate::value::Value;
use crate::Vm;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
enum Count {
    Fixed(usize),
    Star,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Spec {
    key: Option<String>,
    alt: bool,
    zero: bool,
    left: bool,
    blank: bool,
    plus: bool,
    width: Option<Count>,
    precision: Option<Count>,
    conv: char,
}

#[derive(Clone, Debug, PartialEq)]
enum Piece {
    Literal(String),
    Code(Spec),
}

fn parse_format(format: &str) -> EvalResult<Vec<Piece>> {
    let chars: Vec<char> = format.chars().collect();
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    let truncated = || EvalError::new("Truncated format code.");

    while i < chars.len() {
        if chars[i] != '%' {
            literal.push(chars[i]);
            i += 1;
            continue;
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(std::mem::take(&mut literal)));
        }
        i += 1;
        let mut spec = Spec::default();

        if chars.get(i) == Some(&'(') {
            let close = chars[i..]
                .iter()
                .position(|c| *c == ')')
                .ok_or_else(truncated)?;
            spec.key = Some(chars[i + 1..i + close].iter().collect());
            i += close + 1;
        }

        while let Some(c) = chars.get(i) {
            match c {
                '#' => spec.alt = true,
                '0' => spec.zero = true,
                '-' => spec.left = true,
                ' ' => spec.blank = true,
                '+' => spec.plus = true,
                _ => break,
            }
            i += 1;
        }

        spec.width = parse_count(&chars, &mut i);
        if chars.get(i) == Some(&'.') {
            i += 1;
            spec.precision = Some(parse_count(&chars, &mut i).unwrap_or(Count::Fixed(0)));
        }

        while matches!(chars.get(i), Some('h' | 'l' | 'L')) {
            i += 1;
        }

        let conv = *chars.get(i).ok_or_else(truncated)?;
        if !"diuoxXeEfFgGcs%".contains(conv) {
            return Err(EvalError::new(format!("Unrecognised conversion type: {conv}")));
        }
        spec.conv = conv;
        i += 1;
        pieces.push(Piece::Code(spec));
    }
    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }
    Ok(pieces)
}

fn parse_count(chars: &[char], i: &mut usize) -> Option<Count> {
    if chars.get(*i) == Some(&'*') {
        *i += 1;
        return Some(Count::Star);
    }
    let start = *i;
    let mut n = 0usize;
    while let Some(d) = chars.get(*i).and_then(|c| c.to_digit(10)) {
        n = n.saturating_mul(10).saturating_add(d as usize);
        *i += 1;
    }
    (*i > start).then_some(Count::Fixed(n))
}

/// Where formatting arguments come from.
enum Source {
    Positional { items: Rc<[ThunkId]>, next: usize },
    Named(ObjId),
}

impl Vm {
    pub(crate) fn format_string(&mut self, format: &str, args: &Value) -> EvalResult<String> {
        let pieces = parse_format(format)?;
        let mut source = match args {
            Value::Array(items) => Source::Positional {
                items: Rc::clone(items),
                next: 0,
            },
            Value::Object(obj) => Source::Named(*obj),
            other => Source::Positional {
                items: Rc::from(vec![self.heap.alloc_ready(other.clone())]),
                next: 0,
            },
        };

        let mut out = String::new();
        for piece in &pieces {
            let spec = match piece {
                Piece::Literal(text) => {
                    out.push_str(text);
                    continue;
                }
                Piece::Code(spec) => spec,
            };
            if spec.conv == '%' {
                out.push('%');
                continue;
            }
            let width = match &spec.width {
                Some(Count::Star) => self.star_count(&mut source)?,
                Some(Count::Fixed(n)) => *n,
                None => 0,
            };
            let precision = match &spec.precision {
                Some(Count::Star) => Some(self.star_count(&mut source)?),
                Some(Count::Fixed(n)) => Some(*n),
                None => None,
            };
            let value = match source {
                Source::Named(obj) => {
                    let Some(key) = &spec.key else {
                        return Err(EvalError::new("Format required a key, since an object was given"));
                    };
                    self.get_field(obj, key)?
                }
                Source::Positional { .. } => {
                    if let Some(key) = &spec.key {
                        return Err(EvalError::new(format!(
                            "Mapping key ({key}) requires an object argument, got {}",
                            args.type_name()
                        )));
                    }
                    self.next_positional(&mut source)?
                }
            };
            let rendered = self.render_code(spec, precision, &value)?;
            out.push_str(&rendered.pad(spec, width));
        }

        if let Source::Positional { items, next } = &source {
            if *next < items.len() {
                return Err(EvalError::new(format!(
                    "Too many values to format: {}, expected {next}",
                    items.len()
                )));
            }
        }
        Ok(out)
    }

    fn next_positional(&mut self, source: &mut Source) -> EvalResult<Value> {
        match source {
            Source::Positional { items, next } => {
                let Some(thunk) = items.get(*next).copied() else {
                    return Err(EvalError::new(format!(
                        "Not enough values to format: {}",
                        items.len()
                    )));
                };
                *next += 1;
                self.force(thunk)
            }
            Source::Named(_) => Err(EvalError::new(
                "Cannot use * width or precision with an object",
            )),
        }
    }

    fn star_count(&mut self, source: &mut Source) -> EvalResult<usize> {
        match self.next_positional(source)? {
            Value::Num(n) if n >= 0.0 => Ok(n as usize),
            Value::Num(n) => Err(EvalError::new(format!("Negative width or precision: {n}"))),
            other => Err(type_mismatch("format * width", "number", other.type_name())),
        }
    }

    fn render_code(&mut self, spec: &Spec, precision: Option<usize>, value: &Value) -> EvalResult<Rendered> {
        let number = |value: &Value| match value {
            Value::Num(n) => Ok(*n),
            other => Err(type_mismatch(
                &format!("format %{}", spec.conv),
                "number",
                other.type_name(),
            )),
        };
        let rendered = match spec.conv {
            'd' | 'i' | 'u' => {
                let n = number(value)?;
                Rendered::numeric(n, spec, String::new(), integer_digits(n, 10, false, precision))
            }
            'o' => {
                let n = number(value)?;
                let prefix = if spec.alt { "0" } else { "" };
                Rendered::numeric(n, spec, prefix.to_string(), integer_digits(n, 8, false, precision))
            }
            'x' | 'X' => {
                let n = number(value)?;
                let upper = spec.conv == 'X';
                let prefix = match (spec.alt, upper) {
                    (false, _) => "",
                    (true, false) => "0x",
                    (true, true) => "0X",
                };
                Rendered::numeric(n, spec, prefix.to_string(), integer_digits(n, 16, upper, precision))
            }
            'f' | 'F' => {
                let n = number(value)?;
                Rendered::numeric(n, spec, String::new(), fixed(n.abs(), precision.unwrap_or(6), spec.alt))
            }
            'e' | 'E' => {
                let n = number(value)?;
                let body = exponent(n.abs(), precision.unwrap_or(6), spec.alt, spec.conv == 'E');
                Rendered::numeric(n, spec, String::new(), body)
            }
            'g' | 'G' => {
                let n = number(value)?;
                let body = general(n.abs(), precision.unwrap_or(6), spec.alt, spec.conv == 'G');
                Rendered::numeric(n, spec, String::new(), body)
            }
            'c' => match value {
                Value::Num(n) => {
                    let c = char::from_u32(*n as u32)
                        .ok_or_else(|| EvalError::new(format!("Invalid codepoint: {n}")))?;
                    Rendered::text(c.to_string())
                }
                Value::Str(s) if s.chars().count() == 1 => Rendered::text(s.to_string()),
                Value::Str(s) => {
                    return Err(EvalError::new(format!(
                        "%c expected 1-sized string got: {}",
                        s.chars().count()
                    )));
                }
                other => return Err(type_mismatch("format %c", "number or string", other.type_name())),
            },
            _ => {
                let mut text = self.to_string(value)?;
                if let Some(limit) = precision {
                    text = text.chars().take(limit).collect();
                }
                Rendered::text(text)
            }
        };
        Ok(rendered)
    }
}

/// A formatted value before width padding.
struct Rendered {
    sign: &'static str,
    prefix: String,
    body: String,
    numeric: bool,
}

impl Rendered {
    fn numeric(n: f64, spec: &Spec, prefix: String, body: String) -> Self {
        let sign = if n < 0.0 {
            "-"
        } else if spec.plus {
            "+"
        } else if spec.blank {
            " "
        } else {
            ""
        };
        Rendered {
            sign,
            prefix,
            body,
            numeric: true,
        }
    }

    fn text(body: String) -> Self {
        Rendered {
            sign: "",
            prefix: String::new(),
            body,
            numeric: false,
        }
    }

    fn pad(self, spec: &Spec, width: usize) -> String {
        let len = self.sign.len() + self.prefix.chars().count() + self.body.chars().count();
        let fill = width.saturating_sub(len);
        if spec.left {
            format!("{}{}{}{}", self.sign, self.prefix, self.body, " ".repeat(fill))
        } else if spec.zero && self.numeric {
            format!("{}{}{}{}", self.sign, self.prefix, "0".repeat(fill), self.body)
        } else {
            format!("{}{}{}{}", " ".repeat(fill), self.sign, self.prefix, self.body)
        }
    }
}

fn integer_digits(n: f64, radix: u32, upper: bool, min_digits: Option<usize>) -> String {
    let magnitude = n.abs().trunc() as u64;
    let digits = match (radix, upper) {
        (8, _) => format!("{magnitude:o}"),
        (16, false) => format!("{magnitude:x}"),
        (16, true) => format!("{magnitude:X}"),
        _ => magnitude.to_string(),
    };
    match min_digits {
        Some(min) if digits.len() < min => format!("{}{digits}", "0".repeat(min - digits.len())),
        _ => digits,
    }
}

/// `%f` of a non-negative number.
pub(crate) fn fixed(x: f64, precision: usize, alt: bool) -> String {
    let mut out = format!("{x:.precision$}");
    if alt && precision == 0 {
        out.push('.');
    }
    out
}

/// `%e` of a non-negative number.
pub(crate) fn exponent(x: f64, precision: usize, alt: bool, upper: bool) -> String {
    let text = format!("{x:.precision$e}");
    let (mantissa, exp) = text.split_once('e').unwrap_or((&text, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let dot = if alt && precision == 0 { "." } else { "" };
    let e = if upper { 'E' } else { 'e' };
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}{dot}{e}{sign}{:02}", exp.abs())
}

/// `%g` of a non-negative number: `%e` for very small or large exponents,
/// `%f` otherwise, trailing zeros removed unless `alt`.
pub(crate) fn general(x: f64, precision: usize, alt: bool, upper: bool) -> String {
    let precision = precision.max(1);
    let exp = if x == 0.0 {
        0
    } else {
        let text = format!("{x:.prec$e}", prec = precision - 1);
        text.split_once('e')
            .and_then(|(_, exp)| exp.parse::<i32>().ok())
            .unwrap_or(0)
    };
    if exp < -4 || exp >= precision as i32 {
        let text = exponent(x, precision - 1, alt, upper);
        if alt {
            return text;
        }
        match text.find(|c: char| c == 'e' || c == 'E') {
            Some(pos) => format!("{}{}", strip_zeros(&text[..pos]), &text[pos..]),
            None => text,
        }
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        let text = fixed(x, decimals, alt);
        if alt {
            text
        } else {
            strip_zeros(&text).to_string()
        }
    }
}

fn strip_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_format_pieces() {
        let pieces = parse_format("a%-05.2fb%%").unwrap_or_default();
        assert_eq!(pieces.len(), 4);
        assert_eq!(pieces[0], Piece::Literal("a".to_string()));
        let Piece::Code(spec) = &pieces[1] else {
            panic!("expected a format code");
        };
        assert!(spec.left && spec.zero);
        assert_eq!(spec.width, Some(Count::Fixed(5)));
        assert_eq!(spec.precision, Some(Count::Fixed(2)));
        assert_eq!(spec.conv, 'f');
    }

    #[test]
    fn test_parse_format_errors() {
        assert!(parse_format("%").is_err());
        assert!(parse_format("%y").is_err());
        assert!(parse_format("%(name").is_err());
    }

    #[test]
    fn test_float_conversions() {
        assert_eq!(fixed(3.14159, 2, false), "3.14");
        assert_eq!(fixed(3.0, 0, true), "3.");
        assert_eq!(exponent(1234.5, 2, false, false), "1.23e+03");
        assert_eq!(exponent(0.00012, 1, false, true), "1.2E-04");
        assert_eq!(general(0.0001, 6, false, false), "0.0001");
        assert_eq!(general(1234567.0, 6, false, false), "1.23457e+06");
        assert_eq!(general(2.5, 6, false, false), "2.5");
        assert_eq!(general(100.0, 6, true, false), "100.000");
    }

    #[test]
    fn test_integer_digits() {
        assert_eq!(integer_digits(-42.7, 10, false, None), "42");
        assert_eq!(integer_digits(255.0, 16, true, None), "FF");
        assert_eq!(integer_digits(8.0, 8, false, Some(4)), "0010");
    }
}
