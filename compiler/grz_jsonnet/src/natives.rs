//! String and regex functions exposed to scripts via `std.native(name)`.
//!
//! Every parameter is a string. Anything else is rejected with an error
//! naming the function and the parameter; values are never coerced.

use grz_eval::{NativeFunction, NativeHandler};
use regex::Regex;
use serde_json::Value as JsonValue;

const NATIVES: &[(&str, &[&str], NativeHandler)] = &[
    ("literalRegexEscape", &["str"], literal_regex_escape),
    ("regexMatch", &["pattern", "text"], regex_match),
    ("regexSubstitute", &["pattern", "text", "replacement"], regex_substitute),
];

/// The native function table registered into every VM.
pub fn native_functions() -> Vec<NativeFunction> {
    NATIVES
        .iter()
        .map(|(name, params, handler)| NativeFunction::new(name, params, *handler))
        .collect()
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn string_arg<'a>(
    args: &'a [JsonValue],
    index: usize,
    function: &str,
    param: &str,
) -> Result<&'a str, String> {
    match args.get(index) {
        Some(JsonValue::String(s)) => Ok(s),
        Some(other) => Err(format!(
            "{function}: parameter {param} must be a string, got {}",
            json_type(other)
        )),
        None => Err(format!("{function}: missing parameter {param}")),
    }
}

fn compile(pattern: &str, function: &str) -> Result<Regex, String> {
    Regex::new(pattern).map_err(|err| format!("{function}: invalid pattern {pattern:?}: {err}"))
}

fn literal_regex_escape(args: &[JsonValue]) -> Result<JsonValue, String> {
    let s = string_arg(args, 0, "literalRegexEscape", "str")?;
    Ok(JsonValue::String(regex::escape(s)))
}

fn regex_match(args: &[JsonValue]) -> Result<JsonValue, String> {
    let pattern = string_arg(args, 0, "regexMatch", "pattern")?;
    let text = string_arg(args, 1, "regexMatch", "text")?;
    let re = compile(pattern, "regexMatch")?;
    Ok(JsonValue::Bool(re.is_match(text)))
}

/// Replace every match; `$1` and `${name}` refer to capture groups.
fn regex_substitute(args: &[JsonValue]) -> Result<JsonValue, String> {
    let pattern = string_arg(args, 0, "regexSubstitute", "pattern")?;
    let text = string_arg(args, 1, "regexSubstitute", "text")?;
    let replacement = string_arg(args, 2, "regexSubstitute", "replacement")?;
    let re = compile(pattern, "regexSubstitute")?;
    Ok(JsonValue::String(re.replace_all(text, replacement).into_owned()))
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn strings(items: &[&str]) -> Vec<JsonValue> {
        items.iter().map(|s| json!(s)).collect()
    }

    #[test]
    fn test_table_names_and_params() {
        let natives = native_functions();
        let names: Vec<&str> = natives.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["literalRegexEscape", "regexMatch", "regexSubstitute"]);
        assert_eq!(natives[2].params, ["pattern", "text", "replacement"]);
    }

    #[test]
    fn test_escape_matches_only_literal() {
        let escaped = literal_regex_escape(&strings(&["a.b*c"])).unwrap();
        let pattern = format!("^{}$", escaped.as_str().unwrap());
        assert_eq!(regex_match(&strings(&[pattern.as_str(), "a.b*c"])).unwrap(), json!(true));
        assert_eq!(regex_match(&strings(&[pattern.as_str(), "aXbYYc"])).unwrap(), json!(false));
    }

    #[test]
    fn test_match() {
        assert_eq!(regex_match(&strings(&["^foo", "foobar"])).unwrap(), json!(true));
        assert_eq!(regex_match(&strings(&["^bar", "foobar"])).unwrap(), json!(false));
        assert_eq!(regex_match(&strings(&["oba", "foobar"])).unwrap(), json!(true));
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let err = regex_match(&strings(&["(", "x"])).unwrap_err();
        assert!(err.starts_with("regexMatch: invalid pattern \"(\""), "{err}");
        assert!(regex_substitute(&strings(&["[", "x", "y"])).is_err());
    }

    #[test]
    fn test_substitute() {
        assert_eq!(regex_substitute(&strings(&["o", "foo", "0"])).unwrap(), json!("f00"));
        assert_eq!(regex_substitute(&strings(&["z", "foo", "0"])).unwrap(), json!("foo"));
        assert_eq!(
            regex_substitute(&strings(&["(\\w+)@(\\w+)", "me@host", "$2:$1"])).unwrap(),
            json!("host:me")
        );
        assert_eq!(
            regex_substitute(&strings(&["(?P<n>\\d+)", "v12", "<${n}>"])).unwrap(),
            json!("v<12>")
        );
    }

    #[test]
    fn test_non_string_argument() {
        let err = regex_match(&[json!("a"), json!(1)]).unwrap_err();
        assert_eq!(err, "regexMatch: parameter text must be a string, got number");
        let err = literal_regex_escape(&[JsonValue::Null]).unwrap_err();
        assert_eq!(err, "literalRegexEscape: parameter str must be a string, got null");
        let err = regex_substitute(&[json!("a"), json!("b"), json!([])]).unwrap_err();
        assert_eq!(err, "regexSubstitute: parameter replacement must be a string, got array");
    }
}
