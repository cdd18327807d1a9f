use crate::{NativeFunction, Vm, VmOptions};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as JsonValue};

fn double(args: &[JsonValue]) -> Result<JsonValue, String> {
    args[0]
        .as_f64()
        .map(|n| json!(n * 2.0))
        .ok_or_else(|| "double: x must be a number".to_string())
}

fn echo(args: &[JsonValue]) -> Result<JsonValue, String> {
    Ok(args[0].clone())
}

fn fail(_: &[JsonValue]) -> Result<JsonValue, String> {
    Err("native failure".to_string())
}

fn vm() -> Vm {
    let mut vm = Vm::new(VmOptions::default());
    vm.native_function(NativeFunction::new("double", &["x"], double));
    vm.native_function(NativeFunction::new("echo", &["v"], echo));
    vm.native_function(NativeFunction::new("fail", &[], fail));
    vm
}

fn run(source: &str) -> Result<JsonValue, String> {
    vm().evaluate_anonymous_snippet("main.jsonnet", source)
        .map(|out| serde_json::from_str(&out).unwrap())
        .map_err(|err| err.message)
}

#[test]
fn test_native_call() {
    assert_eq!(run(r#"std.native("double")(21)"#).unwrap(), json!(42));
    assert_eq!(run(r#"std.native("double")(x=1.25)"#).unwrap(), json!(2.5));
}

#[test]
fn test_native_arguments_are_manifested() {
    assert_eq!(
        run(r#"std.native("echo")({b: [1, "x", null], a:: 2, c: {d: true}})"#).unwrap(),
        json!({"b": [1, "x", null], "c": {"d": true}})
    );
}

#[test]
fn test_native_result_is_a_value() {
    assert_eq!(
        run(r#"local r = std.native("echo")({k: [1, 2]}); r.k[1] + std.length(r)"#).unwrap(),
        json!(3)
    );
}

#[test]
fn test_native_error() {
    let err = run(r#"std.native("fail")()"#).unwrap_err();
    assert!(err.starts_with("RUNTIME ERROR: native failure"), "{err}");
    let err = run(r#"std.native("double")("a")"#).unwrap_err();
    assert!(err.starts_with("RUNTIME ERROR: double: x must be a number"), "{err}");
}

#[test]
fn test_native_arity() {
    let err = run(r#"std.native("double")()"#).unwrap_err();
    assert!(err.starts_with("RUNTIME ERROR: missing argument: x"), "{err}");
}

#[test]
fn test_unknown_native() {
    let err = run(r#"std.native("missing")"#).unwrap_err();
    assert!(
        err.starts_with("RUNTIME ERROR: Unrecognized native function name: missing"),
        "{err}"
    );
}

#[test]
fn test_native_functions_cannot_receive_functions() {
    let err = run(r#"std.native("echo")(function(x) x)"#).unwrap_err();
    assert!(err.contains("couldn't manifest function as JSON"), "{err}");
}
