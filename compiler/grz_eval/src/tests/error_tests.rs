use super::eval_err;
use pretty_assertions::assert_eq;

#[test]
fn test_error_expression_location() {
    assert_eq!(eval_err(r#"error "boom""#), "RUNTIME ERROR: boom\n\tmain.jsonnet:1:1");
}

#[test]
fn test_error_trace_includes_call_site() {
    assert_eq!(
        eval_err("local f(x) = error \"bad \" + x;\nf(\"y\")"),
        "RUNTIME ERROR: bad y\n\tmain.jsonnet:1:14\n\tmain.jsonnet:2:1"
    );
}

#[test]
fn test_error_with_non_string_value() {
    assert_eq!(
        eval_err("error {a: 1}"),
        "RUNTIME ERROR: {\n   \"a\": 1\n}\n\tmain.jsonnet:1:1"
    );
}

#[test]
fn test_static_error() {
    let err = eval_err("{a: }");
    assert_eq!(
        err,
        "STATIC ERROR: main.jsonnet:1:5: expected an expression but got \"}\""
    );
}

#[test]
fn test_runtime_error_messages() {
    let cases = [
        ("x", "unknown variable: x"),
        ("{a: 1}.b", "field does not exist: b"),
        (r#"1 - "a""#, "binary operator - does not operate on types number and string"),
        ("1 / 0", "division by zero."),
        ("[1][3]", "index out of bounds: 3 not within [0, 1)"),
        ("[1][0.5]", "index must be an integer, got 0.5"),
        ("local f(a) = a; f(1, 2)", "function expected 1 positional argument(s), but got 2"),
        ("local f(a, b) = a; f(1)", "missing argument: b"),
        ("local f(a) = a; f(b=1)", "function has no parameter b"),
        ("1(2)", "only functions can be called, got number"),
        ("self", "can't use self outside of an object"),
        ("{a: super.b}.a", "attempt to use super when there is no super class"),
        ("{f: function(x) x}", "couldn't manifest function as JSON"),
        ("-\"a\"", "unary operator - does not operate on type string"),
        ("if 1 then 2", "if condition: expected boolean, got number"),
        ("local f(x) = x; f == f", "cannot test equality of functions"),
        ("std.length(1)", "std.length: parameter x: expected string, array, object or function, got number"),
        (r#"{["a"]: 1, a: 2}"#, "duplicate field name: \"a\""),
        ("1e308 * 10", "numeric result is not finite"),
    ];
    for (source, expected) in cases {
        let err = eval_err(source);
        assert!(
            err.starts_with(&format!("RUNTIME ERROR: {expected}")),
            "{source}: {err}"
        );
    }
}

#[test]
fn test_infinite_recursion_in_thunk() {
    let err = eval_err("local x = x + 1; x");
    assert!(err.starts_with("RUNTIME ERROR: infinite recursion detected"), "{err}");
}

#[test]
fn test_stack_limit() {
    let err = eval_err("local f(n) = f(n + 1) + 1; f(0)");
    assert!(err.starts_with("RUNTIME ERROR: max stack frames exceeded."), "{err}");
    let err = eval_err("{a: self.a}.a");
    assert!(err.starts_with("RUNTIME ERROR: max stack frames exceeded."), "{err}");
}

#[test]
fn test_trace_is_capped() {
    // One `local` so every function sees the next one in the chain.
    let source = "local\n".to_string()
        + &(0..40)
            .map(|i| format!("  f{i}(x) = f{}(x),\n", i + 1))
            .collect::<String>()
        + "  f40(x) = error \"deep\";\nf0(1)";
    let err = eval_err(&source);
    assert!(err.starts_with("RUNTIME ERROR: deep"), "{err}");
    assert_eq!(err.lines().count(), 21);
}

#[test]
fn test_overflowing_number_literal() {
    let err = eval_err("{a: 1e400}");
    assert!(err.starts_with("RUNTIME ERROR: numeric result is not finite"), "{err}");
    let err = eval_err("local big = 1e400; [big]");
    assert!(err.starts_with("RUNTIME ERROR: numeric result is not finite"), "{err}");
}

#[test]
fn test_error_after_failed_force_is_repeatable() {
    let err = eval_err(r#"local x = error "once"; [x, x]"#);
    assert!(err.starts_with("RUNTIME ERROR: once"), "{err}");
}
