use super::*;
use grz_ir::{BinaryOp, CompSpec, ExprKind, FieldName, ImportKind, SourceFile, UnaryOp, Visibility};
use pretty_assertions::assert_eq;

fn parse_ok(source: &str) -> ExprRef {
    parse(source, FileId(0)).unwrap()
}

fn parse_err(source: &str) -> ParseError {
    parse(source, FileId(0)).unwrap_err()
}

#[test]
fn test_precedence_mul_over_add() {
    let expr = parse_ok("1 + 2 * 3");
    let ExprKind::Binary { op, right, .. } = &expr.kind else {
        panic!("expected binary, got {expr:?}");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(
        right.kind,
        ExprKind::Binary {
            op: BinaryOp::Mul,
            ..
        }
    ));
}

#[test]
fn test_binary_is_left_associative() {
    let expr = parse_ok("10 - 4 - 3");
    let ExprKind::Binary { left, right, .. } = &expr.kind else {
        panic!("expected binary");
    };
    assert!(matches!(left.kind, ExprKind::Binary { op: BinaryOp::Sub, .. }));
    assert_eq!(right.kind, ExprKind::Number(3.0));
}

#[test]
fn test_unary_binds_tighter_than_binary() {
    let expr = parse_ok("-a.b + 1");
    let ExprKind::Binary { left, .. } = &expr.kind else {
        panic!("expected binary");
    };
    let ExprKind::Unary { op, operand } = &left.kind else {
        panic!("expected unary");
    };
    assert_eq!(*op, UnaryOp::Neg);
    assert!(matches!(operand.kind, ExprKind::Index { .. }));
}

#[test]
fn test_local_extends_right() {
    let expr = parse_ok("1 + local x = 2; x * 3");
    let ExprKind::Binary { right, .. } = &expr.kind else {
        panic!("expected binary");
    };
    let ExprKind::Local { binds, body } = &right.kind else {
        panic!("expected local");
    };
    assert_eq!(&*binds[0].name, "x");
    assert!(matches!(body.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
}

#[test]
fn test_local_function_sugar() {
    let expr = parse_ok("local f(a, b=2) = a + b; f(1)");
    let ExprKind::Local { binds, .. } = &expr.kind else {
        panic!("expected local");
    };
    let ExprKind::Function(def) = &binds[0].value.kind else {
        panic!("expected function");
    };
    assert_eq!(def.params.len(), 2);
    assert!(def.params[0].default.is_none());
    assert!(def.params[1].default.is_some());
}

#[test]
fn test_if_without_else_is_null() {
    let expr = parse_ok("if true then 1");
    let ExprKind::If { else_branch, .. } = &expr.kind else {
        panic!("expected if");
    };
    assert_eq!(else_branch.kind, ExprKind::Null);
}

#[test]
fn test_object_fields_and_visibility() {
    let expr = parse_ok("{ a: 1, b:: 2, c::: 3, d+: 4, 'e f': 5, [k]: 6, local l = 7, assert l > 0 }");
    let ExprKind::Object(body) = &expr.kind else {
        panic!("expected object");
    };
    assert_eq!(body.fields.len(), 6);
    assert_eq!(body.locals.len(), 1);
    assert_eq!(body.asserts.len(), 1);
    assert_eq!(body.fields[1].visibility, Visibility::Hidden);
    assert_eq!(body.fields[2].visibility, Visibility::Forced);
    assert!(body.fields[3].plus);
    assert_eq!(body.fields[4].name, FieldName::Fixed("e f".into()));
    assert!(matches!(body.fields[5].name, FieldName::Computed(_)));
}

#[test]
fn test_method_sugar() {
    let expr = parse_ok("{ f(x): x * 2 }");
    let ExprKind::Object(body) = &expr.kind else {
        panic!("expected object");
    };
    assert!(matches!(body.fields[0].value.kind, ExprKind::Function(_)));
}

#[test]
fn test_object_extension_sugar() {
    let expr = parse_ok("base { a: 1 }");
    let ExprKind::Binary { op, left, right } = &expr.kind else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert_eq!(left.kind, ExprKind::Var("base".into()));
    assert!(matches!(right.kind, ExprKind::Object(_)));
}

#[test]
fn test_object_comprehension() {
    let expr = parse_ok("{ [k]: 1 for k in ['a', 'b'] if k != 'b' }");
    let ExprKind::ObjectComp(comp) = &expr.kind else {
        panic!("expected object comprehension");
    };
    assert_eq!(comp.specs.len(), 2);
    assert!(matches!(comp.specs[1], CompSpec::If(_)));
}

#[test]
fn test_array_comprehension_nested_for() {
    let expr = parse_ok("[x + y for x in [1] for y in [2]]");
    let ExprKind::ArrayComp { specs, .. } = &expr.kind else {
        panic!("expected array comprehension");
    };
    assert_eq!(specs.len(), 2);
}

#[test]
fn test_array_trailing_comma() {
    let expr = parse_ok("[1, 2,]");
    let ExprKind::Array(items) = &expr.kind else {
        panic!("expected array");
    };
    assert_eq!(items.len(), 2);
}

#[test]
fn test_slices() {
    for source in ["a[1:2]", "a[:2]", "a[1:]", "a[::2]", "a[1:5:2]", "a[:]"] {
        let expr = parse_ok(source);
        assert!(
            matches!(expr.kind, ExprKind::Slice { .. }),
            "{source} should be a slice"
        );
    }
    let ExprKind::Slice { start, end, step, .. } = &parse_ok("a[::2]").kind else {
        panic!("expected slice");
    };
    assert!(start.is_none() && end.is_none() && step.is_some());
}

#[test]
fn test_call_named_args_and_tailstrict() {
    let expr = parse_ok("f(1, b=2) tailstrict");
    let ExprKind::Apply { args, tailstrict, .. } = &expr.kind else {
        panic!("expected apply");
    };
    assert!(*tailstrict);
    assert!(args[0].name.is_none());
    assert_eq!(args[1].name.as_deref(), Some("b"));
}

#[test]
fn test_positional_after_named_is_error() {
    let err = parse_err("f(a=1, 2)");
    assert!(err.message.contains("positional argument"));
}

#[test]
fn test_super_forms() {
    let expr = parse_ok("{ a: super.a + super['b'], c: 'x' in super }");
    let ExprKind::Object(body) = &expr.kind else {
        panic!("expected object");
    };
    assert!(matches!(body.fields[1].value.kind, ExprKind::InSuper { .. }));
}

#[test]
fn test_imports() {
    let expr = parse_ok("[import 'a.libsonnet', importstr 'b.txt', importbin 'c.bin']");
    let ExprKind::Array(items) = &expr.kind else {
        panic!("expected array");
    };
    let kinds: Vec<_> = items
        .iter()
        .map(|e| match &e.kind {
            ExprKind::Import { kind, .. } => *kind,
            other => panic!("expected import, got {other:?}"),
        })
        .collect();
    assert_eq!(kinds, vec![ImportKind::Code, ImportKind::Str, ImportKind::Bin]);
}

#[test]
fn test_computed_import_is_error() {
    let err = parse_err("local p = 'a'; import p");
    assert!(err.message.contains("computed imports"));
}

#[test]
fn test_assert_expression() {
    let expr = parse_ok("assert x : 'msg'; x");
    assert!(matches!(expr.kind, ExprKind::Assert { .. }));
}

#[test]
fn test_duplicate_field_is_error() {
    let err = parse_err("{ a: 1, a: 2 }");
    assert_eq!(err.message, "duplicate field: a");
}

#[test]
fn test_duplicate_local_is_error() {
    let err = parse_err("local a = 1, a = 2; a");
    assert_eq!(err.message, "duplicate local var: a");
}

#[test]
fn test_trailing_tokens_are_error() {
    let err = parse_err("1 2");
    assert_eq!(err.message, "expected end of file but got number 2");
}

#[test]
fn test_static_error_rendering() {
    let source = "{\n  a: ,\n}";
    let err = parse_err(source);
    let file = SourceFile::new("main.jsonnet", source);
    assert_eq!(
        err.render(&file),
        "STATIC ERROR: main.jsonnet:2:6: expected an expression but got \",\""
    );
}

#[test]
fn test_lex_errors_surface_as_parse_errors() {
    let err = parse_err("'unterminated");
    assert!(!err.message.is_empty());
}

#[test]
fn test_deep_nesting_does_not_overflow() {
    let depth = 2000;
    let source = format!("{}1{}", "[".repeat(depth), "]".repeat(depth));
    parse_ok(&source);
}
