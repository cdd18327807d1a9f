//! End-to-end evaluation of Jsonnet files on disk.

#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use grz_jsonnet::{
    evaluate, AssemblyError, Assembler, Error, JsonnetParser, ParserOptions, Source, FORMAT,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as JsonValue};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Records every call and returns the document unchanged.
#[derive(Default)]
struct Recorder {
    calls: RefCell<Vec<(JsonValue, String, String, Source)>>,
}

impl Assembler for &Recorder {
    type Resources = JsonValue;

    fn assemble(
        &self,
        data: JsonValue,
        default_resource_kind: &str,
        default_folder_uid: &str,
        source: Source,
    ) -> Result<JsonValue, AssemblyError> {
        self.calls.borrow_mut().push((
            data.clone(),
            default_resource_kind.to_string(),
            default_folder_uid.to_string(),
            source,
        ));
        Ok(data)
    }
}

struct Rejecting;

impl Assembler for Rejecting {
    type Resources = ();

    fn assemble(&self, _: JsonValue, _: &str, _: &str, _: Source) -> Result<(), AssemblyError> {
        Err("missing kind".into())
    }
}

fn write(root: &Path, rel: &str, text: &str) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, text).unwrap();
    path
}

/// Evaluate `main.jsonnet` under `root` with `root/work` as working dir.
fn eval_in(root: &TempDir, jsonnet_paths: &[&str]) -> Result<JsonValue, Error> {
    let entry = root.path().join("project/main.jsonnet");
    let working_dir = root.path().join("work");
    std::fs::create_dir_all(&working_dir).unwrap();
    let paths: Vec<PathBuf> = jsonnet_paths.iter().map(PathBuf::from).collect();
    let json = evaluate(&entry, &working_dir, &paths)?;
    Ok(serde_json::from_str(&json).unwrap())
}

fn eval_err(root: &TempDir) -> String {
    eval_in(root, &[]).unwrap_err().to_string()
}

#[test]
fn test_missing_file_skips_evaluation() {
    let root = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let parser = JsonnetParser::new(&recorder, Vec::new());
    let missing = root.path().join("absent.jsonnet");

    let err = parser.parse(&missing, &ParserOptions::default()).unwrap_err();
    assert!(matches!(err, Error::FileNotFound(_)));
    assert_eq!(
        err.to_string(),
        format!("file does not exist: {}", missing.display())
    );
    assert!(recorder.calls.borrow().is_empty());
}

#[test]
fn test_parse_hands_document_to_assembler() {
    let root = tempfile::tempdir().unwrap();
    let file = write(
        root.path(),
        "dash.jsonnet",
        "{ kind: 'Dashboard', spec: { title: 'A' + 'B', panels: [1, 2] } }",
    );
    let recorder = Recorder::default();
    let parser = JsonnetParser::new(&recorder, Vec::new());
    let options = ParserOptions {
        default_resource_kind: "Dashboard".to_string(),
        default_folder_uid: "general".to_string(),
    };

    let resources = parser.parse(&file, &options).unwrap();
    let expected = json!({ "kind": "Dashboard", "spec": { "title": "AB", "panels": [1, 2] } });
    assert_eq!(resources, expected);

    let calls = recorder.calls.borrow();
    assert_eq!(calls.len(), 1);
    let (_, kind, folder, source) = &calls[0];
    assert_eq!(kind, "Dashboard");
    assert_eq!(folder, "general");
    assert_eq!(
        source,
        &Source {
            format: FORMAT.to_string(),
            path: file.clone(),
            rewritable: false,
        }
    );
}

#[test]
fn test_assembly_error_propagates() {
    let root = tempfile::tempdir().unwrap();
    let file = write(root.path(), "dash.jsonnet", "{}");
    let parser = JsonnetParser::new(Rejecting, Vec::new());
    let err = parser.parse(&file, &ParserOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Assembly(_)));
    assert_eq!(err.to_string(), "missing kind");
}

#[test]
fn test_evaluation_error_is_verbatim() {
    let root = tempfile::tempdir().unwrap();
    let file = write(root.path(), "dash.jsonnet", "error 'boom'");
    let parser = JsonnetParser::new(Rejecting, Vec::new());
    let err = parser.parse(&file, &ParserOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Evaluation(_)));
    let prefix = format!("RUNTIME ERROR: boom\n\t{}:1:1", file.display());
    assert!(err.to_string().starts_with(&prefix), "{err}");
}

#[test]
fn test_overflowing_literal_is_evaluation_error() {
    let root = tempfile::tempdir().unwrap();
    let file = write(root.path(), "dash.jsonnet", "{ big: 1e400 }");
    let parser = JsonnetParser::new(Rejecting, Vec::new());
    let err = parser.parse(&file, &ParserOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Evaluation(_)), "{err}");
    assert!(err.to_string().contains("numeric result is not finite"), "{err}");
}

#[test]
fn test_static_error_names_entry() {
    let root = tempfile::tempdir().unwrap();
    let entry = write(root.path(), "project/main.jsonnet", "{ a: }");
    let expected = format!(
        "STATIC ERROR: {}:1:6: expected an expression but got \"}}\"",
        entry.display()
    );
    assert_eq!(eval_err(&root), expected);
}

#[test]
fn test_entry_relative_library_wins() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "project/main.jsonnet", "import 'util.libsonnet'");
    write(root.path(), "project/lib/util.libsonnet", "'entry-relative'");
    write(root.path(), "work/lib/util.libsonnet", "'working-dir-relative'");
    assert_eq!(eval_in(&root, &["lib"]).unwrap(), json!("entry-relative"));
}

#[test]
fn test_working_dir_relative_library() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "project/main.jsonnet", "import 'vendor.libsonnet'");
    write(root.path(), "work/vendor/vendor.libsonnet", "{ from: 'work' }");
    assert_eq!(eval_in(&root, &["vendor"]).unwrap(), json!({ "from": "work" }));
}

#[test]
fn test_working_dir_searched_first() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "project/main.jsonnet", "import 'util.libsonnet'");
    write(root.path(), "project/lib/util.libsonnet", "'library'");
    write(root.path(), "work/util.libsonnet", "'working-dir'");
    assert_eq!(eval_in(&root, &["lib"]).unwrap(), json!("working-dir"));
}

#[test]
fn test_importing_file_directory_searched_before_libraries() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "project/main.jsonnet", "import 'util.libsonnet'");
    write(root.path(), "project/util.libsonnet", "'local'");
    write(root.path(), "work/util.libsonnet", "'working-dir'");
    assert_eq!(eval_in(&root, &[]).unwrap(), json!("local"));
}

#[test]
fn test_absolute_library_dir() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "project/main.jsonnet", "(import 'abs.libsonnet').x");
    let shared = root.path().join("shared");
    write(&shared, "abs.libsonnet", "{ x: 42 }");
    let shared = shared.to_str().unwrap().to_string();
    assert_eq!(eval_in(&root, &[shared.as_str()]).unwrap(), json!(42));
}

#[test]
fn test_nested_relative_imports() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "project/main.jsonnet", "import 'lib/a.libsonnet'");
    write(
        root.path(),
        "project/lib/a.libsonnet",
        "{ a: import 'b.libsonnet', up: import '../top.libsonnet' }",
    );
    write(root.path(), "project/lib/b.libsonnet", "'b'");
    write(root.path(), "project/top.libsonnet", "'top'");
    assert_eq!(eval_in(&root, &[]).unwrap(), json!({ "a": "b", "up": "top" }));
}

#[test]
fn test_importstr_and_this_file() {
    let root = tempfile::tempdir().unwrap();
    let entry = write(
        root.path(),
        "project/main.jsonnet",
        "{ text: importstr 'note.txt', file: std.thisFile }",
    );
    write(root.path(), "project/note.txt", "hello\n");
    assert_eq!(
        eval_in(&root, &[]).unwrap(),
        json!({ "text": "hello\n", "file": entry.to_str().unwrap() })
    );
}

#[test]
fn test_unresolved_import_names_specifier() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "project/main.jsonnet", "import 'nope.libsonnet'");
    let err = eval_err(&root);
    assert!(
        err.starts_with(
            "RUNTIME ERROR: couldn't open import \"nope.libsonnet\": no match locally or in library search paths"
        ),
        "{err}"
    );
}

#[test]
fn test_native_functions_from_script() {
    let root = tempfile::tempdir().unwrap();
    write(
        root.path(),
        "project/main.jsonnet",
        r#"
        local escape = std.native('literalRegexEscape');
        local match = std.native('regexMatch');
        local subst = std.native('regexSubstitute');
        local literal = '^' + escape('a.b*c') + '$';
        {
          literal: match(literal, 'a.b*c'),
          wildcard: match(literal, 'aXbYYc'),
          prefix: match('^foo', 'foobar'),
          other: match('^bar', 'foobar'),
          subst: subst('o', 'foo', '0'),
          groups: subst('(\\w+)-(\\w+)', 'left-right', '$2-$1'),
          named: subst(pattern='x', text='axa', replacement='-'),
        }
        "#,
    );
    assert_eq!(
        eval_in(&root, &[]).unwrap(),
        json!({
            "literal": true,
            "wildcard": false,
            "prefix": true,
            "other": false,
            "subst": "f00",
            "groups": "right-left",
            "named": "a-a",
        })
    );
}

#[test]
fn test_invalid_pattern_is_evaluation_error() {
    let root = tempfile::tempdir().unwrap();
    write(
        root.path(),
        "project/main.jsonnet",
        "std.native('regexMatch')('(', 'x')",
    );
    let err = eval_err(&root);
    assert!(
        err.starts_with("RUNTIME ERROR: regexMatch: invalid pattern \"(\""),
        "{err}"
    );
}

#[test]
fn test_non_string_native_argument() {
    let root = tempfile::tempdir().unwrap();
    write(
        root.path(),
        "project/main.jsonnet",
        "std.native('regexSubstitute')('o', 12, '0')",
    );
    let err = eval_err(&root);
    assert!(
        err.starts_with("RUNTIME ERROR: regexSubstitute: parameter text must be a string, got number"),
        "{err}"
    );
}

#[test]
fn test_calls_are_independent() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "project/main.jsonnet", "import 'value.libsonnet'");
    let value = write(root.path(), "project/value.libsonnet", "1");
    assert_eq!(eval_in(&root, &[]).unwrap(), json!(1));
    std::fs::write(&value, "2").unwrap();
    assert_eq!(eval_in(&root, &[]).unwrap(), json!(2));
}

#[test]
fn test_legacy_mixin_is_converted_to_resources() {
    let root = tempfile::tempdir().unwrap();
    write(
        root.path(),
        "project/main.jsonnet",
        r#"
        {
          grafanaDashboardFolder: 'Ops',
          grafanaDashboards:: {
            'node.json': { uid: 'node', title: 'Node' },
            'plain.json': { title: 'Plain' },
          },
          grafanaDatasources:: { prom: { type: 'prometheus' } },
          prometheusRules:: {
            'rules.yaml': { groups: [{ name: 'node', rules: [{ record: 'up:sum' }] }] },
          },
        }
        "#,
    );
    let resource = |kind: &str, name: &str, spec: JsonValue, metadata: JsonValue| {
        let mut meta = json!({ "name": name });
        if let (Some(map), JsonValue::Object(extra)) = (meta.as_object_mut(), metadata) {
            map.extend(extra);
        }
        json!({
            "apiVersion": "grizzly.grafana.com/v1alpha1",
            "kind": kind,
            "metadata": meta,
            "spec": spec,
        })
    };
    assert_eq!(
        eval_in(&root, &[]).unwrap(),
        json!({
            "grafana": {
                "folders": [resource("DashboardFolder", "Ops", json!({ "title": "Ops" }), json!({}))],
                "dashboards": [
                    resource(
                        "Dashboard",
                        "node",
                        json!({ "uid": "node", "title": "Node" }),
                        json!({ "folder": "Ops" })
                    ),
                    resource("Dashboard", "plain", json!({ "title": "Plain" }), json!({ "folder": "Ops" })),
                ],
                "datasources": [resource("Datasource", "prom", json!({ "type": "prometheus" }), json!({}))],
            },
            "prometheus": {
                "rule_groups": [resource(
                    "PrometheusRuleGroup",
                    "node",
                    json!({ "rules": [{ "record": "up:sum" }] }),
                    json!({ "namespace": "rules" })
                )],
            },
        })
    );
}

#[test]
fn test_resource_documents_pass_through_bootstrap() {
    let root = tempfile::tempdir().unwrap();
    write(
        root.path(),
        "project/main.jsonnet",
        "{ dashboards: { a: { kind: 'Dashboard' } }, folder:: 'hidden' }",
    );
    assert_eq!(
        eval_in(&root, &[]).unwrap(),
        json!({ "dashboards": { "a": { "kind": "Dashboard" } } })
    );

    write(root.path(), "project/main.jsonnet", "[{ grafanaDashboards: {} }]");
    assert_eq!(
        eval_in(&root, &[]).unwrap(),
        json!([{ "grafanaDashboards": {} }])
    );
}
