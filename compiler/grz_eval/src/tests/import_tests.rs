use crate::{ImportedFile, Importer, Vm, VmOptions};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as JsonValue};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Resolves specifiers against an in-memory file table, relative to the
/// importing file's directory, and records every request.
#[derive(Clone, Default)]
struct MemoryImporter {
    files: Rc<BTreeMap<String, Vec<u8>>>,
    requests: Rc<RefCell<Vec<(String, String)>>>,
}

impl MemoryImporter {
    fn new(files: &[(&str, &str)]) -> Self {
        MemoryImporter {
            files: Rc::new(
                files
                    .iter()
                    .map(|(path, text)| ((*path).to_string(), text.as_bytes().to_vec()))
                    .collect(),
            ),
            requests: Rc::default(),
        }
    }
}

impl Importer for MemoryImporter {
    fn import(
        &self,
        imported_from: &str,
        imported_path: &str,
    ) -> Result<ImportedFile, Box<dyn std::error::Error + Send + Sync>> {
        self.requests
            .borrow_mut()
            .push((imported_from.to_string(), imported_path.to_string()));
        let dir = imported_from.rsplit_once('/').map_or("", |(dir, _)| dir);
        let found_at = if dir.is_empty() {
            imported_path.to_string()
        } else {
            format!("{dir}/{imported_path}")
        };
        match self.files.get(&found_at) {
            Some(contents) => Ok(ImportedFile {
                contents: contents.clone(),
                found_at,
            }),
            None => Err(format!("couldn't open import \"{imported_path}\": not found").into()),
        }
    }
}

fn run(importer: &MemoryImporter, source: &str) -> Result<JsonValue, String> {
    let mut vm = Vm::new(VmOptions::default());
    vm.importer(importer.clone());
    vm.evaluate_anonymous_snippet("main.jsonnet", source)
        .map(|out| serde_json::from_str(&out).unwrap())
        .map_err(|err| err.message)
}

#[test]
fn test_import_code() {
    let importer = MemoryImporter::new(&[("lib/util.libsonnet", "{ twice(x):: x * 2, name: 'util' }")]);
    assert_eq!(
        run(&importer, "local u = import 'lib/util.libsonnet'; [u.twice(4), u.name]").unwrap(),
        json!([8, "util"])
    );
}

#[test]
fn test_nested_import_is_relative_to_importer() {
    let importer = MemoryImporter::new(&[
        ("lib/a.libsonnet", "(import 'b.libsonnet') + 1"),
        ("lib/b.libsonnet", "41"),
    ]);
    assert_eq!(run(&importer, "import 'lib/a.libsonnet'").unwrap(), json!(42));
    assert_eq!(
        importer.requests.borrow().as_slice(),
        [
            ("main.jsonnet".to_string(), "lib/a.libsonnet".to_string()),
            ("lib/a.libsonnet".to_string(), "b.libsonnet".to_string()),
        ]
    );
}

#[test]
fn test_imported_file_has_its_own_this_file() {
    let importer = MemoryImporter::new(&[("lib/f.libsonnet", "std.thisFile")]);
    assert_eq!(
        run(&importer, "[std.thisFile, import 'lib/f.libsonnet']").unwrap(),
        json!(["main.jsonnet", "lib/f.libsonnet"])
    );
}

#[test]
fn test_repeated_import_shares_value() {
    let importer = MemoryImporter::new(&[("o.libsonnet", "{ a: 1 }")]);
    assert_eq!(
        run(&importer, "(import 'o.libsonnet') == (import 'o.libsonnet')").unwrap(),
        json!(true)
    );
}

#[test]
fn test_importstr_and_importbin() {
    let importer = MemoryImporter::new(&[("data.txt", "AB\n")]);
    assert_eq!(
        run(&importer, "[importstr 'data.txt', importbin 'data.txt']").unwrap(),
        json!(["AB\n", [65, 66, 10]])
    );
}

#[test]
fn test_missing_import() {
    let importer = MemoryImporter::new(&[]);
    let err = run(&importer, "import 'nope.libsonnet'").unwrap_err();
    assert_eq!(
        err,
        "RUNTIME ERROR: couldn't open import \"nope.libsonnet\": not found\n\tmain.jsonnet:1:1"
    );
}

#[test]
fn test_static_error_in_imported_file() {
    let importer = MemoryImporter::new(&[("bad.libsonnet", "{a: }")]);
    let err = run(&importer, "import 'bad.libsonnet'").unwrap_err();
    assert!(err.starts_with("STATIC ERROR: bad.libsonnet:1:5:"), "{err}");
}

#[test]
fn test_runtime_error_in_imported_file_points_into_it() {
    let importer = MemoryImporter::new(&[("err.libsonnet", "\n  error 'inside'")]);
    let err = run(&importer, "import 'err.libsonnet'").unwrap_err();
    assert!(
        err.starts_with("RUNTIME ERROR: inside\n\terr.libsonnet:2:3"),
        "{err}"
    );
}

#[test]
fn test_import_without_importer() {
    let err = Vm::new(VmOptions::default())
        .evaluate_anonymous_snippet("main.jsonnet", "import 'x.libsonnet'")
        .unwrap_err()
        .message;
    assert!(err.contains("no importer configured"), "{err}");
}
