//! Parsing an entry given relative to the process working directory.
//!
//! Lives in its own test binary because it changes the working directory.

#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use grz_jsonnet::{AssemblyError, Assembler, JsonnetParser, ParserOptions, Source};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as JsonValue};
use std::path::PathBuf;

struct KeepSource;

impl Assembler for KeepSource {
    type Resources = (JsonValue, Source);

    fn assemble(
        &self,
        data: JsonValue,
        _: &str,
        _: &str,
        source: Source,
    ) -> Result<(JsonValue, Source), AssemblyError> {
        Ok((data, source))
    }
}

#[test]
fn test_relative_entry_resolves_against_working_dir() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(root.path().join("sub")).unwrap();
    std::fs::write(
        root.path().join("dash.jsonnet"),
        "{ file: std.thisFile, lib: import 'lib.libsonnet' }",
    )
    .unwrap();
    std::fs::write(root.path().join("lib.libsonnet"), "'local'").unwrap();
    std::env::set_current_dir(root.path()).unwrap();
    let working_dir = std::env::current_dir().unwrap();

    let parser = JsonnetParser::new(KeepSource, Vec::new());
    let relative = PathBuf::from("./sub/../dash.jsonnet");
    let (data, source) = parser.parse(&relative, &ParserOptions::default()).unwrap();

    let entry = working_dir.join("dash.jsonnet");
    assert_eq!(
        data,
        json!({ "file": entry.to_str().unwrap(), "lib": "local" })
    );
    assert_eq!(source.path, relative);
}
