//! One evaluation: search paths, importer, natives and the bootstrap
//! snippet wired into a fresh VM.

use crate::error::Error;
use crate::importer::{FileLoader, ImportResolver};
use crate::natives::native_functions;
use crate::search_path::search_paths;
use grz_eval::{Vm, VmOptions};
use std::path::{Path, PathBuf};

/// Evaluated in place of the entry file; `%s` is the entry path literal.
const BOOTSTRAP: &str = include_str!("grizzly.jsonnet");

/// Evaluate the Jsonnet file at `entry` (absolute) to JSON text.
///
/// Nothing is shared between calls: every call builds its own search path
/// list, importer and VM.
#[tracing::instrument(level = "debug", skip(working_dir, jsonnet_paths), fields(entry = %entry.display()))]
pub fn evaluate(entry: &Path, working_dir: &Path, jsonnet_paths: &[PathBuf]) -> Result<String, Error> {
    let entry_dir = entry.parent().unwrap_or_else(|| Path::new(""));
    let paths = search_paths(working_dir, entry_dir, jsonnet_paths);
    tracing::debug!(search_paths = ?paths, "built jsonnet search path list");

    let mut vm = Vm::new(VmOptions::default());
    vm.importer(ImportResolver::new().with_loader(FileLoader::new(paths)));
    for native in native_functions() {
        vm.native_function(native);
    }

    let entry = entry.to_string_lossy();
    let snippet = bootstrap(&entry);
    Ok(vm.evaluate_anonymous_snippet(&entry, &snippet)?)
}

/// The bootstrap text with `entry` spliced in as a single-quoted literal.
fn bootstrap(entry: &str) -> String {
    let mut literal = String::with_capacity(entry.len());
    for c in entry.chars() {
        if matches!(c, '\\' | '\'') {
            literal.push('\\');
        }
        literal.push(c);
    }
    BOOTSTRAP.replacen("%s", &literal, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_imports_entry() {
        let text = bootstrap("/project/main.jsonnet");
        assert!(text.contains("import '/project/main.jsonnet'"), "{text}");
        assert!(!text.contains("%s"));
    }

    #[test]
    fn test_bootstrap_has_single_placeholder() {
        assert_eq!(BOOTSTRAP.matches("%s").count(), 1);
    }

    #[test]
    fn test_bootstrap_escapes_path() {
        let text = bootstrap(r"/odd/it's\here.jsonnet");
        assert!(text.contains(r"import '/odd/it\'s\\here.jsonnet'"), "{text}");
    }
}
