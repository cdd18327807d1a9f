//! The front-end: entry file in, assembled resources out.

use crate::engine::evaluate;
use crate::error::{AssemblyError, Error};
use crate::search_path::normalize;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

/// Format tag recorded in every [`Source`] this parser produces.
pub const FORMAT: &str = "jsonnet";

/// Per-call defaults forwarded to the assembler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParserOptions {
    pub default_resource_kind: String,
    pub default_folder_uid: String,
}

/// Where a document tree came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    pub format: String,
    pub path: PathBuf,
    /// Whether the tree can be written back to `path`. Never true for
    /// evaluated Jsonnet.
    pub rewritable: bool,
}

/// Turns a decoded document tree into typed resources.
pub trait Assembler {
    type Resources;

    fn assemble(
        &self,
        data: JsonValue,
        default_resource_kind: &str,
        default_folder_uid: &str,
        source: Source,
    ) -> Result<Self::Resources, AssemblyError>;
}

/// Parses `.jsonnet` and `.libsonnet` files.
pub struct JsonnetParser<A> {
    assembler: A,
    jsonnet_paths: Vec<PathBuf>,
}

impl<A: Assembler> JsonnetParser<A> {
    /// `jsonnet_paths` are library directories, possibly relative; see
    /// [`search_paths`](crate::search_paths) for how they are resolved.
    pub fn new(assembler: A, jsonnet_paths: Vec<PathBuf>) -> Self {
        JsonnetParser {
            assembler,
            jsonnet_paths,
        }
    }

    pub fn accept(&self, file: &Path) -> bool {
        matches!(
            file.extension().and_then(|ext| ext.to_str()),
            Some("jsonnet" | "libsonnet")
        )
    }

    /// Evaluate `file` and hand the resulting document to the assembler.
    #[tracing::instrument(level = "debug", skip(self, options), fields(file = %file.display()))]
    pub fn parse(&self, file: &Path, options: &ParserOptions) -> Result<A::Resources, Error> {
        tracing::debug!("parsing file");
        if matches!(file.try_exists(), Ok(false)) {
            return Err(Error::FileNotFound(file.to_path_buf()));
        }
        let working_dir = std::env::current_dir().map_err(Error::WorkingDirectory)?;
        let entry = normalize(&working_dir.join(file));

        let json = evaluate(&entry, &working_dir, &self.jsonnet_paths)?;
        let data: JsonValue = serde_json::from_str(&json)?;

        let source = Source {
            format: FORMAT.to_string(),
            path: file.to_path_buf(),
            rewritable: false,
        };
        self.assembler
            .assemble(
                data,
                &options.default_resource_kind,
                &options.default_folder_uid,
                source,
            )
            .map_err(Error::Assembly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unused;

    impl Assembler for Unused {
        type Resources = ();

        fn assemble(&self, _: JsonValue, _: &str, _: &str, _: Source) -> Result<(), AssemblyError> {
            Ok(())
        }
    }

    #[test]
    fn test_accept_extensions() {
        let parser = JsonnetParser::new(Unused, Vec::new());
        assert!(parser.accept(Path::new("dash.jsonnet")));
        assert!(parser.accept(Path::new("lib/util.libsonnet")));
        assert!(!parser.accept(Path::new("dash.json")));
        assert!(!parser.accept(Path::new("dash.yaml")));
        assert!(!parser.accept(Path::new("jsonnet")));
    }
}
