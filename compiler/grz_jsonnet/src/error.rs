//! Error types for the Jsonnet front-end and import resolution.

use std::path::PathBuf;

/// Boxed error returned by an [`Assembler`](crate::Assembler).
pub type AssemblyError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of [`JsonnetParser::parse`](crate::JsonnetParser::parse) or
/// [`evaluate`](crate::evaluate).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The entry file is missing; nothing was evaluated.
    #[error("file does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("couldn't determine working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),

    /// Any VM failure, with its diagnostic preserved verbatim.
    #[error(transparent)]
    Evaluation(#[from] grz_eval::VmError),

    /// The evaluator produced text that is not valid JSON.
    #[error("couldn't decode evaluated JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Assembly(#[source] AssemblyError),
}

/// Failure to resolve one import specifier.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(
        "couldn't open import \"{path}\": no match locally or in library search paths{}",
        searched_suffix(.searched)
    )]
    NotFound {
        path: String,
        searched: Vec<PathBuf>,
    },

    /// Every loader declined the specifier.
    #[error("couldn't open import \"{path}\": no loader could resolve it")]
    Unresolved { path: String },

    #[error("couldn't read import \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't process import \"{}\": {message}", .path.display())]
    Process { path: PathBuf, message: String },
}

fn searched_suffix(searched: &[PathBuf]) -> String {
    if searched.is_empty() {
        return String::new();
    }
    let dirs: Vec<String> = searched.iter().map(|dir| dir.display().to_string()).collect();
    format!(" (searched: {})", dirs.join(", "))
}
