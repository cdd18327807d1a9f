//! Grz Jsonnet - evaluates grizzly resource files written in Jsonnet.
//!
//! # Architecture
//!
//! - [`JsonnetParser`]: front-end; checks the entry file, evaluates it and
//!   hands the decoded JSON to an [`Assembler`]
//! - [`evaluate`]: one evaluation in a fresh `grz_eval` VM, behind the
//!   embedded `grizzly.jsonnet` bootstrap
//! - [`ImportResolver`]: loader chain then processor chain; [`FileLoader`]
//!   is the filesystem loader the engine installs
//! - [`search_paths`]: precedence order of library directories
//! - [`native_functions`]: `literalRegexEscape`, `regexMatch` and
//!   `regexSubstitute`, reachable through `std.native`

mod engine;
mod error;
mod importer;
mod natives;
mod parser;
mod search_path;

pub use engine::evaluate;
pub use error::{AssemblyError, Error, ImportError};
pub use importer::{FileLoader, ImportRequest, ImportResolver, ImportResult, Loader, Processor};
pub use natives::native_functions;
pub use parser::{Assembler, JsonnetParser, ParserOptions, Source, FORMAT};
pub use search_path::search_paths;
