//! Grz Eval - the Jsonnet virtual machine.
//!
//! A lazy tree-walking evaluator over the `grz_parse` AST.
//!
//! # Architecture
//!
//! - [`Vm`]: owns all evaluation state and exposes the embedding API
//!   (importer hook, native functions, snippet evaluation)
//! - `heap`: arenas for thunks, environments and objects, linked by id
//! - `object`: layered objects for inheritance and `super`
//! - `stdlib`: the `std` functions, implemented natively
//! - `manifest`: JSON output and `serde_json` conversion for native calls
//!
//! Errors stay structured (`EvalErrorKind`) inside the VM and are rendered to
//! text once, in [`VmError`].

mod errors;
mod format;
mod heap;
mod import;
mod interpreter;
mod manifest;
mod native;
mod object;
mod operators;
mod stdlib;
mod value;

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;

pub use import::{ImportedFile, Importer};
pub use interpreter::{Vm, VmError, VmOptions};
pub use native::{NativeFunction, NativeHandler};
