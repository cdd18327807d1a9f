//! End-to-end tests: Jsonnet source in, manifested JSON or rendered error out.

mod error_tests;
mod import_tests;
mod native_tests;

use crate::{Vm, VmOptions};

/// Evaluate `source` as `main.jsonnet` and return the raw output text.
pub(super) fn eval_text(source: &str) -> String {
    Vm::new(VmOptions::default())
        .evaluate_anonymous_snippet("main.jsonnet", source)
        .unwrap()
}

/// Evaluate `source` and decode the output.
pub(super) fn eval_json(source: &str) -> serde_json::Value {
    serde_json::from_str(&eval_text(source)).unwrap()
}

/// Evaluate `source`, expecting failure, and return the rendered message.
pub(super) fn eval_err(source: &str) -> String {
    Vm::new(VmOptions::default())
        .evaluate_anonymous_snippet("main.jsonnet", source)
        .unwrap_err()
        .message
}
