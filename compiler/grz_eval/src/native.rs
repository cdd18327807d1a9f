//! Host functions callable from Jsonnet through `std.native(name)`.

use serde_json::Value as JsonValue;

/// Handler signature: arguments arrive manifested as JSON, in parameter order.
pub type NativeHandler = fn(&[JsonValue]) -> Result<JsonValue, String>;

/// A named host function with a fixed parameter list.
///
/// Handlers are plain function pointers: they cannot capture state, so a
/// native function behaves the same in every VM it is registered with.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub params: Vec<String>,
    pub handler: NativeHandler,
}

impl NativeFunction {
    pub fn new(name: &str, params: &[&str], handler: NativeHandler) -> Self {
        NativeFunction {
            name: name.to_string(),
            params: params.iter().map(|p| (*p).to_string()).collect(),
            handler,
        }
    }
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
