//! The seam through which the VM loads imported files.

/// Contents of a resolved import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportedFile {
    pub contents: Vec<u8>,
    /// Canonical location; used as the memoization key and as the
    /// `imported_from` of imports made by this file.
    pub found_at: String,
}

/// Resolves `import`, `importstr` and `importbin` specifiers.
pub trait Importer {
    /// Resolve `imported_path` as written in the file at `imported_from`.
    ///
    /// The error's `Display` text becomes the runtime error message verbatim.
    fn import(
        &self,
        imported_from: &str,
        imported_path: &str,
    ) -> Result<ImportedFile, Box<dyn std::error::Error + Send + Sync>>;
}
