//! Import resolution: an ordered loader chain followed by an ordered
//! processor chain.

use crate::error::ImportError;
use crate::search_path::normalize;
use grz_eval::{ImportedFile, Importer};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One `import` as written in a file.
#[derive(Clone, Copy, Debug)]
pub struct ImportRequest<'a> {
    /// Path of the file issuing the import.
    pub imported_from: &'a str,
    /// Specifier text, relative or absolute.
    pub imported_path: &'a str,
}

/// A located import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportResult {
    pub contents: Vec<u8>,
    /// Absolute location; nested relative imports resolve against it.
    pub found_at: PathBuf,
}

/// A resolution strategy.
///
/// `Ok(None)` passes the request to the next loader. An error ends
/// resolution without consulting later loaders.
pub trait Loader {
    fn attempt(&self, request: &ImportRequest<'_>) -> Result<Option<ImportResult>, ImportError>;
}

impl<F> Loader for F
where
    F: Fn(&ImportRequest<'_>) -> Result<Option<ImportResult>, ImportError>,
{
    fn attempt(&self, request: &ImportRequest<'_>) -> Result<Option<ImportResult>, ImportError> {
        self(request)
    }
}

/// A content transform applied after a successful load.
///
/// `Ok(None)` leaves the content to the next processor.
pub trait Processor {
    fn transform(&self, contents: &[u8], found_at: &Path) -> Result<Option<Vec<u8>>, ImportError>;
}

impl<F> Processor for F
where
    F: Fn(&[u8], &Path) -> Result<Option<Vec<u8>>, ImportError>,
{
    fn transform(&self, contents: &[u8], found_at: &Path) -> Result<Option<Vec<u8>>, ImportError> {
        self(contents, found_at)
    }
}

/// The importer installed into the VM.
#[derive(Default)]
pub struct ImportResolver {
    loaders: Vec<Box<dyn Loader>>,
    processors: Vec<Box<dyn Processor>>,
}

impl ImportResolver {
    pub fn new() -> Self {
        ImportResolver::default()
    }

    #[must_use]
    pub fn with_loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }

    #[must_use]
    pub fn with_processor(mut self, processor: impl Processor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Run the loader chain, then the processor chain.
    pub fn resolve(&self, request: &ImportRequest<'_>) -> Result<ImportResult, ImportError> {
        let mut found = None;
        for loader in &self.loaders {
            if let Some(result) = loader.attempt(request)? {
                found = Some(result);
                break;
            }
        }
        let Some(mut result) = found else {
            return Err(ImportError::Unresolved {
                path: request.imported_path.to_string(),
            });
        };

        for processor in &self.processors {
            if let Some(contents) = processor.transform(&result.contents, &result.found_at)? {
                result.contents = contents;
                break;
            }
        }
        Ok(result)
    }
}

impl Importer for ImportResolver {
    fn import(
        &self,
        imported_from: &str,
        imported_path: &str,
    ) -> Result<ImportedFile, Box<dyn std::error::Error + Send + Sync>> {
        let result = self.resolve(&ImportRequest {
            imported_from,
            imported_path,
        })?;
        Ok(ImportedFile {
            contents: result.contents,
            found_at: result.found_at.to_string_lossy().into_owned(),
        })
    }
}

/// Loads imports from the local filesystem.
///
/// Absolute specifiers are read directly. Relative ones are tried against
/// the importing file's directory, then each search path in order.
#[derive(Clone, Debug)]
pub struct FileLoader {
    search_paths: Vec<PathBuf>,
}

impl FileLoader {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        FileLoader { search_paths }
    }

    /// `Ok(None)` when the candidate does not exist.
    fn try_read(candidate: &Path) -> Result<Option<ImportResult>, ImportError> {
        let found_at = normalize(candidate);
        tracing::trace!(candidate = %found_at.display(), "trying import candidate");
        match std::fs::read(&found_at) {
            Ok(contents) => Ok(Some(ImportResult { contents, found_at })),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ImportError::Io {
                path: found_at,
                source,
            }),
        }
    }
}

impl Loader for FileLoader {
    fn attempt(&self, request: &ImportRequest<'_>) -> Result<Option<ImportResult>, ImportError> {
        let spec = Path::new(request.imported_path);
        let not_found = |searched: Vec<PathBuf>| ImportError::NotFound {
            path: request.imported_path.to_string(),
            searched,
        };

        if spec.is_absolute() {
            return match Self::try_read(spec)? {
                Some(result) => Ok(Some(result)),
                None => Err(not_found(Vec::new())),
            };
        }

        let local = Path::new(request.imported_from).parent();
        let mut searched = Vec::new();
        for dir in local.into_iter().chain(self.search_paths.iter().map(PathBuf::as_path)) {
            if let Some(result) = Self::try_read(&dir.join(spec))? {
                tracing::trace!(path = request.imported_path, found_at = %result.found_at.display(), "import found");
                return Ok(Some(result));
            }
            searched.push(dir.to_path_buf());
        }
        Err(not_found(searched))
    }
}
