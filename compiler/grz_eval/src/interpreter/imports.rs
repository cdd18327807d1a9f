//! `import`, `importstr` and `importbin`.

use super::Vm;
use crate::errors::{EvalError, EvalErrorKind, EvalResult};
use crate::heap::{Pending, ThunkId};
use crate::value::Value;
use grz_ir::{ImportKind, Span};

impl Vm {
    pub(super) fn eval_import(&mut self, kind: ImportKind, path: &str, span: Span) -> EvalResult<Value> {
        let from = self.file_path(span.file).unwrap_or_default().to_string();
        let Some(importer) = &self.importer else {
            return Err(import_error(format!(
                "couldn't open import \"{path}\": no importer configured"
            )));
        };
        tracing::trace!(from = %from, path, "resolving import");
        let file = importer
            .import(&from, path)
            .map_err(|err| import_error(err.to_string()))?;
        tracing::trace!(path, found_at = %file.found_at, "import resolved");

        match kind {
            ImportKind::Code => {
                if let Some(thunk) = self.code_imports.get(&file.found_at) {
                    return self.force(*thunk);
                }
                let text = utf8(file.contents, &file.found_at)?;
                let expr = self.load_source(&file.found_at, &text)?;
                let env = self.root_env(expr.span.file);
                let thunk = self.heap.alloc_thunk(Pending::Expr { expr, env });
                self.code_imports.insert(file.found_at, thunk);
                self.force(thunk)
            }
            ImportKind::Str => {
                let text = utf8(file.contents, &file.found_at)?;
                Ok(Value::str(&text))
            }
            ImportKind::Bin => {
                let bytes: Vec<ThunkId> = file
                    .contents
                    .iter()
                    .map(|b| self.heap.alloc_ready(Value::Num(f64::from(*b))))
                    .collect();
                Ok(Value::Array(bytes.into()))
            }
        }
    }
}

fn utf8(contents: Vec<u8>, found_at: &str) -> EvalResult<String> {
    String::from_utf8(contents)
        .map_err(|_| import_error(format!("{found_at}: import is not valid UTF-8")))
}

#[cold]
fn import_error(message: String) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Import { message })
}
