//! Parse error type.

use grz_ir::{SourceFile, Span, TokenKind};
use grz_lexer::LexError;

/// A static (lex or parse) error.
///
/// Carries only a span; [`ParseError::render`] turns it into the
/// `STATIC ERROR: file:line:col: message` form once the source is known.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    #[cold]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        ParseError {
            message: message.into(),
            span,
        }
    }

    /// "expected X, got Y" at the offending token.
    #[cold]
    pub fn expected(what: &str, found: &TokenKind, span: Span) -> Self {
        ParseError::new(format!("expected {what} but got {}", found.describe()), span)
    }

    /// Render with the source position the span points at.
    pub fn render(&self, source: &SourceFile) -> String {
        let pos = source.line_col(self.span.start);
        format!(
            "STATIC ERROR: {}:{}:{}: {}",
            source.path(),
            pos.line,
            pos.col,
            self.message
        )
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::new(err.message, err.span)
    }
}
