//! Recursive-descent parser for Jsonnet.
//!
//! [`parse`] lexes and parses one file into an [`ExprRef`]. The grammar lives
//! under `grammar/`, one file per construct family; [`Cursor`] provides the
//! token navigation they share.

mod cursor;
mod error;
mod grammar;

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;

pub use cursor::Cursor;
pub use error::ParseError;

use grz_ir::{ExprRef, FileId, Token};

/// Parser state over one token stream.
pub struct Parser<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Parser {
            cursor: Cursor::new(tokens),
        }
    }

    /// Parse a whole file: one expression followed by end of input.
    pub fn parse_file(&mut self) -> Result<ExprRef, ParseError> {
        let expr = self.parse_expr()?;
        if !self.cursor.is_at_end() {
            return Err(ParseError::expected(
                "end of file",
                self.cursor.current_kind(),
                self.cursor.current_span(),
            ));
        }
        Ok(expr)
    }
}

/// Lex and parse `source`, tagging every span with `file`.
pub fn parse(source: &str, file: FileId) -> Result<ExprRef, ParseError> {
    let tokens = grz_lexer::lex(source, file)?;
    tracing::trace!(file = file.0, tokens = tokens.len(), "lexed jsonnet source");
    Parser::new(&tokens).parse_file()
}
