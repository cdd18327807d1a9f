//! Token cursor for navigating the token stream.

use crate::ParseError;
use grz_ir::{Span, Token, TokenKind};

/// Position over a lexed token list.
///
/// Invariant: the last token is always `Eof`, so `current()` never runs off
/// the end.
pub struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        debug_assert!(
            matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)),
            "token stream must end with Eof"
        );
        Cursor { tokens, pos: 0 }
    }

    #[inline]
    pub fn current(&self) -> &'a Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    #[inline]
    pub fn current_kind(&self) -> &'a TokenKind {
        &self.current().kind
    }

    #[inline]
    pub fn current_span(&self) -> Span {
        self.current().span
    }

    /// Span of the most recently consumed token.
    pub fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::DUMMY
        }
    }

    /// One-token lookahead. Returns the trailing `Eof` at the end.
    pub fn peek_next_kind(&self) -> &'a TokenKind {
        let idx = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    /// Whether the current token is the same variant as `kind`.
    #[inline]
    pub fn check(&self, kind: &TokenKind) -> bool {
        self.current_kind().same_kind(kind)
    }

    pub fn advance(&mut self) -> &'a Token {
        let token = self.current();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of the given kind or fail with "expected ...".
    pub fn expect(&mut self, kind: &TokenKind) -> Result<Span, ParseError> {
        if self.check(kind) {
            Ok(self.advance().span)
        } else {
            Err(ParseError::expected(
                &format!("\"{}\"", kind.symbol()),
                self.current_kind(),
                self.current_span(),
            ))
        }
    }

    /// Consume an identifier and return its text.
    pub fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        match self.current_kind() {
            TokenKind::Ident(name) => {
                let span = self.advance().span;
                Ok((name.clone(), span))
            }
            other => Err(ParseError::expected(
                "an identifier",
                other,
                self.current_span(),
            )),
        }
    }
}
