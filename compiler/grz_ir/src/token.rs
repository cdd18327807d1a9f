//! Tokens produced by the lexer.

use crate::Span;
use std::fmt;

/// A single lexed token.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

/// Token kinds.
///
/// String literals of every flavour (double, single, verbatim, text block)
/// arrive already cooked as [`TokenKind::Str`]; the parser never sees
/// escapes.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Literals
    Ident(String),
    Number(f64),
    Str(String),

    // Keywords
    Assert,
    Else,
    Error,
    False,
    For,
    Function,
    If,
    Import,
    ImportStr,
    ImportBin,
    In,
    Local,
    Null,
    TailStrict,
    Then,
    SelfKw,
    Super,
    True,

    // Delimiters
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Dot,
    Semicolon,
    Dollar,

    // Field separators
    Colon,
    DoubleColon,
    TripleColon,
    PlusColon,
    PlusDoubleColon,
    PlusTripleColon,

    // Operators
    Bang,
    EqEq,
    NotEq,
    Eq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Shl,
    Shr,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    AmpAmp,
    PipePipe,

    Eof,
}

impl TokenKind {
    /// Human-readable rendering used in "expected X, got Y" diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier {name}"),
            TokenKind::Number(n) => format!("number {n}"),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Eof => "end of file".to_string(),
            other => format!("\"{}\"", other.symbol()),
        }
    }

    /// Source text of a keyword, delimiter or operator token.
    pub fn symbol(&self) -> &'static str {
        match self {
            TokenKind::Ident(_) => "<identifier>",
            TokenKind::Number(_) => "<number>",
            TokenKind::Str(_) => "<string>",
            TokenKind::Assert => "assert",
            TokenKind::Else => "else",
            TokenKind::Error => "error",
            TokenKind::False => "false",
            TokenKind::For => "for",
            TokenKind::Function => "function",
            TokenKind::If => "if",
            TokenKind::Import => "import",
            TokenKind::ImportStr => "importstr",
            TokenKind::ImportBin => "importbin",
            TokenKind::In => "in",
            TokenKind::Local => "local",
            TokenKind::Null => "null",
            TokenKind::TailStrict => "tailstrict",
            TokenKind::Then => "then",
            TokenKind::SelfKw => "self",
            TokenKind::Super => "super",
            TokenKind::True => "true",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Semicolon => ";",
            TokenKind::Dollar => "$",
            TokenKind::Colon => ":",
            TokenKind::DoubleColon => "::",
            TokenKind::TripleColon => ":::",
            TokenKind::PlusColon => "+:",
            TokenKind::PlusDoubleColon => "+::",
            TokenKind::PlusTripleColon => "+:::",
            TokenKind::Bang => "!",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Eq => "=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::AmpAmp => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::Eof => "<eof>",
        }
    }

    /// Whether two kinds are the same variant, ignoring payloads.
    #[inline]
    pub fn same_kind(&self, other: &TokenKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_kind_ignores_payload() {
        let a = TokenKind::Ident("a".into());
        let b = TokenKind::Ident("b".into());
        assert!(a.same_kind(&b));
        assert!(!a.same_kind(&TokenKind::Str("a".into())));
    }

    #[test]
    fn test_describe() {
        assert_eq!(TokenKind::PlusColon.describe(), "\"+:\"");
        assert_eq!(TokenKind::Ident("x".into()).describe(), "identifier x");
        assert_eq!(TokenKind::Eof.describe(), "end of file");
    }
}
