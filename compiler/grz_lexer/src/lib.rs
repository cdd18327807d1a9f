//! Jsonnet lexer built on logos.
//!
//! Produces a `Vec<Token>` terminated by [`TokenKind::Eof`]. String literals
//! of every flavour are cooked here (escapes resolved, text block
//! indentation stripped) so the parser only ever sees [`TokenKind::Str`].

mod escape;
mod text_block;

use grz_ir::{FileId, Span, Token, TokenKind};
use logos::{Lexer, Logos};

/// A lexing failure with the offending location.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

/// Raw token from logos (before cooking).
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    #[regex(r"//[^\n]*")]
    #[regex(r"#[^\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    #[token("assert")]
    Assert,
    #[token("else")]
    Else,
    #[token("error")]
    Error,
    #[token("false")]
    False,
    #[token("for")]
    For,
    #[token("function")]
    Function,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("importstr")]
    ImportStr,
    #[token("importbin")]
    ImportBin,
    #[token("in")]
    In,
    #[token("local")]
    Local,
    #[token("null")]
    Null,
    #[token("tailstrict")]
    TailStrict,
    #[token("then")]
    Then,
    #[token("self")]
    SelfKw,
    #[token("super")]
    Super,
    #[token("true")]
    True,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(";")]
    Semicolon,
    #[token("$")]
    Dollar,

    #[token(":")]
    Colon,
    #[token("::")]
    DoubleColon,
    #[token(":::")]
    TripleColon,
    #[token("+:")]
    PlusColon,
    #[token("+::")]
    PlusDoubleColon,
    #[token("+:::")]
    PlusTripleColon,

    #[token("!")]
    Bang,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    #[regex(r#""([^"\\]|\\(.|\n))*""#)]
    DoubleQuoted,

    #[regex(r"'([^'\\]|\\(.|\n))*'")]
    SingleQuoted,

    #[regex(r#"@"([^"]|"")*""#)]
    VerbatimDouble,

    #[regex(r"@'([^']|'')*'")]
    VerbatimSingle,

    #[token("|||", text_block::lex_text_block)]
    TextBlock(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

/// Logos callback invoked after the opening `/*`; consumes through the
/// closing `*/`. Block comments do not nest.
fn block_comment(lex: &mut Lexer<'_, RawToken>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => false,
    }
}

/// Lex Jsonnet source into tokens.
pub fn lex(source: &str, file: FileId) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut logos = RawToken::lexer(source);

    while let Some(token_result) = logos.next() {
        let span = Span::from_range(file, logos.span());
        let slice = logos.slice();

        let raw = token_result.map_err(|()| LexError {
            message: describe_bad_input(slice, logos.remainder()),
            span,
        })?;

        let kind = match raw {
            RawToken::LineComment | RawToken::BlockComment => continue,
            RawToken::DoubleQuoted | RawToken::SingleQuoted => {
                let body = &slice[1..slice.len() - 1];
                let cooked =
                    escape::unescape_string(body).map_err(|message| LexError { message, span })?;
                TokenKind::Str(cooked)
            }
            RawToken::VerbatimDouble => {
                TokenKind::Str(escape::unescape_verbatim(&slice[2..slice.len() - 1], '"'))
            }
            RawToken::VerbatimSingle => {
                TokenKind::Str(escape::unescape_verbatim(&slice[2..slice.len() - 1], '\''))
            }
            RawToken::TextBlock(text) => TokenKind::Str(text),
            RawToken::Ident => TokenKind::Ident(slice.to_string()),
            other => convert_token(other),
        };
        tokens.push(Token::new(kind, span));
    }

    let eof = u32::try_from(source.len()).unwrap_or(u32::MAX);
    tokens.push(Token::new(TokenKind::Eof, Span::point(file, eof)));
    Ok(tokens)
}

/// Best-effort explanation for input logos could not match.
fn describe_bad_input(slice: &str, rest: &str) -> String {
    if slice.starts_with("|||") {
        return "text block syntax error: expected a newline after ||| and an indented body \
                terminated by |||"
            .to_string();
    }
    if slice.starts_with("/*") || (slice == "/" && rest.starts_with('*')) {
        return "multi-line comment has no terminating */".to_string();
    }
    if slice.starts_with('"') || slice.starts_with('\'') || slice.starts_with('@') {
        return "unterminated string".to_string();
    }
    format!("could not lex the character {slice:?}")
}

/// Map a payload-free raw token onto its `TokenKind`.
fn convert_token(raw: RawToken) -> TokenKind {
    match raw {
        RawToken::Number(n) => TokenKind::Number(n),

        // Keywords
        RawToken::Assert => TokenKind::Assert,
        RawToken::Else => TokenKind::Else,
        RawToken::Error => TokenKind::Error,
        RawToken::False => TokenKind::False,
        RawToken::For => TokenKind::For,
        RawToken::Function => TokenKind::Function,
        RawToken::If => TokenKind::If,
        RawToken::Import => TokenKind::Import,
        RawToken::ImportStr => TokenKind::ImportStr,
        RawToken::ImportBin => TokenKind::ImportBin,
        RawToken::In => TokenKind::In,
        RawToken::Local => TokenKind::Local,
        RawToken::Null => TokenKind::Null,
        RawToken::TailStrict => TokenKind::TailStrict,
        RawToken::Then => TokenKind::Then,
        RawToken::SelfKw => TokenKind::SelfKw,
        RawToken::Super => TokenKind::Super,
        RawToken::True => TokenKind::True,

        // Delimiters
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Dot => TokenKind::Dot,
        RawToken::Semicolon => TokenKind::Semicolon,
        RawToken::Dollar => TokenKind::Dollar,
        RawToken::Colon => TokenKind::Colon,
        RawToken::DoubleColon => TokenKind::DoubleColon,
        RawToken::TripleColon => TokenKind::TripleColon,
        RawToken::PlusColon => TokenKind::PlusColon,
        RawToken::PlusDoubleColon => TokenKind::PlusDoubleColon,
        RawToken::PlusTripleColon => TokenKind::PlusTripleColon,

        // Operators
        RawToken::Bang => TokenKind::Bang,
        RawToken::EqEq => TokenKind::EqEq,
        RawToken::NotEq => TokenKind::NotEq,
        RawToken::Eq => TokenKind::Eq,
        RawToken::Lt => TokenKind::Lt,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::Gt => TokenKind::Gt,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::Shl => TokenKind::Shl,
        RawToken::Shr => TokenKind::Shr,
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,
        RawToken::Amp => TokenKind::Amp,
        RawToken::Pipe => TokenKind::Pipe,
        RawToken::Caret => TokenKind::Caret,
        RawToken::Tilde => TokenKind::Tilde,
        RawToken::AmpAmp => TokenKind::AmpAmp,
        RawToken::PipePipe => TokenKind::PipePipe,

        // Payload-carrying and trivia tokens are handled by `lex`.
        RawToken::LineComment
        | RawToken::BlockComment
        | RawToken::DoubleQuoted
        | RawToken::SingleQuoted
        | RawToken::VerbatimDouble
        | RawToken::VerbatimSingle
        | RawToken::TextBlock(_)
        | RawToken::Ident => unreachable!("handled before convert_token"),
    }
}
