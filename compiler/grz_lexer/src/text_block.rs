//! `|||` text blocks.
//!
//! The first non-blank line fixes the indentation prefix. Every following
//! line must start with that prefix (or be blank); the first line that does
//! not ends the block and must consist of whitespace followed by `|||`.
//! `|||-` drops the final newline.

use crate::RawToken;
use logos::Lexer;

/// Logos callback invoked after the opening `|||`.
pub(crate) fn lex_text_block(lex: &mut Lexer<'_, RawToken>) -> Option<String> {
    let (text, consumed) = cook(lex.remainder())?;
    lex.bump(consumed);
    Some(text)
}

/// Cook the text following `|||`, returning the string and how many bytes it used.
fn cook(rest: &str) -> Option<(String, usize)> {
    let bytes = rest.as_bytes();
    let mut pos = 0;
    let chomp = bytes.first() == Some(&b'-');
    if chomp {
        pos += 1;
    }

    while matches!(bytes.get(pos), Some(b' ' | b'\t' | b'\r')) {
        pos += 1;
    }
    if bytes.get(pos) != Some(&b'\n') {
        return None;
    }
    pos += 1;

    let mut out = String::new();
    while bytes.get(pos) == Some(&b'\n') {
        out.push('\n');
        pos += 1;
    }

    let indent_len = leading_whitespace(&rest[pos..]);
    if indent_len == 0 {
        return None;
    }
    let indent = &rest[pos..pos + indent_len];

    loop {
        pos += indent.len();
        let line_end = rest[pos..].find('\n')? + pos;
        out.push_str(&rest[pos..line_end]);
        out.push('\n');
        pos = line_end + 1;

        while bytes.get(pos) == Some(&b'\n') {
            out.push('\n');
            pos += 1;
        }

        if !rest[pos..].starts_with(indent) {
            pos += leading_whitespace(&rest[pos..]);
            if !rest[pos..].starts_with("|||") {
                return None;
            }
            pos += 3;
            break;
        }
    }

    if chomp {
        out.pop();
    }
    Some((out, pos))
}

fn leading_whitespace(s: &str) -> usize {
    s.bytes().take_while(|b| *b == b' ' || *b == b'\t').count()
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strips_common_indent() {
        let rest = "\n    a\n      b\n  |||tail";
        let (text, used) = cook(rest).unwrap();
        assert_eq!(text, "a\n  b\n");
        assert_eq!(&rest[used..], "tail");
    }

    #[test]
    fn test_keeps_blank_lines() {
        let (text, _) = cook("\n  a\n\n  b\n|||").unwrap();
        assert_eq!(text, "a\n\nb\n");
    }

    #[test]
    fn test_chomp_drops_final_newline() {
        let (text, _) = cook("-\n  a\n  b\n|||").unwrap();
        assert_eq!(text, "a\nb");
    }

    #[test]
    fn test_requires_newline_after_opener() {
        assert!(cook(" a\n  b\n|||").is_none());
    }

    #[test]
    fn test_requires_indented_first_line() {
        assert!(cook("\na\n|||").is_none());
    }

    #[test]
    fn test_terminator_must_be_outdented() {
        assert!(cook("\n  a\n  |||").is_none());
    }

    #[test]
    fn test_requires_terminator() {
        assert!(cook("\n  a\nb\n").is_none());
        assert!(cook("\n  a\n").is_none());
    }
}
