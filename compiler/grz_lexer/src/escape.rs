//! Escape sequence processing for quoted Jsonnet strings.
//!
//! Recognized escapes: `\"`, `\'`, `\\`, `\/`, `\b`, `\f`, `\n`, `\r`, `\t`
//! and `\uXXXX` (UTF-16 surrogate pairs are combined). Anything else is an
//! error, matching the reference Jsonnet lexer.

/// Resolve a single-character escape to its replacement.
#[inline]
pub(crate) fn resolve_escape(c: char) -> Option<char> {
    match c {
        '"' => Some('"'),
        '\'' => Some('\''),
        '\\' => Some('\\'),
        '/' => Some('/'),
        'b' => Some('\u{8}'),
        'f' => Some('\u{c}'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        _ => None,
    }
}

/// Cook the body of a `"..."` or `'...'` literal (quotes already stripped).
pub(crate) fn unescape_string(s: &str) -> Result<String, String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('u') => {
                let unit = read_hex4(&mut chars)?;
                let code = if (0xD800..0xDC00).contains(&unit) {
                    // High surrogate: a `\uXXXX` low surrogate must follow.
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return Err(format!("unpaired UTF-16 surrogate \\u{unit:04x}"));
                    }
                    let low = read_hex4(&mut chars)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(format!("invalid UTF-16 low surrogate \\u{low:04x}"));
                    }
                    0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    unit
                };
                let ch = char::from_u32(code)
                    .ok_or_else(|| format!("invalid unicode escape \\u{code:04x}"))?;
                result.push(ch);
            }
            Some(esc) => match resolve_escape(esc) {
                Some(resolved) => result.push(resolved),
                None => return Err(format!("unknown escape sequence in string literal: \\{esc}")),
            },
            None => return Err("truncated escape sequence in string literal".to_string()),
        }
    }

    Ok(result)
}

fn read_hex4(chars: &mut std::str::Chars<'_>) -> Result<u32, String> {
    let mut value = 0u32;
    for _ in 0..4 {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(|| "\\u must be followed by 4 hex digits".to_string())?;
        value = value * 16 + digit;
    }
    Ok(value)
}

/// Cook a verbatim `@"..."` / `@'...'` body: the doubled quote is the only escape.
pub(crate) fn unescape_verbatim(s: &str, quote: char) -> String {
    let mut doubled = String::with_capacity(2);
    doubled.push(quote);
    doubled.push(quote);
    s.replace(&doubled, &quote.to_string())
}
