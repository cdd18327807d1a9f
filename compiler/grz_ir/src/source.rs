//! Source files and line/column lookup for diagnostics.

use std::rc::Rc;

/// One loaded source file.
///
/// Line starts are computed once so rendering many stack frames from the
/// same file stays cheap.
#[derive(Debug)]
pub struct SourceFile {
    path: Rc<str>,
    text: Rc<str>,
    line_starts: Vec<u32>,
}

/// 1-based line and column of a byte offset.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl SourceFile {
    pub fn new(path: impl Into<Rc<str>>, text: impl Into<Rc<str>>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            }
        }
        SourceFile {
            path: path.into(),
            text,
            line_starts,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn shared_path(&self) -> Rc<str> {
        Rc::clone(&self.path)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Translate a byte offset into a 1-based line/column pair.
    ///
    /// Columns count characters, not bytes.
    pub fn line_col(&self, offset: u32) -> LineCol {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx] as usize;
        let end = (offset as usize).min(self.text.len());
        let col = self
            .text
            .get(line_start..end)
            .map_or(0, |s| s.chars().count());
        LineCol {
            line: u32::try_from(line_idx + 1).unwrap_or(u32::MAX),
            col: u32::try_from(col + 1).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_first_line() {
        let file = SourceFile::new("a.jsonnet", "{ a: 1 }");
        assert_eq!(file.line_col(2), LineCol { line: 1, col: 3 });
    }

    #[test]
    fn test_line_col_later_lines() {
        let file = SourceFile::new("a.jsonnet", "{\n  a: 1,\n  b: 2\n}");
        assert_eq!(file.line_col(0), LineCol { line: 1, col: 1 });
        assert_eq!(file.line_col(4), LineCol { line: 2, col: 3 });
        assert_eq!(file.line_col(12), LineCol { line: 3, col: 3 });
    }

    #[test]
    fn test_line_col_counts_chars() {
        let file = SourceFile::new("a.jsonnet", "'é' + x");
        assert_eq!(file.line_col(5), LineCol { line: 1, col: 5 });
    }
}
