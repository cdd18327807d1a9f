//! Source location spans.
//!
//! A span is a byte range inside one registered source file. The file is
//! identified by a [`FileId`] handed out by whoever owns the file table (the
//! VM, in practice), which keeps spans `Copy` and 12 bytes wide.

use std::fmt;

/// Index of a source file in the owning file table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug)]
pub struct FileId(pub u32);

impl FileId {
    /// File id used for synthesized code with no real source.
    pub const SYNTHETIC: FileId = FileId(u32::MAX);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Source location span.
///
/// Layout: 12 bytes total
/// - file: `FileId`
/// - start: u32 - byte offset from file start
/// - end: u32 - byte offset (exclusive)
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub file: FileId,
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Span for generated code (stdlib thunks, native results).
    pub const DUMMY: Span = Span {
        file: FileId::SYNTHETIC,
        start: 0,
        end: 0,
    };

    #[inline]
    pub const fn new(file: FileId, start: u32, end: u32) -> Self {
        Span { file, start, end }
    }

    /// Create from a byte range, saturating offsets that do not fit in `u32`.
    #[inline]
    pub fn from_range(file: FileId, range: std::ops::Range<usize>) -> Self {
        let start = u32::try_from(range.start).unwrap_or(u32::MAX);
        let end = u32::try_from(range.end).unwrap_or(u32::MAX);
        Span { file, start, end }
    }

    /// Zero-length span at `offset`.
    #[inline]
    pub const fn point(file: FileId, offset: u32) -> Self {
        Span {
            file,
            start: offset,
            end: offset,
        }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether this span points into a real file.
    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.file == FileId::SYNTHETIC
    }

    /// Merge two spans of the same file into one covering both.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span {
            file: self.file,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    #[inline]
    pub fn to_range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}..{}", self.file.0, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_basic() {
        let span = Span::new(FileId(0), 10, 20);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());
        assert!(!span.is_synthetic());
    }

    #[test]
    fn test_span_merge() {
        let a = Span::new(FileId(1), 10, 20);
        let b = Span::new(FileId(1), 15, 30);
        let merged = a.merge(b);
        assert_eq!(merged, Span::new(FileId(1), 10, 30));
    }

    #[test]
    fn test_from_range_saturates() {
        let span = Span::from_range(FileId(0), 3..usize::MAX);
        assert_eq!(span.start, 3);
        assert_eq!(span.end, u32::MAX);
    }

    #[test]
    fn test_dummy_is_synthetic() {
        assert!(Span::DUMMY.is_synthetic());
        assert!(Span::point(FileId(2), 4).is_empty());
    }
}
