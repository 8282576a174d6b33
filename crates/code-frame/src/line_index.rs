//! Line index for offset ↔ line/column conversion.

use crate::Location;
use text_size::TextSize;

/// A byte offset into a source string.
pub type ByteOffset = TextSize;

/// A line and column position (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed column (byte offset within the line).
    pub col: u32,
}

impl LineCol {
    /// Creates a new line/column position.
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Maps byte offsets of one file's text to line/column positions and back.
///
/// Compiler diagnostics carry a start offset and a length; the index turns
/// those into a [`Location`] without rescanning the text for every record.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// `line_starts[i]` is the offset where line `i` begins.
    line_starts: Vec<ByteOffset>,
    /// Total length of the indexed text.
    len: ByteOffset,
}

impl LineIndex {
    /// Creates a new line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];

        for (offset, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(TextSize::from((offset + 1) as u32));
            }
        }

        Self {
            line_starts,
            len: TextSize::from(text.len() as u32),
        }
    }

    /// Returns the number of lines in the source.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset to a line/column position.
    ///
    /// Returns `None` if the offset lies past the end of the text.
    pub fn line_col(&self, offset: ByteOffset) -> Option<LineCol> {
        if offset > self.len {
            return None;
        }

        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };

        let col = u32::from(offset) - u32::from(self.line_starts[line]);
        Some(LineCol::new(line as u32, col))
    }

    /// Converts a line/column position to a byte offset.
    ///
    /// Returns `None` if the line is out of bounds.
    pub fn offset(&self, line_col: LineCol) -> Option<ByteOffset> {
        let line_start = *self.line_starts.get(line_col.line as usize)?;
        Some((line_start + TextSize::from(line_col.col)).min(self.len))
    }

    /// Converts an offset/length pair into a 1-based [`Location`].
    ///
    /// An end running past the text is clamped to the end of the text.
    pub fn location(&self, start: u32, length: u32) -> Option<Location> {
        let start_offset = TextSize::from(start);
        let end_offset = TextSize::from(start.saturating_add(length)).min(self.len);

        let start = self.line_col(start_offset)?;
        let end = self.line_col(end_offset)?;
        Some(Location::from_zero_based(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let index = LineIndex::new("hello world");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.line_col(TextSize::from(0)), Some(LineCol::new(0, 0)));
        assert_eq!(index.line_col(TextSize::from(5)), Some(LineCol::new(0, 5)));
    }

    #[test]
    fn test_multiple_lines() {
        let index = LineIndex::new("hello\nworld\nfoo");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_col(TextSize::from(6)), Some(LineCol::new(1, 0)));
        assert_eq!(index.line_col(TextSize::from(10)), Some(LineCol::new(1, 4)));
        assert_eq!(index.line_col(TextSize::from(12)), Some(LineCol::new(2, 0)));
    }

    #[test]
    fn test_offset_past_end() {
        let index = LineIndex::new("abc");
        assert_eq!(index.line_col(TextSize::from(3)), Some(LineCol::new(0, 3)));
        assert_eq!(index.line_col(TextSize::from(4)), None);
    }

    #[test]
    fn test_offset_from_line_col() {
        let index = LineIndex::new("hello\nworld\n");
        assert_eq!(index.offset(LineCol::new(1, 2)), Some(TextSize::from(8)));
        assert_eq!(index.offset(LineCol::new(5, 0)), None);
    }

    #[test]
    fn test_location_from_offset_and_length() {
        let text = "let a = 1;\nlet b: string = 2;\n";
        let index = LineIndex::new(text);
        // `b` on the second line
        let loc = index.location(15, 1).unwrap();
        assert_eq!(loc, Location::new(2, 5, 2, 6));
    }

    #[test]
    fn test_location_clamps_length() {
        let index = LineIndex::new("abc");
        let loc = index.location(1, 100).unwrap();
        assert_eq!(loc, Location::new(1, 2, 1, 4));
    }
}
