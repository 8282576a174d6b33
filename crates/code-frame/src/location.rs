//! Source locations attached to diagnostics.

use crate::LineCol;

/// A range in a source file.
///
/// Lines and columns are 1-based. An end line or column of `0` means the
/// producing tool did not report an end position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Location {
    /// 1-indexed start line.
    pub start_line: u32,
    /// 1-indexed start column.
    pub start_column: u32,
    /// 1-indexed end line, `0` when unknown.
    pub end_line: u32,
    /// 1-indexed end column, `0` when unknown.
    pub end_column: u32,
}

impl Location {
    /// Creates a location from 1-based positions.
    #[inline]
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Creates a location from 0-based line/column pairs, as produced by
    /// [`LineIndex`](crate::LineIndex) and the language server protocol.
    pub fn from_zero_based(start: LineCol, end: LineCol) -> Self {
        Self {
            start_line: start.line + 1,
            start_column: start.col + 1,
            end_line: end.line + 1,
            end_column: end.col + 1,
        }
    }

    /// Returns the last line covered by this location.
    ///
    /// Falls back to the start line when no end was reported.
    #[inline]
    pub fn last_line(&self) -> u32 {
        self.end_line.max(self.start_line)
    }

    /// Returns true if the location spans more than one line.
    #[inline]
    pub fn is_multiline(&self) -> bool {
        self.last_line() > self.start_line
    }
}
