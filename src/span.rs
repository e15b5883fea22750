//! Source location tracking
//!
//! Every token and atom carries the line and column it started at. Errors
//! from all later stages report positions in these terms.

use std::fmt;

/// A position in the source code (line and column, both 1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, PartialOrd, Ord)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: u32,
    /// Column number (1-indexed)
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Maps byte offsets to line/column positions while walking a source text
/// front to back.
///
/// Offsets passed to [`LineCursor::position`] must be non-decreasing.
#[derive(Debug)]
pub struct LineCursor<'src> {
    source: &'src str,
    offset: usize,
    line: u32,
    line_start: usize,
}

impl<'src> LineCursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            line_start: 0,
        }
    }

    /// Position of the byte at `offset`.
    pub fn position(&mut self, offset: usize) -> Position {
        let target = offset.min(self.source.len());
        if target > self.offset {
            for (i, b) in self.source.as_bytes()[self.offset..target].iter().enumerate() {
                if *b == b'\n' {
                    self.line += 1;
                    self.line_start = self.offset + i + 1;
                }
            }
            self.offset = target;
        }
        Position::new(self.line, (target - self.line_start) as u32 + 1)
    }
}

/// Trait for anything that knows where it came from
pub trait Located {
    fn pos(&self) -> Position;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_first_line() {
        let mut cursor = LineCursor::new("abc def");
        assert_eq!(cursor.position(0), Position::new(1, 1));
        assert_eq!(cursor.position(4), Position::new(1, 5));
    }

    #[test]
    fn test_cursor_crosses_lines() {
        let source = "ab\n  cd\nef";
        let mut cursor = LineCursor::new(source);
        assert_eq!(cursor.position(1), Position::new(1, 2));
        assert_eq!(cursor.position(5), Position::new(2, 3));
        assert_eq!(cursor.position(8), Position::new(3, 1));
    }

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(3, 9).to_string(), "line 3, column 9");
    }
}
