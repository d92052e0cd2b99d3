use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// A position in source code, tracking line, column, and byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line number
    line: usize,
    /// 1-based column number
    column: usize,
    /// 0-based byte offset from start of file
    offset: usize,
}

impl Position {
    /// Create a new position
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// Get the line number (1-based)
    pub fn line(&self) -> usize {
        self.line
    }

    /// Get the column number (1-based)
    pub fn column(&self) -> usize {
        self.column
    }

    /// Get the byte offset (0-based)
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Create a position at the start of a file
    pub fn start() -> Self {
        Self::new(1, 1, 0)
    }

    /// Advance position by one character
    pub fn advance(mut self, ch: char) -> Self {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.offset += ch.len_utf8();
        self
    }

    /// Advance position over every character of `text`
    pub fn advance_str(self, text: &str) -> Self {
        text.chars().fold(self, Position::advance)
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.offset.cmp(&other.offset)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

/// A range of text in one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    start: Position,
    end: Position,
}

impl SourceRange {
    /// Create a new source range
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Get the start position
    pub fn start(&self) -> &Position {
        &self.start
    }

    /// Get the end position
    pub fn end(&self) -> &Position {
        &self.end
    }

    /// Check if this range contains a position
    pub fn contains(&self, pos: &Position) -> bool {
        self.start <= *pos && *pos <= self.end
    }

    /// Smallest range covering both `self` and `other`
    pub fn cover(&self, other: &SourceRange) -> SourceRange {
        SourceRange::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Get the byte length of this range
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    /// Check if this range is empty
    pub fn is_empty(&self) -> bool {
        self.start.offset >= self.end.offset
    }

    /// Create a range spanning a single position
    pub fn single(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

impl Default for SourceRange {
    fn default() -> Self {
        Self::single(Position::start())
    }
}

/// Complete source location information: a file and a range inside it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    file: PathBuf,
    range: SourceRange,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(file: PathBuf, range: SourceRange) -> Self {
        Self { file, range }
    }

    /// Get the file path
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Get the covered range
    pub fn range(&self) -> &SourceRange {
        &self.range
    }

    /// Start line (1-based)
    pub fn line(&self) -> usize {
        self.range.start.line
    }

    /// Start column (1-based)
    pub fn column(&self) -> usize {
        self.range.start.column
    }

    /// Get the byte length of this location
    pub fn byte_length(&self) -> usize {
        self.range.len()
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file.display(),
            self.range.start.line,
            self.range.start.column
        )
    }
}

/// Trait for AST nodes that have source range information
pub trait Located {
    /// Get the source range of this node
    fn range(&self) -> SourceRange;

    /// Get the start position of this node
    fn start(&self) -> Position {
        *self.range().start()
    }

    /// Get the end position of this node
    fn end(&self) -> Position {
        *self.range().end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_basic() {
        let pos = Position::new(10, 5, 245);
        assert_eq!(pos.line(), 10);
        assert_eq!(pos.column(), 5);
        assert_eq!(pos.offset(), 245);
    }

    #[test]
    fn test_position_advance() {
        let pos = Position::start().advance_str("IN\nOUT");
        assert_eq!(pos.line(), 2);
        assert_eq!(pos.column(), 4);
        assert_eq!(pos.offset(), 6);
    }

    #[test]
    fn test_source_range_cover() {
        let a = SourceRange::new(Position::new(1, 1, 0), Position::new(1, 3, 2));
        let b = SourceRange::new(Position::new(1, 5, 4), Position::new(1, 14, 13));
        let covered = a.cover(&b);

        assert_eq!(covered.start().offset(), 0);
        assert_eq!(covered.end().offset(), 13);
        assert!(covered.contains(&Position::new(1, 4, 3)));
        assert_eq!(covered.len(), 13);
    }

    #[test]
    fn test_source_location_display() {
        let range = SourceRange::new(Position::new(1, 19, 18), Position::new(1, 28, 27));
        let location = SourceLocation::new(PathBuf::from("pkg.pks"), range);

        assert_eq!(location.to_string(), "pkg.pks:1:19");
        assert_eq!(location.byte_length(), 9);
        assert_eq!(location.line(), 1);
        assert_eq!(location.column(), 19);
    }
}
