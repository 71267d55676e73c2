//! Source positions.
//!
//! [`Span`] is shared with the document model. [`LineIndex`] turns byte
//! offsets into the 1-based line and column pairs used in log output.

pub use quire_core::span::Span;

/// A 1-based line and column (in characters) within the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Byte offsets of every line start in a source text.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    /// Number of lines in the source.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of `offset`. Offsets past the end clamp to the last position.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = self.source[line_start..]
            .char_indices()
            .take_while(|(idx, _)| line_start + idx < offset)
            .count();
        Position {
            line: line + 1,
            column: column + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_positions() {
        let index = LineIndex::new("= Title\n\nSome text\n");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.position(0), Position { line: 1, column: 1 });
        assert_eq!(index.position(2), Position { line: 1, column: 3 });
        assert_eq!(index.position(9), Position { line: 3, column: 1 });
        assert_eq!(index.position(14), Position { line: 3, column: 6 });
    }

    #[test]
    fn test_line_index_counts_characters() {
        let index = LineIndex::new("né x");
        // `x` starts at byte 4 but is the fourth character.
        assert_eq!(index.position(4), Position { line: 1, column: 4 });
    }

    #[test]
    fn test_line_index_clamps() {
        let index = LineIndex::new("ab");
        assert_eq!(index.position(100), Position { line: 1, column: 3 });
    }
}
