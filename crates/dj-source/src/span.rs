//! Positions and source-text line/column bookkeeping.

/// A 1-indexed line/column position plus its 0-indexed byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

/// A source file's text, with line-start offsets precomputed so byte
/// offsets can be turned into positions.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    #[must_use]
    pub fn new(name: String, text: String) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            }
        }
        Self { name, text, line_starts }
    }

    /// Converts a byte offset into a 1-indexed line/column position.
    #[must_use]
    pub fn position_at(&self, offset: u32) -> Position {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line_idx];
        Position {
            line: u32::try_from(line_idx + 1).unwrap_or(u32::MAX),
            column: offset - line_start + 1,
            offset,
        }
    }
}
