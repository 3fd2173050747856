//! Source location types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Region in a source file, line/column based (1-indexed lines).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// A zero span (0:0-0:0), used when a frontend has no position info.
    pub fn zero() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::zero()
    }
}

/// Full source location: file plus span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub span: Span,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, span: Span) -> Self {
        Self {
            file: file.into(),
            span,
        }
    }

    /// Location covering a whole file with no position detail.
    pub fn file_only(file: impl Into<PathBuf>) -> Self {
        Self::new(file, Span::zero())
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file.display(),
            self.span.start_line,
            self.span.start_col
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_span_is_the_default() {
        assert_eq!(Span::default(), Span::zero());
    }

    #[test]
    fn test_location_display() {
        let loc = SourceLocation::new("src/main.c", Span::new(3, 7, 3, 12));
        assert_eq!(loc.to_string(), "src/main.c:3:7");
    }
}
