//! Source location types
//!
//! Positions are zero-based `line` / `character` pairs, which is what the
//! editor layer consumes directly.

use serde::{Deserialize, Serialize};

/// Single location in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Half-open range in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a zero range (0:0-0:0)
    pub fn zero() -> Self {
        Self::new(Position::new(0, 0), Position::new(0, 0))
    }

    pub fn contains(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True when the two ranges share at least one position
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(a: (u32, u32), b: (u32, u32)) -> Range {
        Range::new(Position::new(a.0, a.1), Position::new(b.0, b.1))
    }

    #[test]
    fn test_range_contains() {
        let outer = range((1, 0), (10, 0));
        assert!(outer.contains(&range((2, 4), (3, 1))));
        assert!(!outer.contains(&range((0, 4), (3, 1))));
    }

    #[test]
    fn test_range_overlaps() {
        let a = range((1, 0), (2, 0));
        assert!(a.overlaps(&range((1, 5), (4, 0))));
        assert!(!a.overlaps(&range((2, 0), (4, 0))));
    }
}
