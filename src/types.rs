use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a layer. Base texts and annotation layers share one identifier space,
/// since every annotation layer is itself a text (and a possible anchor target).
/// Identifiers are issued by an [`crate::IdentifierGenerator`] and are never reused,
/// not even when the transaction that obtained them rolls back.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, Default,
)]
#[serde(transparent)]
pub struct LayerId(i64);

impl LayerId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for LayerId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Corresponds to a slice of a text: a half-open interval `[start, end)`.
/// Offsets are unicode codepoints (not bytes!) and are 0-indexed.
///
/// This is used both as a plain position in a text buffer and, combined with a
/// [`LayerId`] in an [`crate::Anchor`], to anchor an annotation to a specific text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct TextRange {
    start: usize,
    end: usize,
}

impl TextRange {
    /// Create a new range. Panics when `end < start`, which is a contract
    /// violation on the caller's part, not a recoverable condition.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(
            end >= start,
            "TextRange end ({}) must not precede start ({})",
            end,
            start
        );
        Self { start, end }
    }

    /// A degenerate (zero-length) range at the given position
    pub fn point(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Return the end position (non-inclusive)
    pub fn end(&self) -> usize {
        self.end
    }

    /// Length in unicode codepoints
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Tests overlap between two half-open ranges: `other.end > self.start && other.start < self.end`
    pub fn overlaps(&self, other: &TextRange) -> bool {
        other.end > self.start && other.start < self.end
    }

    /// Tests whether this range fully encloses the other
    pub fn encloses(&self, other: &TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns a copy grown at the end by `delta` codepoints
    pub(crate) fn grow(&self, delta: usize) -> Self {
        Self {
            start: self.start,
            end: self.end + delta,
        }
    }
}

impl Ord for TextRange {
    // this determines the canonical ordering for ranges: by start, ties broken by end
    fn cmp(&self, other: &Self) -> Ordering {
        let ord = self.start.cmp(&other.start);
        if ord != Ordering::Equal {
            ord
        } else {
            self.end.cmp(&other.end)
        }
    }
}

impl PartialOrd for TextRange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{})", self.start, self.end)
    }
}
