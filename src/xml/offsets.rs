use serde::Serialize;

use crate::types::TextRange;

/// One contiguous correspondence between source-document character positions and
/// output-text positions. The converter emits these in non-decreasing offset
/// order; together they partition the processed source prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeMapping {
    pub source: TextRange,
    pub text: TextRange,
}

/// Accumulates parallel source and text offset deltas and emits a
/// [`RangeMapping`] whenever the accumulated pair stops describing a simple
/// relation. Runs of "copy one char, advance both by one" coalesce into a single
/// entry; pure insertions (text without source) and pure skips (source without
/// text, e.g. markup or compressed whitespace) each get their own entry.
#[derive(Debug)]
pub struct OffsetMapper {
    source: TextRange,
    text: TextRange,
}

impl OffsetMapper {
    pub fn new() -> Self {
        Self {
            source: TextRange::point(0),
            text: TextRange::point(0),
        }
    }

    /// Record that `text_delta` output characters were produced while consuming
    /// `source_delta` source characters. Returns a mapping entry when the
    /// previously accumulated ranges had to be flushed first.
    pub fn advance(&mut self, text_delta: usize, source_delta: usize) -> Option<RangeMapping> {
        if text_delta == 0 && self.text.is_empty() {
            // pure source advance with no text effect
            self.source = self.source.grow(source_delta);
            None
        } else if source_delta == 0 && self.source.is_empty() {
            // pure insertion without consuming source
            self.text = self.text.grow(text_delta);
            None
        } else if self.source.len() == self.text.len() && text_delta == source_delta {
            // plain copy, coalesce
            self.source = self.source.grow(source_delta);
            self.text = self.text.grow(text_delta);
            None
        } else {
            // the accumulated pair no longer describes a simple relation
            let flushed = self.flush();
            self.source = self.source.grow(source_delta);
            self.text = self.text.grow(text_delta);
            flushed
        }
    }

    /// Emit whatever has accumulated and start fresh ranges at the current end
    /// offsets. Returns `None` when both ranges are still empty. Must be called
    /// once more at document end.
    pub fn flush(&mut self) -> Option<RangeMapping> {
        if self.source.is_empty() && self.text.is_empty() {
            return None;
        }
        let mapping = RangeMapping {
            source: self.source,
            text: self.text,
        };
        self.source = TextRange::point(self.source.end());
        self.text = TextRange::point(self.text.end());
        Some(mapping)
    }
}

impl Default for OffsetMapper {
    fn default() -> Self {
        Self::new()
    }
}
