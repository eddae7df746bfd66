// Chunk: docs/chunks/text_selection_model - Selection anchor and range API
// Chunk: docs/chunks/multi_view - Per-view selections over a shared document

//! Per-view selections.
//!
//! A view owns one [`Selection`], a non-empty list of [`TextRange`]s in
//! character offsets. Ranges are kept sorted by their start and never overlap;
//! the document maps every view's selection through each edit so that carets
//! stay on the same text, and undo groups snapshot selections so undo can put
//! the carets back.

/// One selected range. `anchor == caret` is a plain cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRange {
    pub anchor: usize,
    pub caret: usize,
}

impl TextRange {
    pub fn new(anchor: usize, caret: usize) -> Self {
        Self { anchor, caret }
    }

    /// A collapsed range (cursor) at `offset`.
    pub fn cursor(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.caret)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.caret)
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.caret
    }

    /// Maps this range through the replacement of `old_len` characters at
    /// `offset` by `new_len` characters.
    pub fn adjust_for_edit(&mut self, offset: usize, old_len: usize, new_len: usize) {
        self.anchor = map_offset(self.anchor, offset, old_len, new_len);
        self.caret = map_offset(self.caret, offset, old_len, new_len);
    }
}

/// Maps an offset through a replacement.
///
/// Offsets at or before the edit stay put, offsets after the removed span
/// shift by the length difference and offsets inside it move to the end of the
/// inserted text.
pub fn map_offset(pos: usize, offset: usize, old_len: usize, new_len: usize) -> usize {
    if pos <= offset {
        pos
    } else if pos >= offset + old_len {
        pos - old_len + new_len
    } else {
        offset + new_len
    }
}

/// The selection of one view: sorted, non-overlapping, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    ranges: Vec<TextRange>,
}

impl Selection {
    /// Creates a selection from arbitrary ranges, normalizing them.
    ///
    /// An empty list yields a cursor at offset 0.
    pub fn new(ranges: Vec<TextRange>) -> Self {
        let mut selection = Self { ranges };
        selection.normalize();
        selection
    }

    /// A single cursor at `offset`.
    pub fn cursor(offset: usize) -> Self {
        Self {
            ranges: vec![TextRange::cursor(offset)],
        }
    }

    /// A single range.
    pub fn range(anchor: usize, caret: usize) -> Self {
        Self {
            ranges: vec![TextRange::new(anchor, caret)],
        }
    }

    pub fn ranges(&self) -> &[TextRange] {
        &self.ranges
    }

    /// The caret offset of every range, in ascending order.
    pub fn carets(&self) -> Vec<usize> {
        self.ranges.iter().map(|r| r.caret).collect()
    }

    /// Clamps every range to `len` (the document length).
    pub fn clamp(&mut self, len: usize) {
        for range in &mut self.ranges {
            range.anchor = range.anchor.min(len);
            range.caret = range.caret.min(len);
        }
        self.normalize();
    }

    /// Maps every range through a replacement and re-normalizes.
    pub fn adjust_for_edit(&mut self, offset: usize, old_len: usize, new_len: usize) {
        for range in &mut self.ranges {
            range.adjust_for_edit(offset, old_len, new_len);
        }
        self.normalize();
    }

    /// Sorts ranges and merges the ones that overlap.
    ///
    /// Two non-empty ranges that merely touch stay separate; a cursor sitting
    /// on the boundary of a range is absorbed by it.
    fn normalize(&mut self) {
        if self.ranges.is_empty() {
            self.ranges.push(TextRange::default());
            return;
        }
        self.ranges.sort_by_key(|r| (r.start(), r.end()));

        let mut merged: Vec<TextRange> = Vec::with_capacity(self.ranges.len());
        for range in self.ranges.drain(..) {
            match merged.last_mut() {
                Some(last)
                    if range.start() < last.end()
                        || (range.start() == last.end() && (range.is_empty() || last.is_empty())) =>
                {
                    let start = last.start();
                    let end = last.end().max(range.end());
                    // Keep the direction of the earlier range
                    *last = if last.caret >= last.anchor {
                        TextRange::new(start, end)
                    } else {
                        TextRange::new(end, start)
                    };
                }
                _ => merged.push(range),
            }
        }
        self.ranges = merged;
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::cursor(0)
    }
}
