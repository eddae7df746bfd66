// Chunk: docs/chunks/text_buffer - Text buffer data structure with gap buffer backing
// Chunk: docs/chunks/lazy_line_delta - Pending shift for line start offsets

//! Line index for tracking line boundaries in the text buffer.
//!
//! Maintains line start offsets in a gap buffer for O(1) line count and
//! O(log n) offset lookup. Edits do not rewrite every following offset: the
//! entries at or after `delta_index` carry an implicit `delta` that is only
//! folded into the stored values when a later edit lands somewhere else.
//! Typing on one line, or appending lines at the end, therefore costs O(1)
//! per edit instead of O(lines).

use crate::gap_buffer::GapBuffer;

/// Line-level description of a text replacement, in pre-edit line numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChange {
    /// Line containing the start of the replaced range.
    pub line: usize,
    /// Number of line breaks in the removed text.
    pub removed_line_count: usize,
    /// Start offsets (post-edit) of the lines created by the new text.
    pub new_line_offsets: Vec<usize>,
    /// Length of the removed text.
    pub removed_len: usize,
    /// Length of the inserted text.
    pub new_len: usize,
}

impl LineChange {
    /// Number of line breaks in the new text.
    pub fn new_line_count(&self) -> usize {
        self.new_line_offsets.len()
    }
}

/// Tracks line boundaries in a text buffer.
///
/// `line_starts[0]` is always 0 and is never removed. Entries at index
/// `>= delta_index` are stored without the pending `delta`; every read goes
/// through [`LineIndex::line_start`], which applies it.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: GapBuffer<usize>,
    delta: isize,
    delta_index: usize,
}

impl LineIndex {
    /// Creates a new line index with a single empty line.
    pub fn new() -> Self {
        Self {
            line_starts: GapBuffer::from_vec(vec![0]),
            delta: 0,
            delta_index: 1,
        }
    }

    /// Rebuilds the line index from the given content.
    ///
    /// This is O(n) where n is the content length, but should only be needed
    /// for bulk operations like loading a file.
    pub fn rebuild<I>(&mut self, content: I)
    where
        I: IntoIterator<Item = char>,
    {
        let mut starts = vec![0];
        let mut offset = 0;
        for ch in content {
            offset += 1;
            if ch == '\n' {
                starts.push(offset);
            }
        }

        self.delta_index = starts.len();
        self.delta = 0;
        self.line_starts = GapBuffer::from_vec(starts);
    }

    /// Returns the number of lines in the buffer.
    ///
    /// A buffer always has at least one line (even if empty).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Returns the character offset where the given line starts.
    ///
    /// Returns None if the line index is out of bounds.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        let stored = *self.line_starts.get(line)?;
        if line >= self.delta_index {
            Some(stored.wrapping_add_signed(self.delta))
        } else {
            Some(stored)
        }
    }

    /// Returns the start offset of `line`, where `line == line_count()` maps to
    /// `total_len` (the end of the buffer).
    pub fn offset_from_line(&self, line: usize, total_len: usize) -> usize {
        debug_assert!(
            line <= self.line_count(),
            "line {} beyond line count {}",
            line,
            self.line_count()
        );
        self.line_start(line).unwrap_or(total_len)
    }

    /// Returns the character offset of the end of the given line.
    ///
    /// For all lines except the last, this points to the newline character.
    /// For the last line, this equals the total buffer length.
    pub fn line_end(&self, line: usize, total_len: usize) -> Option<usize> {
        if line >= self.line_count() {
            return None;
        }

        if line + 1 < self.line_count() {
            // Not the last line: end is the start of the next line minus 1 (the newline)
            self.line_start(line + 1).map(|start| start - 1)
        } else {
            Some(total_len)
        }
    }

    /// Returns the length of the given line (excluding the newline character).
    pub fn line_len(&self, line: usize, total_len: usize) -> Option<usize> {
        let start = self.line_start(line)?;
        let end = self.line_end(line, total_len)?;
        Some(end - start)
    }

    /// Returns the line number containing the given character offset.
    ///
    /// Binary search for the largest line whose start is `<= offset`, so an
    /// offset sitting exactly on a line start belongs to that line. Reads go
    /// through `line_start`, which applies the pending shift past the anchor.
    pub fn line_at_offset(&self, offset: usize) -> usize {
        let mut lo = 0;
        let mut hi = self.line_count();
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            match self.line_start(mid) {
                Some(start) if start <= offset => lo = mid,
                _ => hi = mid,
            }
        }
        lo
    }

    /// Applies a text replacement to the index.
    ///
    /// The pending shift is first moved to the end of the replaced lines, the
    /// replaced line starts are overwritten with the new ones, then the shift
    /// grows by the length difference and its anchor moves past the new lines.
    pub fn apply_change(&mut self, change: &LineChange) {
        let first = change.line + 1;
        let removed = change.removed_line_count;
        let added = change.new_line_count();
        debug_assert!(
            first + removed <= self.line_count(),
            "line change {:?} beyond line count {}",
            change,
            self.line_count()
        );

        self.move_delta_to(first + removed);
        self.line_starts
            .replace(first, removed, change.new_line_offsets.clone());

        self.delta_index = first + added;
        self.delta += change.new_len as isize - change.removed_len as isize;

        if self.delta_index >= self.line_count() {
            self.delta = 0;
            self.delta_index = self.line_count();
        }
    }

    /// Moves the pending shift anchor to `index`.
    ///
    /// Moving right folds the shift into the skipped entries. Moving left
    /// either subtracts it from the skipped entries (they then carry it
    /// implicitly) or folds it into the whole tail, whichever touches fewer
    /// entries. Both leave identical logical offsets.
    fn move_delta_to(&mut self, index: usize) {
        if index == self.delta_index {
            return;
        }
        if self.delta == 0 {
            self.delta_index = index;
            return;
        }

        let delta = self.delta;
        if index > self.delta_index {
            for line in self.delta_index..index {
                self.shift_entry(line, delta);
            }
            self.delta_index = index;
        } else {
            let left_cost = self.delta_index - index;
            let fold_cost = self.line_count() - self.delta_index;
            if left_cost <= fold_cost {
                // Stored values may wrap below zero; reads add the delta back.
                for line in index..self.delta_index {
                    self.shift_entry(line, -delta);
                }
            } else {
                for line in self.delta_index..self.line_count() {
                    self.shift_entry(line, delta);
                }
                self.delta = 0;
            }
            self.delta_index = index;
        }
    }

    fn shift_entry(&mut self, line: usize, delta: isize) {
        if let Some(start) = self.line_starts.get_mut(line) {
            *start = start.wrapping_add_signed(delta);
        }
    }

    /// Returns the materialized line start offsets (for debug validation).
    #[cfg(any(debug_assertions, test))]
    pub fn line_starts(&self) -> Vec<usize> {
        (0..self.line_count())
            .filter_map(|line| self.line_start(line))
            .collect()
    }
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Scans `text` for line breaks, returning the absolute start offsets of the
/// lines they create when `text` is placed at `offset`.
pub fn line_offsets_in(text: &[char], offset: usize) -> Vec<usize> {
    text.iter()
        .enumerate()
        .filter(|(_, &ch)| ch == '\n')
        .map(|(i, _)| offset + i + 1)
        .collect()
}
