// Chunk: docs/chunks/text_buffer - Text buffer data structure with gap buffer backing
// Chunk: docs/chunks/change_notifications - Before/after change notifications for collaborators

//! TextBuffer owns the characters of a document and everything derived from
//! them.
//!
//! It combines a gap buffer (for character storage) with a line index (for
//! line lookups) and the registered change listeners. [`TextBuffer::replace`]
//! is the single mutation path: it raises the about-to-change notification,
//! mutates the gap buffer, updates the line index and raises the changed
//! notification.

use crate::event::{TextBufferChange, TextChangeListener};
use crate::gap_buffer::{GapBuffer, INITIAL_GAP_SIZE, INITIAL_GROWTH};
use crate::line_index::{line_offsets_in, LineChange, LineIndex};
use crate::types::{DirtyLines, Position};

/// Characters, line index and listeners of one document.
pub struct TextBuffer {
    chars: GapBuffer<char>,
    line_index: LineIndex,
    listeners: Vec<Box<dyn TextChangeListener>>,
    /// Buffer length when raw append mode began.
    raw_append_start: Option<usize>,
    /// Mutation counter for sampling debug assertions (debug builds only).
    #[cfg(debug_assertions)]
    debug_mutation_count: u64,
}

impl TextBuffer {
    /// Creates a new empty text buffer.
    pub fn new() -> Self {
        Self::with_gap(INITIAL_GAP_SIZE, INITIAL_GROWTH)
    }

    /// Creates an empty text buffer with the given gap sizing.
    pub fn with_gap(initial_gap: usize, growth: usize) -> Self {
        Self {
            chars: GapBuffer::with_gap(initial_gap, growth),
            line_index: LineIndex::new(),
            listeners: Vec::new(),
            raw_append_start: None,
            #[cfg(debug_assertions)]
            debug_mutation_count: 0,
        }
    }

    /// Creates a text buffer initialized with the given content.
    ///
    /// No notifications are raised.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Self {
        let mut line_index = LineIndex::new();
        line_index.rebuild(content.chars());

        Self {
            chars: GapBuffer::from_str(content),
            line_index,
            listeners: Vec::new(),
            raw_append_start: None,
            #[cfg(debug_assertions)]
            debug_mutation_count: 0,
        }
    }

    /// Registers a listener for change notifications.
    pub fn add_listener(&mut self, listener: Box<dyn TextChangeListener>) {
        self.listeners.push(listener);
    }

    // ==================== Accessors ====================

    /// Returns the total character count in the buffer.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Returns the character at `offset`.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.chars.get(offset).copied()
    }

    /// Returns `len` characters starting at `offset` as a String.
    pub fn text_part(&self, offset: usize, len: usize) -> String {
        self.chars.slice(offset, offset.saturating_add(len))
    }

    /// Returns `len` characters starting at `offset`.
    pub fn chars_in(&self, offset: usize, len: usize) -> Vec<char> {
        self.chars.read(offset, len)
    }

    /// Returns the entire buffer content as a String.
    pub fn content(&self) -> String {
        self.chars.to_string()
    }

    /// Returns the number of lines in the buffer.
    ///
    /// Always at least 1 (even for an empty buffer).
    pub fn line_count(&self) -> usize {
        self.line_index.line_count()
    }

    /// Returns the line containing `offset`.
    pub fn line_from_offset(&self, offset: usize) -> usize {
        debug_assert!(offset <= self.len(), "offset {} beyond length {}", offset, self.len());
        self.line_index.line_at_offset(offset)
    }

    /// Returns the start offset of `line`; `line_count()` maps to `len()`.
    pub fn offset_from_line(&self, line: usize) -> usize {
        self.line_index.offset_from_line(line, self.len())
    }

    /// Returns the column of `offset` on `line`.
    pub fn column_from_offset_and_line(&self, offset: usize, line: usize) -> usize {
        let start = self.offset_from_line(line);
        debug_assert!(offset >= start, "offset {} before line {} start {}", offset, line, start);
        offset - start
    }

    /// Returns the content of the specified line as a String.
    ///
    /// The returned string does not include the trailing newline (if any).
    /// Returns an empty string if the line index is out of bounds.
    pub fn line_content(&self, line: usize) -> String {
        let total_len = self.len();
        match (
            self.line_index.line_start(line),
            self.line_index.line_end(line, total_len),
        ) {
            (Some(start), Some(end)) => self.chars.slice(start, end),
            _ => String::new(),
        }
    }

    /// Returns the characters of the specified line (excluding newline).
    pub fn line_chars(&self, line: usize) -> Vec<char> {
        let start = self.line_index.line_start(line).unwrap_or(0);
        let len = self.line_len(line);
        self.chars.read(start, len)
    }

    /// Returns the length of the specified line (excluding newline).
    pub fn line_len(&self, line: usize) -> usize {
        self.line_index.line_len(line, self.len()).unwrap_or(0)
    }

    /// Converts an offset to a (line, column) position.
    pub fn position_from_offset(&self, offset: usize) -> Position {
        let line = self.line_from_offset(offset);
        Position::new(line, self.column_from_offset_and_line(offset, line))
    }

    /// Converts a (line, col) position to an offset.
    ///
    /// The position is clamped to valid bounds.
    pub fn offset_from_position(&self, pos: Position) -> usize {
        let line = pos.line.min(self.line_count().saturating_sub(1));
        self.offset_from_line(line) + pos.col.min(self.line_len(line))
    }

    // ==================== Mutations ====================

    /// Replaces `len` characters at `offset` with `text`.
    ///
    /// `len` is clamped to the characters available after `offset`. Returns
    /// the replaced characters and the line-level description of the edit.
    pub fn replace(&mut self, offset: usize, len: usize, text: Vec<char>) -> (Vec<char>, LineChange) {
        debug_assert!(offset <= self.len(), "offset {} beyond length {}", offset, self.len());
        debug_assert!(
            self.raw_append_start.is_none(),
            "replace while raw append is active"
        );
        let len = len.min(self.len() - offset);

        let line = self.line_index.line_at_offset(offset);
        let removed_line_count = self.chars.range(offset, offset + len).filter(|&&c| c == '\n').count();
        let new_line_offsets = line_offsets_in(&text, offset);

        let change = TextBufferChange {
            offset,
            removed_len: len,
            new_text: &text,
            line,
            removed_line_count,
            new_line_offsets,
        };
        for listener in self.listeners.iter_mut() {
            listener.text_about_to_change(&change);
        }

        let old_text = self.chars.replace(offset, len, text.clone());

        let line_change = LineChange {
            line,
            removed_line_count,
            new_line_offsets: change.new_line_offsets.clone(),
            removed_len: len,
            new_len: text.len(),
        };
        self.line_index.apply_change(&line_change);

        for listener in self.listeners.iter_mut() {
            listener.text_changed(&change, &old_text);
        }

        self.assert_line_index_consistent();
        (old_text, line_change)
    }

    /// Tells every listener that a change batch ended.
    pub fn notify_changes_ended(&mut self, dirty: &DirtyLines) {
        for listener in self.listeners.iter_mut() {
            listener.changes_ended(dirty);
        }
    }

    // ==================== Raw append ====================
    // Chunk: docs/chunks/raw_append - Bulk loading without per-edit bookkeeping

    /// Starts raw append mode for bulk loading.
    ///
    /// Until [`TextBuffer::end_raw_append`], appended text bypasses the line
    /// index and the notifications; line queries report the pre-append state.
    pub fn begin_raw_append(&mut self) {
        debug_assert!(self.raw_append_start.is_none(), "raw append already active");
        self.raw_append_start = Some(self.len());
    }

    /// Returns true while raw append mode is active.
    pub fn is_raw_appending(&self) -> bool {
        self.raw_append_start.is_some()
    }

    /// Appends text to the end of the buffer (raw append mode only).
    pub fn raw_append(&mut self, text: &str) {
        debug_assert!(self.raw_append_start.is_some(), "raw_append outside raw append mode");
        self.chars.append(text.chars().collect());
    }

    /// Ends raw append mode.
    ///
    /// The line index catches up with everything appended and listeners get
    /// one `text_changed` covering the appended range. Returns the line-level
    /// description of the append, or `None` if raw mode was not active.
    pub fn end_raw_append(&mut self) -> Option<LineChange> {
        let start = self.raw_append_start.take()?;
        let appended = self.chars.read(start, self.len() - start);

        let line_change = LineChange {
            line: self.line_index.line_count() - 1,
            removed_line_count: 0,
            new_line_offsets: line_offsets_in(&appended, start),
            removed_len: 0,
            new_len: appended.len(),
        };
        self.line_index.apply_change(&line_change);

        let change = TextBufferChange {
            offset: start,
            removed_len: 0,
            new_text: &appended,
            line: line_change.line,
            removed_line_count: 0,
            new_line_offsets: line_change.new_line_offsets.clone(),
        };
        for listener in self.listeners.iter_mut() {
            listener.text_changed(&change, &[]);
        }

        self.assert_line_index_consistent();
        Some(line_change)
    }

    // ==================== Validation ====================

    /// Debug assertion: verifies that the incremental line_index matches
    /// a fresh rebuild from the buffer content.
    ///
    /// This catches cumulative drift between the pending-shift bookkeeping
    /// and the ground truth. Compiled out in release builds.
    ///
    /// Uses a mutation counter so the O(n) rebuild doesn't tank perf
    /// in tight loops — checks every 64th mutation.
    #[cfg(debug_assertions)]
    fn assert_line_index_consistent(&mut self) {
        self.debug_mutation_count += 1;
        if self.debug_mutation_count % 64 != 0 {
            return;
        }
        let mut expected = LineIndex::new();
        expected.rebuild(self.chars.iter().copied());
        let actual = self.line_index.line_starts();
        let expected_starts = expected.line_starts();
        assert_eq!(
            actual, expected_starts,
            "line_index drift detected after {} mutations!\n  buffer len: {}\n  actual line_starts:   {:?}\n  expected line_starts: {:?}",
            self.debug_mutation_count, self.len(), actual, expected_starts,
        );
    }

    #[cfg(not(debug_assertions))]
    fn assert_line_index_consistent(&mut self) {}
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextBuffer")
            .field("len", &self.len())
            .field("line_count", &self.line_count())
            .field("listeners", &self.listeners.len())
            .field("raw_append_start", &self.raw_append_start)
            .finish()
    }
}
