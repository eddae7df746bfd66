// Chunk: docs/chunks/change_notifications - Before/after change notifications for collaborators

//! Change notifications raised by every text mutation.
//!
//! Collaborators (lexers, layout, renderers) observe the document exclusively
//! through [`TextChangeListener`]. Each replacement raises
//! `text_about_to_change` before the storage is touched and `text_changed`
//! afterwards, both with the same [`TextBufferChange`]; the second call also
//! carries the text that was replaced.

use crate::types::DirtyLines;

/// Describes one replacement of `removed_len` characters at `offset` by
/// `new_text`.
///
/// Line fields are expressed in pre-edit line numbers: `line` is the line that
/// contains `offset`, `removed_line_count` is the number of line breaks in the
/// removed text and `new_line_offsets` holds the post-edit start offsets of the
/// lines the new text creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBufferChange<'a> {
    pub offset: usize,
    pub removed_len: usize,
    pub new_text: &'a [char],
    pub line: usize,
    pub removed_line_count: usize,
    pub new_line_offsets: Vec<usize>,
}

impl TextBufferChange<'_> {
    /// Length of the inserted text.
    pub fn new_len(&self) -> usize {
        self.new_text.len()
    }

    /// Number of line breaks in the inserted text.
    pub fn new_line_count(&self) -> usize {
        self.new_line_offsets.len()
    }

    /// Net change of the document length.
    pub fn len_delta(&self) -> isize {
        self.new_text.len() as isize - self.removed_len as isize
    }

    /// Lines a renderer has to refresh after this change.
    pub fn dirty_lines(&self) -> DirtyLines {
        DirtyLines::for_replacement(self.line, self.removed_line_count, self.new_line_count())
    }
}

/// Observer of document mutations.
///
/// All methods have empty default bodies so listeners implement only what
/// they need. Listeners run synchronously on the thread performing the edit
/// and cannot reach back into the document.
pub trait TextChangeListener {
    /// Called before the text is modified.
    fn text_about_to_change(&mut self, _change: &TextBufferChange<'_>) {}

    /// Called after the text is modified. `old_text` is the replaced content.
    fn text_changed(&mut self, _change: &TextBufferChange<'_>, _old_text: &[char]) {}

    /// Called once when the outermost change batch ends, with the union of the
    /// lines its replacements dirtied.
    fn changes_ended(&mut self, _dirty: &DirtyLines) {}
}
