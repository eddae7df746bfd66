// Chunk: docs/chunks/document - Document facade over text, line data, views and undo
// Chunk: docs/chunks/change_notifications - Before/after change notifications for collaborators

//! The document facade.
//!
//! [`Document`] owns the text buffer, the side channel, the selections of
//! every view and the shared undo history. It is the only thing collaborators
//! talk to: reads go through the read API, every edit goes through
//! [`Document::replace`] (or a helper built on it) and every edit is observed
//! through [`TextChangeListener`].
//!
//! An edit runs in this order:
//!
//! 1. the first edit inside the outermost undo group snapshots the selection
//!    of every view;
//! 2. the text change executes through the core, which raises the
//!    about-to-change notification, mutates the gap buffer, updates the line
//!    index, raises the changed notification and maps every selection;
//! 3. when line breaks were added or removed, a slot change keeps the side
//!    channel at one slot per line;
//! 4. both are handed to the open undo group;
//! 5. closing the outermost group records one before/after selection pair
//!    per snapshotted view.
//!
//! Undo and redo run the recorded changes back through the same core, so
//! listeners see undo as ordinary edits and nothing new is recorded.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use tracing::{debug, trace};

use crate::change::{
    Change, ChangeTarget, LineDataChange, LineDataListChange, LineFieldChange, SelectionChange,
    TextChange,
};
use crate::config::DocumentConfig;
use crate::event::TextChangeListener;
use crate::grapheme;
use crate::line_data::{empty_slots, LineData, LineDataStore, LineSlot};
use crate::selection::{Selection, TextRange};
use crate::text_buffer::TextBuffer;
use crate::types::{CoalesceId, DirtyLines, Position, ViewId};
use crate::undo_history::UndoHistory;

/// Everything undo can touch.
#[derive(Debug)]
struct DocumentCore {
    text: TextBuffer,
    line_data: LineDataStore,
    views: BTreeMap<ViewId, Selection>,
    /// Lines dirtied since listeners last got `changes_ended`.
    dirty: DirtyLines,
}

impl ChangeTarget for DocumentCore {
    fn replace_text(&mut self, offset: usize, len: usize, text: Vec<char>) -> Vec<char> {
        let new_len = text.len();
        let (old, change) = self.text.replace(offset, len, text);
        for selection in self.views.values_mut() {
            selection.adjust_for_edit(offset, old.len(), new_len);
        }
        self.dirty.merge(DirtyLines::for_replacement(
            change.line,
            change.removed_line_count,
            change.new_line_count(),
        ));
        old
    }

    fn replace_line_slots(&mut self, line: usize, len: usize, slots: Vec<LineSlot>) -> Vec<LineSlot> {
        self.line_data.replace_slots(line, len, slots)
    }

    fn swap_line_field(
        &mut self,
        line: usize,
        field: usize,
        payload: Option<Box<dyn LineData>>,
    ) -> Option<Box<dyn LineData>> {
        self.line_data.swap_field(line, field, payload)
    }

    fn restore_selection(&mut self, view: ViewId, selection: &Selection) {
        let len = self.text.len();
        if let Some(current) = self.views.get_mut(&view) {
            *current = selection.clone();
            current.clamp(len);
        }
    }
}

/// A text document with multiple views and shared undo.
#[derive(Debug)]
pub struct Document {
    core: DocumentCore,
    undo: UndoHistory,
    config: DocumentConfig,
    next_view: u32,
    /// Selections as they were when the outermost open group first touched
    /// them.
    selections_before: BTreeMap<ViewId, Selection>,
    /// Number of live [`ChangeBatch`] guards.
    batch_depth: usize,
}

impl Document {
    /// Creates an empty document with the default configuration.
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    pub fn with_config(config: DocumentConfig) -> Self {
        Self {
            core: DocumentCore {
                text: TextBuffer::with_gap(config.initial_gap, config.gap_growth),
                line_data: LineDataStore::new(1, config.fields_per_line),
                views: BTreeMap::new(),
                dirty: DirtyLines::None,
            },
            undo: UndoHistory::with_limit(config.undo_limit),
            config,
            next_view: 1,
            selections_before: BTreeMap::new(),
            batch_depth: 0,
        }
    }

    /// Creates a document holding `content`, with an empty undo history.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Self {
        let mut doc = Self::new();
        doc.begin_raw_append();
        doc.raw_append(content);
        doc.end_raw_append();
        doc
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Registers a collaborator for change notifications.
    pub fn add_listener(&mut self, listener: Box<dyn TextChangeListener>) {
        self.core.text.add_listener(listener);
    }

    // ==================== Read API ====================

    pub fn len(&self) -> usize {
        self.core.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.text.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.core.text.line_count()
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.core.text.char_at(offset)
    }

    /// Returns `len` characters starting at `offset`.
    pub fn text_part(&self, offset: usize, len: usize) -> String {
        self.core.text.text_part(offset, len)
    }

    /// Returns the whole text.
    pub fn text(&self) -> String {
        self.core.text.content()
    }

    pub fn line_from_offset(&self, offset: usize) -> usize {
        self.core.text.line_from_offset(offset)
    }

    /// Start offset of `line`; `line_count()` maps to `len()`.
    pub fn offset_from_line(&self, line: usize) -> usize {
        self.core.text.offset_from_line(line)
    }

    pub fn column_from_offset_and_line(&self, offset: usize, line: usize) -> usize {
        self.core.text.column_from_offset_and_line(offset, line)
    }

    /// Content of `line` without its line break.
    pub fn line_content(&self, line: usize) -> String {
        self.core.text.line_content(line)
    }

    pub fn line_len(&self, line: usize) -> usize {
        self.core.text.line_len(line)
    }

    pub fn position_from_offset(&self, offset: usize) -> Position {
        self.core.text.position_from_offset(offset)
    }

    pub fn offset_from_position(&self, position: Position) -> usize {
        self.core.text.offset_from_position(position)
    }

    /// The grapheme boundary before `offset`. A line break is one step.
    pub fn grapheme_boundary_before(&self, offset: usize) -> usize {
        let offset = offset.min(self.len());
        if offset == 0 {
            return 0;
        }
        let line = self.line_from_offset(offset);
        let start = self.offset_from_line(line);
        if offset == start {
            return offset - 1;
        }
        start + grapheme::boundary_before(&self.core.text.line_chars(line), offset - start)
    }

    /// The grapheme boundary after `offset`. A line break is one step.
    pub fn grapheme_boundary_after(&self, offset: usize) -> usize {
        if offset >= self.len() {
            return self.len();
        }
        let line = self.line_from_offset(offset);
        let start = self.offset_from_line(line);
        let col = offset - start;
        if col >= self.line_len(line) {
            return offset + 1;
        }
        start + grapheme::boundary_after(&self.core.text.line_chars(line), col)
    }

    // ==================== Mutation ====================

    /// Replaces `len` characters at `offset` with `text`.
    ///
    /// `len` is clamped to the text after `offset`. The edit is one undo step
    /// unless `coalesce_id` merges it into the previous one (or a group is
    /// open). Returns the lines the edit dirtied.
    pub fn replace(&mut self, offset: usize, len: usize, text: &str, coalesce_id: CoalesceId) -> DirtyLines {
        debug_assert!(offset <= self.len(), "offset {} beyond length {}", offset, self.len());
        self.begin_group(true);
        let dirty = self.replace_recorded(offset, len, text.chars().collect());
        self.end_group(coalesce_id, true);
        self.flush_notifications();
        dirty
    }

    /// Appends `text` at the end of the document.
    pub fn append(&mut self, text: &str, coalesce_id: CoalesceId) -> DirtyLines {
        self.replace(self.len(), 0, text, coalesce_id)
    }

    /// Replaces the whole text (as one undoable step).
    pub fn set_text(&mut self, text: &str) -> DirtyLines {
        self.replace(0, self.len(), text, CoalesceId::None)
    }

    /// Replaces every range of `view`'s selection with `text` as one undo
    /// step, leaving a caret after each insertion.
    pub fn replace_selection(&mut self, view: ViewId, text: &str, coalesce_id: CoalesceId) -> DirtyLines {
        // The view's ranges are replaced by carets at the end, so they are
        // kept out of the per-edit mapping
        let Some(selection) = self.core.views.remove(&view) else {
            debug_assert!(false, "unknown view {:?}", view);
            return DirtyLines::None;
        };
        let text: Vec<char> = text.chars().collect();

        self.begin_group(true);
        self.selections_before
            .entry(view)
            .or_insert_with(|| selection.clone());

        // Front to back, so every record lands after the group's earlier ones
        let mut dirty = DirtyLines::None;
        let mut shift: isize = 0;
        let mut carets = Vec::with_capacity(selection.ranges().len());
        for range in selection.ranges() {
            let start = range.start().wrapping_add_signed(shift);
            dirty.merge(self.replace_recorded(start, range.len(), text.clone()));
            shift += text.len() as isize - range.len() as isize;
            carets.push(TextRange::cursor(start + text.len()));
        }

        let mut carets = Selection::new(carets);
        carets.clamp(self.len());
        self.core.views.insert(view, carets);

        self.end_group(coalesce_id, true);
        self.flush_notifications();
        dirty
    }

    /// Executes one text replacement and records it in the open group.
    fn replace_recorded(&mut self, offset: usize, len: usize, text: Vec<char>) -> DirtyLines {
        let len = len.min(self.len() - offset);
        self.snapshot_selections();

        let line = self.core.text.line_from_offset(offset);
        let removed_lines = self
            .core
            .text
            .chars_in(offset, len)
            .iter()
            .filter(|&&c| c == '\n')
            .count();
        let added_lines = text.iter().filter(|&&c| c == '\n').count();

        let mut change = TextChange::new(offset, len, text);
        change.apply(|offset, len, text| self.core.replace_text(offset, len, text));
        self.undo.give_change(Change::Text(change));

        if removed_lines > 0 || added_lines > 0 {
            // Lines after the edited one are the ones that come and go
            let mut slots = LineDataListChange::new(line + 1, removed_lines, empty_slots(added_lines));
            slots.apply(|line, len, slots| self.core.replace_line_slots(line, len, slots));
            self.undo
                .give_change(Change::LineData(LineDataChange::Slots(slots)));
        }

        DirtyLines::for_replacement(line, removed_lines, added_lines)
    }

    // ==================== Raw append ====================
    // Chunk: docs/chunks/raw_append - Bulk loading without per-edit bookkeeping

    /// Starts bulk loading. Appended text is not recorded for undo and
    /// listeners hear about it once, at [`Document::end_raw_append`].
    pub fn begin_raw_append(&mut self) {
        debug_assert!(!self.undo.is_group_open(), "raw append inside an undo group");
        self.core.text.begin_raw_append();
    }

    pub fn raw_append(&mut self, text: &str) {
        self.core.text.raw_append(text);
    }

    /// Ends bulk loading and notifies listeners of everything appended.
    pub fn end_raw_append(&mut self) -> DirtyLines {
        let Some(change) = self.core.text.end_raw_append() else {
            return DirtyLines::None;
        };
        let added = change.new_line_count();
        if added > 0 {
            self.core.line_data.replace_slots(change.line + 1, 0, empty_slots(added));
        }
        debug!(chars = change.new_len, lines = added, "raw append finished");

        let dirty = DirtyLines::for_replacement(change.line, 0, added);
        self.core.dirty.merge(dirty.clone());
        self.flush_notifications();
        dirty
    }

    // ==================== Views ====================

    /// Adds a view with a caret at offset 0.
    pub fn register_view(&mut self) -> ViewId {
        let view = ViewId(self.next_view);
        self.next_view += 1;
        self.core.views.insert(view, Selection::default());
        self.undo.register_view(view);
        trace!(view = view.raw(), "registered view");
        view
    }

    /// Removes a view. The undo history keeps its groups.
    pub fn unregister_view(&mut self, view: ViewId) {
        self.core.views.remove(&view);
        self.undo.unregister_view(view);
    }

    pub fn selection(&self, view: ViewId) -> Option<&Selection> {
        self.core.views.get(&view)
    }

    /// Registered views, in registration order.
    pub fn views(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.core.views.keys().copied()
    }

    /// Moves `view`'s selection. The move is an undo step of that view alone.
    pub fn change_selection(&mut self, view: ViewId, selection: Selection, coalesce_id: CoalesceId) {
        self.begin_group(true);
        self.set_selection_recorded(view, selection);
        self.end_group(coalesce_id, true);
    }

    /// Moves `view`'s selection inside the open group.
    fn set_selection_recorded(&mut self, view: ViewId, mut selection: Selection) {
        selection.clamp(self.len());
        let Some(current) = self.core.views.get_mut(&view) else {
            debug_assert!(false, "unknown view {:?}", view);
            return;
        };
        let before = std::mem::replace(current, selection);
        self.selections_before.entry(view).or_insert(before);
    }

    /// Remembers the selection of every view not yet touched by the open
    /// group.
    fn snapshot_selections(&mut self) {
        for (view, selection) in &self.core.views {
            self.selections_before
                .entry(*view)
                .or_insert_with(|| selection.clone());
        }
    }

    /// Hands the open group one selection change per snapshotted view that
    /// is still registered.
    fn record_selection_moves(&mut self) {
        for (view, before) in std::mem::take(&mut self.selections_before) {
            if let Some(after) = self.core.views.get(&view) {
                let change = SelectionChange::new(view, before, after.clone());
                self.undo.give_change(Change::Selection(change));
            }
        }
    }

    // ==================== Undo ====================

    /// Opens an undo group; empty groups are dropped when closed.
    pub fn begin_undo_group(&mut self) {
        self.begin_group(true);
    }

    /// Opens an undo group that is kept even if it ends up empty.
    pub fn begin_undo_group_kept(&mut self) {
        self.begin_group(false);
    }

    pub fn end_undo_group(&mut self, coalesce_id: CoalesceId, flatten: bool) {
        self.end_group(coalesce_id, flatten);
    }

    fn begin_group(&mut self, discardable: bool) {
        self.undo.begin_group(discardable);
    }

    /// Closing the outermost group records the selection moves first.
    fn end_group(&mut self, coalesce_id: CoalesceId, flatten: bool) {
        if self.undo.group_depth() == 1 {
            self.record_selection_moves();
        }
        self.undo.end_group(coalesce_id, flatten);
    }

    /// Undoes one step for `view` (or the whole document when `None`).
    /// With `soft` set, a view's own selection steps are undone one by one.
    pub fn undo(&mut self, view: Option<ViewId>, soft: bool) -> bool {
        let undone = self.undo.undo(view, soft, &mut self.core);
        self.flush_notifications();
        undone
    }

    pub fn redo(&mut self, view: Option<ViewId>, soft: bool) -> bool {
        let redone = self.undo.redo(view, soft, &mut self.core);
        self.flush_notifications();
        redone
    }

    pub fn can_undo(&self, view: Option<ViewId>) -> bool {
        self.undo.can_undo(view)
    }

    pub fn can_redo(&self, view: Option<ViewId>) -> bool {
        self.undo.can_redo(view)
    }

    /// True when the text matches the last [`Document::set_persisted`] state.
    pub fn is_persisted(&self) -> bool {
        self.undo.is_persisted()
    }

    pub fn set_persisted(&mut self) {
        self.undo.set_persisted();
    }

    pub fn clear_undo_history(&mut self) {
        self.undo.clear();
    }

    /// Number of undo steps in the shared history.
    pub fn undo_entry_count(&self) -> usize {
        self.undo.len()
    }

    pub fn undo_history(&self) -> &UndoHistory {
        &self.undo
    }

    // ==================== Side channel ====================

    pub fn fields_per_line(&self) -> usize {
        self.core.line_data.fields_per_line()
    }

    /// Changes the number of side-channel fields per line.
    ///
    /// Drops every payload and the whole undo history, which may hold
    /// payloads laid out for the old field count.
    pub fn set_fields_per_line(&mut self, count: usize) {
        debug!(count, "resetting line data fields");
        self.core.line_data.set_fields_per_line(count);
        self.config.fields_per_line = count;
        self.undo.clear();
    }

    /// Stores `data` in `field` of `line`.
    ///
    /// Inside an open undo group the store is recorded, so undo restores the
    /// previous payload; outside a group it is a plain cache update.
    pub fn give_line_data(&mut self, line: usize, field: usize, data: Box<dyn LineData>) {
        self.put_line_data(line, field, Some(data));
    }

    /// Removes the payload of `field` of `line`.
    pub fn clear_line_data(&mut self, line: usize, field: usize) {
        self.put_line_data(line, field, None);
    }

    fn put_line_data(&mut self, line: usize, field: usize, data: Option<Box<dyn LineData>>) {
        debug_assert!(line < self.line_count(), "line {} beyond {}", line, self.line_count());
        if self.undo.is_group_open() {
            let mut change = LineDataChange::Field(LineFieldChange::new(line, field, data));
            change.execute(&mut self.core);
            self.undo.give_change(Change::LineData(change));
        } else {
            self.core.line_data.swap_field(line, field, data);
        }
    }

    pub fn line_data(&self, line: usize, field: usize) -> Option<&dyn LineData> {
        self.core.line_data.get(line, field)
    }

    /// The payload of `field` of `line` if it is a `T`.
    pub fn line_data_as<T: 'static>(&self, line: usize, field: usize) -> Option<&T> {
        self.core.line_data.get_as::<T>(line, field)
    }

    /// Number of side-channel slots (always `line_count()`).
    pub fn line_data_len(&self) -> usize {
        self.core.line_data.len()
    }

    // ==================== Batches ====================

    /// Starts a batch of edits that form one undo step.
    ///
    /// Listeners get `changes_ended` once, when the returned guard drops,
    /// with the union of the dirtied lines.
    pub fn begin_changes(&mut self, coalesce_id: CoalesceId) -> ChangeBatch<'_> {
        self.batch_depth += 1;
        self.begin_group(true);
        ChangeBatch {
            doc: self,
            coalesce_id,
        }
    }

    fn flush_notifications(&mut self) {
        if self.batch_depth > 0 {
            return;
        }
        let dirty = std::mem::replace(&mut self.core.dirty, DirtyLines::None);
        if !dirty.is_none() {
            self.core.text.notify_changes_ended(&dirty);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Scope guard of [`Document::begin_changes`].
///
/// Derefs to the document. Dropping it (on any exit path) closes the undo
/// group and delivers the batch's `changes_ended` notification.
pub struct ChangeBatch<'a> {
    doc: &'a mut Document,
    coalesce_id: CoalesceId,
}

impl Deref for ChangeBatch<'_> {
    type Target = Document;

    fn deref(&self) -> &Document {
        &*self.doc
    }
}

impl DerefMut for ChangeBatch<'_> {
    fn deref_mut(&mut self) -> &mut Document {
        &mut *self.doc
    }
}

impl Drop for ChangeBatch<'_> {
    fn drop(&mut self) {
        self.doc.end_group(self.coalesce_id, true);
        self.doc.batch_depth -= 1;
        self.doc.flush_notifications();
    }
}
