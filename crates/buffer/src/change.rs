// Chunk: docs/chunks/undo_history - Coalescing change groups and shared multi-view undo
// Chunk: docs/chunks/change_merge - Exact merge algebra for touching replacements

//! Revertible changes.
//!
//! Every mutation of a document is described by a [`Change`]: a text
//! replacement, a side-channel edit, a selection move or a nested group.
//! Changes execute and revert against a [`ChangeTarget`], which the document
//! implements; the change itself never holds a reference into the document.
//!
//! # Replace records
//!
//! [`ReplaceRecord`] is the atomic replacement used for both characters
//! ([`TextChange`]) and line slots ([`LineDataListChange`]). It stores only the
//! content that is *not* currently in the store: the replacement before it is
//! executed and the replaced content afterwards. Executing and reverting are
//! therefore the same swap, and the `executed` flag tells which side is which.
//!
//! Two executed records where the second ran right after the first merge into
//! one equivalent record when they touch or overlap. The merged record keeps
//! the exact content needed to revert both, which is what lets an undo group
//! collapse a burst of keystrokes into a single replacement.

use crate::change_group::ChangeGroup;
use crate::line_data::{LineData, LineSlot};
use crate::selection::Selection;
use crate::types::ViewId;

/// Receiver of executed and reverted changes.
pub trait ChangeTarget {
    /// Replaces `len` characters at `offset`, returning the removed ones.
    fn replace_text(&mut self, offset: usize, len: usize, text: Vec<char>) -> Vec<char>;

    /// Replaces `len` line slots at `line`, returning the removed ones.
    fn replace_line_slots(&mut self, line: usize, len: usize, slots: Vec<LineSlot>) -> Vec<LineSlot>;

    /// Stores `payload` in one line field, returning the previous payload.
    fn swap_line_field(
        &mut self,
        line: usize,
        field: usize,
        payload: Option<Box<dyn LineData>>,
    ) -> Option<Box<dyn LineData>>;

    /// Puts a view's selection back to a recorded state.
    fn restore_selection(&mut self, view: ViewId, selection: &Selection);
}

// ==================== Replace records ====================

/// Replacement of a span of a sequence store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceRecord<T> {
    offset: usize,
    /// Length of the span this record currently occupies in the store.
    doc_len: usize,
    /// The content not in the store: new content while unexecuted, the
    /// replaced content once executed.
    stored: Vec<T>,
    executed: bool,
}

/// A replacement of characters.
pub type TextChange = ReplaceRecord<char>;

/// A replacement of line slots in the side channel.
pub type LineDataListChange = ReplaceRecord<LineSlot>;

impl<T> ReplaceRecord<T> {
    /// A record that will replace `len` items at `offset` with `content`.
    pub fn new(offset: usize, len: usize, content: Vec<T>) -> Self {
        Self {
            offset,
            doc_len: len,
            stored: content,
            executed: false,
        }
    }

    /// A record describing a replacement that already happened: `new_len`
    /// items now sit at `offset` where `old` used to be.
    pub fn executed(offset: usize, new_len: usize, old: Vec<T>) -> Self {
        Self {
            offset,
            doc_len: new_len,
            stored: old,
            executed: true,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Length of the content before the replacement.
    pub fn old_len(&self) -> usize {
        if self.executed {
            self.stored.len()
        } else {
            self.doc_len
        }
    }

    /// Length of the content after the replacement.
    pub fn new_len(&self) -> usize {
        if self.executed {
            self.doc_len
        } else {
            self.stored.len()
        }
    }

    pub fn old_end(&self) -> usize {
        self.offset + self.old_len()
    }

    pub fn new_end(&self) -> usize {
        self.offset + self.new_len()
    }

    /// Net length change.
    pub fn delta(&self) -> isize {
        self.new_len() as isize - self.old_len() as isize
    }

    /// The replaced content (known once executed).
    pub fn old_content(&self) -> Option<&[T]> {
        self.executed.then_some(self.stored.as_slice())
    }

    /// The replacement content (known while unexecuted).
    pub fn new_content(&self) -> Option<&[T]> {
        (!self.executed).then_some(self.stored.as_slice())
    }

    /// True when the record neither removes nor inserts anything.
    pub fn is_noop(&self) -> bool {
        self.old_len() == 0 && self.new_len() == 0
    }

    /// Moves the record by `delta` positions.
    pub(crate) fn shift(&mut self, delta: isize) {
        self.offset = self.offset.wrapping_add_signed(delta);
    }

    /// Executes or reverts the record through `replace`, which receives the
    /// offset, the length of the span to remove and the content to insert and
    /// returns the removed content.
    pub fn apply<F>(&mut self, replace: F)
    where
        F: FnOnce(usize, usize, Vec<T>) -> Vec<T>,
    {
        let content = std::mem::take(&mut self.stored);
        let content_len = content.len();
        self.stored = replace(self.offset, self.doc_len, content);
        debug_assert_eq!(
            self.stored.len(),
            self.doc_len,
            "store removed {} items, record expected {}",
            self.stored.len(),
            self.doc_len
        );
        self.doc_len = content_len;
        self.executed = !self.executed;
    }

    /// Executes or reverts the record against a plain vector.
    pub fn apply_to(&mut self, items: &mut Vec<T>) {
        self.apply(|offset, len, content| items.splice(offset..offset + len, content).collect());
    }

    /// True when `later` starts where this record's new content ends, or
    /// ends where this record starts.
    pub fn touches(&self, later: &Self) -> bool {
        later.offset == self.new_end() || later.old_end() == self.offset
    }

    /// True when `later`'s removed span intersects this record's new content.
    pub fn overlaps(&self, later: &Self) -> bool {
        later.offset < self.new_end() && self.offset < later.old_end()
    }

    pub fn touches_or_overlaps(&self, later: &Self) -> bool {
        later.offset <= self.new_end() && self.offset <= later.old_end()
    }

    /// Merges `later`, executed right after `self`, into `self`.
    ///
    /// Afterwards `self` is the single replacement equivalent to both. When
    /// the records neither touch nor overlap `later` is handed back unchanged.
    pub fn merge(&mut self, later: Self) -> Result<(), Self> {
        debug_assert!(
            self.executed && later.executed,
            "only executed records can be merged"
        );
        if !self.touches_or_overlaps(&later) {
            return Err(later);
        }
        let first = std::mem::replace(self, Self::executed(0, 0, Vec::new()));
        *self = Self::merge_run(vec![first], later);
        Ok(())
    }

    /// Merges `later` with every record of `run`.
    ///
    /// `run` holds executed, disjoint records sorted by offset, all touched by
    /// `later`, which was executed after them. Between two records of the run
    /// `later` must cover the untouched text, which holds whenever it touches
    /// the first and the last one.
    pub(crate) fn merge_run(run: Vec<Self>, later: Self) -> Self {
        debug_assert!(!run.is_empty(), "merge_run needs at least one record");
        debug_assert!(later.executed, "only executed records can be merged");

        let first_offset = run.first().map_or(later.offset, |r| r.offset);
        let last_new_end = run.last().map_or(later.old_end(), |r| r.new_end());
        let offset = first_offset.min(later.offset);
        let new_end = if last_new_end > later.old_end() {
            last_new_end - later.old_len() + later.new_len()
        } else {
            later.new_end()
        };

        // Walk the span as it was between the run and `later`: where a record
        // inserted content, its own old content is the original; everywhere
        // else the original is what `later` removed.
        let mut later_old = later.stored.into_iter();
        let mut pos = later.offset;
        let mut old = Vec::new();
        for record in run {
            debug_assert!(record.executed, "only executed records can be merged");
            if pos < record.offset {
                old.extend(later_old.by_ref().take(record.offset - pos));
                pos = record.offset;
            }
            let record_end = record.offset + record.doc_len;
            if pos < record_end {
                // Inserted by the run and removed again by `later`
                later_old.by_ref().take(record_end - pos).for_each(drop);
                pos = record_end;
            }
            old.extend(record.stored);
        }
        old.extend(later_old);

        Self {
            offset,
            doc_len: new_end - offset,
            stored: old,
            executed: true,
        }
    }
}

// ==================== Side-channel changes ====================

/// Swap of the payload stored in one field of one line.
#[derive(Debug)]
pub struct LineFieldChange {
    line: usize,
    field: usize,
    payload: Option<Box<dyn LineData>>,
    executed: bool,
}

impl LineFieldChange {
    /// A change that will store `payload` in `field` of `line`.
    pub fn new(line: usize, field: usize, payload: Option<Box<dyn LineData>>) -> Self {
        Self {
            line,
            field,
            payload,
            executed: false,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn field(&self) -> usize {
        self.field
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    fn swap(&mut self, target: &mut dyn ChangeTarget) {
        let payload = self.payload.take();
        self.payload = target.swap_line_field(self.line, self.field, payload);
        self.executed = !self.executed;
    }
}

/// An edit of the side channel.
#[derive(Debug)]
pub enum LineDataChange {
    /// Line slots inserted or removed alongside a text edit.
    Slots(LineDataListChange),
    /// One payload replaced.
    Field(LineFieldChange),
}

impl LineDataChange {
    pub fn is_executed(&self) -> bool {
        match self {
            LineDataChange::Slots(change) => change.is_executed(),
            LineDataChange::Field(change) => change.is_executed(),
        }
    }

    pub fn execute(&mut self, target: &mut dyn ChangeTarget) {
        if self.is_executed() {
            return;
        }
        self.swap(target);
    }

    pub fn revert(&mut self, target: &mut dyn ChangeTarget) {
        if !self.is_executed() {
            return;
        }
        self.swap(target);
    }

    fn swap(&mut self, target: &mut dyn ChangeTarget) {
        match self {
            LineDataChange::Slots(change) => {
                change.apply(|line, len, slots| target.replace_line_slots(line, len, slots))
            }
            LineDataChange::Field(change) => change.swap(target),
        }
    }
}

// ==================== Selection changes ====================

/// A view's selection before and after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    pub view: ViewId,
    pub before: Selection,
    pub after: Selection,
}

impl SelectionChange {
    pub fn new(view: ViewId, before: Selection, after: Selection) -> Self {
        Self { view, before, after }
    }

    /// True when the selection actually moved.
    pub fn is_move(&self) -> bool {
        self.before != self.after
    }
}

// ==================== Change ====================

/// Every kind of revertible change.
#[derive(Debug)]
pub enum Change {
    Text(TextChange),
    LineData(LineDataChange),
    Selection(SelectionChange),
    Group(ChangeGroup),
}

impl Change {
    /// Applies the change to `target`. Already executed changes are left alone.
    pub fn execute(&mut self, target: &mut dyn ChangeTarget) {
        match self {
            Change::Text(change) => {
                if !change.is_executed() {
                    change.apply(|offset, len, text| target.replace_text(offset, len, text));
                }
            }
            Change::LineData(change) => change.execute(target),
            Change::Selection(change) => target.restore_selection(change.view, &change.after),
            Change::Group(group) => group.execute(target),
        }
    }

    /// Undoes the change on `target`. Changes that are not executed are left
    /// alone.
    pub fn revert(&mut self, target: &mut dyn ChangeTarget) {
        match self {
            Change::Text(change) => {
                if change.is_executed() {
                    change.apply(|offset, len, text| target.replace_text(offset, len, text));
                }
            }
            Change::LineData(change) => change.revert(target),
            Change::Selection(change) => target.restore_selection(change.view, &change.before),
            Change::Group(group) => group.revert(target),
        }
    }
}

impl From<TextChange> for Change {
    fn from(change: TextChange) -> Self {
        Change::Text(change)
    }
}

impl From<LineDataChange> for Change {
    fn from(change: LineDataChange) -> Self {
        Change::LineData(change)
    }
}

impl From<SelectionChange> for Change {
    fn from(change: SelectionChange) -> Self {
        Change::Selection(change)
    }
}

impl From<ChangeGroup> for Change {
    fn from(group: ChangeGroup) -> Self {
        Change::Group(group)
    }
}
