// Chunk: docs/chunks/undo_history - Coalescing change groups and shared multi-view undo

//! One undo step.
//!
//! A [`ChangeGroup`] collects every change made while it was open and undoes
//! or redoes them as a unit. Text records given to a group are compressed as
//! they arrive: a record that touches or overlaps earlier ones is merged with
//! them (see [`ReplaceRecord::merge`]), so typing a word produces a single
//! replacement instead of one per keystroke.
//!
//! Layout of a group:
//!
//! - `entries`: the frozen part, in chronological order. It ends with the last
//!   nested group kept as a barrier (`push_nested`); nothing merges across it.
//! - `text`: text records given after the barrier, sorted by offset and never
//!   touching each other, in the coordinates of the fully applied group. In
//!   that shape they can be reverted from the highest offset down and
//!   re-executed from the lowest offset up.
//! - `lines`: side-channel records given after the barrier, in chronological
//!   order. A slot record only merges with the slot record right before it.
//! - `selections`: one before/after pair per view. Intermediate selections are
//!   not undo steps, so the first `before` and the latest `after` win.
//!
//! Text and side-channel records live in different stores, so reverting the
//! two lanes independently is exact.

use std::collections::VecDeque;

use crate::change::{Change, ChangeTarget, LineDataChange, SelectionChange, TextChange};
use crate::types::ViewId;

/// Which indices of the undo history a group moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeScope {
    /// Changes the document; every view steps over it together.
    Document,
    /// Only moved the selection of one view.
    View(ViewId),
}

#[derive(Debug)]
pub struct ChangeGroup {
    entries: Vec<Change>,
    text: Vec<TextChange>,
    lines: Vec<LineDataChange>,
    selections: Vec<SelectionChange>,
    discardable: bool,
}

impl ChangeGroup {
    /// Creates an empty group. Discardable groups are dropped when they end
    /// up empty.
    pub fn new(discardable: bool) -> Self {
        Self {
            entries: Vec::new(),
            text: Vec::new(),
            lines: Vec::new(),
            selections: Vec::new(),
            discardable,
        }
    }

    pub fn is_discardable(&self) -> bool {
        self.discardable
    }

    /// True when the group neither changes anything nor moves a selection.
    pub fn is_empty(&self) -> bool {
        !self.has_records() && !self.selections.iter().any(SelectionChange::is_move)
    }

    /// True when the group holds text or side-channel records.
    pub fn has_records(&self) -> bool {
        !self.entries.is_empty() || !self.text.is_empty() || !self.lines.is_empty()
    }

    /// Number of stored changes (frozen entries plus both lanes).
    pub fn change_count(&self) -> usize {
        self.entries.len() + self.text.len() + self.lines.len()
    }

    /// Text records after the last barrier, sorted by offset.
    pub fn text_changes(&self) -> &[TextChange] {
        &self.text
    }

    pub fn selections(&self) -> &[SelectionChange] {
        &self.selections
    }

    /// The recorded selection change of `view`, if any.
    pub fn selection(&self, view: ViewId) -> Option<&SelectionChange> {
        self.selections.iter().find(|s| s.view == view)
    }

    pub fn scope(&self) -> ChangeScope {
        if self.has_records() {
            return ChangeScope::Document;
        }
        let mut moved = self.selections.iter().filter(|s| s.is_move());
        match (moved.next(), moved.next()) {
            (Some(only), None) => ChangeScope::View(only.view),
            _ => ChangeScope::Document,
        }
    }

    // ==================== Composition ====================

    /// Adds an executed change to the group.
    pub fn give_change(&mut self, change: Change) {
        match change {
            Change::Text(change) => self.give_text(change),
            Change::LineData(change) => self.give_line_data(change),
            Change::Selection(change) => self.give_selection(change),
            Change::Group(group) => self.absorb(group),
        }
    }

    fn give_text(&mut self, change: TextChange) {
        debug_assert!(change.is_executed(), "groups only hold executed text changes");
        if change.is_noop() {
            return;
        }

        // The records touched by `change` form one contiguous run
        let start = self.text.partition_point(|r| r.new_end() < change.offset());
        let end = start
            + self.text[start..]
                .iter()
                .take_while(|r| r.offset() <= change.old_end())
                .count();
        let delta = change.delta();

        let merged = if start == end {
            Some(change)
        } else {
            let run: Vec<TextChange> = self.text.drain(start..end).collect();
            let merged = TextChange::merge_run(run, change);
            (!merged.is_noop()).then_some(merged)
        };

        for record in &mut self.text[start..] {
            record.shift(delta);
        }
        if let Some(merged) = merged {
            self.text.insert(start, merged);
        }
    }

    fn give_line_data(&mut self, change: LineDataChange) {
        debug_assert!(change.is_executed(), "groups only hold executed line data changes");
        let change = match change {
            LineDataChange::Slots(record) => {
                if record.is_noop() {
                    return;
                }
                match self.lines.last_mut() {
                    Some(LineDataChange::Slots(last)) => match last.merge(record) {
                        Ok(()) => {
                            if last.is_noop() {
                                self.lines.pop();
                            }
                            return;
                        }
                        Err(record) => LineDataChange::Slots(record),
                    },
                    _ => LineDataChange::Slots(record),
                }
            }
            field => field,
        };
        self.lines.push(change);
    }

    fn give_selection(&mut self, change: SelectionChange) {
        match self.selections.iter_mut().find(|s| s.view == change.view) {
            Some(existing) => existing.after = change.after,
            None => self.selections.push(change),
        }
    }

    /// Moves every change of `group` into this group, unwrapping its nested
    /// groups, and compresses them with the changes already here.
    pub fn absorb(&mut self, mut group: ChangeGroup) {
        let queue: VecDeque<Change> = group.take_changes().into();
        self.give_all(queue);
    }

    /// Keeps `child` as a nested group. Nothing given later merges with the
    /// records given before.
    pub fn push_nested(&mut self, mut child: ChangeGroup) {
        self.freeze_region();
        for selection in std::mem::take(&mut child.selections) {
            self.give_selection(selection);
        }
        self.entries.push(Change::Group(child));
    }

    /// Merges `child` into the last kept nested group, handing it back when
    /// there is none or changes were given after it.
    pub fn absorb_into_last_nested(&mut self, mut child: ChangeGroup) -> Result<(), ChangeGroup> {
        if self.last_nested_mut().is_none() {
            return Err(child);
        }
        for selection in std::mem::take(&mut child.selections) {
            self.give_selection(selection);
        }
        if let Some(last) = self.last_nested_mut() {
            last.absorb(child);
        }
        Ok(())
    }

    /// The last kept nested group, when nothing was given after it.
    pub fn last_nested_mut(&mut self) -> Option<&mut ChangeGroup> {
        if !self.text.is_empty() || !self.lines.is_empty() {
            return None;
        }
        match self.entries.last_mut() {
            Some(Change::Group(group)) => Some(group),
            _ => None,
        }
    }

    /// Unwraps every nested group, top-down, and compresses the result.
    pub fn flatten(&mut self) {
        let selections = std::mem::take(&mut self.selections);
        let queue: VecDeque<Change> = self.take_changes().into();
        self.selections = selections;
        self.give_all(queue);
    }

    fn give_all(&mut self, mut queue: VecDeque<Change>) {
        while let Some(change) = queue.pop_front() {
            match change {
                Change::Group(mut group) => {
                    for child in group.take_changes().into_iter().rev() {
                        queue.push_front(child);
                    }
                }
                change => self.give_change(change),
            }
        }
    }

    fn freeze_region(&mut self) {
        self.entries.extend(self.text.drain(..).map(Change::Text));
        self.entries.extend(self.lines.drain(..).map(Change::LineData));
    }

    /// Takes every change out of the group in an order that replays it:
    /// frozen entries, the text lane ascending, the side-channel lane, then
    /// the selection changes.
    fn take_changes(&mut self) -> Vec<Change> {
        self.freeze_region();
        let mut changes = std::mem::take(&mut self.entries);
        changes.extend(self.selections.drain(..).map(Change::Selection));
        changes
    }

    // ==================== Execution ====================

    /// Re-applies the group and restores the selections it ended with.
    pub fn execute(&mut self, target: &mut dyn ChangeTarget) {
        for entry in &mut self.entries {
            entry.execute(target);
        }
        for record in &mut self.text {
            if !record.is_executed() {
                record.apply(|offset, len, text| target.replace_text(offset, len, text));
            }
        }
        for record in &mut self.lines {
            record.execute(target);
        }
        for selection in &self.selections {
            target.restore_selection(selection.view, &selection.after);
        }
    }

    /// Undoes the group and restores the selections it started with.
    pub fn revert(&mut self, target: &mut dyn ChangeTarget) {
        for record in self.lines.iter_mut().rev() {
            record.revert(target);
        }
        for record in self.text.iter_mut().rev() {
            if record.is_executed() {
                record.apply(|offset, len, text| target.replace_text(offset, len, text));
            }
        }
        for entry in self.entries.iter_mut().rev() {
            entry.revert(target);
        }
        for selection in &self.selections {
            target.restore_selection(selection.view, &selection.before);
        }
    }
}

impl Default for ChangeGroup {
    fn default() -> Self {
        Self::new(true)
    }
}
