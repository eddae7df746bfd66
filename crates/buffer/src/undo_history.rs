// Chunk: docs/chunks/undo_history - Coalescing change groups and shared multi-view undo

//! Shared undo history with per-view positions.
//!
//! All views of a document share one list of closed [`ChangeGroup`]s. The
//! history tracks a document index plus one index per view:
//!
//! - A group that changed the document (text or line data, or several views'
//!   selections) has [`ChangeScope::Document`]. It is applied iff its position
//!   is below the document index, and every view steps over it together.
//! - A group that only moved one view's selection has [`ChangeScope::View`].
//!   It is applied iff its position is below that view's index and only that
//!   view sees it.
//!
//! Invariants (checked in debug builds after every operation):
//!
//! - every view index is at most the document index;
//! - no document group sits between a view index and the document index, so
//!   the only groups a view can have "soft undone" are its own view groups.
//!
//! Soft undo/redo steps a single view through its own view groups. Hard
//! undo/redo (or a soft request that reaches a document group) moves every
//! index over the nearest document group, reverting or re-applying whatever
//! view groups lie in between.

use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use crate::change::{Change, ChangeTarget};
use crate::change_group::{ChangeGroup, ChangeScope};
use crate::types::{CoalesceId, ViewId};

#[derive(Debug)]
struct HistoryEntry {
    group: ChangeGroup,
    scope: ChangeScope,
    coalesce_id: CoalesceId,
}

/// A group that has been begun but not ended.
#[derive(Debug)]
struct OpenGroup {
    group: ChangeGroup,
    /// Coalesce id of the last nested group kept inside `group`.
    last_child_coalesce: Option<CoalesceId>,
}

#[derive(Debug)]
pub struct UndoHistory {
    entries: Vec<HistoryEntry>,
    doc_index: usize,
    view_indices: BTreeMap<ViewId, usize>,
    /// Document index at the last save, `None` once that state is unreachable.
    persisted: Option<usize>,
    open: Vec<OpenGroup>,
    limit: Option<usize>,
}

impl UndoHistory {
    /// Creates an empty history. A fresh document counts as persisted.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            doc_index: 0,
            view_indices: BTreeMap::new(),
            persisted: Some(0),
            open: Vec::new(),
            limit: None,
        }
    }

    /// Creates an empty history that keeps at most `limit` groups.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::new()
        }
    }

    // ==================== Views ====================

    /// Starts tracking `view` at the current document position.
    pub fn register_view(&mut self, view: ViewId) {
        self.view_indices.insert(view, self.doc_index);
    }

    /// Stops tracking `view`. Its groups stay in the list.
    pub fn unregister_view(&mut self, view: ViewId) {
        self.view_indices.remove(&view);
    }

    pub fn is_registered(&self, view: ViewId) -> bool {
        self.view_indices.contains_key(&view)
    }

    pub fn view_index(&self, view: ViewId) -> Option<usize> {
        self.view_indices.get(&view).copied()
    }

    pub fn doc_index(&self) -> usize {
        self.doc_index
    }

    /// Number of closed groups in the history.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The closed group at `index`.
    pub fn group(&self, index: usize) -> Option<&ChangeGroup> {
        self.entries.get(index).map(|e| &e.group)
    }

    pub fn scope(&self, index: usize) -> Option<ChangeScope> {
        self.entries.get(index).map(|e| e.scope)
    }

    // ==================== Groups ====================

    /// Opens a group. Groups nest; only the outermost one becomes a history
    /// entry.
    pub fn begin_group(&mut self, discardable: bool) {
        trace!(depth = self.open.len(), discardable, "begin undo group");
        self.open.push(OpenGroup {
            group: ChangeGroup::new(discardable),
            last_child_coalesce: None,
        });
    }

    /// Number of open groups.
    pub fn group_depth(&self) -> usize {
        self.open.len()
    }

    pub fn is_group_open(&self) -> bool {
        !self.open.is_empty()
    }

    /// Records an executed change. Outside of a group the change becomes a
    /// group of its own.
    pub fn give_change(&mut self, change: Change) {
        match self.open.last_mut() {
            Some(open) => open.group.give_change(change),
            None => {
                let mut group = ChangeGroup::default();
                group.give_change(change);
                self.commit(group, CoalesceId::None);
            }
        }
    }

    /// Closes the innermost open group.
    ///
    /// A nested group is absorbed by its parent when `flatten` is set, merged
    /// into the parent's previous nested group when `coalesce_id` matches it,
    /// and kept as a nested group otherwise. The outermost group is flattened
    /// on request and then coalesced with the previous history entry or
    /// pushed as a new one.
    pub fn end_group(&mut self, coalesce_id: CoalesceId, flatten: bool) {
        let Some(mut open) = self.open.pop() else {
            debug_assert!(false, "end_group without a matching begin_group");
            return;
        };
        trace!(depth = self.open.len(), ?coalesce_id, flatten, "end undo group");

        let Some(parent) = self.open.last_mut() else {
            if flatten {
                open.group.flatten();
            }
            self.commit(open.group, coalesce_id);
            return;
        };

        if open.group.is_empty() && open.group.is_discardable() {
            return;
        }
        if flatten {
            parent.group.absorb(open.group);
            return;
        }
        let child = match parent.last_child_coalesce {
            Some(previous) if coalesce_id.coalesces_with(previous) => {
                match parent.group.absorb_into_last_nested(open.group) {
                    Ok(()) => return,
                    Err(child) => child,
                }
            }
            _ => open.group,
        };
        parent.group.push_nested(child);
        parent.last_child_coalesce = Some(coalesce_id);
    }

    fn commit(&mut self, group: ChangeGroup, coalesce_id: CoalesceId) {
        if group.is_empty() && group.is_discardable() {
            trace!("dropping empty undo group");
            return;
        }
        let scope = match group.scope() {
            ChangeScope::View(view) if self.is_registered(view) => ChangeScope::View(view),
            _ => ChangeScope::Document,
        };
        let entry = HistoryEntry {
            group,
            scope,
            coalesce_id,
        };
        match scope {
            ChangeScope::Document => self.push_document(entry),
            ChangeScope::View(view) => self.push_view(view, entry),
        }
        self.enforce_limit();
        self.check_invariants();
    }

    fn push_document(&mut self, entry: HistoryEntry) {
        self.drop_unapplied_for_document_edit();

        if let Some(index) = self.doc_index.checked_sub(1) {
            if self.try_coalesce(index, entry.coalesce_id, ChangeScope::Document) {
                self.absorb_into(index, entry);
                return;
            }
        }
        let at = self.entries.len();
        self.insert_entry(at, entry);
        for index in self.view_indices.values_mut() {
            *index = self.doc_index;
        }
    }

    fn push_view(&mut self, view: ViewId, entry: HistoryEntry) {
        let Some(view_index) = self.view_index(view) else {
            return;
        };
        // The view's own redo groups
        for index in (view_index..self.entries.len()).rev() {
            if self.entries[index].scope == ChangeScope::View(view) {
                self.remove_entry(index);
            }
        }

        if let Some(index) = view_index.checked_sub(1) {
            if self.try_coalesce(index, entry.coalesce_id, ChangeScope::View(view)) {
                self.absorb_into(index, entry);
                return;
            }
        }
        self.insert_entry(view_index, entry);
        self.view_indices.insert(view, view_index + 1);
    }

    fn try_coalesce(&self, index: usize, coalesce_id: CoalesceId, scope: ChangeScope) -> bool {
        let candidate = &self.entries[index];
        candidate.scope == scope && coalesce_id.coalesces_with(candidate.coalesce_id)
    }

    /// Merges `entry` into the applied entry at `index`, the last one the
    /// relevant index covers.
    fn absorb_into(&mut self, index: usize, entry: HistoryEntry) {
        debug!(index, coalesce_id = ?entry.coalesce_id, "coalescing undo group");
        let candidate = &mut self.entries[index];
        candidate.group.absorb(entry.group);
        if entry.coalesce_id != CoalesceId::Force {
            candidate.coalesce_id = entry.coalesce_id;
        }
        let now_empty = candidate.group.is_empty();
        if entry.scope == ChangeScope::Document && self.persisted == Some(index + 1) {
            // The saved state was this entry before it grew
            self.persisted = None;
        }
        if now_empty {
            self.remove_entry(index);
        }
    }

    /// Before a document group is pushed: drops the redo groups and every
    /// view's soft-undone groups, and lines every view up with the document
    /// index.
    fn drop_unapplied_for_document_edit(&mut self) {
        let redo = self.entries.len() - self.doc_index;
        if redo > 0 {
            debug!(count = redo, "truncating redo history");
        }
        while self.entries.len() > self.doc_index {
            self.remove_entry(self.entries.len() - 1);
        }

        // Soft-undone groups only sit between the lowest view index and the
        // document index
        let lowest = self
            .view_indices
            .values()
            .copied()
            .min()
            .unwrap_or(self.doc_index)
            .min(self.doc_index);
        for index in (lowest..self.doc_index).rev() {
            if let ChangeScope::View(view) = self.entries[index].scope {
                if self.view_index(view).is_some_and(|v| index >= v) {
                    self.remove_entry(index);
                }
            }
        }

        let doc_index = self.doc_index;
        for (view, index) in self.view_indices.iter_mut() {
            if *index > doc_index {
                warn!(
                    view = view.raw(),
                    view_index = *index,
                    doc_index,
                    "view ahead of the document undo index, forcing it back"
                );
            }
            *index = doc_index;
        }
    }

    fn insert_entry(&mut self, at: usize, entry: HistoryEntry) {
        self.entries.insert(at, entry);
        if self.doc_index >= at {
            self.doc_index += 1;
        }
        for index in self.view_indices.values_mut() {
            if *index > at {
                *index += 1;
            }
        }
        if let Some(persisted) = self.persisted {
            if persisted > at {
                self.persisted = Some(persisted + 1);
            }
        }
    }

    fn remove_entry(&mut self, at: usize) -> HistoryEntry {
        let entry = self.entries.remove(at);
        if at < self.doc_index {
            self.doc_index -= 1;
        }
        for index in self.view_indices.values_mut() {
            if at < *index {
                *index -= 1;
            }
        }
        if let Some(persisted) = self.persisted {
            if persisted > at {
                // The saved state included this group
                self.persisted = match entry.scope {
                    ChangeScope::Document => None,
                    ChangeScope::View(_) => Some(persisted - 1),
                };
            }
        }
        entry
    }

    fn enforce_limit(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };
        while self.entries.len() > limit && self.is_applied(0) {
            let entry = self.entries.remove(0);
            self.doc_index = self.doc_index.saturating_sub(1);
            for index in self.view_indices.values_mut() {
                *index = index.saturating_sub(1);
            }
            self.persisted = match (self.persisted, entry.scope) {
                (Some(0), ChangeScope::Document) => None,
                (persisted, _) => persisted.map(|p| p.saturating_sub(1)),
            };
            debug!(limit, "evicted oldest undo group");
        }
    }

    // ==================== Undo / redo ====================

    fn is_applied(&self, index: usize) -> bool {
        match self.entries[index].scope {
            ChangeScope::Document => index < self.doc_index,
            ChangeScope::View(view) => index < self.view_index(view).unwrap_or(self.doc_index),
        }
    }

    fn is_visible(&self, index: usize, view: Option<ViewId>) -> bool {
        match self.entries[index].scope {
            ChangeScope::Document => true,
            ChangeScope::View(owner) => Some(owner) == view,
        }
    }

    /// Unregistered views are treated like a document-level request.
    fn known_view(&self, view: Option<ViewId>) -> Option<ViewId> {
        view.filter(|v| self.is_registered(*v))
    }

    pub fn can_undo(&self, view: Option<ViewId>) -> bool {
        match self.known_view(view).and_then(|v| Some((v, self.view_index(v)?))) {
            Some((view, index)) => (0..index).any(|i| self.is_visible(i, Some(view))),
            None => (0..self.doc_index).any(|i| self.entries[i].scope == ChangeScope::Document),
        }
    }

    pub fn can_redo(&self, view: Option<ViewId>) -> bool {
        match self.known_view(view).and_then(|v| Some((v, self.view_index(v)?))) {
            Some((view, index)) => (index..self.entries.len()).any(|i| self.is_visible(i, Some(view))),
            None => (self.doc_index..self.entries.len())
                .any(|i| self.entries[i].scope == ChangeScope::Document),
        }
    }

    /// Undoes one step.
    ///
    /// With `soft` set and a view given, a selection-only group of that view
    /// is undone on its own; every other case undoes back over the nearest
    /// document group for all views. Returns false when nothing was undone.
    pub fn undo(&mut self, view: Option<ViewId>, soft: bool, target: &mut dyn ChangeTarget) -> bool {
        debug_assert!(self.open.is_empty(), "undo while an undo group is open");
        let view = self.known_view(view);
        let undone = match view {
            Some(view) if soft => match self.last_applied_visible(view) {
                Some(index) if self.entries[index].scope == ChangeScope::View(view) => {
                    self.undo_view_entry(view, index, target);
                    true
                }
                Some(_) => self.undo_document(view, target),
                None => false,
            },
            view => self.undo_document(view, target),
        };
        self.check_invariants();
        undone
    }

    /// Redoes one step; the mirror image of [`UndoHistory::undo`].
    pub fn redo(&mut self, view: Option<ViewId>, soft: bool, target: &mut dyn ChangeTarget) -> bool {
        debug_assert!(self.open.is_empty(), "redo while an undo group is open");
        let view = self.known_view(view);
        let redone = match view {
            Some(view) if soft => match self.first_unapplied_visible(view) {
                Some(index) if self.entries[index].scope == ChangeScope::View(view) => {
                    self.redo_view_entry(view, index, target);
                    true
                }
                Some(_) => self.redo_document(view, target),
                None => false,
            },
            view => self.redo_document(view, target),
        };
        self.check_invariants();
        redone
    }

    fn last_applied_visible(&self, view: ViewId) -> Option<usize> {
        let index = self.view_index(view)?;
        (0..index).rev().find(|&i| self.is_visible(i, Some(view)))
    }

    fn first_unapplied_visible(&self, view: ViewId) -> Option<usize> {
        let index = self.view_index(view)?;
        (index..self.entries.len()).find(|&i| self.is_visible(i, Some(view)))
    }

    fn undo_view_entry(&mut self, view: ViewId, index: usize, target: &mut dyn ChangeTarget) {
        trace!(view = view.raw(), index, "soft undo");
        self.entries[index].group.revert(target);
        self.view_indices.insert(view, index);
    }

    fn redo_view_entry(&mut self, view: ViewId, index: usize, target: &mut dyn ChangeTarget) {
        trace!(view = view.raw(), index, "soft redo");
        self.entries[index].group.execute(target);
        self.view_indices.insert(view, index + 1);
        self.doc_index = self.doc_index.max(index + 1);
    }

    fn undo_document(&mut self, view: impl Into<Option<ViewId>>, target: &mut dyn ChangeTarget) -> bool {
        let view = view.into();
        let Some(start) = (0..self.doc_index)
            .rev()
            .find(|&i| self.entries[i].scope == ChangeScope::Document)
        else {
            // Only view groups left: fall back to the view's own history
            return match view.and_then(|v| Some((v, self.last_applied_visible(v)?))) {
                Some((view, index)) => {
                    self.undo_view_entry(view, index, target);
                    true
                }
                None => false,
            };
        };

        trace!(from = start, to = self.doc_index, "hard undo");
        for index in (start..self.doc_index).rev() {
            if self.is_applied(index) {
                self.entries[index].group.revert(target);
            }
        }
        self.doc_index = start;
        for index in self.view_indices.values_mut() {
            *index = (*index).min(start);
        }
        true
    }

    fn redo_document(&mut self, view: impl Into<Option<ViewId>>, target: &mut dyn ChangeTarget) -> bool {
        let view = view.into();
        let Some(end) =
            (self.doc_index..self.entries.len()).find(|&i| self.entries[i].scope == ChangeScope::Document)
        else {
            return match view.and_then(|v| Some((v, self.first_unapplied_visible(v)?))) {
                Some((view, index)) => {
                    self.redo_view_entry(view, index, target);
                    true
                }
                None => false,
            };
        };

        let from = self
            .view_indices
            .values()
            .copied()
            .min()
            .unwrap_or(self.doc_index)
            .min(self.doc_index);
        trace!(from, to = end, "hard redo");
        for index in from..=end {
            if !self.is_applied(index) {
                self.entries[index].group.execute(target);
            }
        }
        self.doc_index = end + 1;
        for index in self.view_indices.values_mut() {
            *index = end + 1;
        }
        true
    }

    // ==================== Persisted state ====================

    /// Marks the current state as saved.
    pub fn set_persisted(&mut self) {
        self.persisted = Some(self.doc_index);
    }

    /// True when the document text equals the last saved state: no document
    /// group lies between the saved position and the current one.
    pub fn is_persisted(&self) -> bool {
        let Some(persisted) = self.persisted else {
            return false;
        };
        let (low, high) = (persisted.min(self.doc_index), persisted.max(self.doc_index));
        self.entries
            .get(low..high)
            .is_some_and(|between| !between.iter().any(|e| e.scope == ChangeScope::Document))
    }

    /// Drops every group. Open groups are kept.
    pub fn clear(&mut self) {
        let persisted = self.is_persisted();
        debug!(entries = self.entries.len(), "clearing undo history");
        self.entries.clear();
        self.doc_index = 0;
        for index in self.view_indices.values_mut() {
            *index = 0;
        }
        self.persisted = persisted.then_some(0);
    }

    /// Checks the index invariants (debug builds only).
    #[cfg(debug_assertions)]
    fn check_invariants(&self) {
        assert!(
            self.doc_index <= self.entries.len(),
            "doc index {} beyond {} entries",
            self.doc_index,
            self.entries.len()
        );
        for (view, &index) in &self.view_indices {
            assert!(
                index <= self.doc_index,
                "view {} index {} ahead of doc index {}",
                view.raw(),
                index,
                self.doc_index
            );
            assert!(
                !(index..self.doc_index).any(|i| self.entries[i].scope == ChangeScope::Document),
                "document group between view {} index {} and doc index {}",
                view.raw(),
                index,
                self.doc_index
            );
        }
    }

    #[cfg(not(debug_assertions))]
    fn check_invariants(&self) {}
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new()
    }
}
