// Chunk: docs/chunks/line_data - Per-line side channel that follows line edits

//! Per-line auxiliary data (the side channel).
//!
//! Collaborators attach payloads such as cached tokenization results to lines.
//! The store keeps exactly one slot per line and moves slots in and out of the
//! [`GapBuffer`] when lines are inserted or removed, so a payload keeps its
//! identity while its line shifts around. Undo hands removed slots back
//! verbatim, which means a payload is the same allocation after an undo/redo
//! cycle, not merely an equal one.

use std::any::Any;
use std::fmt::Debug;

use crate::gap_buffer::GapBuffer;

/// A payload attached to one field of one line.
///
/// Implemented for every `'static` type that is `Debug`.
pub trait LineData: Any + Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Debug> LineData for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The fields of one line.
#[derive(Debug, Default)]
pub struct LineDataList {
    fields: Vec<Option<Box<dyn LineData>>>,
}

impl LineDataList {
    fn with_fields(count: usize) -> Self {
        Self {
            fields: (0..count).map(|_| None).collect(),
        }
    }

    /// Returns the payload stored in `field`.
    pub fn get(&self, field: usize) -> Option<&dyn LineData> {
        self.fields.get(field).and_then(|f| f.as_deref())
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// One line's slot: lines without any data carry no allocation.
pub type LineSlot = Option<Box<LineDataList>>;

/// Creates `count` empty slots.
pub fn empty_slots(count: usize) -> Vec<LineSlot> {
    (0..count).map(|_| None).collect()
}

/// Slot table with one entry per line.
#[derive(Debug)]
pub struct LineDataStore {
    slots: GapBuffer<LineSlot>,
    fields_per_line: usize,
}

impl LineDataStore {
    /// Creates a store for a document of `line_count` lines.
    pub fn new(line_count: usize, fields_per_line: usize) -> Self {
        Self {
            slots: GapBuffer::from_vec(empty_slots(line_count)),
            fields_per_line,
        }
    }

    /// Number of slots (always the document's line count).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn fields_per_line(&self) -> usize {
        self.fields_per_line
    }

    /// Drops every payload and changes the number of fields of each line.
    pub fn set_fields_per_line(&mut self, fields_per_line: usize) {
        let line_count = self.slots.len();
        self.fields_per_line = fields_per_line;
        self.slots = GapBuffer::from_vec(empty_slots(line_count));
    }

    /// Replaces `count` slots starting at `line` with `slots`, moving the
    /// removed slots out.
    pub fn replace_slots(&mut self, line: usize, count: usize, slots: Vec<LineSlot>) -> Vec<LineSlot> {
        debug_assert!(line <= self.slots.len(), "slot {} beyond {}", line, self.slots.len());
        self.slots.replace(line, count, slots)
    }

    /// Stores `payload` in `field` of `line` and returns the previous payload.
    pub fn swap_field(
        &mut self,
        line: usize,
        field: usize,
        payload: Option<Box<dyn LineData>>,
    ) -> Option<Box<dyn LineData>> {
        debug_assert!(
            field < self.fields_per_line,
            "field {} out of range ({} fields per line)",
            field,
            self.fields_per_line
        );
        let fields_per_line = self.fields_per_line;
        let slot = self.slots.get_mut(line)?;
        let list = slot.get_or_insert_with(|| Box::new(LineDataList::with_fields(fields_per_line)));
        if list.fields.len() <= field {
            list.fields.resize_with(field + 1, || None);
        }
        std::mem::replace(&mut list.fields[field], payload)
    }

    /// Returns the payload stored in `field` of `line`.
    pub fn get(&self, line: usize, field: usize) -> Option<&dyn LineData> {
        self.slots.get(line)?.as_deref()?.get(field)
    }

    /// Returns the payload stored in `field` of `line` if it is a `T`.
    pub fn get_as<T: Any>(&self, line: usize, field: usize) -> Option<&T> {
        self.get(line, field)?.as_any().downcast_ref::<T>()
    }
}
