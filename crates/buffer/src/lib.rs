// Chunk: docs/chunks/text_buffer - Text buffer data structure with gap buffer backing
// Chunk: docs/chunks/undo_history - Coalescing change groups and shared multi-view undo

//! edtext-buffer: the text document layer of an editor.
//!
//! This crate provides a gap buffer-backed document with a line index, a
//! per-line side channel for cached derived data (syntax state, markers) and
//! an undo history shared by several views of the same document.
//!
//! # Overview
//!
//! The main type is [`Document`], which provides:
//! - Offset and line/column reads over a [`GapBuffer`] of chars
//! - A single mutation path, [`Document::replace`], with before/after change
//!   notifications for collaborators ([`TextChangeListener`])
//! - Per-view [`Selection`]s that follow every edit
//! - Undo/redo with coalescing, nested groups and per-view soft undo
//! - A save marker ([`Document::set_persisted`]) that survives undo and redo
//!
//! # Example
//!
//! ```
//! use edtext_buffer::{CoalesceId, DirtyLines, Document, Position};
//!
//! let mut doc = Document::new();
//! let view = doc.register_view();
//!
//! // Typing coalesces into one undo step
//! doc.replace(0, 0, "Hello", CoalesceId::Id(1));
//! doc.replace(5, 0, ", world!", CoalesceId::Id(1));
//! assert_eq!(doc.line_content(0), "Hello, world!");
//!
//! // Splitting a line dirties everything below it
//! let dirty = doc.replace(6, 1, "\n", CoalesceId::None);
//! assert_eq!(dirty, DirtyLines::FromLineToEnd(0));
//! assert_eq!(doc.position_from_offset(7), Position::new(1, 0));
//!
//! doc.undo(Some(view), false);
//! doc.undo(Some(view), false);
//! assert_eq!(doc.text(), "");
//! ```
//!
//! # Dirty Line Tracking
//!
//! Each mutation returns a [`DirtyLines`] value indicating which lines were
//! affected, and listeners receive the same information once a batch of
//! changes ends:
//!
//! - `DirtyLines::None` - No visual change
//! - `DirtyLines::Single(line)` - Only one line changed
//! - `DirtyLines::Range { from, to }` - Lines `from..to` changed
//! - `DirtyLines::FromLineToEnd(line)` - All lines from `line` to the end changed
//!   (used when lines are split or joined)

mod change;
mod change_group;
mod config;
mod document;
mod event;
mod gap_buffer;
pub mod grapheme;
mod line_data;
mod line_index;
mod selection;
mod text_buffer;
mod types;
mod undo_history;

pub use change::{
    Change, ChangeTarget, LineDataChange, LineDataListChange, LineFieldChange, ReplaceRecord,
    SelectionChange, TextChange,
};
pub use change_group::{ChangeGroup, ChangeScope};
pub use config::DocumentConfig;
pub use document::{ChangeBatch, Document};
pub use event::{TextBufferChange, TextChangeListener};
pub use gap_buffer::GapBuffer;
pub use line_data::{empty_slots, LineData, LineDataList, LineDataStore, LineSlot};
pub use line_index::{line_offsets_in, LineChange, LineIndex};
pub use selection::{map_offset, Selection, TextRange};
pub use text_buffer::TextBuffer;
pub use types::{CoalesceId, DirtyLines, Position, ViewId};
pub use undo_history::UndoHistory;
