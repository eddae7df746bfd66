// Chunk: docs/chunks/text_buffer - Text buffer data structure with gap buffer backing

/// A (line, column) pair, both 0-indexed, ordered line first.
// Chunk: docs/chunks/text_selection_model - Selection anchor and range API (added Ord)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

// Chunk: docs/chunks/undo_history - Coalescing change groups and shared multi-view undo

/// Identifies a view (an independent cursor/selection context) over a document.
///
/// Views never hold references into the document; the document and its undo
/// history look a view up by this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(pub(crate) u32);

impl ViewId {
    /// Returns the raw identifier.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Controls whether a closed undo group merges into the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoalesceId {
    /// Never coalesces.
    #[default]
    None,
    /// Always coalesces with the immediately preceding group.
    Force,
    /// Coalesces with the preceding group when it was closed with the same id.
    Id(u32),
}

impl CoalesceId {
    /// Returns true when a group closed with `self` merges into a group that
    /// was closed with `previous`.
    pub fn coalesces_with(self, previous: CoalesceId) -> bool {
        match (self, previous) {
            (CoalesceId::None, _) => false,
            (CoalesceId::Force, _) => true,
            (CoalesceId::Id(id), CoalesceId::Id(prev)) => id == prev,
            (CoalesceId::Id(_), _) => false,
        }
    }
}

/// Lines touched by a mutation or a batch of mutations.
///
/// Returned by every edit and handed to listeners when a batch of changes
/// ends, so a renderer can limit what it redraws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirtyLines {
    /// Nothing visible changed.
    None,
    /// One line changed in place.
    Single(usize),
    /// Lines `from..to` changed.
    Range { from: usize, to: usize },
    /// A line and everything below it, because line breaks were added or
    /// removed and the following lines moved.
    FromLineToEnd(usize),
}

impl DirtyLines {
    /// Dirty region of a replacement starting on `line` that removed and added
    /// the given numbers of line breaks.
    pub fn for_replacement(line: usize, removed_lines: usize, added_lines: usize) -> Self {
        if removed_lines == 0 && added_lines == 0 {
            DirtyLines::Single(line)
        } else {
            DirtyLines::FromLineToEnd(line)
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, DirtyLines::None)
    }

    /// First dirty line, if any.
    pub fn start_line(&self) -> Option<usize> {
        self.bounds().map(|(from, _)| from)
    }

    /// Half-open bounds; an open end reaches the end of the document.
    fn bounds(&self) -> Option<(usize, Option<usize>)> {
        match *self {
            DirtyLines::None => None,
            DirtyLines::Single(line) => Some((line, Some(line + 1))),
            DirtyLines::Range { from, to } => Some((from, Some(to))),
            DirtyLines::FromLineToEnd(line) => Some((line, None)),
        }
    }

    fn from_bounds(from: usize, to: Option<usize>) -> Self {
        match to {
            None => DirtyLines::FromLineToEnd(from),
            Some(to) if to == from + 1 => DirtyLines::Single(from),
            Some(to) => DirtyLines::Range { from, to },
        }
    }

    /// Grows this region to also cover `other`.
    pub fn merge(&mut self, other: DirtyLines) {
        *self = match (self.bounds(), other.bounds()) {
            (None, _) => other,
            (_, None) => return,
            (Some((from, to)), Some((other_from, other_to))) => {
                let to = to.zip(other_to).map(|(a, b)| a.max(b));
                Self::from_bounds(from.min(other_from), to)
            }
        };
    }
}
