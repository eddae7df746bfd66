// Chunk: docs/chunks/text_buffer - Text buffer data structure with gap buffer backing

//! Gap buffer implementation for efficient localized editing.
//!
//! A gap buffer is an array with a movable gap. Every replacement first moves the
//! gap next to the edit point, so runs of edits at nearby positions only shift a
//! handful of elements: O(1) amortized for local edits, O(distance) when the edit
//! point jumps.
//!
//! The container is generic. The document keeps its characters in a
//! `GapBuffer<char>`, the line index keeps line start offsets in a
//! `GapBuffer<usize>` and the side channel keeps per-line slots in a
//! `GapBuffer<LineSlot>`. Elements are moved across the gap by swapping, so
//! payloads that are neither `Copy` nor `Clone` keep their identity.

use std::mem;

pub(crate) const INITIAL_GAP_SIZE: usize = 64;
pub(crate) const INITIAL_GROWTH: usize = 64;

/// A gap buffer of `T`.
///
/// The gap is an implementation detail: every accessor takes logical offsets
/// and never observes where the gap currently is.
#[derive(Debug, Clone)]
pub struct GapBuffer<T> {
    /// The underlying storage. Contains [pre-gap content | gap | post-gap content].
    data: Vec<T>,
    /// Index where the gap starts (first unused position).
    gap_start: usize,
    /// Index where the gap ends (first used position after gap).
    gap_end: usize,
    /// Extra room added on top of the requested size whenever the buffer grows.
    growth: usize,
}

impl<T: Default> GapBuffer<T> {
    /// Creates a new empty gap buffer.
    pub fn new() -> Self {
        Self::with_gap(INITIAL_GAP_SIZE, INITIAL_GROWTH)
    }

    /// Creates an empty gap buffer with the given initial gap and growth increment.
    pub fn with_gap(initial_gap: usize, growth: usize) -> Self {
        let mut data = Vec::with_capacity(initial_gap);
        data.resize_with(initial_gap, T::default);
        Self {
            data,
            gap_start: 0,
            gap_end: initial_gap,
            growth: growth.max(1),
        }
    }

    /// Creates a gap buffer holding `items`, with the gap at the end.
    pub fn from_vec(items: Vec<T>) -> Self {
        let len = items.len();
        let capacity = len + INITIAL_GAP_SIZE;

        let mut data = items;
        data.resize_with(capacity, T::default);

        Self {
            data,
            gap_start: len,
            gap_end: capacity,
            growth: INITIAL_GROWTH,
        }
    }

    /// Returns the logical length of the buffer (excluding the gap).
    pub fn len(&self) -> usize {
        self.data.len() - self.gap_len()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the size of the backing storage, gap included.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Returns the current gap size.
    fn gap_len(&self) -> usize {
        self.gap_end - self.gap_start
    }

    /// Returns the current gap position in logical coordinates.
    pub fn gap_position(&self) -> usize {
        self.gap_start
    }

    fn physical(&self, pos: usize) -> usize {
        if pos < self.gap_start {
            pos
        } else {
            pos + self.gap_len()
        }
    }

    /// Returns the element at the given logical position.
    pub fn get(&self, pos: usize) -> Option<&T> {
        if pos >= self.len() {
            return None;
        }
        Some(&self.data[self.physical(pos)])
    }

    /// Returns a mutable reference to the element at the given logical position.
    pub fn get_mut(&mut self, pos: usize) -> Option<&mut T> {
        if pos >= self.len() {
            return None;
        }
        let physical = self.physical(pos);
        Some(&mut self.data[physical])
    }

    /// Returns an iterator over all elements in logical order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.data[..self.gap_start]
            .iter()
            .chain(self.data[self.gap_end..].iter())
    }

    /// Returns an iterator over the logical range `[start, end)`.
    ///
    /// The range is clamped to the buffer length.
    pub fn range(&self, start: usize, end: usize) -> impl Iterator<Item = &T> + '_ {
        let end = end.min(self.len());
        let start = start.min(end);
        let gap = self.gap_len();

        let before = start.min(self.gap_start)..end.min(self.gap_start);
        let after = start.max(self.gap_start) + gap..end.max(self.gap_start) + gap;
        self.data[before].iter().chain(self.data[after].iter())
    }

    /// Moves the gap to the specified logical position.
    ///
    /// This is O(distance) where distance is the absolute difference between
    /// the current gap position and the target position. Elements are swapped
    /// with gap filler one at a time, so no element is ever duplicated.
    pub fn move_gap_to(&mut self, pos: usize) {
        let pos = pos.min(self.len());

        if pos < self.gap_start {
            // Move gap left: [pos..gap_start] ends up right before gap_end
            let shift = self.gap_start - pos;
            for k in 0..shift {
                self.data.swap(self.gap_start - 1 - k, self.gap_end - 1 - k);
            }
            self.gap_start = pos;
            self.gap_end -= shift;
        } else if pos > self.gap_start {
            // Move gap right: [gap_end..gap_end + shift] ends up at gap_start
            let shift = pos - self.gap_start;
            for k in 0..shift {
                self.data.swap(self.gap_start + k, self.gap_end + k);
            }
            self.gap_start += shift;
            self.gap_end += shift;
        }
    }

    /// Ensures the gap is at least the specified size.
    ///
    /// The growth increment doubles while it is smaller than a sixth of the
    /// capacity, then the storage grows to `capacity + min_size + growth`. The
    /// gap grows in place so its position is preserved.
    fn ensure_gap(&mut self, min_size: usize) {
        if self.gap_len() >= min_size {
            return;
        }

        while self.growth < self.data.len() / 6 {
            self.growth *= 2;
        }

        let old_len = self.data.len();
        let new_size = old_len + min_size + self.growth;
        let extra = new_size - old_len;

        // Insert `extra` filler slots at gap_end, shifting the post-gap content right.
        let post_gap = self.data.split_off(self.gap_end);
        self.data.resize_with(self.gap_end + extra, T::default);
        self.data.extend(post_gap);

        // gap_start stays the same
        self.gap_end += extra;
    }

    /// Replaces `count` elements at `offset` with `items`, returning the removed
    /// elements.
    ///
    /// `count` is clamped to the elements available after `offset`. Growing
    /// replacements leave the gap after the inserted items, shrinking ones
    /// leave it at the end of the new content, equal-length replacements
    /// overwrite in place without touching the gap.
    pub fn replace(&mut self, offset: usize, count: usize, items: Vec<T>) -> Vec<T> {
        debug_assert!(
            offset <= self.len(),
            "replace offset {} beyond length {}",
            offset,
            self.len()
        );
        let count = count.min(self.len() - offset);
        let new_len = items.len();

        if new_len > count {
            self.ensure_gap(new_len - count);
            self.move_gap_to(offset + count);

            let mut items = items.into_iter();
            let mut removed = Vec::with_capacity(count);
            // [offset..offset + count] sits directly before the gap
            for slot in &mut self.data[offset..offset + count] {
                if let Some(item) = items.next() {
                    removed.push(mem::replace(slot, item));
                }
            }
            for item in items {
                self.data[self.gap_start] = item;
                self.gap_start += 1;
            }
            removed
        } else if new_len < count {
            self.move_gap_to(offset);

            let removed: Vec<T> = self.data[self.gap_end..self.gap_end + count]
                .iter_mut()
                .map(mem::take)
                .collect();
            self.gap_end += count;

            for item in items {
                self.data[self.gap_start] = item;
                self.gap_start += 1;
            }
            removed
        } else {
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    let physical = self.physical(offset + i);
                    mem::replace(&mut self.data[physical], item)
                })
                .collect()
        }
    }

    /// Appends `items` at the end of the buffer.
    pub fn append(&mut self, items: Vec<T>) {
        let len = self.len();
        self.ensure_gap(items.len());
        self.move_gap_to(len);
        for item in items {
            self.data[self.gap_start] = item;
            self.gap_start += 1;
        }
    }
}

impl<T: Default + Clone> GapBuffer<T> {
    /// Returns a copy of `count` elements starting at `offset`.
    pub fn read(&self, offset: usize, count: usize) -> Vec<T> {
        self.range(offset, offset.saturating_add(count)).cloned().collect()
    }
}

impl GapBuffer<char> {
    /// Creates a gap buffer initialized with the given text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Self {
        Self::from_vec(text.chars().collect())
    }

    /// Returns the content of a range as a String.
    ///
    /// The range is in logical coordinates and is clamped to the buffer.
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.range(start, end).collect()
    }
}

impl<T: Default> Default for GapBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GapBuffer<char> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for ch in self.iter() {
            write!(f, "{}", ch)?;
        }
        Ok(())
    }
}
