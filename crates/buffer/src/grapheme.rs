// Chunk: docs/chunks/grapheme_cluster_awareness - Grapheme cluster boundary helpers

//! Grapheme cluster boundaries.
//!
//! The document stores Unicode scalar values, but carets should step over
//! what users perceive as one character: ZWJ emoji sequences, combining
//! sequences, regional indicator pairs and decomposed Hangul. These helpers
//! work on the characters of one line; [`Document`](crate::Document) applies
//! them per line and treats the line break itself as a boundary on both
//! sides.

use unicode_segmentation::UnicodeSegmentation;

/// Ends of the grapheme clusters of `chars`, in char offsets.
fn grapheme_ends(chars: &[char]) -> Vec<usize> {
    let s: String = chars.iter().collect();
    let mut end = 0;
    s.graphemes(true)
        .map(|g| {
            end += g.chars().count();
            end
        })
        .collect()
}

/// Returns the grapheme boundary strictly before `col`, or 0.
///
/// A `col` inside a cluster snaps to that cluster's start.
pub fn boundary_before(chars: &[char], col: usize) -> usize {
    let col = col.min(chars.len());
    if col == 0 {
        return 0;
    }
    // ASCII never extends a preceding cluster
    if chars[col - 1].is_ascii() && chars.get(col).map_or(true, |c| c.is_ascii()) {
        return col - 1;
    }
    std::iter::once(0)
        .chain(grapheme_ends(chars))
        .take_while(|&start| start < col)
        .last()
        .unwrap_or(0)
}

/// Returns the grapheme boundary strictly after `col`, or `chars.len()`.
pub fn boundary_after(chars: &[char], col: usize) -> usize {
    if col >= chars.len() {
        return chars.len();
    }
    if chars[col].is_ascii() && chars.get(col + 1).map_or(true, |c| c.is_ascii()) {
        return col + 1;
    }
    grapheme_ends(chars)
        .into_iter()
        .find(|&end| end > col)
        .unwrap_or(chars.len())
}

/// Number of chars a backward delete at `col` removes.
pub fn len_before(chars: &[char], col: usize) -> usize {
    let col = col.min(chars.len());
    col - boundary_before(chars, col)
}

/// Number of chars a forward delete at `col` removes.
pub fn len_at(chars: &[char], col: usize) -> usize {
    boundary_after(chars, col).saturating_sub(col)
}

/// True when `col` falls between two grapheme clusters.
pub fn is_boundary(chars: &[char], col: usize) -> bool {
    col == 0 || col >= chars.len() || boundary_after(chars, boundary_before(chars, col)) == col
}
