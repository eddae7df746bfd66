// Chunk: docs/chunks/document - Document facade over text, line data, views and undo

//! Integration tests for realistic editing sequences.
//!
//! These tests verify that the gap buffer, the line index, the side channel
//! and the view selections stay in sync through complex editing patterns.

use edtext_buffer::{CoalesceId, Document, Position, Selection, TextRange, ViewId};

const TYPING: CoalesceId = CoalesceId::Id(1);

fn type_text(doc: &mut Document, view: ViewId, text: &str) {
    for ch in text.chars() {
        doc.replace_selection(view, &ch.to_string(), TYPING);
    }
}

fn caret(doc: &Document, view: ViewId) -> usize {
    doc.selection(view).unwrap().carets()[0]
}

fn backspace(doc: &mut Document, view: ViewId) {
    let at = caret(doc, view);
    let from = doc.grapheme_boundary_before(at);
    doc.replace(from, at - from, "", CoalesceId::Id(2));
}

fn set_caret(doc: &mut Document, view: ViewId, position: Position) {
    let offset = doc.offset_from_position(position);
    doc.change_selection(view, Selection::cursor(offset), CoalesceId::None);
}

#[test]
fn test_type_word_then_delete_entirely() {
    let mut doc = Document::new();
    let view = doc.register_view();

    type_text(&mut doc, view, "hello");
    assert_eq!(doc.text(), "hello");
    assert_eq!(caret(&doc, view), 5);

    for _ in 0..5 {
        backspace(&mut doc, view);
    }
    assert!(doc.is_empty());
    assert_eq!(caret(&doc, view), 0);
}

#[test]
fn test_type_multiple_lines_and_insert_in_middle() {
    let mut doc = Document::new();
    let view = doc.register_view();

    type_text(&mut doc, view, "first line\nsecond line\nthird line");
    assert_eq!(doc.line_count(), 3);
    assert_eq!(doc.line_content(0), "first line");
    assert_eq!(doc.line_content(1), "second line");
    assert_eq!(doc.line_content(2), "third line");
    assert_eq!(doc.line_data_len(), 3);

    set_caret(&mut doc, view, Position::new(1, 7));
    type_text(&mut doc, view, "awesome ");
    assert_eq!(doc.line_content(1), "second awesome line");
    assert_eq!(doc.position_from_offset(caret(&doc, view)), Position::new(1, 15));
}

#[test]
fn test_split_and_rejoin_lines() {
    let mut doc = Document::from_str("helloworld");
    let view = doc.register_view();

    set_caret(&mut doc, view, Position::new(0, 5));
    doc.replace_selection(view, "\n", CoalesceId::None);
    assert_eq!(doc.line_count(), 2);
    assert_eq!(doc.line_content(0), "hello");
    assert_eq!(doc.line_content(1), "world");
    assert_eq!(doc.line_data_len(), 2);

    backspace(&mut doc, view);
    assert_eq!(doc.line_count(), 1);
    assert_eq!(doc.text(), "helloworld");
    assert_eq!(doc.line_data_len(), 1);
    assert_eq!(caret(&doc, view), 5);
}

#[test]
fn test_replace_spanning_lines() {
    let mut doc = Document::from_str("one\ntwo\nthree\nfour");
    let start = doc.offset_from_line(1) + 1;
    let end = doc.offset_from_line(3) + 2;

    doc.replace(start, end - start, "X", CoalesceId::None);
    assert_eq!(doc.text(), "one\ntXur");
    assert_eq!(doc.line_count(), 2);
    assert_eq!(doc.line_data_len(), 2);
    assert_eq!(doc.offset_from_line(2), doc.len());
}

#[test]
fn test_edits_in_one_view_move_the_other() {
    let mut doc = Document::from_str("alpha\nbeta\ngamma");
    let left = doc.register_view();
    let right = doc.register_view();

    set_caret(&mut doc, left, Position::new(0, 0));
    set_caret(&mut doc, right, Position::new(2, 2));
    let right_before = caret(&doc, right);

    type_text(&mut doc, left, "// ");
    assert_eq!(caret(&doc, right), right_before + 3);
    assert_eq!(doc.position_from_offset(caret(&doc, right)), Position::new(2, 2));

    // Deleting the line the other caret is on collapses it to the edit point
    let line2 = doc.offset_from_line(2);
    doc.replace(line2 - 1, doc.len() - line2 + 1, "", CoalesceId::None);
    assert_eq!(caret(&doc, right), line2 - 1);
}

#[test]
fn test_multi_cursor_typing_is_one_undo_step() {
    let mut doc = Document::from_str("a\nb\nc");
    let view = doc.register_view();
    let carets = (0..3)
        .map(|line| TextRange::cursor(doc.offset_from_line(line) + 1))
        .collect();
    doc.change_selection(view, Selection::new(carets), CoalesceId::None);

    type_text(&mut doc, view, "!?");
    assert_eq!(doc.text(), "a!?\nb!?\nc!?");
    assert_eq!(doc.selection(view).unwrap().carets(), vec![3, 7, 11]);

    assert!(doc.undo(Some(view), false));
    assert_eq!(doc.text(), "a\nb\nc");
    assert_eq!(doc.selection(view).unwrap().carets(), vec![1, 3, 5]);
}

#[test]
fn test_set_text_replaces_everything() {
    let mut doc = Document::from_str("old\ncontent\nhere");
    doc.set_text("new");
    assert_eq!(doc.text(), "new");
    assert_eq!(doc.line_count(), 1);
    assert_eq!(doc.line_data_len(), 1);

    doc.undo(None, false);
    assert_eq!(doc.text(), "old\ncontent\nhere");
    assert_eq!(doc.line_data_len(), 3);
}

#[test]
fn test_offset_position_roundtrip_after_edits() {
    let mut doc = Document::from_str("ab\ncd\nef");
    doc.replace(4, 0, "XYZ\n", CoalesceId::None);
    doc.replace(0, 1, "", CoalesceId::None);

    for offset in 0..=doc.len() {
        let position = doc.position_from_offset(offset);
        assert_eq!(doc.offset_from_position(position), offset);
        assert_eq!(doc.line_from_offset(offset), position.line);
        assert_eq!(
            doc.column_from_offset_and_line(offset, position.line),
            position.col
        );
    }
}

#[test]
fn test_offset_from_position_clamps() {
    let doc = Document::from_str("short\nlonger line");
    assert_eq!(doc.offset_from_position(Position::new(0, 99)), 5);
    assert_eq!(doc.offset_from_position(Position::new(9, 3)), doc.offset_from_line(1) + 3);
    assert_eq!(doc.offset_from_position(Position::new(9, 99)), doc.len());
}

#[test]
fn test_char_at_and_text_part() {
    let doc = Document::from_str("hello\nworld");
    assert_eq!(doc.char_at(5), Some('\n'));
    assert_eq!(doc.char_at(doc.len()), None);
    assert_eq!(doc.text_part(3, 5), "lo\nwo");
}

#[test]
fn test_append_coalesces_with_id() {
    let mut doc = Document::new();
    for word in ["log ", "line ", "three"] {
        doc.append(word, CoalesceId::Id(9));
    }
    assert_eq!(doc.text(), "log line three");
    assert_eq!(doc.undo_entry_count(), 1);
}

#[test]
fn test_line_index_after_set_text_and_split() {
    let mut doc = Document::new();
    doc.set_text("a\nb\nc");
    assert_eq!(doc.line_count(), 3);
    assert_eq!(doc.offset_from_line(0), 0);
    assert_eq!(doc.offset_from_line(1), 2);
    assert_eq!(doc.offset_from_line(2), 4);

    doc.replace(1, 0, "\n", CoalesceId::None);
    assert_eq!(doc.line_count(), 4);
    assert_eq!(doc.offset_from_line(1), 2);
    assert_eq!(doc.offset_from_line(2), 3);
    assert_eq!(doc.line_content(1), "");
}
