// Chunk: docs/chunks/line_data - Per-line side channel that follows line edits

//! Integration tests for the per-line side channel.
//!
//! Payloads are cached derived data: they must move with their lines and
//! come back as the very same objects when an edit that removed them is
//! undone.

use edtext_buffer::{CoalesceId, Document, LineData};

#[derive(Debug, PartialEq)]
struct Tokens(Vec<&'static str>);

fn addr(data: Option<&dyn LineData>) -> *const () {
    data.map_or(std::ptr::null(), |d| std::ptr::from_ref(d).cast())
}

fn tokenized(text: &str) -> Document {
    let mut doc = Document::from_str(text);
    for line in 0..doc.line_count() {
        let words = match doc.line_content(line).as_str() {
            "a" => vec!["a"],
            "b" => vec!["b"],
            "c" => vec!["c"],
            _ => vec!["?"],
        };
        doc.give_line_data(line, 0, Box::new(Tokens(words)));
    }
    doc
}

#[test]
fn test_payloads_follow_line_insertions() {
    let mut doc = tokenized("a\nb\nc");
    doc.replace(1, 0, "\nnew", CoalesceId::None);

    assert_eq!(doc.line_data_len(), 4);
    assert_eq!(doc.line_data_as::<Tokens>(0, 0), Some(&Tokens(vec!["a"])));
    assert!(doc.line_data(1, 0).is_none());
    assert_eq!(doc.line_data_as::<Tokens>(2, 0), Some(&Tokens(vec!["b"])));
    assert_eq!(doc.line_data_as::<Tokens>(3, 0), Some(&Tokens(vec!["c"])));
}

#[test]
fn test_removed_payloads_return_with_identity() {
    let mut doc = tokenized("a\nb\nc\nd");
    let b = addr(doc.line_data(1, 0));
    let c = addr(doc.line_data(2, 0));
    let d = addr(doc.line_data(3, 0));

    // Delete "\nb\nc"
    doc.replace(1, 4, "", CoalesceId::None);
    assert_eq!(doc.text(), "a\nd");
    assert_eq!(addr(doc.line_data(1, 0)), d);

    for _ in 0..2 {
        doc.undo(None, false);
        assert_eq!(doc.text(), "a\nb\nc\nd");
        assert_eq!(addr(doc.line_data(1, 0)), b);
        assert_eq!(addr(doc.line_data(2, 0)), c);
        assert_eq!(addr(doc.line_data(3, 0)), d);

        doc.redo(None, false);
        assert_eq!(doc.line_data_len(), 2);
    }
}

#[test]
fn test_coalesced_line_edits_keep_slot_count() {
    let mut doc = tokenized("a\nb");
    for text in ["\n", "x", "\n", "y"] {
        doc.append(text, CoalesceId::Id(1));
    }
    doc.replace(0, 2, "", CoalesceId::Id(1));
    assert_eq!(doc.line_data_len(), doc.line_count());
    assert_eq!(doc.undo_entry_count(), 1);

    doc.undo(None, false);
    assert_eq!(doc.text(), "a\nb");
    assert_eq!(doc.line_data_len(), 2);
    assert_eq!(doc.line_data_as::<Tokens>(1, 0), Some(&Tokens(vec!["b"])));
}

#[test]
fn test_multiple_fields() {
    let mut doc = Document::from_str("x\ny");
    doc.set_fields_per_line(2);
    doc.give_line_data(1, 1, Box::new(42usize));

    assert!(doc.line_data(1, 0).is_none());
    assert_eq!(doc.line_data_as::<usize>(1, 1), Some(&42));
    assert_eq!(doc.line_data_as::<u32>(1, 1), None);

    doc.clear_line_data(1, 1);
    assert!(doc.line_data(1, 1).is_none());
}

#[test]
fn test_recorded_field_swap_restores_previous_payload() {
    let mut doc = tokenized("a");
    let original = addr(doc.line_data(0, 0));

    doc.begin_undo_group();
    doc.give_line_data(0, 0, Box::new(Tokens(vec!["retokenized"])));
    doc.end_undo_group(CoalesceId::None, false);

    doc.undo(None, false);
    assert_eq!(addr(doc.line_data(0, 0)), original);
    doc.redo(None, false);
    assert_eq!(
        doc.line_data_as::<Tokens>(0, 0),
        Some(&Tokens(vec!["retokenized"]))
    );
}
