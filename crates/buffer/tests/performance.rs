// Chunk: docs/chunks/text_buffer - Text buffer data structure with gap buffer backing

//! Performance sanity checks for the document.
//!
//! These tests verify that basic operations complete within reasonable time bounds.
//! They are not formal benchmarks but guard against obvious performance regressions
//! (quadratic merging in undo groups, full line index rebuilds on every edit).

use edtext_buffer::{CoalesceId, Document, Selection, TextRange};
use std::time::{Duration, Instant};

const TYPING: CoalesceId = CoalesceId::Id(1);

#[test]
fn type_20k_chars_under_1s() {
    let mut doc = Document::new();
    let start = Instant::now();

    for _ in 0..20_000 {
        doc.append("x", TYPING);
    }

    let elapsed = start.elapsed();
    assert!(
        elapsed < Duration::from_secs(1),
        "Typing 20K characters took {:?}, expected < 1s",
        elapsed
    );

    assert_eq!(doc.len(), 20_000);
    assert_eq!(doc.line_count(), 1);
    assert_eq!(doc.undo_entry_count(), 1);
}

#[test]
fn type_20k_chars_with_newlines_under_1s() {
    let mut doc = Document::new();
    let start = Instant::now();

    for i in 0..20_000 {
        let ch = if i % 80 == 79 { "\n" } else { "x" };
        doc.append(ch, TYPING);
    }

    let elapsed = start.elapsed();
    assert!(
        elapsed < Duration::from_secs(1),
        "Typing 20K characters with newlines took {:?}, expected < 1s",
        elapsed
    );

    // 20000/80 = 250 line breaks
    assert_eq!(doc.line_count(), 251);
    assert_eq!(doc.line_data_len(), 251);
}

#[test]
fn uncoalesced_40k_appends_under_2s() {
    let mut doc = Document::new();
    let view = doc.register_view();
    let start = Instant::now();

    // Every append is its own undo step, so the history keeps growing
    for _ in 0..40_000 {
        doc.append("x", CoalesceId::None);
    }

    let elapsed = start.elapsed();
    assert!(
        elapsed < Duration::from_secs(2),
        "40K separate undo steps took {:?}, expected < 2s",
        elapsed
    );
    assert_eq!(doc.undo_entry_count(), 40_000);
    assert!(doc.undo(Some(view), true));
    assert_eq!(doc.len(), 39_999);
}

#[test]
fn type_at_5k_cursors_under_1s() {
    let content = "ab\n".repeat(5_000);
    let mut doc = Document::from_str(&content);
    let view = doc.register_view();
    let carets = (0..5_000)
        .map(|line| TextRange::cursor(doc.offset_from_line(line) + 1))
        .collect();
    doc.change_selection(view, Selection::new(carets), CoalesceId::None);

    let start = Instant::now();
    doc.replace_selection(view, "x", TYPING);

    let elapsed = start.elapsed();
    assert!(
        elapsed < Duration::from_secs(1),
        "Typing at 5K cursors took {:?}, expected < 1s",
        elapsed
    );
    assert_eq!(doc.line_content(4_999), "axb");
    assert_eq!(doc.selection(view).unwrap().ranges().len(), 5_000);

    assert!(doc.undo(Some(view), false));
    assert_eq!(doc.text(), content);
}

#[test]
fn raw_append_large_file() {
    let line = "fn main() { println!(\"hello\"); }\n";
    let mut doc = Document::new();
    let start = Instant::now();

    doc.begin_raw_append();
    for _ in 0..20_000 {
        doc.raw_append(line);
    }
    doc.end_raw_append();

    let elapsed = start.elapsed();
    assert!(
        elapsed < Duration::from_secs(2),
        "Loading 20K lines took {:?}, expected < 2s",
        elapsed
    );
    assert_eq!(doc.line_count(), 20_001);
    assert!(!doc.can_undo(None));
}

#[test]
fn line_access_performance() {
    let content: String = (0..1000)
        .map(|i| format!("Line number {}", i))
        .collect::<Vec<_>>()
        .join("\n");

    let doc = Document::from_str(&content);
    let start = Instant::now();

    for _ in 0..100 {
        for line in 0..doc.line_count() {
            let _ = doc.line_content(line);
        }
    }

    let elapsed = start.elapsed();
    assert!(
        elapsed < Duration::from_secs(1),
        "Accessing {} lines 100 times took {:?}, expected < 1s",
        doc.line_count(),
        elapsed
    );
}

#[test]
fn undo_and_redo_large_group() {
    let mut doc = Document::new();
    let view = doc.register_view();
    for i in 0..5_000 {
        let ch = if i % 50 == 49 { "\n" } else { "y" };
        doc.replace_selection(view, ch, TYPING);
    }
    let typed = doc.text();

    let start = Instant::now();
    assert!(doc.undo(Some(view), false));
    assert!(doc.is_empty());
    assert!(doc.redo(Some(view), false));

    let elapsed = start.elapsed();
    assert!(
        elapsed < Duration::from_millis(500),
        "Undo and redo of 5K coalesced edits took {:?}, expected < 500ms",
        elapsed
    );
    assert_eq!(doc.text(), typed);
    assert_eq!(doc.line_data_len(), doc.line_count());
}

#[test]
fn mixed_operations_performance() {
    let mut doc = Document::new();
    let view = doc.register_view();
    let start = Instant::now();

    // Simulate realistic editing: type, correct, type more, new line
    for iteration in 0..500 {
        doc.replace_selection(view, &format!("Line {}: ", iteration), TYPING);

        doc.replace_selection(view, "x", TYPING);
        let caret = doc.selection(view).unwrap().carets()[0];
        doc.replace(caret - 1, 1, "", CoalesceId::Id(2));

        doc.replace_selection(view, "some content here", TYPING);
        doc.replace_selection(view, "\n", CoalesceId::None);
    }

    let elapsed = start.elapsed();
    assert!(
        elapsed < Duration::from_secs(1),
        "Mixed operations took {:?}, expected < 1s",
        elapsed
    );

    assert_eq!(doc.line_count(), 501); // 500 lines + 1 empty line at end
}
