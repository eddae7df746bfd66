// Chunk: docs/chunks/undo_history - Coalescing change groups and shared multi-view undo

//! Property tests for the change algebra, undo history and line index.

use edtext_buffer::{CoalesceId, Document, ReplaceRecord, Selection, TextRange};
use proptest::prelude::*;

// Text with some line breaks and a non-ASCII char
fn text_with_newlines(max: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            (b'a'..=b'z').prop_map(char::from),
            Just('\n'),
            Just('\u{e9}'),
        ],
        0..max,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

#[derive(Debug, Clone)]
struct Edit {
    offset: usize,
    len: usize,
    text: String,
}

fn edits_strategy() -> impl Strategy<Value = Vec<Edit>> {
    prop::collection::vec(
        (0usize..200, 0usize..20, text_with_newlines(12))
            .prop_map(|(offset, len, text)| Edit { offset, len, text }),
        0..30,
    )
}

/// Applies `edit` clamped to the document; false when it would do nothing.
fn apply(doc: &mut Document, edit: &Edit, coalesce_id: CoalesceId) -> bool {
    let offset = edit.offset.min(doc.len());
    let len = edit.len.min(doc.len() - offset);
    if len == 0 && edit.text.is_empty() {
        return false;
    }
    doc.replace(offset, len, &edit.text, coalesce_id);
    true
}

fn sequence(max: usize) -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..1000, 0..max)
}

/// One user action in a multi-view session.
#[derive(Debug, Clone)]
enum Step {
    Insert { offset: usize, text: String, coalesce: bool },
    Delete { offset: usize, len: usize, coalesce: bool },
    Type { view: usize, text: String },
    Move { view: usize, offset: usize, coalesce: bool },
    Undo { view: Option<usize>, soft: bool },
    Redo { view: Option<usize>, soft: bool },
    Save,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0usize..100, "[a-z\n]{1,3}", any::<bool>())
            .prop_map(|(offset, text, coalesce)| Step::Insert { offset, text, coalesce }),
        2 => (0usize..100, 0usize..5, any::<bool>())
            .prop_map(|(offset, len, coalesce)| Step::Delete { offset, len, coalesce }),
        2 => (0usize..2, "[a-z]{1,2}").prop_map(|(view, text)| Step::Type { view, text }),
        3 => (0usize..2, 0usize..100, any::<bool>())
            .prop_map(|(view, offset, coalesce)| Step::Move { view, offset, coalesce }),
        3 => (prop::option::of(0usize..2), any::<bool>())
            .prop_map(|(view, soft)| Step::Undo { view, soft }),
        2 => (prop::option::of(0usize..2), any::<bool>())
            .prop_map(|(view, soft)| Step::Redo { view, soft }),
        1 => Just(Step::Save),
    ]
}

fn coalesce(join: bool) -> CoalesceId {
    if join {
        CoalesceId::Id(1)
    } else {
        CoalesceId::None
    }
}

proptest! {
    #[test]
    fn prop_undo_round_trip(
        initial in text_with_newlines(60),
        edits in edits_strategy(),
        carets in (0usize..100, 0usize..100),
    ) {
        let mut doc = Document::from_str(&initial);
        let left = doc.register_view();
        let right = doc.register_view();
        doc.change_selection(left, Selection::cursor(carets.0), CoalesceId::None);
        doc.change_selection(right, Selection::range(carets.1, 0), CoalesceId::None);
        let left_before = doc.selection(left).cloned();
        let right_before = doc.selection(right).cloned();

        let mut applied = 0;
        for edit in &edits {
            if apply(&mut doc, edit, CoalesceId::None) {
                applied += 1;
            }
        }
        let edited = doc.text();

        for _ in 0..applied {
            prop_assert!(doc.undo(None, false));
        }
        prop_assert_eq!(doc.text(), initial);
        prop_assert_eq!(doc.selection(left).cloned(), left_before);
        prop_assert_eq!(doc.selection(right).cloned(), right_before);
        prop_assert_eq!(doc.line_data_len(), doc.line_count());

        for _ in 0..applied {
            prop_assert!(doc.redo(None, false));
        }
        prop_assert_eq!(doc.text(), edited);
    }

    #[test]
    fn prop_multi_view_undo_redo_session(
        initial in text_with_newlines(30),
        steps in prop::collection::vec(step_strategy(), 0..40),
    ) {
        let mut doc = Document::from_str(&initial);
        let views = [doc.register_view(), doc.register_view()];
        let mut saved = initial.clone();

        for step in &steps {
            let was_persisted = doc.is_persisted();
            match step {
                Step::Insert { offset, text, coalesce: join } => {
                    let offset = offset % (doc.len() + 1);
                    doc.replace(offset, 0, text, coalesce(*join));
                }
                Step::Delete { offset, len, coalesce: join } => {
                    if !doc.is_empty() {
                        let offset = offset % doc.len();
                        let len = 1 + len % (doc.len() - offset);
                        doc.replace(offset, len, "", coalesce(*join));
                    }
                }
                Step::Type { view, text } => {
                    doc.replace_selection(views[*view], text, CoalesceId::Id(2));
                }
                Step::Move { view, offset, coalesce: join } => {
                    let offset = offset % (doc.len() + 1);
                    doc.change_selection(views[*view], Selection::cursor(offset), coalesce(*join));
                    // Moving a caret never touches the saved state
                    prop_assert_eq!(doc.is_persisted(), was_persisted);
                }
                Step::Undo { view, soft } => {
                    let view = view.map(|i| views[i]);
                    let expected = doc.can_undo(view);
                    prop_assert_eq!(doc.undo(view, *soft), expected);
                }
                Step::Redo { view, soft } => {
                    let view = view.map(|i| views[i]);
                    let expected = doc.can_redo(view);
                    prop_assert_eq!(doc.redo(view, *soft), expected);
                }
                Step::Save => {
                    doc.set_persisted();
                    saved = doc.text();
                    prop_assert!(doc.is_persisted());
                }
            }

            if doc.is_persisted() {
                prop_assert_eq!(doc.text(), saved.clone());
            }
            prop_assert_eq!(doc.line_data_len(), doc.line_count());
            for view in views {
                let selection = doc.selection(view).unwrap();
                prop_assert!(selection.ranges().iter().all(|r| r.end() <= doc.len()));
            }
        }

        // Unwinding the whole history reaches the loaded text and comes back
        let current = doc.text();
        let mut undone = 0;
        while doc.undo(None, false) {
            undone += 1;
        }
        prop_assert_eq!(doc.text(), initial);
        for _ in 0..undone {
            prop_assert!(doc.redo(None, false));
        }
        prop_assert_eq!(doc.text(), current);
    }

    #[test]
    fn prop_coalesced_edits_undo_together(
        initial in text_with_newlines(40),
        edits in edits_strategy(),
    ) {
        let mut doc = Document::from_str(&initial);
        for edit in &edits {
            apply(&mut doc, edit, CoalesceId::Id(1));
        }
        prop_assert!(doc.undo_entry_count() <= 1);

        doc.undo(None, false);
        prop_assert_eq!(doc.text(), initial);
        prop_assert_eq!(doc.line_data_len(), doc.line_count());
    }

    #[test]
    fn prop_coalescing_idempotence(chunks in prop::collection::vec("[a-z]{1,4}", 1..20)) {
        let mut doc = Document::new();
        for chunk in &chunks {
            doc.begin_undo_group();
            doc.append(chunk, CoalesceId::None);
            doc.end_undo_group(CoalesceId::Id(9), false);
        }
        prop_assert_eq!(doc.undo_entry_count(), 1);
        prop_assert_eq!(doc.text(), chunks.concat());
    }

    #[test]
    fn prop_merge_equivalence(
        base in sequence(20),
        a in (0usize..40, 0usize..40, sequence(6)),
        b in (0usize..40, 0usize..40, sequence(6)),
    ) {
        let mut items = base.clone();
        let a_offset = a.0 % (items.len() + 1);
        let a_len = a.1 % (items.len() - a_offset + 1);
        let mut first = ReplaceRecord::new(a_offset, a_len, a.2);
        first.apply_to(&mut items);

        // `second` touches or overlaps what `first` produced
        let b_offset = b.0 % (first.new_end() + 1);
        let low = b_offset.max(first.offset());
        let b_end = low + b.1 % (items.len() - low + 1);
        let mut second = ReplaceRecord::new(b_offset, b_end - b_offset, b.2);
        second.apply_to(&mut items);
        let sequential = items.clone();

        prop_assert!(first.merge(second).is_ok());
        first.apply_to(&mut items);
        prop_assert_eq!(&items, &base);
        first.apply_to(&mut items);
        prop_assert_eq!(items, sequential);
    }

    #[test]
    fn prop_line_index_consistency(
        initial in text_with_newlines(60),
        edits in edits_strategy(),
    ) {
        let mut doc = Document::from_str(&initial);
        for edit in &edits {
            apply(&mut doc, edit, CoalesceId::None);

            let text = doc.text();
            prop_assert_eq!(doc.line_count(), text.matches('\n').count() + 1);
            prop_assert_eq!(doc.line_data_len(), doc.line_count());
            for offset in 0..=doc.len() {
                let line = doc.line_from_offset(offset);
                prop_assert!(doc.offset_from_line(line) <= offset);
                prop_assert!(
                    offset < doc.offset_from_line(line + 1)
                        || (offset == doc.len() && line + 1 == doc.line_count())
                );
            }
        }
    }

    #[test]
    fn prop_selections_stay_in_bounds(
        initial in text_with_newlines(40),
        edits in edits_strategy(),
        anchors in prop::collection::vec((0usize..60, 0usize..60), 1..4),
    ) {
        let mut doc = Document::from_str(&initial);
        let view = doc.register_view();
        let ranges = anchors
            .iter()
            .map(|&(anchor, caret)| TextRange::new(anchor, caret))
            .collect();
        doc.change_selection(view, Selection::new(ranges), CoalesceId::None);

        for edit in &edits {
            apply(&mut doc, edit, CoalesceId::None);
            let selection = doc.selection(view).unwrap();
            for range in selection.ranges() {
                prop_assert!(range.end() <= doc.len());
            }
            for pair in selection.ranges().windows(2) {
                prop_assert!(pair[0].end() <= pair[1].start());
            }
        }
    }
}
