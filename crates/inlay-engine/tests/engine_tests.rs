/// Integration tests for the editor facade: debounce behavior across edit
/// bursts and the full keystroke-to-evaluation flow.

use std::time::{Duration, Instant};

use inlay_document::{Point, Selection};
use inlay_engine::{render_summary, Editor, QUIET_PERIOD};
use inlay_eval::{EvalOutcome, MapScope, Value};

fn scope() -> MapScope {
    let mut scope = MapScope::new();
    scope.insert("x", Value::Number(5.0));
    scope.insert("name", Value::String("ada".into()));
    scope
}

/// Place the caret at the end of the first span's source run.
fn caret_in_source(editor: &mut Editor) {
    let doc = editor.document();
    let span = doc.top_level_spans()[0];
    let source = doc.source_of_span(span).unwrap();
    let run = doc.children(source)[0];
    let caret = Selection::caret(Point::new(run, doc.text_len(run)));
    editor.set_selection(caret);
}

#[test]
fn test_rapid_edits_coalesce_into_one_cycle() {
    let scope = scope();
    let mut editor = Editor::from_text("{{ x}}");
    caret_in_source(&mut editor);

    let start = Instant::now();
    let step = Duration::from_millis(100);

    // A burst of source edits, each within the quiet period of the last.
    for (i, ch) in [" ", "+", " ", "1"].iter().enumerate() {
        editor.insert_text(ch, start + step * i as u32);
        // No deadline elapses inside the burst.
        assert!(editor.tick(start + step * (i as u32 + 1), &scope).is_none());
    }

    // One quiet period after the last keystroke, exactly one cycle fires.
    let due = start + step * 3 + QUIET_PERIOD;
    let event = editor.tick(due, &scope).expect("cycle fires when quiet");
    assert_eq!(event.updated.len(), 1);
    assert!(editor.tick(due + QUIET_PERIOD, &scope).is_none());

    let doc = editor.document();
    let span = doc.top_level_spans()[0];
    assert_eq!(doc.span_source(span), "x + 1");
    assert_eq!(
        doc.span_outcome(span),
        Some(&EvalOutcome::success(Value::Number(6.0)))
    );
}

#[test]
fn test_plain_text_edits_never_arm_the_scheduler() {
    let scope = scope();
    let mut editor = Editor::from_text("hello {{ x }}");
    let run = editor.document().children(editor.document().root())[0];
    editor.set_selection(Selection::caret(Point::new(run, 5)));

    let start = Instant::now();
    editor.insert_text(" there", start);

    assert!(!editor.scheduler().is_armed());
    assert!(editor.tick(start + QUIET_PERIOD * 2, &scope).is_none());
}

#[test]
fn test_typing_a_new_span_arms_and_evaluates() {
    let scope = scope();
    let mut editor = Editor::from_text("x is ");
    let run = editor.document().children(editor.document().root())[0];
    editor.set_selection(Selection::caret(Point::new(run, 5)));

    let start = Instant::now();
    let report = editor.insert_text("{{x}}", start);
    assert!(report.qualifies_for_eval());

    let event = editor
        .tick(start + QUIET_PERIOD, &scope)
        .expect("promotion arms the debounce");
    assert_eq!(event.updated.len(), 1);

    let summary = render_summary(editor.document()).unwrap();
    assert_eq!(summary.result, Value::String("x is 5".into()));
}

#[test]
fn test_breaking_a_span_revokes_its_result_from_the_summary() {
    let scope = scope();
    let mut editor = Editor::from_text("{{ x }}!");
    editor.run_eval_cycle(&scope);
    assert_eq!(
        render_summary(editor.document()).unwrap().result,
        Value::String("5!".into())
    );

    // Delete the last close brace; the span collapses to plain text.
    let doc = editor.document();
    let span = doc.top_level_spans()[0];
    let close = doc.delimiters_of_span(span)[1];
    let close_run = doc.children(close)[0];
    editor.set_selection(Selection::caret(Point::new(close_run, 2)));

    let start = Instant::now();
    let report = editor.delete_backward(start);
    assert!(report.qualifies_for_eval());
    assert!(editor.document().top_level_spans().is_empty());

    editor.tick(start + QUIET_PERIOD, &scope);
    assert_eq!(
        render_summary(editor.document()).unwrap().result,
        Value::String("{{ x }!".into())
    );
}

#[test]
fn test_caret_moves_track_brace_highlighting() {
    let mut editor = Editor::from_text("a {{ x }} b");
    let doc = editor.document();
    let span = doc.top_level_spans()[0];
    let delimiters = doc.delimiters_of_span(span);
    let open_run = doc.children(delimiters[0])[0];
    let plain = doc.children(doc.root())[0];

    editor.set_selection(Selection::caret(Point::new(open_run, 1)));
    for delimiter in editor.document().delimiters_of_span(span) {
        assert!(editor.document().is_highlighted(delimiter));
    }

    editor.set_selection(Selection::caret(Point::new(plain, 0)));
    for delimiter in editor.document().delimiters_of_span(span) {
        assert!(!editor.document().is_highlighted(delimiter));
    }
}

#[test]
fn test_caret_move_dismisses_autocomplete_and_blocks_stale_commit() {
    let scope = scope();
    let mut editor = Editor::from_text("{{ na }} plain text here");
    let doc = editor.document();
    let span = doc.top_level_spans()[0];
    let source = doc.source_of_span(span).unwrap();
    let run = doc.children(source)[0];
    editor.set_selection(Selection::caret(Point::new(run, 3)));

    editor.on_key(inlay_complete::Key::Character('m'), &scope);
    assert!(editor.autocomplete().is_active());

    // A pure caret move out of the scanned run drops the session, so a
    // commit afterwards must leave the document untouched.
    let plain = editor.document().children(editor.document().root())[1];
    editor.set_selection(Selection::caret(Point::new(plain, 6)));
    assert!(!editor.autocomplete().is_active());

    let outcome = editor.commit_completion(Instant::now());
    assert_eq!(outcome, inlay_complete::KeyOutcome::Ignored);
    assert_eq!(
        editor.document().text_content(editor.document().root()),
        "{{ na }} plain text here"
    );
}

#[test]
fn test_autocomplete_commit_flows_into_evaluation() {
    let scope = scope();
    let mut editor = Editor::from_text("{{ na }}");
    caret_in_source(&mut editor);
    // Pull the caret back to just after "na".
    let focus = editor.selection().focus;
    editor.set_selection(Selection::caret(Point::new(focus.node, focus.offset - 1)));

    let start = Instant::now();
    editor.on_key(inlay_complete::Key::Character('m'), &scope);
    assert!(editor.autocomplete().is_active());

    let outcome = editor.commit_completion(start);
    assert_eq!(outcome, inlay_complete::KeyOutcome::Handled);
    assert_eq!(editor.document().span_source(editor.document().top_level_spans()[0]), "name");

    let event = editor.tick(start + QUIET_PERIOD, &scope).unwrap();
    assert_eq!(event.updated.len(), 1);
    assert_eq!(
        render_summary(editor.document()).unwrap().result,
        Value::String("ada".into())
    );
}
