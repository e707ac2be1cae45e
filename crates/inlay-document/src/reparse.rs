//! Incremental reparse: promotion and demotion/repair transforms.
//!
//! Both transforms run per mutated text node and re-apply until the node
//! reaches one of three stable shapes: a well-formed span, fully collapsed
//! plain text, or a span with adjusted leading/trailing plain text.

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use crate::selection::{Point, Selection};
use crate::tree::{DelimiterSide, Document, NodeId};

/// Non-greedy: the first `}}` after a `{{` always closes it.
static EXPRESSION_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(.*?)\}\}").unwrap());

/// What a reparse pass did, for dirty tracking.
#[derive(Debug, Default)]
pub(crate) struct ReparseOutcome {
    pub dirty: Vec<NodeId>,
    pub removed_any: bool,
    pub touched_source: bool,
}

/// Restructure the tree after a text mutation in `start`.
///
/// Runs a worklist: transforms can surface new text runs (collapsed spans,
/// overflow moved to the top level) that themselves need rescanning.
pub(crate) fn reparse_after_text_edit(
    doc: &mut Document,
    start: NodeId,
    selection: &mut Selection,
) -> ReparseOutcome {
    let mut out = ReparseOutcome::default();
    let mut queue = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
        if !doc.exists(node) || !doc.is_text(node) {
            continue;
        }
        let Some(parent) = doc.parent(node) else {
            continue;
        };
        if doc.is_root(parent) {
            promote_runs(doc, node, selection, &mut out);
        } else if doc.is_delimiter(parent) {
            repair_delimiter_run(doc, node, selection, &mut out, &mut queue);
        } else if doc.is_source(parent) {
            out.touched_source = true;
            out.dirty.push(node);
        }
    }

    out
}

/// Promotion: convert every `{{…}}` match in a top-level run into a span.
fn promote_runs(
    doc: &mut Document,
    run: NodeId,
    selection: &mut Selection,
    out: &mut ReparseOutcome,
) {
    let mut current = run;
    loop {
        let text = match doc.text(current) {
            Some(text) => text.to_string(),
            None => break,
        };
        let Some(found) = EXPRESSION_PATTERN.find(&text) else {
            break;
        };

        let start = text[..found.start()].chars().count();
        let end = start + found.as_str().chars().count();
        let total = text.chars().count();
        trace!(start, end, "promoting expression match");

        let parts = doc.split_text_run(current, &[start, end], Some(selection));
        let matched = if start > 0 { parts[1] } else { parts[0] };
        let trailing = (end < total).then(|| *parts.last().expect("split produced segments"));

        let span = wrap_in_span(doc, matched, selection);
        out.dirty.push(span);
        out.removed_any = true;

        match trailing {
            Some(next) => current = next,
            None => break,
        }
    }
}

/// Build an expression span around a run whose text is exactly one match.
fn wrap_in_span(doc: &mut Document, matched: NodeId, selection: &mut Selection) -> NodeId {
    let total = doc.text_len(matched);
    debug_assert!(total >= 4, "a match is at least the two delimiters");

    let span = doc.create_span();
    doc.insert_sibling_before(matched, span);

    let open = doc.create_delimiter(DelimiterSide::Open);
    let source = doc.create_source();
    let close = doc.create_delimiter(DelimiterSide::Close);

    let parts = doc.split_text_run(matched, &[2, total - 2], Some(selection));
    let (open_run, source_run, close_run) = match parts.len() {
        // `{{}}` splits into just the two delimiters; the source is empty.
        2 => (parts[0], None, parts[1]),
        3 => (parts[0], Some(parts[1]), parts[2]),
        n => unreachable!("match split produced {} segments", n),
    };

    doc.append_child(open, open_run);
    if let Some(source_run) = source_run {
        doc.append_child(source, source_run);
    }
    doc.append_child(close, close_run);
    doc.append_child(span, open);
    doc.append_child(span, source);
    doc.append_child(span, close);

    debug!(?span, "promoted text into expression span");
    span
}

/// Demotion/repair: restore a delimiter run to its canonical text or break
/// the span apart.
fn repair_delimiter_run(
    doc: &mut Document,
    run: NodeId,
    selection: &mut Selection,
    out: &mut ReparseOutcome,
    queue: &mut VecDeque<NodeId>,
) {
    let mut current = run;
    loop {
        if !doc.exists(current) {
            break;
        }
        let Some(parent) = doc.parent(current) else {
            break;
        };
        let Some(side) = doc.delimiter_side(parent) else {
            // The run was moved out of the delimiter by an earlier pass.
            queue.push_back(current);
            break;
        };
        let Some(span) = doc.enclosing_span(parent) else {
            break;
        };

        let braces = side.canonical();
        let text = match doc.text(current) {
            Some(text) => text.to_string(),
            None => break,
        };

        if text == braces {
            break;
        }

        if !text.contains(braces) {
            collapse_span(doc, span, selection, out, queue);
            break;
        }

        if text.starts_with(braces) {
            // Trailing remainder: move the text right of the delimiter out.
            let parts = doc.split_text_run(current, &[2], Some(selection));
            let rest = parts[1];
            let rest_len = doc.text_len(rest);
            match side {
                DelimiterSide::Open => {
                    // Merges with the adjoining source.
                    let source = doc
                        .source_of_span(span)
                        .expect("span retains its source during repair");
                    if let Some(&first) = doc.children(source).first() {
                        doc.insert_sibling_before(first, rest);
                        doc.merge_text_pair(rest, first, Some(selection));
                    } else {
                        doc.append_child(source, rest);
                    }
                    *selection = Selection::caret(Point::new(rest, rest_len));
                    out.touched_source = true;
                }
                DelimiterSide::Close => {
                    // No node to merge with inside the span; it goes next to it.
                    doc.insert_sibling_after(span, rest);
                    *selection = Selection::caret(Point::new(rest, rest_len));
                    queue.push_back(rest);
                }
            }
            out.dirty.push(span);
            debug!(?span, ?side, "split delimiter overflow out of span");
            continue;
        }

        // Leading remainder: move the text left of the delimiter out.
        let split_at = text
            .find(braces)
            .map(|byte| text[..byte].chars().count())
            .expect("delimiter substring present");
        let parts = doc.split_text_run(current, &[split_at], Some(selection));
        let leading = parts[0];
        let remainder = parts[1];
        match side {
            DelimiterSide::Close => {
                let source = doc
                    .source_of_span(span)
                    .expect("span retains its source during repair");
                if let Some(&last) = doc.children(source).last() {
                    doc.insert_sibling_after(last, leading);
                    let merged = doc.merge_text_pair(last, leading, Some(selection));
                    let merged_len = doc.text_len(merged);
                    *selection = Selection::caret(Point::new(merged, merged_len));
                } else {
                    let leading_len = doc.text_len(leading);
                    doc.append_child(source, leading);
                    *selection = Selection::caret(Point::new(leading, leading_len));
                }
                out.touched_source = true;
            }
            DelimiterSide::Open => {
                let leading_len = doc.text_len(leading);
                doc.insert_sibling_before(span, leading);
                *selection = Selection::caret(Point::new(leading, leading_len));
                queue.push_back(leading);
            }
        }
        out.dirty.push(span);
        debug!(?span, ?side, "split leading delimiter overflow out of span");
        current = remainder;
    }
}

/// Collapse a broken span into a single plain-text run.
///
/// Selection points inside the span are remapped by their absolute offset
/// in the flattened text: open-side breaks keep their offsets, close-side
/// breaks shift by the length consumed up to the breaking run.
fn collapse_span(
    doc: &mut Document,
    span: NodeId,
    selection: &mut Selection,
    out: &mut ReparseOutcome,
    queue: &mut VecDeque<NodeId>,
) {
    let flat = doc.text_content(span);

    // Absolute character offset of each text run inside the span.
    let runs = doc.text_runs_under(span);
    let mut starts = Vec::with_capacity(runs.len());
    let mut acc = 0;
    for &run in &runs {
        starts.push((run, acc));
        acc += doc.text_len(run);
    }

    let replacement = doc.replace_with_text(span, flat);
    selection.remap(|point| {
        match starts.iter().find(|(run, _)| *run == point.node) {
            Some((_, start)) => Point::new(replacement, start + point.offset),
            None => point,
        }
    });

    debug!(?span, ?replacement, "collapsed broken span into plain text");
    out.removed_any = true;
    out.dirty.push(replacement);
    queue.push_back(replacement);
}
