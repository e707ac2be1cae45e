//! Text edit entry points.
//!
//! The host feeds keystroke-level edits in here; each edit splices a text
//! run, runs the reparse engine to a fixpoint, and normalizes adjacent
//! top-level runs, all before the edit is considered done.

use crate::reparse::reparse_after_text_edit;
use crate::selection::{Point, Selection};
use crate::tree::{Document, NodeId};

/// What an edit did: the resulting selection plus the dirty information the
/// scheduler and autocomplete controller consume.
#[derive(Debug, Clone)]
pub struct EditReport {
    /// Selection after the edit and all restructuring.
    pub selection: Selection,
    /// Nodes whose text or structure changed.
    pub dirty: Vec<NodeId>,
    /// Whether any node was removed or replaced.
    pub removed_any: bool,
    /// Whether text under a source node changed.
    pub touched_source: bool,
}

impl EditReport {
    /// Whether this edit should arm the re-evaluation debounce.
    pub fn qualifies_for_eval(&self) -> bool {
        self.touched_source || self.removed_any
    }

    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.dirty.contains(&id)
    }
}

impl Document {
    /// Build a document from plain text, promoting every `{{…}}` pattern.
    pub fn from_text(text: &str) -> Self {
        let mut doc = Document::new();
        if !text.is_empty() {
            let run = doc.create_text(text);
            let root = doc.root();
            doc.append_child(root, run);
            let mut selection = Selection::caret(Point::new(run, 0));
            reparse_after_text_edit(&mut doc, run, &mut selection);
        }
        doc
    }

    /// Insert text at the selection.
    ///
    /// A non-collapsed selection within a single text run is replaced;
    /// otherwise the selection collapses to its focus first.
    pub fn insert_text(&mut self, selection: &Selection, text: &str) -> EditReport {
        let mut sel = *selection;

        if !sel.is_collapsed() {
            if sel.anchor.node == sel.focus.node && self.is_text(sel.anchor.node) {
                let start = sel.anchor.offset.min(sel.focus.offset);
                let end = sel.anchor.offset.max(sel.focus.offset);
                self.splice_text(sel.anchor.node, start, end - start, "");
                sel = Selection::caret(Point::new(sel.anchor.node, start));
            } else {
                sel = sel.collapse_to_focus();
            }
        }

        let (target, offset) = self.resolve_insertion_point(sel.focus);
        self.splice_text(target, offset, 0, text);
        let sel = Selection::caret(Point::new(target, offset + text.chars().count()));

        self.finish_edit(target, sel)
    }

    /// Delete one character before the caret.
    ///
    /// At the start of a run this reaches into the previous text run in
    /// document order, which is how delimiter characters get deleted from
    /// the outside.
    pub fn delete_backward(&mut self, selection: &Selection) -> EditReport {
        let sel = *selection;

        if !sel.is_collapsed() {
            // Range deletion is an insert of nothing.
            return self.insert_text(&sel, "");
        }

        let point = sel.focus;
        let target = if self.is_text(point.node) && point.offset > 0 {
            Some((point.node, point.offset - 1))
        } else {
            self.previous_text_position(point)
        };

        let Some((node, offset)) = target else {
            // Nothing before the caret; the edit is a no-op.
            return EditReport {
                selection: sel,
                dirty: Vec::new(),
                removed_any: false,
                touched_source: false,
            };
        };

        self.splice_text(node, offset, 1, "");
        let sel = Selection::caret(Point::new(node, offset));
        self.finish_edit(node, sel)
    }

    fn finish_edit(&mut self, target: NodeId, mut sel: Selection) -> EditReport {
        let touched_source_directly = self.is_in_source(target);
        let outcome = reparse_after_text_edit(self, target, &mut sel);

        let root = self.root();
        self.merge_adjacent_text_runs(root, Some(&mut sel));

        let mut dirty = outcome.dirty;
        if self.exists(target) && !dirty.contains(&target) {
            dirty.push(target);
        }

        EditReport {
            selection: sel,
            dirty,
            removed_any: outcome.removed_any,
            touched_source: outcome.touched_source || touched_source_directly,
        }
    }

    /// Find the text run and offset an insertion at `point` lands in.
    fn resolve_insertion_point(&mut self, point: Point) -> (NodeId, usize) {
        if self.is_text(point.node) {
            let len = self.text_len(point.node);
            return (point.node, point.offset.min(len));
        }

        // Caret in an element: materialize a text run at the child index.
        let run = self.create_text("");
        let children = self.children(point.node).to_vec();
        if let Some(&reference) = children.get(point.offset) {
            self.insert_sibling_before(reference, run);
        } else {
            self.append_child(point.node, run);
        }
        (run, 0)
    }

    /// The last character position strictly before `point`, if any.
    fn previous_text_position(&self, point: Point) -> Option<(NodeId, usize)> {
        let runs = self.text_runs();
        let caret_run = if self.is_text(point.node) {
            Some(point.node)
        } else {
            None
        };

        let before: Vec<NodeId> = match caret_run {
            Some(run) => {
                let index = runs.iter().position(|&r| r == run)?;
                runs[..index].to_vec()
            }
            None => runs,
        };

        before
            .into_iter()
            .rev()
            .find(|&run| self.text_len(run) > 0)
            .map(|run| (run, self.text_len(run) - 1))
    }
}
