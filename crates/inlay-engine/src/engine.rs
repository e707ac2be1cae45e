//! The editor facade: one object owning the document, the brace
//! highlighter, the autocomplete controller, and the evaluation scheduler,
//! wired together the way a host embeds them.

use std::time::Instant;

use inlay_complete::{AutocompleteController, Key, KeyOutcome};
use inlay_document::{BraceHighlighter, Document, EditReport, NodeId, Point, Selection};
use inlay_eval::{evaluate, ScopeProvider};
use tracing::debug;

use crate::scheduler::EvalScheduler;

/// Fired after an evaluation cycle; the one notification a rendering layer
/// listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatedEvent {
    /// Spans whose cached outcome was rewritten this cycle.
    pub updated: Vec<NodeId>,
}

pub struct Editor {
    document: Document,
    selection: Selection,
    highlighter: BraceHighlighter,
    autocomplete: AutocompleteController,
    scheduler: EvalScheduler,
}

impl Editor {
    pub fn new() -> Self {
        Self::from_text("")
    }

    /// Open a document, promoting every expression pattern in the text.
    /// The caret starts at the end of the document.
    pub fn from_text(text: &str) -> Self {
        let document = Document::from_text(text);
        let root = document.root();
        let selection = Selection::caret(Point::new(root, document.children(root).len()));
        Editor {
            document,
            selection,
            highlighter: BraceHighlighter::new(),
            autocomplete: AutocompleteController::new(),
            scheduler: EvalScheduler::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn autocomplete(&self) -> &AutocompleteController {
        &self.autocomplete
    }

    pub fn scheduler(&self) -> &EvalScheduler {
        &self.scheduler
    }

    /// Move the caret without editing. Highlighting follows the caret and
    /// a caret outside the scanned run dismisses the autocomplete session.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.highlighter
            .sync(&mut self.document, Some(&self.selection));
        self.autocomplete.on_selection_change(&self.selection);
    }

    /// Feed a key-down event before applying the edit it stands for.
    /// `Handled` means the host must not apply the default edit.
    pub fn on_key(&mut self, key: Key, scope: &dyn ScopeProvider) -> KeyOutcome {
        self.autocomplete
            .on_key(key, &self.document, &self.selection, scope)
    }

    pub fn insert_text(&mut self, text: &str, now: Instant) -> EditReport {
        let report = self.document.insert_text(&self.selection, text);
        self.after_edit(&report, now);
        report
    }

    pub fn delete_backward(&mut self, now: Instant) -> EditReport {
        let report = self.document.delete_backward(&self.selection);
        self.after_edit(&report, now);
        report
    }

    /// Accept the focused autocomplete suggestion, if any.
    pub fn commit_completion(&mut self, now: Instant) -> KeyOutcome {
        match self.autocomplete.commit(&mut self.document, &self.selection) {
            Some(selection) => {
                self.selection = selection;
                self.highlighter
                    .sync(&mut self.document, Some(&self.selection));
                // The committed text changed a source, so evaluation is due.
                self.scheduler.note_mutation(now);
                KeyOutcome::Handled
            }
            None => KeyOutcome::Ignored,
        }
    }

    fn after_edit(&mut self, report: &EditReport, now: Instant) {
        self.selection = report.selection;
        self.highlighter
            .sync(&mut self.document, Some(&self.selection));
        self.autocomplete.on_document_update(report, &self.selection);
        if report.qualifies_for_eval() {
            self.scheduler.note_mutation(now);
        }
    }

    /// Evaluate every span against the scope.
    ///
    /// Two phases: read every span's source and compute its outcome, then
    /// write all outcomes back. Reads never interleave with writes, so an
    /// observer sees either the old document or the new one.
    pub fn run_eval_cycle(&mut self, scope: &dyn ScopeProvider) -> EvaluatedEvent {
        let spans = self.document.top_level_spans();

        let outcomes: Vec<_> = spans
            .iter()
            .map(|&span| {
                let source = self.document.span_source(span);
                (span, evaluate(&source, scope))
            })
            .collect();

        let mut updated = Vec::with_capacity(outcomes.len());
        for (span, outcome) in outcomes {
            self.document.set_span_outcome(span, outcome);
            updated.push(span);
        }

        self.scheduler.cancel();
        debug!(spans = updated.len(), "evaluation cycle complete");
        EvaluatedEvent { updated }
    }

    /// Run a cycle iff the debounce deadline has elapsed.
    pub fn tick(&mut self, now: Instant, scope: &dyn ScopeProvider) -> Option<EvaluatedEvent> {
        if self.scheduler.take_due(now) {
            Some(self.run_eval_cycle(scope))
        } else {
            None
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inlay_eval::{EvalOutcome, MapScope, Value};

    #[test]
    fn test_eval_cycle_writes_every_span_outcome() {
        let mut scope = MapScope::new();
        scope.insert("x", Value::Number(5.0));
        let mut editor = Editor::from_text("a {{ x + 1 }} b {{ y }}");

        let event = editor.run_eval_cycle(&scope);
        assert_eq!(event.updated.len(), 2);

        let doc = editor.document();
        let spans = doc.top_level_spans();
        assert_eq!(
            doc.span_outcome(spans[0]),
            Some(&EvalOutcome::success(Value::Number(6.0)))
        );
        assert!(matches!(
            doc.span_outcome(spans[1]),
            Some(EvalOutcome::Error { .. })
        ));
    }

    #[test]
    fn test_spans_start_not_run() {
        let editor = Editor::from_text("{{ 1 + 1 }}");
        let doc = editor.document();
        let span = doc.top_level_spans()[0];
        assert_eq!(doc.span_outcome(span), Some(&EvalOutcome::NotRun));
    }

    #[test]
    fn test_fault_is_isolated_to_its_span() {
        let scope = MapScope::new();
        let mut editor = Editor::from_text("{{ nope }} {{ 2 * 3 }}");
        editor.run_eval_cycle(&scope);

        let doc = editor.document();
        let spans = doc.top_level_spans();
        assert!(!doc.span_outcome(spans[0]).unwrap().is_valid());
        assert_eq!(
            doc.span_outcome(spans[1]),
            Some(&EvalOutcome::success(Value::Number(6.0)))
        );
    }
}
