//! Autocomplete controller: a keystroke-driven state machine over the
//! document's selection.
//!
//! The controller scans on key-down, before the edit lands, so the match
//! set always reflects the text the user saw when they pressed the key.

use inlay_document::{Document, EditReport, NodeId, Point, Selection};
use inlay_eval::ScopeProvider;
use tracing::trace;

use crate::token::token_ending_at;

/// Keys the controller distinguishes. Everything else maps to `Other`.
///
/// `Modifier` covers Shift/Ctrl/Alt/Meta; together with the horizontal
/// arrows it passes through without disturbing the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Character(char),
    Backspace,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Modifier,
    Escape,
    Other,
}

/// Whether the controller consumed a keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
}

/// Where a suggestion came from. Only scope aliases today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Alias,
}

/// A single suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub value: String,
    pub kind: MatchKind,
}

/// The live suggestion list and its focused entry.
///
/// `token_node` pins the session to the text run the token was scanned in;
/// a commit anywhere else would splice unrelated text.
#[derive(Debug, Default)]
pub struct AutocompleteSession {
    matches: Vec<Match>,
    token_start: Option<usize>,
    token_node: Option<NodeId>,
    focus_index: usize,
}

impl AutocompleteSession {
    fn reset(&mut self) {
        self.matches.clear();
        self.token_start = None;
        self.token_node = None;
        self.focus_index = 0;
    }

    fn set_matches(&mut self, matches: Vec<Match>, token_start: usize, token_node: NodeId) {
        self.matches = matches;
        self.token_start = Some(token_start);
        self.token_node = Some(token_node);
        self.focus_index = 0;
    }
}

#[derive(Debug, Default)]
pub struct AutocompleteController {
    session: AutocompleteSession,
}

impl AutocompleteController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matches(&self) -> &[Match] {
        &self.session.matches
    }

    pub fn focus_index(&self) -> usize {
        self.session.focus_index
    }

    /// The suggestion a commit would insert.
    pub fn focused(&self) -> Option<&Match> {
        self.session.matches.get(self.session.focus_index)
    }

    pub fn is_active(&self) -> bool {
        !self.session.matches.is_empty()
    }

    /// Feed a key-down event, before the edit it causes is applied.
    pub fn on_key(
        &mut self,
        key: Key,
        doc: &Document,
        selection: &Selection,
        scope: &dyn ScopeProvider,
    ) -> KeyOutcome {
        match key {
            Key::ArrowUp => {
                if self.is_active() {
                    self.move_up();
                    return KeyOutcome::Handled;
                }
                KeyOutcome::Ignored
            }
            Key::ArrowDown => {
                if self.is_active() {
                    self.move_down();
                    return KeyOutcome::Handled;
                }
                KeyOutcome::Ignored
            }
            Key::Escape => {
                let was_active = self.is_active();
                self.session.reset();
                if was_active {
                    KeyOutcome::Handled
                } else {
                    KeyOutcome::Ignored
                }
            }
            Key::ArrowLeft | Key::ArrowRight | Key::Modifier => KeyOutcome::Ignored,
            Key::Backspace | Key::Other => {
                self.session.reset();
                KeyOutcome::Ignored
            }
            Key::Character(_) => {
                self.rescan(doc, selection, scope);
                KeyOutcome::Ignored
            }
        }
    }

    /// Move the focus one entry up, clamped.
    pub fn move_up(&mut self) {
        self.session.focus_index = self.session.focus_index.saturating_sub(1);
    }

    /// Move the focus one entry down, clamped.
    pub fn move_down(&mut self) {
        if !self.session.matches.is_empty() {
            let last = self.session.matches.len() - 1;
            self.session.focus_index = (self.session.focus_index + 1).min(last);
        }
    }

    /// Replace the scanned token with the focused suggestion.
    ///
    /// No-op unless a match is focused and the selection is a collapsed
    /// caret in a text run. Clears the session on success and returns the
    /// selection after the splice.
    pub fn commit(&mut self, doc: &mut Document, selection: &Selection) -> Option<Selection> {
        let value = self.focused()?.value.clone();
        let token_start = self.session.token_start?;
        let token_node = self.session.token_node?;

        if !selection.is_collapsed() {
            return None;
        }
        let caret = selection.focus;
        if caret.node != token_node || !doc.exists(caret.node) || !doc.is_text(caret.node) {
            return None;
        }
        if caret.offset < token_start {
            return None;
        }

        doc.splice_text(caret.node, token_start, caret.offset - token_start, &value);
        let end = token_start + value.chars().count();
        trace!(token_start, %value, "committed autocomplete suggestion");

        self.session.reset();
        Some(Selection::caret(Point::new(caret.node, end)))
    }

    /// React to a completed document edit.
    ///
    /// The session survives only while edits keep landing in the caret's
    /// own run; anything else means the context the matches were computed
    /// against is gone.
    pub fn on_document_update(&mut self, report: &EditReport, selection: &Selection) {
        if !self.is_active() {
            return;
        }
        if !selection.is_collapsed() || !report.is_dirty(selection.focus.node) {
            self.session.reset();
        }
    }

    /// React to a pure caret move, with no edit attached.
    ///
    /// The session is pinned to the run the token was scanned in; a caret
    /// in any other node dismisses it.
    pub fn on_selection_change(&mut self, selection: &Selection) {
        if !self.is_active() {
            return;
        }
        if !selection.is_collapsed() || Some(selection.focus.node) != self.session.token_node {
            self.session.reset();
        }
    }

    fn rescan(&mut self, doc: &Document, selection: &Selection, scope: &dyn ScopeProvider) {
        if !selection.is_collapsed() {
            self.session.reset();
            return;
        }
        let caret = selection.focus;
        if !doc.exists(caret.node) || !doc.is_text(caret.node) || !doc.is_in_source(caret.node) {
            self.session.reset();
            return;
        }
        let Some(text) = doc.text(caret.node) else {
            self.session.reset();
            return;
        };

        match token_ending_at(text, caret.offset) {
            Some((start, token)) => {
                let matches = scope
                    .search(token)
                    .into_iter()
                    .map(|value| Match {
                        value,
                        kind: MatchKind::Alias,
                    })
                    .collect::<Vec<_>>();
                trace!(token, count = matches.len(), "autocomplete rescan");
                self.session.set_matches(matches, start, caret.node);
            }
            None => self.session.reset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inlay_eval::{MapScope, Value};

    fn scope() -> MapScope {
        let mut scope = MapScope::new();
        scope.insert("alpha", Value::Number(1.0));
        scope.insert("alphabet", Value::Number(2.0));
        scope.insert("beta", Value::Number(3.0));
        scope
    }

    /// A document whose single span's source run holds the given text, with
    /// a caret at its end.
    fn doc_with_source(source: &str) -> (Document, Selection) {
        let doc = Document::from_text(&format!("{{{{{source}}}}}"));
        let span = doc.top_level_spans()[0];
        let source_node = doc.source_of_span(span).unwrap();
        let run = doc.children(source_node)[0];
        let caret = Selection::caret(Point::new(run, doc.text_len(run)));
        (doc, caret)
    }

    #[test]
    fn test_character_key_scans_token_and_searches_scope() {
        let (doc, caret) = doc_with_source(" alp");
        let mut controller = AutocompleteController::new();

        let outcome = controller.on_key(Key::Character('h'), &doc, &caret, &scope());
        assert_eq!(outcome, KeyOutcome::Ignored);
        let names: Vec<&str> = controller.matches().iter().map(|m| m.value.as_str()).collect();
        assert_eq!(names, ["alpha", "alphabet"]);
        assert_eq!(controller.focus_index(), 0);
    }

    #[test]
    fn test_arrow_keys_move_focus_clamped_without_wrap() {
        let (doc, caret) = doc_with_source(" alp");
        let mut controller = AutocompleteController::new();
        controller.on_key(Key::Character('h'), &doc, &caret, &scope());

        assert_eq!(controller.on_key(Key::ArrowUp, &doc, &caret, &scope()), KeyOutcome::Handled);
        assert_eq!(controller.focus_index(), 0);

        controller.on_key(Key::ArrowDown, &doc, &caret, &scope());
        controller.on_key(Key::ArrowDown, &doc, &caret, &scope());
        controller.on_key(Key::ArrowDown, &doc, &caret, &scope());
        assert_eq!(controller.focus_index(), 1);
    }

    #[test]
    fn test_arrows_pass_through_when_inactive() {
        let (doc, caret) = doc_with_source(" x");
        let mut controller = AutocompleteController::new();
        assert_eq!(controller.on_key(Key::ArrowDown, &doc, &caret, &scope()), KeyOutcome::Ignored);
    }

    #[test]
    fn test_commit_replaces_token_and_clears_session() {
        let (mut doc, caret) = doc_with_source(" a");
        let mut controller = AutocompleteController::new();
        // Scan sees the token "a" (the caret is right after it).
        controller.on_key(Key::Character('l'), &doc, &caret, &scope());
        controller.move_down();

        let after = controller.commit(&mut doc, &caret).unwrap();
        let run = caret.focus.node;
        assert_eq!(doc.text(run), Some(" alphabet"));
        assert_eq!(after.focus, Point::new(run, 9));
        assert!(!controller.is_active());
    }

    #[test]
    fn test_commit_without_session_is_noop() {
        let (mut doc, caret) = doc_with_source(" a");
        let mut controller = AutocompleteController::new();
        assert!(controller.commit(&mut doc, &caret).is_none());
        assert_eq!(doc.span_source(doc.top_level_spans()[0]), "a");
    }

    #[test]
    fn test_backspace_resets() {
        let (doc, caret) = doc_with_source(" alp");
        let mut controller = AutocompleteController::new();
        controller.on_key(Key::Character('h'), &doc, &caret, &scope());
        assert!(controller.is_active());

        controller.on_key(Key::Backspace, &doc, &caret, &scope());
        assert!(!controller.is_active());
    }

    #[test]
    fn test_caret_outside_source_resets() {
        let doc = Document::from_text("hi {{ alp }}");
        let plain = doc.children(doc.root())[0];
        let span = doc.top_level_spans()[0];
        let source_node = doc.source_of_span(span).unwrap();
        let run = doc.children(source_node)[0];

        let mut controller = AutocompleteController::new();
        let in_source = Selection::caret(Point::new(run, 4));
        controller.on_key(Key::Character('h'), &doc, &in_source, &scope());
        assert!(controller.is_active());

        let outside = Selection::caret(Point::new(plain, 1));
        controller.on_key(Key::Character('x'), &doc, &outside, &scope());
        assert!(!controller.is_active());
    }

    #[test]
    fn test_document_update_elsewhere_resets() {
        let (mut doc, caret) = doc_with_source(" alp");
        let mut controller = AutocompleteController::new();
        controller.on_key(Key::Character('h'), &doc, &caret, &scope());
        assert!(controller.is_active());

        // An edit in a different run invalidates the session.
        let plain = doc.insert_text(&Selection::caret(Point::new(doc.root(), 0)), "x");
        controller.on_document_update(&plain, &caret);
        assert!(!controller.is_active());
    }

    #[test]
    fn test_caret_move_to_another_node_resets() {
        let (doc, caret) = doc_with_source(" alp");
        let mut controller = AutocompleteController::new();
        controller.on_key(Key::Character('h'), &doc, &caret, &scope());
        assert!(controller.is_active());

        // Moving within the scanned run keeps the session alive.
        controller.on_selection_change(&Selection::caret(Point::new(caret.focus.node, 1)));
        assert!(controller.is_active());

        let span = doc.top_level_spans()[0];
        let open_run = doc.children(doc.delimiters_of_span(span)[0])[0];
        controller.on_selection_change(&Selection::caret(Point::new(open_run, 1)));
        assert!(!controller.is_active());
    }

    #[test]
    fn test_commit_with_caret_in_another_node_is_noop() {
        let mut doc = Document::from_text("{{ alp }} plain text here");
        let span = doc.top_level_spans()[0];
        let source_node = doc.source_of_span(span).unwrap();
        let run = doc.children(source_node)[0];
        let in_source = Selection::caret(Point::new(run, 4));

        let mut controller = AutocompleteController::new();
        controller.on_key(Key::Character('h'), &doc, &in_source, &scope());
        assert!(controller.is_active());

        // A stale session must not splice whatever run the caret is in now.
        let plain = doc.children(doc.root())[1];
        let moved = Selection::caret(Point::new(plain, 6));
        assert!(controller.commit(&mut doc, &moved).is_none());
        assert_eq!(doc.text(plain), Some(" plain text here"));
    }

    #[test]
    fn test_modifier_and_horizontal_arrows_pass_through() {
        let (doc, caret) = doc_with_source(" alp");
        let mut controller = AutocompleteController::new();
        controller.on_key(Key::Character('h'), &doc, &caret, &scope());

        for key in [Key::Modifier, Key::ArrowLeft, Key::ArrowRight] {
            assert_eq!(controller.on_key(key, &doc, &caret, &scope()), KeyOutcome::Ignored);
            assert!(controller.is_active());
        }

        // Unclassified keys still dismiss the list.
        controller.on_key(Key::Other, &doc, &caret, &scope());
        assert!(!controller.is_active());
    }

    #[test]
    fn test_token_at_source_start_never_matches() {
        // No boundary before the token, so no scan.
        let (doc, caret) = doc_with_source("alp");
        let mut controller = AutocompleteController::new();
        controller.on_key(Key::Character('h'), &doc, &caret, &scope());
        assert!(!controller.is_active());
    }
}
