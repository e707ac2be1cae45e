//! Brace highlighting.
//!
//! When the caret sits inside either delimiter of a span, both of that
//! span's delimiters light up. Moving the caret anywhere else clears them.

use tracing::trace;

use crate::selection::Selection;
use crate::tree::{Document, NodeId};

/// Tracks which span currently has highlighted delimiters.
///
/// The tracked id can go stale when an edit removes the span; `sync`
/// tolerates that and just drops it.
#[derive(Debug, Default)]
pub struct BraceHighlighter {
    highlighted: Option<NodeId>,
}

impl BraceHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The span whose delimiters are currently highlighted, if any.
    pub fn highlighted_span(&self) -> Option<NodeId> {
        self.highlighted
    }

    /// Reconcile highlight flags with the current selection.
    ///
    /// Idempotent; safe to call after every edit and caret move.
    pub fn sync(&mut self, doc: &mut Document, selection: Option<&Selection>) {
        let target = selection
            .filter(|sel| sel.is_collapsed())
            .and_then(|sel| Self::span_at_caret(doc, sel));

        if target == self.highlighted && target.map_or(true, |span| doc.exists(span)) {
            return;
        }

        self.clear(doc);
        if let Some(span) = target {
            for delimiter in doc.delimiters_of_span(span) {
                doc.set_highlighted(delimiter, true);
            }
            trace!(?span, "highlighted span delimiters");
            self.highlighted = Some(span);
        }
    }

    /// Remove any active highlight.
    pub fn clear(&mut self, doc: &mut Document) {
        if let Some(span) = self.highlighted.take() {
            if doc.exists(span) {
                for delimiter in doc.delimiters_of_span(span) {
                    doc.set_highlighted(delimiter, false);
                }
            }
        }
    }

    /// The span to highlight for a collapsed caret, if the caret is in a
    /// delimiter.
    fn span_at_caret(doc: &Document, selection: &Selection) -> Option<NodeId> {
        let node = selection.focus.node;
        if !doc.exists(node) {
            return None;
        }
        let delimiter = if doc.is_delimiter(node) {
            node
        } else {
            doc.parent(node).filter(|&p| doc.is_delimiter(p))?
        };
        doc.enclosing_span(delimiter)
    }
}
