//! Aggregate rendering: derive one display result from a whole document.
//!
//! A document that is nothing but a single expression passes its outcome
//! through untouched, types and all. Anything mixed flattens to a string,
//! with faulted and not-yet-run spans contributing nothing.

use inlay_document::Document;
use inlay_eval::{EvalOutcome, FaultKind, Value};
use serde::Serialize;

/// The document-level result a host displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSummary {
    pub result: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RenderError>,
}

/// The error half of a summary whose single span faulted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderError {
    pub kind: FaultKind,
    pub message: String,
}

/// Summarize the document's evaluated state.
///
/// `None` for an empty document and for a lone span that has not been
/// evaluated yet.
pub fn render_summary(doc: &Document) -> Option<RenderSummary> {
    let children = doc.children(doc.root());
    if children.is_empty() {
        return None;
    }

    if let [only] = children {
        if doc.is_span(*only) {
            return match doc.span_outcome(*only)? {
                EvalOutcome::NotRun => None,
                EvalOutcome::Success { value } => Some(RenderSummary {
                    result: value.clone(),
                    error: None,
                }),
                EvalOutcome::Error { kind, message } => Some(RenderSummary {
                    result: Value::String(String::new()),
                    error: Some(RenderError {
                        kind: *kind,
                        message: message.clone(),
                    }),
                }),
            };
        }
    }

    let mut out = String::new();
    for &child in children {
        if doc.is_span(child) {
            if let Some(outcome) = doc.span_outcome(child) {
                out.push_str(&outcome.string_value());
            }
        } else {
            out.push_str(&doc.text_content(child));
        }
    }

    Some(RenderSummary {
        result: Value::String(out),
        error: None,
    })
}
