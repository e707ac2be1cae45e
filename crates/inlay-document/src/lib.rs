//! Structural document model for text with embedded expression spans.
//!
//! A document is a tree of text runs and expression spans. A span always
//! has exactly three children: an opening delimiter, a source node, and a
//! closing delimiter. Edits go through [`Document::insert_text`] and
//! [`Document::delete_backward`], which keep that shape as an invariant by
//! promoting newly typed `{{…}}` patterns into spans and demoting spans
//! whose delimiters no longer read `{{` or `}}`.

mod edit;
mod highlight;
mod reparse;
mod selection;
mod tree;

pub use edit::EditReport;
pub use highlight::BraceHighlighter;
pub use selection::{Point, Selection};
pub use tree::{DelimiterSide, Document, NodeId};
