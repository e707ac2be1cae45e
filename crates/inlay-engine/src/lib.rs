//! Ties the document model, evaluator, and autocomplete together behind an
//! [`Editor`] facade, with debounced re-evaluation and document-level
//! rendering.

mod engine;
mod render;
mod scheduler;

pub use engine::{Editor, EvaluatedEvent};
pub use render::{render_summary, RenderError, RenderSummary};
pub use scheduler::{EvalScheduler, QUIET_PERIOD};
