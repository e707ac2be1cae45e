//! The cached evaluation result attached to every expression span.

use serde::Serialize;

use crate::error::FaultKind;
use crate::value::Value;

/// The evaluation state of an expression span.
///
/// `NotRun` exists only between span creation and the first evaluation
/// cycle that reaches it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum EvalOutcome {
    NotRun,
    Success { value: Value },
    Error { kind: FaultKind, message: String },
}

impl EvalOutcome {
    pub fn success(value: Value) -> Self {
        EvalOutcome::Success { value }
    }

    pub fn error(kind: FaultKind, message: impl Into<String>) -> Self {
        EvalOutcome::Error {
            kind,
            message: message.into(),
        }
    }

    /// Whether the span should render as valid (not yet run counts as valid).
    pub fn is_valid(&self) -> bool {
        matches!(self, EvalOutcome::NotRun | EvalOutcome::Success { .. })
    }

    /// The success value's string conversion, or empty for anything else.
    pub fn string_value(&self) -> String {
        match self {
            EvalOutcome::Success { value } => value.to_display_string(),
            _ => String::new(),
        }
    }
}

impl Default for EvalOutcome {
    fn default() -> Self {
        EvalOutcome::NotRun
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity() {
        assert!(EvalOutcome::NotRun.is_valid());
        assert!(EvalOutcome::success(Value::Number(1.0)).is_valid());
        assert!(!EvalOutcome::error(FaultKind::TypeError, "boom").is_valid());
    }

    #[test]
    fn test_string_value() {
        assert_eq!(EvalOutcome::success(Value::Number(2.0)).string_value(), "2");
        assert_eq!(EvalOutcome::NotRun.string_value(), "");
        assert_eq!(
            EvalOutcome::error(FaultKind::SyntaxError, "bad").string_value(),
            ""
        );
    }
}
