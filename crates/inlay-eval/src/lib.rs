//! Sandboxed evaluation of expression-span source text.
//!
//! The evaluator treats span source as a single implicit-return expression,
//! resolves free identifiers through a [`ScopeProvider`], and classifies the
//! result into a typed [`Value`] or a categorized [`EvalOutcome::Error`].
//! Faults are modeled as [`EvalFault`] and propagate internally with Rust's
//! `?` operator; none escape [`evaluate`].

mod error;
mod interp;
mod lexer;
mod outcome;
mod parser;
mod scope;
mod value;

pub use error::{EvalFault, FaultKind};
pub use outcome::EvalOutcome;
pub use scope::{MapScope, ScopeBindings, ScopeProvider};
pub use value::{display_value, Value, ValueKind};

/// Result type for evaluator internals.
pub type Result<T> = std::result::Result<T, EvalFault>;

/// Evaluate span source against a scope.
///
/// Blank or whitespace-only source is an empty string result and never
/// reaches the parser. Everything else runs lex → parse → interpret in a
/// fresh context; two calls with identical source and identical observable
/// scope answers yield identical outcomes.
pub fn evaluate(source: &str, scope: &dyn ScopeProvider) -> EvalOutcome {
    if source.trim().is_empty() {
        return EvalOutcome::success(Value::String(String::new()));
    }

    let bindings = ScopeBindings::new(scope);
    let evaluated = parser::parse(source).and_then(|expr| interp::eval_expr(&expr, &bindings));

    match evaluated {
        Ok(value) => EvalOutcome::success(value),
        Err(fault) => EvalOutcome::error(fault.kind(), fault.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_source_is_empty_string() {
        let scope = MapScope::new();
        let expected = EvalOutcome::success(Value::String(String::new()));
        assert_eq!(evaluate("", &scope), expected);
        assert_eq!(evaluate("   ", &scope), expected);
        assert_eq!(evaluate("\t\n", &scope), expected);
    }

    #[test]
    fn test_number_classification() {
        let scope = MapScope::new();
        assert_eq!(
            evaluate("1+1", &scope),
            EvalOutcome::success(Value::Number(2.0))
        );
    }

    #[test]
    fn test_string_classification() {
        let scope = MapScope::new();
        assert_eq!(
            evaluate("'a'+'b'", &scope),
            EvalOutcome::success(Value::String("ab".into()))
        );
    }

    #[test]
    fn test_unresolved_identifier_is_reference_error() {
        let scope = MapScope::new();
        match evaluate("undefinedVar", &scope) {
            EvalOutcome::Error { kind, message } => {
                assert_eq!(kind, FaultKind::ReferenceError);
                assert!(message.contains("undefinedVar"));
            }
            other => panic!("expected a reference error, got {:?}", other),
        }
    }

    #[test]
    fn test_syntax_error_classification() {
        let scope = MapScope::new();
        match evaluate("1 +", &scope) {
            EvalOutcome::Error { kind, .. } => assert_eq!(kind, FaultKind::SyntaxError),
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_determinism() {
        let mut scope = MapScope::new();
        scope.insert("x", Value::Number(5.0));
        let first = evaluate("x * 2", &scope);
        let second = evaluate("x * 2", &scope);
        assert_eq!(first, second);
        assert_eq!(first, EvalOutcome::success(Value::Number(10.0)));
    }

    #[test]
    fn test_scope_absence_is_not_an_evaluator_panic() {
        let scope = MapScope::new();
        // Absence is ordinary control flow that becomes a fault outcome.
        assert!(matches!(
            evaluate("missing + 1", &scope),
            EvalOutcome::Error { kind: FaultKind::ReferenceError, .. }
        ));
    }
}
