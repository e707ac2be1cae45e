//! Fault types raised while evaluating expression source.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// The classified category of an evaluation fault.
///
/// These are the names a host surfaces next to a faulted span, so they keep
/// their conventional JavaScript spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultKind {
    SyntaxError,
    ReferenceError,
    TypeError,
    UncaughtException,
}

impl FaultKind {
    pub fn name(self) -> &'static str {
        match self {
            FaultKind::SyntaxError => "SyntaxError",
            FaultKind::ReferenceError => "ReferenceError",
            FaultKind::TypeError => "TypeError",
            FaultKind::UncaughtException => "UncaughtException",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fault raised during lexing, parsing or interpretation.
///
/// Faults propagate with `?` inside the evaluator and are classified into
/// an error outcome at the `evaluate` boundary; they never escape it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvalFault {
    /// The source text is not a well-formed expression.
    #[error("{0}")]
    Syntax(String),
    /// An identifier did not resolve through the scope.
    #[error("{0} is not defined")]
    Reference(String),
    /// An operation was applied to a value of the wrong kind.
    #[error("{0}")]
    Type(String),
}

impl EvalFault {
    /// Classify this fault for display.
    pub fn kind(&self) -> FaultKind {
        match self {
            EvalFault::Syntax(_) => FaultKind::SyntaxError,
            EvalFault::Reference(_) => FaultKind::ReferenceError,
            EvalFault::Type(_) => FaultKind::TypeError,
        }
    }
}
