//! Autocomplete for expression sources: a backward token scanner and a
//! keystroke-driven controller that queries a [`ScopeProvider`] for
//! suggestions and splices the chosen one into the document.
//!
//! [`ScopeProvider`]: inlay_eval::ScopeProvider

mod controller;
mod token;

pub use controller::{AutocompleteController, AutocompleteSession, Key, KeyOutcome, Match, MatchKind};
pub use token::{is_symbol_char, token_ending_at};
