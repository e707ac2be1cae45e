//! The scope protocol: how the evaluator sees the host's named values.

use indexmap::IndexMap;

use crate::value::Value;

/// An external provider of named values.
///
/// The host owns the provider; the evaluator borrows it per call and never
/// caches answers, so every lookup observes the live scope.
pub trait ScopeProvider {
    /// Symbol names matching a prefix, in provider-defined order.
    fn search(&self, prefix: &str) -> Vec<String>;

    /// Whether a key resolves at all. Decides identifier-vs-ReferenceError.
    fn has_value(&self, key: &str) -> bool;

    /// The value for a key, or `None` when absent.
    fn get_value(&self, key: &str) -> Option<Value>;
}

/// Reference provider over an insertion-ordered map.
///
/// `search` matches case-insensitively on the prefix and returns names in
/// declaration order.
#[derive(Debug, Clone, Default)]
pub struct MapScope {
    entries: IndexMap<String, Value>,
}

impl MapScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for MapScope {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl ScopeProvider for MapScope {
    fn search(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.to_lowercase();
        self.entries
            .keys()
            .filter(|key| key.to_lowercase().starts_with(&prefix))
            .cloned()
            .collect()
    }

    fn has_value(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn get_value(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }
}

/// Adapts a [`ScopeProvider`] into the interpreter's identifier-resolution
/// protocol.
///
/// Existence and fetch are separate questions: a key that `has_value` but
/// yields no value resolves to `Undefined`, while a key that fails the
/// existence check is an unresolved identifier.
pub struct ScopeBindings<'a> {
    provider: &'a dyn ScopeProvider,
}

impl<'a> ScopeBindings<'a> {
    pub fn new(provider: &'a dyn ScopeProvider) -> Self {
        Self { provider }
    }

    /// Resolve an identifier, or `None` when the scope does not know it.
    pub fn resolve(&self, name: &str) -> Option<Value> {
        if self.provider.has_value(name) {
            Some(self.provider.get_value(name).unwrap_or(Value::Undefined))
        } else {
            None
        }
    }
}
