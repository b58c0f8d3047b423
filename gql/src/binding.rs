//! Variable bindings for pattern matching.

use mrepo_core::Value;

/// Variable bindings of one candidate row.
///
/// Keeps first-insertion order so `RETURN *` has a stable column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    entries: Vec<(String, Value)>,
}

impl Binding {
    /// Create new empty bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a binding by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Check if a variable is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Bind a variable, replacing the value but keeping the position if already bound.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Return a copy with one more binding.
    pub fn with(&self, name: impl Into<String>, value: Value) -> Self {
        let mut result = self.clone();
        result.insert(name, value);
        result
    }

    /// Variable names in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
