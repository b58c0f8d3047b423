//! Evaluator configuration.

use serde::{Deserialize, Serialize};

/// Limits applied while evaluating a single expression.
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Maximum nesting of expression evaluation.
    pub max_depth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

impl EvalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
