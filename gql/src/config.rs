//! Executor configuration.

use serde::{Deserialize, Serialize};

/// Limits applied during pattern matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Hop ceiling for quantifiers without an upper bound.
    pub max_path_depth: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { max_path_depth: 16 }
    }
}

impl ExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_path_depth(mut self, max_path_depth: u32) -> Self {
        self.max_path_depth = max_path_depth;
        self
    }
}
