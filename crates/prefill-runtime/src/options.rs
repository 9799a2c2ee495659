//! Runtime limits

use serde::{Deserialize, Serialize};

/// Limits applied while extracting and evaluating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Expression nodes a single rule may evaluate
    pub max_evaluation_steps: usize,
    /// Nesting accepted by the rule parser
    pub max_expression_depth: usize,
    /// Nesting followed when flattening composite and sequence fields
    pub max_flatten_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_evaluation_steps: 10_000,
            max_expression_depth: 64,
            max_flatten_depth: 16,
        }
    }
}
