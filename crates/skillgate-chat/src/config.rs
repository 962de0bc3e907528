//! Fast-path configuration.

use serde::{Deserialize, Serialize};

/// When a matched skill may answer a message without the LLM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastPathConfig {
    pub enabled: bool,
    /// Minimum match confidence for the fast path.  Default: **0.75**.
    pub confidence_threshold: f64,
}

impl Default for FastPathConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence_threshold: 0.75,
        }
    }
}

impl FastPathConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }
}
