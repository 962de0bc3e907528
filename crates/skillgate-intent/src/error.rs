//! Intent engine error types.
//!
//! Matching itself never fails: an input that matches nothing simply yields
//! no results.  Errors only arise while configuring the matcher.

/// Unified error type for the intent engine.
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    /// A confidence threshold outside `[0, 1]` was supplied.
    #[error("confidence threshold {0} is outside [0, 1]")]
    InvalidConfidence(f64),

    /// An extraction pattern failed to compile.
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A keyword automaton could not be built.
    #[error("failed to build keyword automaton: {0}")]
    Automaton(#[from] aho_corasick::BuildError),
}

/// Convenience alias used throughout the intent crate.
pub type Result<T> = std::result::Result<T, IntentError>;
