//! Intent matching for SkillGate.
//!
//! This crate provides:
//!
//! - **Similarity scoring**: pure functions comparing normalized strings
//!   (exact, substring and token-overlap scores) in [`similarity`].
//! - **Intent matching**: ranking every catalog skill against free-text
//!   input via [`matcher::IntentMatcher`].
//! - **Parameter extraction**: best-effort time, date, location and
//!   quantity extraction via [`extract::ParameterExtractor`].

pub mod error;
pub mod extract;
pub mod keywords;
pub mod matcher;
pub mod similarity;

pub use error::{IntentError, Result};
pub use extract::ParameterExtractor;
pub use matcher::{IntentMatchResult, IntentMatcher, MatchType, MatcherConfig};
pub use similarity::{example_score, jaccard, normalize, trigger_score};
