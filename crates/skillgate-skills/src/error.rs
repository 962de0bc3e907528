//! Error types for the skills subsystem.

use std::path::PathBuf;

use crate::validate::ValidationIssue;

/// Skill-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("skill not found: `{0}`")]
    NotFound(String),

    #[error("invalid skill definition in `{path}`: {reason}")]
    InvalidDefinition { path: PathBuf, reason: String },

    #[error("skill `{skill_id}` failed validation: {}", format_issues(.issues))]
    Validation {
        skill_id: String,
        issues: Vec<ValidationIssue>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SkillError>;
