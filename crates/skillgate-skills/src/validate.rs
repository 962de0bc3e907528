//! Structural validation of skill definitions.

use std::collections::HashSet;
use std::fmt;

use crate::types::SkillDefinition;

/// A single problem found in a skill definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A required top-level field is empty.
    MissingField(&'static str),
    /// A step is malformed.
    InvalidStep { step: u32, reason: String },
    /// Two or more steps share a step number.
    DuplicateStep(u32),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::InvalidStep { step, reason } => write!(f, "invalid step {step}: {reason}"),
            Self::DuplicateStep(step) => write!(f, "duplicate step number {step}"),
        }
    }
}

/// Check a definition for structural problems.
///
/// Returns every issue found; an empty vector means the definition is usable.
pub fn validate_skill(skill: &SkillDefinition) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if skill.id.trim().is_empty() {
        issues.push(ValidationIssue::MissingField("id"));
    }
    if skill.name.trim().is_empty() {
        issues.push(ValidationIssue::MissingField("name"));
    }
    if skill.category.trim().is_empty() {
        issues.push(ValidationIssue::MissingField("category"));
    }

    let sequences = std::iter::once(&skill.tool_sequence).chain(skill.fallback_sequence.as_ref());
    for sequence in sequences {
        let mut seen = HashSet::new();
        for step in sequence {
            if step.step == 0 {
                issues.push(ValidationIssue::InvalidStep {
                    step: step.step,
                    reason: "step numbers start at 1".into(),
                });
            }
            if step.tool.trim().is_empty() {
                issues.push(ValidationIssue::InvalidStep {
                    step: step.step,
                    reason: "tool name is empty".into(),
                });
            }
            if !seen.insert(step.step) {
                issues.push(ValidationIssue::DuplicateStep(step.step));
            }
        }
    }

    issues
}
