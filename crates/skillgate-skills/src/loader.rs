//! Discovers and loads skill definitions from JSON files.
//!
//! Each skill is a single JSON file.  The loader walks a directory, parses
//! every `*.json` file it finds, and validates the result.  Files that fail
//! to parse or validate are logged and skipped so that one broken skill does
//! not take the whole catalog down.

use std::path::Path;

use crate::error::{Result, SkillError};
use crate::types::SkillDefinition;
use crate::validate::validate_skill;

/// Load all skills from the given directory.
///
/// A missing directory yields an empty list rather than an error.
pub fn load_skills_from_dir(dir: &Path) -> Result<Vec<SkillDefinition>> {
    if !dir.exists() {
        tracing::debug!(path = %dir.display(), "skills directory does not exist");
        return Ok(Vec::new());
    }

    let mut skills = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if !path.is_file() || path.extension().is_none_or(|ext| ext != "json") {
            tracing::trace!(path = %path.display(), "not a skill file, skipping");
            continue;
        }

        match load_skill_from_file(&path) {
            Ok(skill) => {
                tracing::info!(
                    id = %skill.id,
                    steps = skill.tool_sequence.len(),
                    "loaded skill"
                );
                skills.push(skill);
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to load skill"
                );
            }
        }
    }

    tracing::info!(count = skills.len(), dir = %dir.display(), "skills loaded");
    Ok(skills)
}

/// Load and validate a single skill definition file.
pub fn load_skill_from_file(path: &Path) -> Result<SkillDefinition> {
    let content = std::fs::read_to_string(path)?;
    let skill: SkillDefinition =
        serde_json::from_str(&content).map_err(|e| SkillError::InvalidDefinition {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let issues = validate_skill(&skill);
    if !issues.is_empty() {
        return Err(SkillError::Validation {
            skill_id: skill.id,
            issues,
        });
    }

    Ok(skill)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROCERIES: &str = r#"{
        "id": "home.groceries",
        "name": "Order Groceries",
        "category": "food",
        "tool_sequence": [
            {"step": 1, "tool": "check_pantry"},
            {"step": 2, "tool": "place_order", "requires_approval": true}
        ]
    }"#;

    #[test]
    fn missing_dir_is_empty() {
        let skills = load_skills_from_dir(Path::new("/nonexistent/skills")).unwrap();
        assert!(skills.is_empty());
    }

    #[test]
    fn loads_json_files_and_skips_others() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("groceries.json"), GROCERIES).unwrap();
        std::fs::write(dir.path().join("README.md"), "# not a skill").unwrap();

        let skills = load_skills_from_dir(dir.path()).unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].id, "home.groceries");
        assert!(skills[0].tool_sequence[1].requires_approval);
    }

    #[test]
    fn broken_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.json"), GROCERIES).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(
            dir.path().join("invalid.json"),
            r#"{"id": "x", "name": "", "category": "food"}"#,
        )
        .unwrap();

        let skills = load_skills_from_dir(dir.path()).unwrap();
        assert_eq!(skills.len(), 1);
    }

    #[test]
    fn single_file_reports_validation_issues() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        std::fs::write(&path, r#"{"id": "x", "name": "X", "category": ""}"#).unwrap();

        let err = load_skill_from_file(&path).unwrap_err();
        assert!(matches!(err, SkillError::Validation { ref skill_id, .. } if skill_id == "x"));
    }
}
