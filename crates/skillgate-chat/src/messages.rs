//! User-facing message text for skill outcomes.

use skillgate_runtime::SkillRuntimeError;

/// Append a skill's disclaimers, if any, to a successful response.
pub fn success_message(response: &str, disclaimers: &[String]) -> String {
    if disclaimers.is_empty() {
        return response.to_owned();
    }
    format!("{response}\n\n---\n_{}_", disclaimers.join(" "))
}

/// Explain a failed run in terms a user can act on.
pub fn error_message(error: &SkillRuntimeError, skill_name: &str) -> String {
    match error {
        SkillRuntimeError::MissingRequiredTool(tool) => format!(
            "I couldn't complete the {skill_name} task because the required tool '{tool}' \
             is not available. Please check your integrations in Settings."
        ),
        SkillRuntimeError::ApprovalDenied { .. } | SkillRuntimeError::ApprovalTimeout { .. } => {
            format!("The {skill_name} task was cancelled because approval was not granted.")
        }
        SkillRuntimeError::SafetyViolation(reason) => reason.clone(),
        SkillRuntimeError::SkillNotFound(id) => {
            format!("I don't know how to run '{id}'. Please try rephrasing your request.")
        }
        other => format!(
            "I encountered an error while trying to help with {skill_name}: {other}. \
             Please try again or rephrase your request."
        ),
    }
}
