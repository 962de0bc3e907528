//! Runtime error types.
//!
//! Every variant of [`SkillRuntimeError`] is terminal for the run it occurs
//! in; nothing is retried internally.  An aborted run is returned as a
//! [`RunFailure`], which pairs the error with the partial result so callers
//! still get the step results and audit trail.

use crate::result::SkillExecutionResult;

/// Why a skill run stopped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkillRuntimeError {
    /// The requested skill id is not in the catalog.
    #[error("skill not found: {0}")]
    SkillNotFound(String),

    /// The capability check found a required tool missing.
    #[error("required tool not available: {0}")]
    MissingRequiredTool(String),

    /// A gated step was not approved.
    #[error("user denied approval for step {step}")]
    ApprovalDenied { step: u32 },

    /// No approval decision arrived in time.
    #[error("approval timeout for step {step}")]
    ApprovalTimeout { step: u32 },

    /// A tool invocation returned an error.
    #[error("step {step} failed: {reason}")]
    StepExecutionFailed { step: u32, reason: String },

    /// The input tripped one of the skill's emergency keywords.
    #[error("safety constraint violated: {0}")]
    SafetyViolation(String),

    /// The run was cancelled between steps.
    #[error("skill execution was cancelled")]
    Cancelled,

    /// The run exceeded its wall-clock budget.
    #[error("skill execution timed out")]
    Timeout,
}

impl SkillRuntimeError {
    /// Stable, machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SkillNotFound(_) => "skill_not_found",
            Self::MissingRequiredTool(_) => "missing_required_tool",
            Self::ApprovalDenied { .. } => "approval_denied",
            Self::ApprovalTimeout { .. } => "approval_timeout",
            Self::StepExecutionFailed { .. } => "step_execution_failed",
            Self::SafetyViolation(_) => "safety_violation",
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
        }
    }
}

/// An aborted run: the error plus everything recorded before it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error}")]
pub struct RunFailure {
    pub error: SkillRuntimeError,
    pub result: Box<SkillExecutionResult>,
}

impl RunFailure {
    pub fn kind(&self) -> &'static str {
        self.error.kind()
    }
}

/// Errors raised by tool backends.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    /// No registered source provides the tool.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// The tool rejected its arguments.
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The tool ran and failed.
    #[error("{0}")]
    Execution(String),
}

/// Convenience alias for runtime operations.
pub type Result<T> = std::result::Result<T, SkillRuntimeError>;

/// Outcome of a full skill run.
pub type RunResult = std::result::Result<SkillExecutionResult, RunFailure>;
