//! Error types for the chat integration layer.

/// Errors raised while interpreting LLM tool calls.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("tool call `{0}` does not name a skill")]
    MissingSkillId(String),

    #[error("invalid arguments for tool call `{tool}`: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("parameter `{name}` must be a string, number, or boolean")]
    UnsupportedParameter { name: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ChatError>;
