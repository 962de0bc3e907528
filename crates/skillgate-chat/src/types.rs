//! Chat-facing data types.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use skillgate_skills::Parameters;

// ---------------------------------------------------------------------------
// Conversation turns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Which skill produced an assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillExecutionMetadata {
    pub skill_id: String,
    pub skill_name: String,
    pub success: bool,
    pub execution_time: Duration,
}

/// One message in a chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,

    /// Present only on assistant turns answered by a skill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_execution: Option<SkillExecutionMetadata>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            skill_execution: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            skill_execution: None,
        }
    }

    #[must_use]
    pub fn with_skill_execution(mut self, metadata: SkillExecutionMetadata) -> Self {
        self.skill_execution = Some(metadata);
        self
    }
}

// ---------------------------------------------------------------------------
// Session and responses
// ---------------------------------------------------------------------------

/// The chat session a skill runs on behalf of.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub session_id: String,
    /// Most recent user message, used for safety checks.
    pub last_user_input: Option<String>,
    pub requester: Option<String>,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Self::default()
        }
    }

    pub fn with_last_input(mut self, input: impl Into<String>) -> Self {
        self.last_user_input = Some(input.into());
        self
    }

    pub fn with_requester(mut self, requester: impl Into<String>) -> Self {
        self.requester = Some(requester.into());
        self
    }
}

/// How a skill run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationKind {
    FastPath,
    LlmInvocation,
}

impl std::fmt::Display for InvocationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::FastPath => "fast_path",
            Self::LlmInvocation => "llm_invocation",
        })
    }
}

/// A chat-ready answer from a skill run.  Failures are answers too.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillExecutionResponse {
    pub success: bool,
    pub response: String,
    pub skill_id: String,
    pub skill_name: String,
    /// Wall-clock time of the run, up to the failure for failed runs.
    pub execution_time: Duration,
    pub disclaimers: Vec<String>,
    /// Machine-readable error kind for failed runs.
    pub error_kind: Option<&'static str>,
}

impl SkillExecutionResponse {
    pub fn metadata(&self) -> SkillExecutionMetadata {
        SkillExecutionMetadata {
            skill_id: self.skill_id.clone(),
            skill_name: self.skill_name.clone(),
            success: self.success,
            execution_time: self.execution_time,
        }
    }
}

// ---------------------------------------------------------------------------
// LLM tool calls
// ---------------------------------------------------------------------------

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Either a JSON object or a string containing one.
    pub arguments: Value,
}

/// A skill run requested through a tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillInvocation {
    pub skill_id: String,
    pub parameters: Parameters,
    pub tool_call_id: String,
}

/// A function the model may call, with a JSON Schema for its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}
