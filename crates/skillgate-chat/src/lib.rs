//! Chat integration for SkillGate.
//!
//! Connects a conversational front end to the skill pipeline in two ways:
//!
//! - **Fast path**: [`FastPathService::handle_turn`] answers a message by
//!   running the matched skill directly when the match is confident enough,
//!   skipping the LLM entirely.
//! - **LLM invocation**: [`skill_tool_specs`] advertises every skill as a
//!   callable function, and [`parse_skill_invocation`] turns the model's
//!   tool calls back into skill runs.
//!
//! Either way the outcome comes back as a [`SkillExecutionResponse`] whose
//! text is ready to show to the user.

pub mod config;
pub mod error;
pub mod invocation;
pub mod listener;
pub mod messages;
pub mod service;
pub mod types;

pub use config::FastPathConfig;
pub use error::{ChatError, Result};
pub use invocation::{
    EXECUTE_SKILL_TOOL, SKILL_TOOL_PREFIX, parse_skill_invocation, skill_tool_spec,
    skill_tool_specs, tool_name_for,
};
pub use listener::IntegrationListener;
pub use messages::{error_message, success_message};
pub use service::FastPathService;
pub use types::{
    ChatTurn, InvocationKind, Role, SessionContext, SkillExecutionMetadata,
    SkillExecutionResponse, SkillInvocation, ToolCall, ToolSpec,
};
