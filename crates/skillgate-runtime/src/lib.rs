//! Approval-gated skill execution for SkillGate.
//!
//! The runtime takes a skill from a [`SkillCatalog`](skillgate_skills::SkillCatalog)
//! and runs its tool sequence through a [`ToolProvider`].  Around the tools it
//! enforces:
//!
//! - **Safety**: emergency keywords in the user input stop a run before any
//!   tool is touched.
//! - **Capabilities**: every required tool must be available up front
//!   ([`CapabilityChecker`]).
//! - **Approval**: gated steps wait for an [`ApprovalHandler`], raced
//!   against a timeout ([`ApprovalCoordinator`]).
//! - **Audit**: every phase leaves an [`AuditEntry`] behind, returned with
//!   both successful and failed runs.

pub mod approval;
pub mod capability;
pub mod condition;
pub mod config;
pub mod error;
pub mod observer;
pub mod provider;
pub mod result;
pub mod runtime;

pub use approval::{
    ApprovalCoordinator, ApprovalFn, ApprovalHandler, ApprovalOutcome, ApprovalRequest,
    FixedApproval, RiskLevel, race_approval,
};
pub use capability::{CapabilityChecker, CapabilityReport};
pub use condition::Condition;
pub use config::RuntimeConfig;
pub use error::{Result, RunFailure, RunResult, SkillRuntimeError, ToolError};
pub use observer::{RuntimeObserver, TracingObserver};
pub use provider::{
    AvailableTools, DEFAULT_NAME_PREFIXES, SourceKind, StaticToolSource, ToolDescriptor,
    ToolInfo, ToolProvider, ToolRegistry, ToolSource,
};
pub use result::{AuditEntry, SkillExecutionResult, StepExecutionResult};
pub use runtime::{ExecutionContext, MATCHED_TRIGGER_PARAM, SkillRuntime, USER_INPUT_PARAM};
