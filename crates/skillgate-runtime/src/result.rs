//! Run results and audit entries.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SkillRuntimeError;

/// Outcome of one skill run.  Built once and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct SkillExecutionResult {
    pub run_id: Uuid,
    pub success: bool,
    pub skill_id: String,
    /// Human-readable response text.
    pub response: String,
    /// One entry per attempted (non-skipped) step, in execution order.
    pub step_results: Vec<StepExecutionResult>,
    pub execution_time: Duration,
    pub error: Option<SkillRuntimeError>,
    /// Append-only history of the run.
    pub audit_trail: Vec<AuditEntry>,
}

impl SkillExecutionResult {
    /// Number of steps that succeeded.
    pub fn succeeded_steps(&self) -> usize {
        self.step_results.iter().filter(|s| s.success).count()
    }

    /// Audit event names, in order.
    pub fn audit_events(&self) -> Vec<&str> {
        self.audit_trail.iter().map(|e| e.event.as_str()).collect()
    }

    /// The first audit entry with the given event name.
    pub fn audit_entry(&self, event: &str) -> Option<&AuditEntry> {
        self.audit_trail.iter().find(|e| e.event == event)
    }
}

/// Outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepExecutionResult {
    pub step_number: u32,
    pub tool_name: String,
    pub success: bool,
    pub output: Option<String>,
    pub error: Option<String>,
    pub duration: Duration,
}

/// A timestamped event in a run's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    pub details: Option<String>,
}

impl AuditEntry {
    pub fn new(event: impl Into<String>, details: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            event: event.into(),
            details,
        }
    }
}

impl std::fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.timestamp.format("%H:%M:%S%.3f"), self.event)?;
        if let Some(details) = &self.details {
            write!(f, ": {details}")?;
        }
        Ok(())
    }
}
