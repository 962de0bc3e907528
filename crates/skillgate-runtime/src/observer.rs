//! Run observers.
//!
//! Observers are notified synchronously as a run progresses.  They cannot
//! influence the run and must return quickly.

use uuid::Uuid;

use crate::result::{SkillExecutionResult, StepExecutionResult};

/// Progress notifications for skill runs.  Every method defaults to a no-op.
pub trait RuntimeObserver: Send + Sync {
    fn on_step_start(&self, _run_id: Uuid, _step: u32, _tool: &str) {}

    fn on_step_complete(&self, _run_id: Uuid, _result: &StepExecutionResult) {}

    /// Called once per run, for successful and failed runs alike.
    fn on_run_complete(&self, _result: &SkillExecutionResult) {}
}

/// Logs every notification through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RuntimeObserver for TracingObserver {
    fn on_step_start(&self, run_id: Uuid, step: u32, tool: &str) {
        tracing::info!(run_id = %run_id, step, tool, "step started");
    }

    fn on_step_complete(&self, run_id: Uuid, result: &StepExecutionResult) {
        tracing::info!(
            run_id = %run_id,
            step = result.step_number,
            success = result.success,
            duration_ms = result.duration.as_millis() as u64,
            "step finished"
        );
    }

    fn on_run_complete(&self, result: &SkillExecutionResult) {
        tracing::info!(
            run_id = %result.run_id,
            skill_id = %result.skill_id,
            success = result.success,
            steps = result.step_results.len(),
            "run finished"
        );
    }
}
