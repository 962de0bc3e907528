//! Skill execution runtime.
//!
//! One run moves through a fixed sequence of phases:
//!
//! ```text
//! Loading -> SafetyCheck -> CapabilityCheck -> StepLoop -> Finalize
//! ```
//!
//! Inside the step loop each step, in ascending step order, is evaluated
//! against its condition, approved if gated, executed through the
//! [`ToolProvider`], and followed by a budget check.  Any failure ends the
//! run; the partial results and the audit trail travel back with the error
//! in a [`RunFailure`].
//!
//! Runs are independent.  Each is registered under its own id with a
//! [`CancellationToken`] so concurrent runs can be cancelled individually.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use skillgate_intent::IntentMatchResult;
use skillgate_skills::{ParamValue, Parameters, SkillCatalog, SkillDefinition, ToolStep};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::approval::{ApprovalCoordinator, ApprovalHandler, ApprovalOutcome, ApprovalRequest};
use crate::capability::CapabilityChecker;
use crate::condition::Condition;
use crate::config::RuntimeConfig;
use crate::error::{Result, RunFailure, RunResult, SkillRuntimeError};
use crate::observer::RuntimeObserver;
use crate::provider::ToolProvider;
use crate::result::{AuditEntry, SkillExecutionResult, StepExecutionResult};

/// Parameter carrying the raw user input when running from a match.
pub const USER_INPUT_PARAM: &str = "_userInput";
/// Parameter carrying the trigger that produced a match.
pub const MATCHED_TRIGGER_PARAM: &str = "_matchedTrigger";

const DEFAULT_EMERGENCY_ACTION: &str = "Please seek appropriate help";

// ---------------------------------------------------------------------------
// Execution context
// ---------------------------------------------------------------------------

/// Caller-side information about a run.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Original user input, checked against emergency keywords.
    pub user_input: Option<String>,
    pub session_id: String,
    /// Who asked for the run, if known.
    pub requester: Option<String>,
    pub is_voice_request: bool,
    /// Run identifier; generated when absent.
    pub run_id: Option<Uuid>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            user_input: None,
            session_id: Uuid::now_v7().to_string(),
            requester: None,
            is_voice_request: false,
            run_id: None,
        }
    }
}

impl ExecutionContext {
    pub fn for_input(input: impl Into<String>) -> Self {
        Self {
            user_input: Some(input.into()),
            ..Self::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_requester(mut self, requester: impl Into<String>) -> Self {
        self.requester = Some(requester.into());
        self
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn voice(mut self) -> Self {
        self.is_voice_request = true;
        self
    }
}

// ---------------------------------------------------------------------------
// Per-run state
// ---------------------------------------------------------------------------

struct RunState {
    run_id: Uuid,
    skill_id: String,
    started: Instant,
    audit: Vec<AuditEntry>,
    steps: Vec<StepExecutionResult>,
}

impl RunState {
    fn new(run_id: Uuid, skill_id: &str) -> Self {
        Self {
            run_id,
            skill_id: skill_id.to_owned(),
            started: Instant::now(),
            audit: Vec::new(),
            steps: Vec::new(),
        }
    }

    fn record(&mut self, event: &str, details: impl Into<String>) {
        let entry = AuditEntry::new(event, Some(details.into()));
        tracing::debug!(
            run_id = %self.run_id,
            event = %entry.event,
            details = entry.details.as_deref().unwrap_or(""),
            "audit"
        );
        self.audit.push(entry);
    }

    fn finish(self, response: String, error: Option<SkillRuntimeError>) -> SkillExecutionResult {
        SkillExecutionResult {
            run_id: self.run_id,
            success: error.is_none(),
            skill_id: self.skill_id,
            response,
            step_results: self.steps,
            execution_time: self.started.elapsed(),
            error,
            audit_trail: self.audit,
        }
    }
}

/// Holds a run's slot in the active set and frees it when dropped.
struct ActiveRun<'a> {
    runs: &'a DashMap<Uuid, CancellationToken>,
    run_id: Uuid,
    /// The id the caller asked for, when it was already taken.
    displaced: Option<Uuid>,
}

impl<'a> ActiveRun<'a> {
    /// Claim `requested`, or a fresh id when another run holds it.
    fn claim(
        runs: &'a DashMap<Uuid, CancellationToken>,
        requested: Uuid,
        token: &CancellationToken,
    ) -> Self {
        let mut run_id = requested;
        loop {
            match runs.entry(run_id) {
                Entry::Vacant(slot) => {
                    slot.insert(token.clone());
                    break;
                }
                Entry::Occupied(_) => run_id = Uuid::now_v7(),
            }
        }
        Self {
            runs,
            run_id,
            displaced: (run_id != requested).then_some(requested),
        }
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        // Ids are claimed exclusively, so the slot is still ours.
        self.runs.remove(&self.run_id);
    }
}

// ---------------------------------------------------------------------------
// SkillRuntime
// ---------------------------------------------------------------------------

/// Executes skills from a catalog against a tool provider.
pub struct SkillRuntime {
    catalog: Arc<dyn SkillCatalog>,
    tools: Arc<dyn ToolProvider>,
    capabilities: CapabilityChecker,
    approvals: ApprovalCoordinator,
    observers: Vec<Arc<dyn RuntimeObserver>>,
    config: RuntimeConfig,
    active: DashMap<Uuid, CancellationToken>,
}

impl SkillRuntime {
    pub fn new(
        catalog: Arc<dyn SkillCatalog>,
        tools: Arc<dyn ToolProvider>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            catalog,
            capabilities: CapabilityChecker::new(Arc::clone(&tools)),
            tools,
            approvals: ApprovalCoordinator::default(),
            observers: Vec::new(),
            config,
            active: DashMap::new(),
        }
    }

    /// Route approval requests to `handler`.
    #[must_use]
    pub fn with_approval_handler(mut self, handler: Arc<dyn ApprovalHandler>) -> Self {
        self.approvals.set_handler(handler);
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RuntimeObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<dyn SkillCatalog> {
        &self.catalog
    }

    pub fn capability_checker(&self) -> &CapabilityChecker {
        &self.capabilities
    }

    // -- cancellation -------------------------------------------------------

    /// Signal one run to stop before its next step.  Returns `false` when
    /// no such run is active.
    pub fn cancel(&self, run_id: Uuid) -> bool {
        match self.active.get(&run_id) {
            Some(token) => {
                token.cancel();
                tracing::info!(run_id = %run_id, "run cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Signal every active run.  Returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let mut count = 0;
        for entry in &self.active {
            entry.value().cancel();
            count += 1;
        }
        if count > 0 {
            tracing::info!(count, "all runs cancelled");
        }
        count
    }

    /// Ids of runs currently executing.
    pub fn active_runs(&self) -> Vec<Uuid> {
        self.active.iter().map(|entry| *entry.key()).collect()
    }

    // -- execution ----------------------------------------------------------

    /// Run the skill `skill_id` with caller parameters.
    pub async fn execute(
        &self,
        skill_id: &str,
        parameters: Parameters,
        context: ExecutionContext,
    ) -> RunResult {
        let token = CancellationToken::new();
        let active = ActiveRun::claim(
            &self.active,
            context.run_id.unwrap_or_else(Uuid::now_v7),
            &token,
        );
        let run_id = active.run_id;
        if let Some(requested) = active.displaced {
            tracing::warn!(requested = %requested, run_id = %run_id, "run id already active, reassigned");
        }

        tracing::info!(
            run_id = %run_id,
            skill_id,
            session_id = %context.session_id,
            voice = context.is_voice_request,
            "skill run started"
        );

        let mut run = RunState::new(run_id, skill_id);
        let outcome = self
            .drive(&mut run, &parameters, &context, active.displaced, &token)
            .await;

        let result = match outcome {
            Ok(response) => {
                let elapsed = run.started.elapsed();
                run.record(
                    "execution_completed",
                    format!("Duration: {:.2}s", elapsed.as_secs_f64()),
                );
                let result = run.finish(response, None);
                tracing::info!(
                    run_id = %run_id,
                    skill_id,
                    steps = result.step_results.len(),
                    "skill run completed"
                );
                Ok(result)
            }
            Err(error) => {
                tracing::warn!(run_id = %run_id, skill_id, error = %error, "skill run failed");
                let result = run.finish(error.to_string(), Some(error.clone()));
                Err(RunFailure {
                    error,
                    result: Box::new(result),
                })
            }
        };

        let finished = match &result {
            Ok(result) => result,
            Err(failure) => failure.result.as_ref(),
        };
        for observer in &self.observers {
            observer.on_run_complete(finished);
        }

        result
    }

    /// Run the skill behind an intent match.
    ///
    /// The parameters are the match's extracted values plus the raw input
    /// and the matched trigger.
    pub async fn execute_match(&self, matched: &IntentMatchResult, user_input: &str) -> RunResult {
        self.execute_match_with(matched, user_input, ExecutionContext::default())
            .await
    }

    /// Like [`execute_match`](Self::execute_match), under a caller-built
    /// context.  The context's user input is replaced by `user_input`.
    pub async fn execute_match_with(
        &self,
        matched: &IntentMatchResult,
        user_input: &str,
        mut context: ExecutionContext,
    ) -> RunResult {
        let mut parameters: Parameters = matched
            .extracted_params
            .iter()
            .map(|(k, v)| (k.clone(), ParamValue::from(v.as_str())))
            .collect();
        parameters.insert(USER_INPUT_PARAM.to_owned(), user_input.into());
        parameters.insert(
            MATCHED_TRIGGER_PARAM.to_owned(),
            matched.matched_trigger.as_str().into(),
        );

        context.user_input = Some(user_input.to_owned());
        self.execute(&matched.skill.id, parameters, context).await
    }

    async fn drive(
        &self,
        run: &mut RunState,
        parameters: &Parameters,
        context: &ExecutionContext,
        displaced: Option<Uuid>,
        token: &CancellationToken,
    ) -> Result<String> {
        run.record("execution_started", format!("Skill: {}", run.skill_id));
        if let Some(requested) = displaced {
            run.record(
                "run_id_reassigned",
                format!("{requested} is already active; running as {}", run.run_id),
            );
        }

        // Loading
        let Some(skill) = self.catalog.by_id(&run.skill_id) else {
            let id = run.skill_id.clone();
            run.record("skill_not_found", id.clone());
            return Err(SkillRuntimeError::SkillNotFound(id));
        };
        run.record("skill_loaded", skill.name.clone());

        // SafetyCheck
        if self.config.enable_safety_checks {
            if let Some(violation) = safety_violation(&skill, context.user_input.as_deref()) {
                run.record("safety_violation", violation.clone());
                return Err(SkillRuntimeError::SafetyViolation(violation));
            }
        }

        // CapabilityCheck
        let report = self.capabilities.check(&skill.capabilities).await;
        if !report.can_execute {
            let missing = report
                .missing_required
                .first()
                .cloned()
                .unwrap_or_else(|| "unknown".to_owned());
            run.record("missing_tools", report.missing_required.join(", "));
            return Err(SkillRuntimeError::MissingRequiredTool(missing));
        }
        run.record(
            "tools_verified",
            format!("{} tools available", report.available_tools.len()),
        );

        // Steps
        let primary = skill.ordered_steps();
        if let Err(error) = self.run_steps(run, &skill, &primary, parameters, token).await {
            let fallback = skill
                .fallback_sequence
                .as_deref()
                .filter(|steps| !steps.is_empty())
                .filter(|_| matches!(error, SkillRuntimeError::StepExecutionFailed { .. }));
            let Some(fallback) = fallback else {
                return Err(error);
            };

            if !self.config.execute_fallback {
                run.record("fallback_available", format!("{} steps", fallback.len()));
                return Err(error);
            }

            run.record("fallback_started", format!("{} steps", fallback.len()));
            self.run_steps(run, &skill, &sorted(fallback), parameters, token)
                .await?;
            run.record("fallback_completed", "Fallback sequence succeeded");
        }

        // Finalize
        Ok(build_response(&skill, &run.steps))
    }

    async fn run_steps(
        &self,
        run: &mut RunState,
        skill: &SkillDefinition,
        steps: &[&ToolStep],
        parameters: &Parameters,
        token: &CancellationToken,
    ) -> Result<()> {
        for step in steps {
            ensure_active(run, token, step.step)?;

            let condition = Condition::from(step.condition.as_deref());
            if !condition.evaluate(parameters) {
                run.record(
                    "step_skipped",
                    format!("Step {}: condition not met", step.step),
                );
                continue;
            }

            if self.needs_approval(skill, step) {
                self.approve(run, skill, step, parameters).await?;
                ensure_active(run, token, step.step)?;
            }

            self.run_step(run, step, parameters).await?;

            if run.started.elapsed() > self.config.max_execution_time {
                run.record(
                    "timeout",
                    format!(
                        "Exceeded {:.2}s after step {}",
                        self.config.max_execution_time.as_secs_f64(),
                        step.step
                    ),
                );
                return Err(SkillRuntimeError::Timeout);
            }
        }
        Ok(())
    }

    fn needs_approval(&self, skill: &SkillDefinition, step: &ToolStep) -> bool {
        step.requires_approval
            || skill
                .approval_gates
                .as_ref()
                .is_some_and(|gates| gates.matches(&step.tool))
    }

    async fn approve(
        &self,
        run: &mut RunState,
        skill: &SkillDefinition,
        step: &ToolStep,
        parameters: &Parameters,
    ) -> Result<()> {
        let request = ApprovalRequest::for_step(skill, step, parameters);
        let timeout = skill
            .approval_gates
            .as_ref()
            .and_then(|gates| gates.timeout_seconds)
            .map_or(self.config.approval_timeout, Duration::from_secs);

        match self.approvals.request(&request, timeout).await {
            ApprovalOutcome::Approved => {
                run.record("approval_granted", format!("Step {}", step.step));
                Ok(())
            }
            ApprovalOutcome::Denied => {
                run.record("approval_denied", format!("Step {}", step.step));
                Err(SkillRuntimeError::ApprovalDenied { step: step.step })
            }
            ApprovalOutcome::TimedOut => {
                run.record(
                    "approval_timeout",
                    format!(
                        "Step {}: no decision within {:.2}s",
                        step.step,
                        timeout.as_secs_f64()
                    ),
                );
                Err(SkillRuntimeError::ApprovalDenied { step: step.step })
            }
        }
    }

    async fn run_step(
        &self,
        run: &mut RunState,
        step: &ToolStep,
        parameters: &Parameters,
    ) -> Result<()> {
        for observer in &self.observers {
            observer.on_step_start(run.run_id, step.step, &step.tool);
        }
        run.record("step_started", format!("Step {}: {}", step.step, step.tool));

        let tool_params = tool_parameters(step, parameters, &run.steps);
        let started = Instant::now();
        let outcome = self.tools.execute(&step.tool, &tool_params).await;
        let duration = started.elapsed();

        let (result, failure) = match outcome {
            Ok(output) => (
                StepExecutionResult {
                    step_number: step.step,
                    tool_name: step.tool.clone(),
                    success: true,
                    output: Some(output),
                    error: None,
                    duration,
                },
                None,
            ),
            Err(e) => (
                StepExecutionResult {
                    step_number: step.step,
                    tool_name: step.tool.clone(),
                    success: false,
                    output: None,
                    error: Some(e.to_string()),
                    duration,
                },
                Some(e.to_string()),
            ),
        };

        for observer in &self.observers {
            observer.on_step_complete(run.run_id, &result);
        }
        run.steps.push(result);

        match failure {
            None => {
                run.record("step_completed", format!("Step {} succeeded", step.step));
                Ok(())
            }
            Some(reason) => {
                run.record("step_failed", format!("Step {}: {reason}", step.step));
                Err(SkillRuntimeError::StepExecutionFailed {
                    step: step.step,
                    reason,
                })
            }
        }
    }
}

impl std::fmt::Debug for SkillRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillRuntime")
            .field("config", &self.config)
            .field("approvals", &self.approvals)
            .field("observers", &self.observers.len())
            .field("active_runs", &self.active.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ensure_active(run: &mut RunState, token: &CancellationToken, step: u32) -> Result<()> {
    if token.is_cancelled() {
        run.record("cancelled", format!("Before step {step}"));
        return Err(SkillRuntimeError::Cancelled);
    }
    Ok(())
}

fn sorted(steps: &[ToolStep]) -> Vec<&ToolStep> {
    let mut ordered: Vec<&ToolStep> = steps.iter().collect();
    ordered.sort_by_key(|s| s.step);
    ordered
}

/// The emergency message if `input` contains one of the skill's keywords.
fn safety_violation(skill: &SkillDefinition, input: Option<&str>) -> Option<String> {
    let safety = skill.safety_constraints.as_ref()?;
    let input = input?.to_lowercase();

    let hit = safety
        .emergency_keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .any(|k| !k.is_empty() && input.contains(&k));

    hit.then(|| {
        format!(
            "Emergency detected: {}",
            safety
                .emergency_action
                .as_deref()
                .unwrap_or(DEFAULT_EMERGENCY_ACTION)
        )
    })
}

/// Parameters for one tool call: the step's static values, then the caller
/// values the step declares, then the outputs of earlier successful steps.
fn tool_parameters(
    step: &ToolStep,
    caller: &Parameters,
    previous: &[StepExecutionResult],
) -> Parameters {
    let mut params = step.static_params.clone();

    for name in &step.params {
        if let Some(value) = caller.get(name) {
            params.insert(name.clone(), value.clone());
        }
    }

    for result in previous.iter().filter(|r| r.success) {
        if let Some(output) = &result.output {
            params.insert(
                format!("_step{}_output", result.step_number),
                ParamValue::String(output.clone()),
            );
        }
    }

    params
}

fn build_response(skill: &SkillDefinition, steps: &[StepExecutionResult]) -> String {
    if let Some(output) = steps
        .iter()
        .rev()
        .find(|s| s.success)
        .and_then(|s| s.output.clone())
    {
        return output;
    }

    let succeeded = steps.iter().filter(|s| s.success).count();
    format!(
        "Completed {succeeded} of {} steps for {}",
        steps.len(),
        skill.name
    )
}
