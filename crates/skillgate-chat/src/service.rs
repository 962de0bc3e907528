//! Fast-path service.
//!
//! Sits in front of the conversational flow.  A message whose best skill
//! match clears the fast-path threshold is answered by running that skill
//! directly; everything else is left to the LLM, which can still reach the
//! skills through tool calls.

use std::sync::Arc;

use skillgate_intent::{IntentMatchResult, IntentMatcher};
use skillgate_runtime::{ExecutionContext, RunResult, SkillRuntime};
use skillgate_skills::{SkillCatalog, SkillDefinition};

use crate::config::FastPathConfig;
use crate::error::Result;
use crate::invocation;
use crate::listener::IntegrationListener;
use crate::messages::{error_message, success_message};
use crate::types::{
    ChatTurn, InvocationKind, SessionContext, SkillExecutionResponse, SkillInvocation, ToolCall,
    ToolSpec,
};

/// Bridges chat sessions and the skill runtime.
pub struct FastPathService {
    matcher: Arc<IntentMatcher>,
    runtime: Arc<SkillRuntime>,
    config: FastPathConfig,
    listeners: Vec<Arc<dyn IntegrationListener>>,
}

impl FastPathService {
    pub fn new(matcher: Arc<IntentMatcher>, runtime: Arc<SkillRuntime>, config: FastPathConfig) -> Self {
        Self {
            matcher,
            runtime,
            config,
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn IntegrationListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn config(&self) -> &FastPathConfig {
        &self.config
    }

    fn catalog(&self) -> &dyn SkillCatalog {
        self.runtime.catalog().as_ref()
    }

    // -- fast path ----------------------------------------------------------

    /// The best match for `input`, if the fast path is enabled and the match
    /// is confident enough.
    pub fn check_fast_path(&self, input: &str) -> Option<IntentMatchResult> {
        if !self.config.enabled {
            return None;
        }

        let matched = self.matcher.best_match(input)?;
        if matched.confidence < self.config.confidence_threshold {
            tracing::debug!(
                skill_id = %matched.skill.id,
                confidence = matched.confidence,
                threshold = self.config.confidence_threshold,
                "best match below fast-path threshold"
            );
            return None;
        }

        tracing::info!(
            skill_id = %matched.skill.id,
            confidence = matched.confidence,
            "fast path match"
        );
        Some(matched)
    }

    /// Run a fast-path match and shape the outcome for chat.
    pub async fn execute_fast_path(
        &self,
        matched: &IntentMatchResult,
        user_input: &str,
        session: &SessionContext,
    ) -> SkillExecutionResponse {
        let skill = Arc::clone(&matched.skill);
        tracing::info!(
            skill_id = %skill.id,
            session_id = %session.session_id,
            "executing fast-path skill"
        );
        self.notify_will_execute(&skill.id, InvocationKind::FastPath);

        let outcome = self
            .runtime
            .execute_match_with(matched, user_input, run_context(session))
            .await;
        let response = respond(&skill.id, Some(skill.as_ref()), outcome);

        self.notify_did_execute(&skill.id, response.success);
        response
    }

    /// Answer a user message through the fast path.
    ///
    /// Returns the user turn and the skill's assistant turn, or `None` when
    /// the message should go to the LLM instead.  Messages with attachments
    /// always go to the LLM.
    pub async fn handle_turn(
        &self,
        input: &str,
        has_attachments: bool,
        session: &SessionContext,
    ) -> Option<(ChatTurn, ChatTurn)> {
        if has_attachments {
            return None;
        }

        let matched = self.check_fast_path(input)?;
        let response = self.execute_fast_path(&matched, input, session).await;

        let assistant = ChatTurn::assistant(response.response.clone())
            .with_skill_execution(response.metadata());
        Some((ChatTurn::user(input), assistant))
    }

    // -- LLM invocation -----------------------------------------------------

    /// Interpret an LLM tool call; `Ok(None)` when it is not a skill call.
    pub fn parse_skill_invocation(&self, call: &ToolCall) -> Result<Option<SkillInvocation>> {
        invocation::parse_skill_invocation(call, self.catalog())
    }

    /// Run a skill the LLM asked for.
    pub async fn execute_invocation(
        &self,
        request: &SkillInvocation,
        session: &SessionContext,
    ) -> SkillExecutionResponse {
        tracing::info!(
            skill_id = %request.skill_id,
            tool_call_id = %request.tool_call_id,
            session_id = %session.session_id,
            "executing llm-invoked skill"
        );
        self.notify_will_execute(&request.skill_id, InvocationKind::LlmInvocation);

        let mut context = run_context(session);
        context.user_input = session.last_user_input.clone();

        let outcome = self
            .runtime
            .execute(&request.skill_id, request.parameters.clone(), context)
            .await;
        let skill = self.catalog().by_id(&request.skill_id);
        let response = respond(&request.skill_id, skill.as_deref(), outcome);

        self.notify_did_execute(&request.skill_id, response.success);
        response
    }

    /// Function specs for every catalog skill.
    pub fn skill_tool_specs(&self) -> Vec<ToolSpec> {
        invocation::skill_tool_specs(self.catalog())
    }

    // -- listeners ----------------------------------------------------------

    fn notify_will_execute(&self, skill_id: &str, via: InvocationKind) {
        for listener in &self.listeners {
            listener.will_execute(skill_id, via);
        }
    }

    fn notify_did_execute(&self, skill_id: &str, success: bool) {
        for listener in &self.listeners {
            listener.did_execute(skill_id, success);
        }
    }
}

impl std::fmt::Debug for FastPathService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastPathService")
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

fn run_context(session: &SessionContext) -> ExecutionContext {
    let mut context = ExecutionContext::default().with_session(session.session_id.clone());
    context.requester = session.requester.clone();
    context
}

fn respond(
    skill_id: &str,
    skill: Option<&SkillDefinition>,
    outcome: RunResult,
) -> SkillExecutionResponse {
    let skill_name = skill.map_or_else(|| skill_id.to_owned(), |s| s.name.clone());

    match outcome {
        Ok(result) => {
            let disclaimers = skill
                .and_then(|s| s.safety_constraints.as_ref())
                .map(|c| c.required_disclaimers.clone())
                .unwrap_or_default();
            SkillExecutionResponse {
                success: true,
                response: success_message(&result.response, &disclaimers),
                skill_id: skill_id.to_owned(),
                skill_name,
                execution_time: result.execution_time,
                disclaimers,
                error_kind: None,
            }
        }
        Err(failure) => {
            tracing::warn!(skill_id, kind = failure.kind(), error = %failure.error, "skill run failed");
            SkillExecutionResponse {
                success: false,
                response: error_message(&failure.error, &skill_name),
                skill_id: skill_id.to_owned(),
                skill_name,
                execution_time: failure.result.execution_time,
                disclaimers: Vec::new(),
                error_kind: Some(failure.kind()),
            }
        }
    }
}
