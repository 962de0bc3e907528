//! Approval coordination.
//!
//! A gated step needs a yes from somebody before it runs.  The coordinator
//! asks the injected [`ApprovalHandler`] and races the answer against a
//! timeout; whichever finishes first decides, and the other future is
//! dropped.  With no handler at all, steps explicitly flagged as needing
//! approval are denied and everything else is let through.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skillgate_skills::params::to_string_map;
use skillgate_skills::{Parameters, SkillDefinition, ToolStep};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// What an approver is shown before a gated step runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalRequest {
    pub skill_id: String,
    pub skill_name: String,
    pub step_number: u32,
    pub tool_name: String,
    pub description: String,
    pub risk_level: RiskLevel,
    /// Display-only snapshot of the run's parameters.
    pub parameters: BTreeMap<String, String>,
}

impl ApprovalRequest {
    /// Build the request for `step`.  Explicitly flagged steps are high
    /// risk; steps gated only by a tool-name pattern are medium.
    pub fn for_step(skill: &SkillDefinition, step: &ToolStep, parameters: &Parameters) -> Self {
        Self {
            skill_id: skill.id.clone(),
            skill_name: skill.name.clone(),
            step_number: step.step,
            tool_name: step.tool.clone(),
            description: step
                .description
                .clone()
                .unwrap_or_else(|| format!("Execute {}", step.tool)),
            risk_level: if step.requires_approval {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            },
            parameters: to_string_map(parameters),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Asks someone (a person, a policy) whether a step may run.
#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    async fn request_approval(&self, request: &ApprovalRequest) -> bool;
}

/// Adapts an async closure into an [`ApprovalHandler`].
pub struct ApprovalFn<F>(pub F);

#[async_trait]
impl<F, Fut> ApprovalHandler for ApprovalFn<F>
where
    F: Fn(ApprovalRequest) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send,
{
    async fn request_approval(&self, request: &ApprovalRequest) -> bool {
        (self.0)(request.clone()).await
    }
}

/// Approves or denies everything.
#[derive(Debug, Clone, Copy)]
pub struct FixedApproval(pub bool);

#[async_trait]
impl ApprovalHandler for FixedApproval {
    async fn request_approval(&self, _request: &ApprovalRequest) -> bool {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    Approved,
    Denied,
    TimedOut,
}

impl ApprovalOutcome {
    pub fn is_approved(self) -> bool {
        self == Self::Approved
    }
}

/// Race a handler's decision against `timeout`.
///
/// A decision that is ready on the same poll as the deadline wins.
pub async fn race_approval(
    handler: &dyn ApprovalHandler,
    request: &ApprovalRequest,
    timeout: Duration,
) -> ApprovalOutcome {
    tokio::select! {
        biased;

        approved = handler.request_approval(request) => {
            if approved {
                ApprovalOutcome::Approved
            } else {
                ApprovalOutcome::Denied
            }
        }
        () = tokio::time::sleep(timeout) => ApprovalOutcome::TimedOut,
    }
}

/// Routes approval requests to an optional handler.
#[derive(Clone, Default)]
pub struct ApprovalCoordinator {
    handler: Option<Arc<dyn ApprovalHandler>>,
}

impl ApprovalCoordinator {
    pub fn new(handler: Option<Arc<dyn ApprovalHandler>>) -> Self {
        Self { handler }
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    pub fn set_handler(&mut self, handler: Arc<dyn ApprovalHandler>) {
        self.handler = Some(handler);
    }

    /// Decide on `request`, waiting at most `timeout` for the handler.
    pub async fn request(&self, request: &ApprovalRequest, timeout: Duration) -> ApprovalOutcome {
        let Some(handler) = &self.handler else {
            let outcome = if request.risk_level == RiskLevel::High {
                ApprovalOutcome::Denied
            } else {
                ApprovalOutcome::Approved
            };
            tracing::debug!(
                step = request.step_number,
                tool = %request.tool_name,
                ?outcome,
                "no approval handler registered"
            );
            return outcome;
        };

        tracing::info!(
            skill_id = %request.skill_id,
            step = request.step_number,
            tool = %request.tool_name,
            risk = %request.risk_level,
            "requesting approval"
        );
        let outcome = race_approval(handler.as_ref(), request, timeout).await;
        tracing::info!(step = request.step_number, ?outcome, "approval decided");
        outcome
    }

    /// Boolean form of [`request`](Self::request): only an explicit yes
    /// within the timeout counts.
    pub async fn request_approval(&self, request: &ApprovalRequest, timeout: Duration) -> bool {
        self.request(request, timeout).await.is_approved()
    }
}

impl std::fmt::Debug for ApprovalCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalCoordinator")
            .field("has_handler", &self.has_handler())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    fn request(risk_level: RiskLevel) -> ApprovalRequest {
        ApprovalRequest {
            skill_id: "s".into(),
            skill_name: "S".into(),
            step_number: 2,
            tool_name: "place_order".into(),
            description: "Place the order".into(),
            risk_level,
            parameters: BTreeMap::new(),
        }
    }

    fn delayed(delay: Duration, answer: bool) -> Arc<dyn ApprovalHandler> {
        Arc::new(ApprovalFn(move |_: ApprovalRequest| async move {
            tokio::time::sleep(delay).await;
            answer
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn answer_before_timeout_wins() {
        let coordinator = ApprovalCoordinator::new(Some(delayed(Duration::from_secs(1), true)));
        let outcome = coordinator
            .request(&request(RiskLevel::High), Duration::from_secs(5))
            .await;
        assert_eq!(outcome, ApprovalOutcome::Approved);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_before_answer_wins() {
        let coordinator = ApprovalCoordinator::new(Some(delayed(Duration::from_secs(1), true)));
        let outcome = coordinator
            .request(&request(RiskLevel::High), Duration::from_millis(500))
            .await;
        assert_eq!(outcome, ApprovalOutcome::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn ready_answer_beats_elapsed_deadline() {
        for _ in 0..200 {
            let outcome =
                race_approval(&FixedApproval(true), &request(RiskLevel::High), Duration::ZERO).await;
            assert_eq!(outcome, ApprovalOutcome::Approved);
        }
        assert!(
            !coordinator
                .request_approval(&request(RiskLevel::High), Duration::from_millis(500))
                .await
        );
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_denial() {
        let coordinator = ApprovalCoordinator::new(Some(delayed(Duration::from_millis(10), false)));
        let outcome = coordinator
            .request(&request(RiskLevel::Medium), Duration::from_secs(5))
            .await;
        assert_eq!(outcome, ApprovalOutcome::Denied);
    }

    #[tokio::test(start_paused = true)]
    async fn losing_handler_is_dropped_without_finishing() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let handler = ApprovalFn(move |_: ApprovalRequest| {
            let flag = Arc::clone(&flag);
            async move {
                tokio::time::sleep(Duration::from_secs(10)).await;
                flag.store(true, Ordering::SeqCst);
                true
            }
        });

        let outcome = race_approval(&handler, &request(RiskLevel::High), Duration::from_secs(1)).await;
        assert_eq!(outcome, ApprovalOutcome::TimedOut);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn without_handler_flagged_steps_are_denied() {
        let coordinator = ApprovalCoordinator::default();
        assert!(!coordinator.has_handler());
        assert_eq!(
            coordinator
                .request(&request(RiskLevel::High), Duration::from_secs(1))
                .await,
            ApprovalOutcome::Denied
        );
        assert_eq!(
            coordinator
                .request(&request(RiskLevel::Medium), Duration::from_secs(1))
                .await,
            ApprovalOutcome::Approved
        );
    }

    #[tokio::test]
    async fn fixed_handler() {
        let coordinator = ApprovalCoordinator::new(Some(Arc::new(FixedApproval(true))));
        assert!(
            coordinator
                .request_approval(&request(RiskLevel::High), Duration::from_secs(1))
                .await
        );
    }

    #[test]
    fn request_for_step_sets_risk_and_description() {
        let skill = SkillDefinition::new("shop", "Shop", "food", "");
        let gated = ToolStep::new(1, "payment.charge");
        let flagged = ToolStep::new(2, "place_order")
            .with_description("Place the order")
            .requiring_approval();

        let mut params = Parameters::new();
        params.insert("quantity".into(), 2i64.into());

        let req = ApprovalRequest::for_step(&skill, &gated, &params);
        assert_eq!(req.risk_level, RiskLevel::Medium);
        assert_eq!(req.description, "Execute payment.charge");
        assert_eq!(req.parameters["quantity"], "2");

        let req = ApprovalRequest::for_step(&skill, &flagged, &params);
        assert_eq!(req.risk_level, RiskLevel::High);
        assert_eq!(req.description, "Place the order");
    }
}
