//! Integration tests for the skillgate-chat crate.
//!
//! These tests wire a real matcher and runtime behind the fast-path service
//! and check what a chat front end would see.

use std::sync::{Arc, Mutex};

use serde_json::json;
use skillgate_chat::{
    FastPathConfig, FastPathService, IntegrationListener, InvocationKind, Role, SessionContext,
    SkillInvocation, ToolCall,
};
use skillgate_intent::{IntentMatcher, MatcherConfig};
use skillgate_runtime::{RuntimeConfig, SkillRuntime, SourceKind, StaticToolSource, ToolRegistry};
use skillgate_skills::{
    CapabilitiesDeclaration, InMemoryCatalog, Parameters, RemoteToolGroup, SafetyConstraints,
    SkillDefinition, ToolStep,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl IntegrationListener for Recorder {
    fn will_execute(&self, skill_id: &str, via: InvocationKind) {
        self.events.lock().unwrap().push(format!("will {skill_id} {via}"));
    }

    fn did_execute(&self, skill_id: &str, success: bool) {
        self.events
            .lock()
            .unwrap()
            .push(format!("did {skill_id} {success}"));
    }
}

fn catalog() -> Arc<InMemoryCatalog> {
    Arc::new(InMemoryCatalog::new([
        SkillDefinition::new("meal.dinner", "Dinner Planner", "food", "Suggest dinner recipes.")
            .with_voice_triggers(["plan dinner"])
            .with_safety(SafetyConstraints::default().with_disclaimers(["Check for allergies."]))
            .with_steps(vec![ToolStep::new(1, "suggest_recipes").with_params(["cuisine"])]),
        SkillDefinition::new("email.send", "Send Email", "communication", "Send an email")
            .with_voice_triggers(["send an email"])
            .with_capabilities(
                CapabilitiesDeclaration::default()
                    .with_remote(RemoteToolGroup::new("rube", ["gmail_send"])),
            )
            .with_steps(vec![ToolStep::new(1, "gmail_send")]),
        SkillDefinition::new("health.symptoms", "Symptom Checker", "health", "Check symptoms")
            .with_voice_triggers(["check my symptoms"])
            .with_safety(SafetyConstraints::with_emergency(["chest pain"], "Call 911"))
            .with_steps(vec![ToolStep::new(1, "suggest_recipes")]),
        SkillDefinition::new("home.unlock", "Unlock Door", "home", "Unlock the front door")
            .with_voice_triggers(["unlock the door"])
            .with_steps(vec![ToolStep::new(1, "unlock").requiring_approval()]),
    ]))
}

fn service(config: FastPathConfig) -> (FastPathService, Arc<Recorder>) {
    let catalog = catalog();
    let tools = ToolRegistry::new().with_source(Arc::new(
        StaticToolSource::new("builtin", SourceKind::Builtin)
            .with_tool("suggest_recipes", "Suggest recipes", |params: &Parameters| {
                let cuisine = params
                    .get("cuisine")
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "green".to_owned());
                Ok(format!("Try {cuisine} curry"))
            })
            .with_tool("unlock", "Unlock the door", |_: &Parameters| Ok("unlocked".to_owned())),
    ));

    let runtime = Arc::new(SkillRuntime::new(
        catalog.clone(),
        Arc::new(tools),
        RuntimeConfig::default(),
    ));
    let matcher = Arc::new(IntentMatcher::new(catalog, MatcherConfig::default()).unwrap());

    let recorder = Arc::new(Recorder::default());
    let service = FastPathService::new(matcher, runtime, config).with_listener(recorder.clone());
    (service, recorder)
}

fn session() -> SessionContext {
    SessionContext::new("session-1")
}

// ═══════════════════════════════════════════════════════════════════════
//  Fast path
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn confident_match_is_answered_without_the_llm() {
    let (service, recorder) = service(FastPathConfig::default());

    let (user, assistant) = service
        .handle_turn("Plan dinner", false, &session())
        .await
        .unwrap();

    assert_eq!(user.role, Role::User);
    assert_eq!(user.content, "Plan dinner");
    assert!(user.skill_execution.is_none());

    assert_eq!(assistant.role, Role::Assistant);
    assert_eq!(assistant.content, "Try green curry\n\n---\n_Check for allergies._");
    let metadata = assistant.skill_execution.unwrap();
    assert_eq!(metadata.skill_id, "meal.dinner");
    assert_eq!(metadata.skill_name, "Dinner Planner");
    assert!(metadata.success);

    assert_eq!(
        *recorder.events.lock().unwrap(),
        ["will meal.dinner fast_path", "did meal.dinner true"]
    );
}

#[tokio::test]
async fn attachments_go_to_the_llm() {
    let (service, recorder) = service(FastPathConfig::default());
    assert!(service.handle_turn("Plan dinner", true, &session()).await.is_none());
    assert!(recorder.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn weak_matches_fall_through() {
    let (service, _) = service(FastPathConfig::default());

    // Clears the matcher's minimum but not the fast-path threshold.
    assert!(service.check_fast_path("dinner").is_none());
    assert!(service.check_fast_path("tell me a joke").is_none());
    assert!(service.handle_turn("tell me a joke", false, &session()).await.is_none());
}

#[tokio::test]
async fn disabled_fast_path_never_matches() {
    let (service, _) = service(FastPathConfig::disabled());
    assert!(service.check_fast_path("Plan dinner").is_none());
}

#[tokio::test]
async fn failures_become_specific_messages() {
    let (service, recorder) = service(FastPathConfig::default());

    let (_, assistant) = service
        .handle_turn("Send an email to Sam", false, &session())
        .await
        .unwrap();
    assert!(assistant.content.contains("'gmail_send' is not available"));
    assert!(!assistant.skill_execution.as_ref().unwrap().success);

    let (_, assistant) = service
        .handle_turn("Unlock the door", false, &session())
        .await
        .unwrap();
    assert_eq!(
        assistant.content,
        "The Unlock Door task was cancelled because approval was not granted."
    );

    let (_, assistant) = service
        .handle_turn("Check my symptoms, I have chest pain", false, &session())
        .await
        .unwrap();
    assert_eq!(assistant.content, "Emergency detected: Call 911");

    assert!(
        recorder
            .events
            .lock()
            .unwrap()
            .contains(&"did email.send false".to_owned())
    );
}

#[tokio::test]
async fn failed_fast_path_reports_error_kind() {
    let (service, _) = service(FastPathConfig::default());
    let matched = service.check_fast_path("unlock the door").unwrap();

    let response = service
        .execute_fast_path(&matched, "unlock the door", &session())
        .await;
    assert!(!response.success);
    assert_eq!(response.error_kind, Some("approval_denied"));
    assert!(response.disclaimers.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
//  LLM invocation
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn tool_call_round_trip() {
    let (service, recorder) = service(FastPathConfig::default());

    let call = ToolCall {
        id: "call_7".into(),
        name: "skill_meal_dinner".into(),
        arguments: json!({"cuisine": "thai"}),
    };
    let request = service.parse_skill_invocation(&call).unwrap().unwrap();
    assert_eq!(request.skill_id, "meal.dinner");

    let response = service
        .execute_invocation(&request, &session().with_last_input("plan a thai dinner"))
        .await;
    assert!(response.success);
    assert_eq!(response.skill_name, "Dinner Planner");
    assert_eq!(response.disclaimers, ["Check for allergies."]);
    assert!(response.response.starts_with("Try thai curry"));

    assert_eq!(
        *recorder.events.lock().unwrap(),
        ["will meal.dinner llm_invocation", "did meal.dinner true"]
    );
}

#[tokio::test]
async fn invocation_checks_the_session_input_for_emergencies() {
    let (service, _) = service(FastPathConfig::default());
    let request = SkillInvocation {
        skill_id: "health.symptoms".into(),
        parameters: Parameters::new(),
        tool_call_id: "call_1".into(),
    };

    let response = service
        .execute_invocation(&request, &session().with_last_input("I have chest pain"))
        .await;
    assert!(!response.success);
    assert_eq!(response.error_kind, Some("safety_violation"));
}

#[tokio::test]
async fn unknown_skill_invocation_is_reported() {
    let (service, _) = service(FastPathConfig::default());
    let request = SkillInvocation {
        skill_id: "nope.skill".into(),
        parameters: Parameters::new(),
        tool_call_id: "call_1".into(),
    };

    let response = service.execute_invocation(&request, &session()).await;
    assert!(!response.success);
    assert_eq!(response.skill_name, "nope.skill");
    assert_eq!(response.error_kind, Some("skill_not_found"));
}

#[test]
fn every_skill_is_advertised() {
    let (service, _) = service(FastPathConfig::default());
    let names: Vec<String> = service
        .skill_tool_specs()
        .into_iter()
        .map(|spec| spec.name)
        .collect();
    assert_eq!(
        names,
        [
            "skill_email_send",
            "skill_health_symptoms",
            "skill_home_unlock",
            "skill_meal_dinner",
        ]
    );
}

#[test]
fn non_skill_calls_are_ignored() {
    let (service, _) = service(FastPathConfig::default());
    let call = ToolCall {
        id: "call_1".into(),
        name: "web_search".into(),
        arguments: json!({"query": "weather"}),
    };
    assert!(service.parse_skill_invocation(&call).unwrap().is_none());
}
