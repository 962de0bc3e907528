//! Skill type definitions.
//!
//! A skill is a scripted capability: trigger phrases and example prompts
//! that identify it, plus an ordered tool sequence that carries it out.
//! Definitions are owned by the catalog and treated as immutable while a
//! match or execution is in progress.

use serde::{Deserialize, Serialize};

use crate::params::{ParamValue, Parameters};

/// A complete skill definition, as loaded from a catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDefinition {
    /// Unique identifier (e.g. `home.meal_planning.v1`).
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Semantic version string.
    #[serde(default = "default_version")]
    pub version: String,

    /// Category used for keyword matching and grouping.
    #[serde(default)]
    pub category: String,

    /// One-line description shown in listings.
    #[serde(default)]
    pub short_description: String,

    /// Full description; falls back to the short one when empty.
    #[serde(default)]
    pub full_description: String,

    /// Free-form tags for search.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Trigger phrases, in priority order.
    #[serde(default)]
    pub voice_triggers: Vec<String>,

    /// Example prompts that should route to this skill.
    #[serde(default)]
    pub example_prompts: Vec<String>,

    /// Tools the skill needs.
    #[serde(default)]
    pub capabilities: CapabilitiesDeclaration,

    /// Ordered tool sequence.
    #[serde(default)]
    pub tool_sequence: Vec<ToolStep>,

    /// Alternative sequence for when the primary one fails.
    #[serde(default)]
    pub fallback_sequence: Option<Vec<ToolStep>>,

    /// Emergency detection and disclaimers.
    #[serde(default)]
    pub safety_constraints: Option<SafetyConstraints>,

    /// Tool-name patterns that always need sign-off.
    #[serde(default)]
    pub approval_gates: Option<ApprovalGates>,
}

fn default_version() -> String {
    "1.0.0".into()
}

impl SkillDefinition {
    /// Create a skill with the given identity and no steps.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        short_description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: default_version(),
            category: category.into(),
            short_description: short_description.into(),
            full_description: String::new(),
            tags: Vec::new(),
            voice_triggers: Vec::new(),
            example_prompts: Vec::new(),
            capabilities: CapabilitiesDeclaration::default(),
            tool_sequence: Vec::new(),
            fallback_sequence: None,
            safety_constraints: None,
            approval_gates: None,
        }
    }

    pub fn with_voice_triggers<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.voice_triggers = triggers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_example_prompts<I, S>(mut self, prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.example_prompts = prompts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_steps(mut self, steps: Vec<ToolStep>) -> Self {
        self.tool_sequence = steps;
        self
    }

    pub fn with_fallback(mut self, steps: Vec<ToolStep>) -> Self {
        self.fallback_sequence = Some(steps);
        self
    }

    pub fn with_capabilities(mut self, capabilities: CapabilitiesDeclaration) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_safety(mut self, safety: SafetyConstraints) -> Self {
        self.safety_constraints = Some(safety);
        self
    }

    pub fn with_approval_gates(mut self, gates: ApprovalGates) -> Self {
        self.approval_gates = Some(gates);
        self
    }

    /// The full description, or the short one if no full text was given.
    pub fn description(&self) -> &str {
        if self.full_description.is_empty() {
            &self.short_description
        } else {
            &self.full_description
        }
    }

    /// The tool sequence sorted by ascending step number.
    pub fn ordered_steps(&self) -> Vec<&ToolStep> {
        let mut steps: Vec<&ToolStep> = self.tool_sequence.iter().collect();
        steps.sort_by_key(|s| s.step);
        steps
    }

    /// Every parameter name consumed by any step, in first-seen order.
    pub fn parameter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for step in self.ordered_steps() {
            for param in &step.params {
                if !names.contains(&param.as_str()) {
                    names.push(param);
                }
            }
        }
        names
    }
}

/// A single step in a tool sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolStep {
    /// Step number (1-based). Defines execution order.
    pub step: u32,

    /// Tool to invoke (e.g. `google_calendar.create_event`).
    pub tool: String,

    /// Names of caller parameters this step consumes.
    #[serde(default)]
    pub params: Vec<String>,

    /// Fixed parameter values; caller parameters with the same name win.
    #[serde(default)]
    pub static_params: Parameters,

    /// Human-readable description, shown in approval prompts.
    #[serde(default)]
    pub description: Option<String>,

    /// Whether the user must approve this step before it runs.
    #[serde(default)]
    pub requires_approval: bool,

    /// Optional `key == "value"` guard.
    #[serde(default)]
    pub condition: Option<String>,
}

impl ToolStep {
    pub fn new(step: u32, tool: impl Into<String>) -> Self {
        Self {
            step,
            tool: tool.into(),
            params: Vec::new(),
            static_params: Parameters::new(),
            description: None,
            requires_approval: false,
            condition: None,
        }
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_static_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.static_params.insert(name.into(), value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn requiring_approval(mut self) -> Self {
        self.requires_approval = true;
        self
    }
}

/// Tools a skill needs in order to run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilitiesDeclaration {
    /// Built-in tools. These are always required.
    #[serde(default)]
    pub builtin_tools: Vec<String>,

    /// Tools served by remote providers.
    #[serde(default)]
    pub remote_tools: Vec<RemoteToolGroup>,
}

impl CapabilitiesDeclaration {
    pub fn with_builtin<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builtin_tools.extend(tools.into_iter().map(Into::into));
        self
    }

    pub fn with_remote(mut self, group: RemoteToolGroup) -> Self {
        self.remote_tools.push(group);
        self
    }
}

/// A group of tools from one remote provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteToolGroup {
    /// Provider identifier (e.g. `rube`, `standalone`).
    pub provider: String,

    /// Server identifier within the provider, if any.
    #[serde(default)]
    pub server: Option<String>,

    /// Tool names.
    #[serde(default)]
    pub tools: Vec<String>,

    /// Whether the skill can run without these tools.
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl RemoteToolGroup {
    pub fn new<I, S>(provider: impl Into<String>, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            provider: provider.into(),
            server: None,
            tools: tools.into_iter().map(Into::into).collect(),
            required: true,
        }
    }

    pub fn on_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Safety constraints evaluated before any tool runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafetyConstraints {
    /// Input containing any of these stops the run immediately.
    #[serde(default)]
    pub emergency_keywords: Vec<String>,

    /// What to tell the user when an emergency keyword is found.
    #[serde(default)]
    pub emergency_action: Option<String>,

    /// Disclaimers appended to successful responses.
    #[serde(default)]
    pub required_disclaimers: Vec<String>,

    /// Actions the skill must never take. Informational.
    #[serde(default)]
    pub prohibited_actions: Vec<String>,
}

impl SafetyConstraints {
    pub fn with_emergency<I, S>(keywords: I, action: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            emergency_keywords: keywords.into_iter().map(Into::into).collect(),
            emergency_action: Some(action.into()),
            ..Self::default()
        }
    }

    pub fn with_disclaimers<I, S>(mut self, disclaimers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_disclaimers = disclaimers.into_iter().map(Into::into).collect();
        self
    }
}

/// Tool-name patterns that require approval regardless of step flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalGates {
    /// Case-insensitive substrings of tool names considered high risk.
    #[serde(default)]
    pub high_risk: Vec<String>,

    /// Overrides the runtime's approval timeout for this skill.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl ApprovalGates {
    pub fn high_risk<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            high_risk: patterns.into_iter().map(Into::into).collect(),
            timeout_seconds: None,
        }
    }

    /// Whether `tool` matches any high-risk pattern.
    pub fn matches(&self, tool: &str) -> bool {
        let tool = tool.to_lowercase();
        self.high_risk
            .iter()
            .any(|pattern| tool.contains(&pattern.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_minimal_definition() {
        let json = r#"{
            "id": "home.groceries",
            "name": "Order Groceries",
            "tool_sequence": [{"step": 1, "tool": "check_pantry"}]
        }"#;
        let skill: SkillDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(skill.version, "1.0.0");
        assert_eq!(skill.tool_sequence.len(), 1);
        assert!(!skill.tool_sequence[0].requires_approval);
        assert!(skill.fallback_sequence.is_none());
    }

    #[test]
    fn remote_groups_default_to_required() {
        let json = r#"{"provider": "rube", "tools": ["gmail_send"]}"#;
        let group: RemoteToolGroup = serde_json::from_str(json).unwrap();
        assert!(group.required);
        assert!(group.server.is_none());
    }

    #[test]
    fn ordered_steps_sorts_by_number() {
        let skill = SkillDefinition::new("s", "S", "test", "").with_steps(vec![
            ToolStep::new(3, "c"),
            ToolStep::new(1, "a"),
            ToolStep::new(2, "b"),
        ]);
        let tools: Vec<&str> = skill.ordered_steps().iter().map(|s| s.tool.as_str()).collect();
        assert_eq!(tools, ["a", "b", "c"]);
    }

    #[test]
    fn parameter_names_are_deduplicated() {
        let skill = SkillDefinition::new("s", "S", "test", "").with_steps(vec![
            ToolStep::new(1, "a").with_params(["date", "meal"]),
            ToolStep::new(2, "b").with_params(["meal", "store"]),
        ]);
        assert_eq!(skill.parameter_names(), ["date", "meal", "store"]);
    }

    #[test]
    fn description_falls_back_to_short() {
        let mut skill = SkillDefinition::new("s", "S", "test", "short");
        assert_eq!(skill.description(), "short");
        skill.full_description = "long".into();
        assert_eq!(skill.description(), "long");
    }

    #[test]
    fn approval_gate_matching_is_case_insensitive() {
        let gates = ApprovalGates::high_risk(["Payment", "send_"]);
        assert!(gates.matches("stripe_payment_create"));
        assert!(gates.matches("EMAIL_SEND_MESSAGE"));
        assert!(!gates.matches("calendar_list"));
    }
}
