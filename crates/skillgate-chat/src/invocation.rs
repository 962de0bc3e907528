//! Skill invocation through LLM tool calls.
//!
//! Every catalog skill is exposed to the model as a function named
//! `skill_<id>` (dots become underscores).  The model may also call the
//! generic `execute_skill` function with an explicit `skill_id`.

use serde_json::{Map, Value, json};
use skillgate_skills::{ParamValue, Parameters, SkillCatalog, SkillDefinition};

use crate::error::{ChatError, Result};
use crate::types::{SkillInvocation, ToolCall, ToolSpec};

pub const EXECUTE_SKILL_TOOL: &str = "execute_skill";
pub const SKILL_TOOL_PREFIX: &str = "skill_";

const ID_KEYS: [&str; 2] = ["skill_id", "skillId"];
const PARAMETERS_KEY: &str = "parameters";

/// Function name under which `skill_id` is offered to the model.
pub fn tool_name_for(skill_id: &str) -> String {
    format!("{SKILL_TOOL_PREFIX}{}", skill_id.replace('.', "_"))
}

pub fn is_skill_call(name: &str) -> bool {
    name == EXECUTE_SKILL_TOOL || name.starts_with(SKILL_TOOL_PREFIX)
}

/// Interpret a tool call as a skill invocation.
///
/// Returns `Ok(None)` for tool calls that are not skill calls.  The skill id
/// comes from a `skill_id` (or `skillId`) argument, or failing that from a
/// catalog skill whose function name matches the call.  Parameters come from
/// a `parameters` object when present, otherwise from the remaining
/// top-level arguments.
pub fn parse_skill_invocation(
    call: &ToolCall,
    catalog: &dyn SkillCatalog,
) -> Result<Option<SkillInvocation>> {
    if !is_skill_call(&call.name) {
        return Ok(None);
    }

    let mut args = arguments_object(call)?;

    let explicit_id = ID_KEYS
        .iter()
        .find_map(|key| args.get(*key).and_then(Value::as_str).map(str::to_owned));
    let skill_id = match explicit_id {
        Some(id) => id,
        None => catalog
            .list_all()
            .iter()
            .find(|skill| tool_name_for(&skill.id) == call.name)
            .map(|skill| skill.id.clone())
            .ok_or_else(|| ChatError::MissingSkillId(call.name.clone()))?,
    };

    let raw = match args.remove(PARAMETERS_KEY) {
        Some(Value::Object(map)) => map,
        Some(Value::Null) | None => {
            for key in ID_KEYS {
                args.remove(key);
            }
            args
        }
        Some(other) => {
            return Err(ChatError::InvalidArguments {
                tool: call.name.clone(),
                reason: format!("`parameters` must be an object, got {other}"),
            });
        }
    };

    let parameters = convert_parameters(raw)?;
    tracing::debug!(
        tool = %call.name,
        skill_id = %skill_id,
        params = parameters.len(),
        "parsed skill invocation"
    );

    Ok(Some(SkillInvocation {
        skill_id,
        parameters,
        tool_call_id: call.id.clone(),
    }))
}

fn arguments_object(call: &ToolCall) -> Result<Map<String, Value>> {
    let value = match &call.arguments {
        Value::String(text) if text.trim().is_empty() => Value::Object(Map::new()),
        Value::String(text) => serde_json::from_str(text)?,
        other => other.clone(),
    };

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ChatError::InvalidArguments {
            tool: call.name.clone(),
            reason: format!("expected a JSON object, got {other}"),
        }),
    }
}

fn convert_parameters(raw: Map<String, Value>) -> Result<Parameters> {
    let mut parameters = Parameters::new();
    for (name, value) in raw {
        if value.is_null() {
            continue;
        }
        let value = ParamValue::from_json(&value)
            .ok_or_else(|| ChatError::UnsupportedParameter { name: name.clone() })?;
        parameters.insert(name, value);
    }
    Ok(parameters)
}

// ---------------------------------------------------------------------------
// Tool specs
// ---------------------------------------------------------------------------

/// One function spec per catalog skill.
pub fn skill_tool_specs(catalog: &dyn SkillCatalog) -> Vec<ToolSpec> {
    catalog
        .list_all()
        .iter()
        .map(|skill| skill_tool_spec(skill))
        .collect()
}

pub fn skill_tool_spec(skill: &SkillDefinition) -> ToolSpec {
    let mut properties = Map::new();
    for step in skill.ordered_steps() {
        // Underscore names are filled in by the runtime.
        for param in step.params.iter().filter(|p| !p.starts_with('_')) {
            properties.entry(param.clone()).or_insert_with(|| {
                json!({
                    "type": "string",
                    "description": format!("Parameter for {}", step.tool),
                })
            });
        }
    }

    let description = if skill.voice_triggers.is_empty() {
        skill.short_description.clone()
    } else {
        format!(
            "{}. Triggers: {}",
            skill.short_description.trim_end_matches('.'),
            skill.voice_triggers.join(", ")
        )
    };

    ToolSpec {
        name: tool_name_for(&skill.id),
        description,
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": [],
        }),
    }
}
