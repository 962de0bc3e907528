//! Local tool backends and the terminal approval prompt.
//!
//! The CLI has no real integrations.  Every tool a catalog skill mentions is
//! backed by an echo tool that reports what it was called with, except the
//! names listed under `[tools] unavailable`, which are registered disabled
//! so capability checks see them as missing.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use async_trait::async_trait;
use skillgate_runtime::{
    ApprovalHandler, ApprovalRequest, SourceKind, StaticToolSource, ToolError, ToolRegistry,
};
use skillgate_skills::{Parameters, SkillCatalog};

const LOCAL_SOURCE: &str = "local";

/// Build a registry with echo tools for every tool the catalog names.
pub fn echo_registry(catalog: &dyn SkillCatalog, unavailable: &[String]) -> ToolRegistry {
    let is_unavailable =
        |tool: &str| unavailable.iter().any(|name| name.eq_ignore_ascii_case(tool));

    let mut local: BTreeSet<String> = BTreeSet::new();
    let mut remote: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for skill in catalog.list_all() {
        let steps = skill
            .tool_sequence
            .iter()
            .chain(skill.fallback_sequence.iter().flatten());
        local.extend(steps.map(|step| step.tool.clone()));
        local.extend(skill.capabilities.builtin_tools.iter().cloned());
        for group in &skill.capabilities.remote_tools {
            remote
                .entry(group.provider.clone())
                .or_default()
                .extend(group.tools.iter().cloned());
        }
    }

    // A remote tool also named by a step is served by its provider.
    for tools in remote.values() {
        for tool in tools {
            local.remove(tool);
        }
    }

    let mut registry = ToolRegistry::new().with_source(Arc::new(echo_source(
        LOCAL_SOURCE,
        SourceKind::Builtin,
        &local,
        &is_unavailable,
    )));
    for (provider, tools) in &remote {
        registry.register(Arc::new(echo_source(
            provider,
            SourceKind::Remote,
            tools,
            &is_unavailable,
        )));
    }

    tracing::debug!(
        local = local.len(),
        providers = remote.len(),
        unavailable = unavailable.len(),
        "echo tools registered"
    );
    registry
}

fn echo_source(
    id: &str,
    kind: SourceKind,
    tools: &BTreeSet<String>,
    is_unavailable: &dyn Fn(&str) -> bool,
) -> StaticToolSource {
    tools.iter().fold(StaticToolSource::new(id, kind), |source, tool| {
        if is_unavailable(tool) {
            source.with_disabled_tool(tool.clone(), "Unavailable in this environment")
        } else {
            let name = tool.clone();
            source.with_tool(tool.clone(), "Echo tool", move |params: &Parameters| {
                Ok::<_, ToolError>(echo(&name, params))
            })
        }
    })
}

/// `tool(k=v, ...)`.
pub fn echo(tool: &str, params: &Parameters) -> String {
    let args: Vec<String> = params
        .iter()
        .filter(|(key, _)| !key.starts_with("_step"))
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    format!("{tool}({})", args.join(", "))
}

// ---------------------------------------------------------------------------
// Approval prompt
// ---------------------------------------------------------------------------

/// Asks on the terminal before each gated step.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalApproval;

#[async_trait]
impl ApprovalHandler for TerminalApproval {
    async fn request_approval(&self, request: &ApprovalRequest) -> bool {
        let prompt = format!(
            "\n  [{}] {} step {}: {} ({})\n  Approve? [y/N] ",
            request.risk_level,
            request.skill_name,
            request.step_number,
            request.description,
            request.tool_name,
        );

        let answer = tokio::task::spawn_blocking(move || -> io::Result<String> {
            let mut stderr = io::stderr();
            stderr.write_all(prompt.as_bytes())?;
            stderr.flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "failed to read approval answer");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "approval prompt task failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use skillgate_runtime::ToolProvider;
    use skillgate_skills::{
        CapabilitiesDeclaration, InMemoryCatalog, RemoteToolGroup, SkillDefinition, ToolStep,
    };

    use super::*;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new([SkillDefinition::new("mail", "Mail", "work", "")
            .with_capabilities(
                CapabilitiesDeclaration::default()
                    .with_builtin(["draft"])
                    .with_remote(RemoteToolGroup::new("rube", ["gmail_send"])),
            )
            .with_steps(vec![
                ToolStep::new(1, "draft").with_params(["topic"]),
                ToolStep::new(2, "gmail_send"),
            ])
            .with_fallback(vec![ToolStep::new(1, "notify")])])
    }

    #[tokio::test]
    async fn every_named_tool_echoes() {
        let registry = echo_registry(&catalog(), &[]);
        for tool in ["draft", "gmail_send", "notify", "rube.gmail_send"] {
            assert!(registry.is_available(tool).await, "{tool}");
        }

        let mut params = Parameters::new();
        params.insert("topic".into(), "launch".into());
        params.insert("_step1_output".into(), "ignored".into());
        assert_eq!(
            registry.execute("draft", &params).await.unwrap(),
            "draft(topic=launch)"
        );
        assert_eq!(registry.source_count(), 2);
    }

    #[tokio::test]
    async fn unavailable_tools_are_disabled() {
        let registry = echo_registry(&catalog(), &["GMAIL_SEND".to_owned()]);
        assert!(!registry.is_available("gmail_send").await);
        assert!(registry.is_available("draft").await);
        assert!(registry.tool_info("gmail_send").await.is_some());
    }
}
