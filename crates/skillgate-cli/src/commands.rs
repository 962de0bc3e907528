//! Subcommand implementations.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use skillgate_chat::{FastPathService, SessionContext};
use skillgate_intent::{IntentMatchResult, IntentMatcher};
use skillgate_runtime::{
    ApprovalHandler, ExecutionContext, FixedApproval, SkillExecutionResult, SkillRuntime,
    TracingObserver,
};
use skillgate_skills::{
    InMemoryCatalog, ParamValue, Parameters, SkillCatalog, SkillDefinition, validate_skill,
};

use crate::config::AppConfig;
use crate::tools::{TerminalApproval, echo_registry};

/// Everything a subcommand needs, wired from configuration.
pub struct App {
    catalog: Arc<InMemoryCatalog>,
    matcher: Arc<IntentMatcher>,
    runtime: Arc<SkillRuntime>,
    config: AppConfig,
}

impl App {
    pub fn build(config: AppConfig, approve_all: bool) -> Result<Self> {
        let catalog = Arc::new(
            InMemoryCatalog::from_dir(&config.skills_dir).with_context(|| {
                format!("failed to load skills from {}", config.skills_dir.display())
            })?,
        );
        tracing::info!(skills = catalog.len(), dir = %config.skills_dir.display(), "catalog ready");

        let matcher = Arc::new(
            IntentMatcher::new(catalog.clone(), config.matcher)
                .context("failed to build intent matcher")?,
        );

        let approvals: Arc<dyn ApprovalHandler> = if approve_all {
            Arc::new(FixedApproval(true))
        } else {
            Arc::new(TerminalApproval)
        };
        let tools = echo_registry(catalog.as_ref(), &config.tools.unavailable);
        let runtime = Arc::new(
            SkillRuntime::new(catalog.clone(), Arc::new(tools), config.runtime.clone())
                .with_approval_handler(approvals)
                .with_observer(Arc::new(TracingObserver)),
        );

        Ok(Self {
            catalog,
            matcher,
            runtime,
            config,
        })
    }

    // -- list ---------------------------------------------------------------

    pub fn list(&self) {
        let skills = self.catalog.list_all();
        if skills.is_empty() {
            println!("No skills found in {}", self.config.skills_dir.display());
            return;
        }

        for skill in skills {
            println!(
                "{:<24} {:<24} {:<16} {} step(s)",
                skill.id,
                skill.name,
                skill.category,
                skill.tool_sequence.len()
            );
            if !skill.voice_triggers.is_empty() {
                println!("{:<24} triggers: {}", "", skill.voice_triggers.join(", "));
            }
        }
    }

    // -- match --------------------------------------------------------------

    pub fn match_input(&self, text: &str, all: bool) {
        let results = if all {
            let mut results: Vec<_> = self
                .catalog
                .list_all()
                .iter()
                .filter_map(|skill| self.matcher.matches(text, &skill.id))
                .collect();
            results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
            results
        } else {
            self.matcher.match_input(text)
        };

        if results.is_empty() {
            println!("No skill matched.");
            return;
        }
        for result in &results {
            print_match(result);
        }
    }

    // -- check --------------------------------------------------------------

    pub async fn check(&self, skill_id: &str) -> Result<()> {
        let skill = self.skill(skill_id)?;

        let issues = validate_skill(&skill);
        for issue in &issues {
            println!("invalid: {issue}");
        }

        let report = self
            .runtime
            .capability_checker()
            .check(&skill.capabilities)
            .await;
        println!("{}: {}", skill.id, report.summary());
        if !report.available_tools.is_empty() {
            println!("  available: {}", report.available_tools.join(", "));
        }

        if !report.can_execute || !issues.is_empty() {
            bail!("skill `{skill_id}` cannot run");
        }
        Ok(())
    }

    // -- run ----------------------------------------------------------------

    pub async fn run(
        &self,
        skill_id: &str,
        params: Vec<(String, String)>,
        input: Option<String>,
    ) -> Result<()> {
        let parameters: Parameters = params
            .into_iter()
            .map(|(key, value)| (key, parse_param(&value)))
            .collect();

        let context = input.map_or_else(ExecutionContext::default, ExecutionContext::for_input);

        match self.runtime.execute(skill_id, parameters, context).await {
            Ok(result) => {
                print_result(&result);
                Ok(())
            }
            Err(failure) => {
                print_result(&failure.result);
                Err(failure).context(format!("skill `{skill_id}` failed"))
            }
        }
    }

    // -- chat ---------------------------------------------------------------

    pub async fn chat(&self, text: &str) -> Result<()> {
        let service = FastPathService::new(
            Arc::clone(&self.matcher),
            Arc::clone(&self.runtime),
            self.config.fast_path,
        );
        let session = SessionContext::new("cli").with_last_input(text);

        match service.handle_turn(text, false, &session).await {
            Some((_, assistant)) => {
                println!("{}", assistant.content);
                if let Some(meta) = assistant.skill_execution {
                    println!(
                        "\n[{} · {} · {:.2}s]",
                        meta.skill_name,
                        if meta.success { "ok" } else { "failed" },
                        meta.execution_time.as_secs_f64()
                    );
                }
            }
            None => {
                println!("No confident skill match; this message would go to the LLM.");
                println!(
                    "{} skill function(s) would be offered to the model.",
                    service.skill_tool_specs().len()
                );
            }
        }
        Ok(())
    }

    fn skill(&self, skill_id: &str) -> Result<Arc<SkillDefinition>> {
        self.catalog
            .by_id(skill_id)
            .with_context(|| format!("no skill with id `{skill_id}`"))
    }
}

/// Interpret a command-line value as a bool, a number, or a string.
fn parse_param(raw: &str) -> ParamValue {
    if let Ok(b) = raw.parse::<bool>() {
        return ParamValue::Bool(b);
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => ParamValue::Number(n),
        _ => ParamValue::String(raw.to_owned()),
    }
}

fn print_match(result: &IntentMatchResult) {
    println!(
        "{:.2}  {:<24} {:<15} {}",
        result.confidence, result.skill.id, result.match_type, result.matched_trigger
    );
    for (key, value) in &result.extracted_params {
        println!("      {key} = {value}");
    }
}

fn print_result(result: &SkillExecutionResult) {
    println!("{}", result.response);
    println!();
    for step in &result.step_results {
        let status = if step.success { "ok" } else { "failed" };
        let detail = step.output.as_deref().or(step.error.as_deref()).unwrap_or("");
        println!(
            "  step {} {:<20} {:<6} {:>6}ms  {}",
            step.step_number,
            step.tool_name,
            status,
            step.duration.as_millis(),
            detail
        );
    }
    println!();
    for entry in &result.audit_trail {
        println!("  {entry}");
    }
}
