//! Capability checking.
//!
//! Before a skill runs, every tool it declares is probed against the
//! [`ToolProvider`].  The check always visits every tool, so a failing
//! report still lists everything that is missing.

use std::sync::Arc;

use serde::Serialize;
use skillgate_skills::{CapabilitiesDeclaration, RemoteToolGroup};

use crate::provider::ToolProvider;

/// Result of a capability check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapabilityReport {
    /// True iff no required tool is missing.
    pub can_execute: bool,
    pub available_tools: Vec<String>,
    pub missing_required: Vec<String>,
    pub missing_optional: Vec<String>,
}

impl CapabilityReport {
    /// One-line human-readable verdict.
    pub fn summary(&self) -> String {
        if !self.can_execute {
            return format!("Missing required: {}", self.missing_required.join(", "));
        }
        if self.missing_optional.is_empty() {
            "All tools available".to_owned()
        } else {
            format!(
                "Ready (optional tools missing: {})",
                self.missing_optional.join(", ")
            )
        }
    }
}

/// Probes declared tools against a provider.
#[derive(Clone)]
pub struct CapabilityChecker {
    provider: Arc<dyn ToolProvider>,
}

impl CapabilityChecker {
    pub fn new(provider: Arc<dyn ToolProvider>) -> Self {
        Self { provider }
    }

    pub async fn check(&self, declared: &CapabilitiesDeclaration) -> CapabilityReport {
        let mut report = CapabilityReport::default();

        // Built-in tools are always required.
        for tool in &declared.builtin_tools {
            if self.provider.is_available(tool).await {
                report.available_tools.push(tool.clone());
            } else {
                report.missing_required.push(tool.clone());
            }
        }

        for group in &declared.remote_tools {
            for tool in &group.tools {
                if self.remote_available(group, tool).await {
                    report.available_tools.push(tool.clone());
                } else if group.required {
                    report.missing_required.push(tool.clone());
                } else {
                    report.missing_optional.push(tool.clone());
                }
            }
        }

        report.can_execute = report.missing_required.is_empty();

        tracing::debug!(
            available = report.available_tools.len(),
            missing_required = report.missing_required.len(),
            missing_optional = report.missing_optional.len(),
            "capability check finished"
        );
        report
    }

    async fn remote_available(&self, group: &RemoteToolGroup, tool: &str) -> bool {
        let mut candidates = vec![tool.to_owned(), format!("{}.{tool}", group.provider)];
        if let Some(server) = &group.server {
            candidates.push(format!("{server}.{tool}"));
        }

        for candidate in &candidates {
            if self.provider.is_available(candidate).await {
                return true;
            }
        }
        false
    }
}

impl std::fmt::Debug for CapabilityChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityChecker").finish_non_exhaustive()
    }
}
