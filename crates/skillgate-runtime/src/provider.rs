//! Tool provider surface.
//!
//! The runtime only ever talks to tools through [`ToolProvider`]: "is this
//! tool available" and "run this tool with these parameters".  A
//! [`ToolRegistry`] implements that over any number of [`ToolSource`]s
//! (built-in tools, remote providers, third-party aggregators) and resolves
//! loosely written tool names to a concrete source.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skillgate_skills::Parameters;

use crate::error::ToolError;

/// Name prefixes ignored when matching tool names loosely.
pub const DEFAULT_NAME_PREFIXES: &[&str] = &["builtin.", "rube_", "composio_"];

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// The runtime's view of the tool backends.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Whether a tool with this name can currently be executed.
    async fn is_available(&self, name: &str) -> bool;

    /// Execute a tool and return its textual output.
    async fn execute(&self, name: &str, params: &Parameters) -> Result<String, ToolError>;
}

/// Where a tool comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Builtin,
    Remote,
    Aggregator,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Builtin => "Built-in",
            Self::Remote => "Remote provider",
            Self::Aggregator => "Aggregator",
        })
    }
}

/// A tool as advertised by its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

/// One tool backend.
#[async_trait]
pub trait ToolSource: Send + Sync {
    /// Identifier of the source, also used as the `<id>.<tool>` qualifier.
    fn id(&self) -> &str;

    fn kind(&self) -> SourceKind;

    /// Tools this source currently offers.
    async fn tools(&self) -> Vec<ToolDescriptor>;

    /// Execute one of this source's tools by its own name.
    async fn execute(&self, tool: &str, params: &Parameters) -> Result<String, ToolError>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Information about a resolved tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub source: SourceKind,
    pub source_id: String,
    pub enabled: bool,
}

/// Tool names grouped by source kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AvailableTools {
    pub builtin: Vec<String>,
    pub remote: Vec<String>,
    pub aggregator: Vec<String>,
}

impl AvailableTools {
    pub fn total_count(&self) -> usize {
        self.builtin.len() + self.remote.len() + self.aggregator.len()
    }

    pub fn all(&self) -> Vec<&str> {
        self.builtin
            .iter()
            .chain(&self.remote)
            .chain(&self.aggregator)
            .map(String::as_str)
            .collect()
    }
}

/// A [`ToolProvider`] over an ordered list of sources.
///
/// A requested name resolves, first hit wins, by:
///
/// 1. exact tool name, in source registration order;
/// 2. the qualified `<source id>.<tool>` form;
/// 3. case-insensitive comparison after stripping one known prefix from
///    both names.
#[derive(Clone)]
pub struct ToolRegistry {
    sources: Vec<Arc<dyn ToolSource>>,
    prefixes: Vec<String>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            prefixes: DEFAULT_NAME_PREFIXES.iter().map(|p| (*p).to_owned()).collect(),
        }
    }

    /// Add a source; earlier sources win on name collisions.
    pub fn register(&mut self, source: Arc<dyn ToolSource>) {
        tracing::debug!(source = %source.id(), kind = %source.kind(), "tool source registered");
        self.sources.push(source);
    }

    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn ToolSource>) -> Self {
        self.register(source);
        self
    }

    /// Replace the prefixes stripped during loose matching.
    #[must_use]
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(|p| p.into().to_lowercase()).collect();
        self
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Lowercase and strip the first matching prefix.
    pub fn normalize_name(&self, name: &str) -> String {
        let lowered = name.to_lowercase();
        self.prefixes
            .iter()
            .find_map(|p| lowered.strip_prefix(p.as_str()))
            .map_or_else(|| lowered.clone(), str::to_owned)
    }

    /// Find the source and source-local descriptor for a requested name.
    async fn resolve(&self, name: &str) -> Option<(Arc<dyn ToolSource>, ToolDescriptor)> {
        let mut listings = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            listings.push((Arc::clone(source), source.tools().await));
        }

        let exact = listings.iter().find_map(|(source, tools)| {
            tools
                .iter()
                .find(|t| t.name == name)
                .map(|t| (Arc::clone(source), t.clone()))
        });
        if exact.is_some() {
            return exact;
        }

        let qualified = listings.iter().find_map(|(source, tools)| {
            let rest = name.strip_prefix(source.id())?.strip_prefix('.')?;
            tools
                .iter()
                .find(|t| t.name == rest)
                .map(|t| (Arc::clone(source), t.clone()))
        });
        if qualified.is_some() {
            return qualified;
        }

        let wanted = self.normalize_name(name);
        listings.iter().find_map(|(source, tools)| {
            tools
                .iter()
                .find(|t| self.normalize_name(&t.name) == wanted)
                .map(|t| (Arc::clone(source), t.clone()))
        })
    }

    /// Every enabled tool, grouped by source kind.
    pub async fn available_tools(&self) -> AvailableTools {
        let mut available = AvailableTools::default();
        for source in &self.sources {
            let names = source
                .tools()
                .await
                .into_iter()
                .filter(|t| t.enabled)
                .map(|t| t.name);
            match source.kind() {
                SourceKind::Builtin => available.builtin.extend(names),
                SourceKind::Remote => available.remote.extend(names),
                SourceKind::Aggregator => available.aggregator.extend(names),
            }
        }
        available
    }

    /// Details about a tool, if any source provides it.
    pub async fn tool_info(&self, name: &str) -> Option<ToolInfo> {
        let (source, tool) = self.resolve(name).await?;
        Some(ToolInfo {
            name: tool.name,
            description: tool.description,
            source: source.kind(),
            source_id: source.id().to_owned(),
            enabled: tool.enabled,
        })
    }

    /// Availability of each named tool.
    pub async fn check_availability(&self, names: &[&str]) -> BTreeMap<String, bool> {
        let mut availability = BTreeMap::new();
        for name in names {
            availability.insert((*name).to_owned(), self.is_available(name).await);
        }
        availability
    }
}

#[async_trait]
impl ToolProvider for ToolRegistry {
    async fn is_available(&self, name: &str) -> bool {
        self.resolve(name).await.is_some_and(|(_, tool)| tool.enabled)
    }

    async fn execute(&self, name: &str, params: &Parameters) -> Result<String, ToolError> {
        let (source, tool) = self
            .resolve(name)
            .await
            .ok_or_else(|| ToolError::NotFound(name.to_owned()))?;

        if !tool.enabled {
            return Err(ToolError::NotFound(name.to_owned()));
        }

        tracing::debug!(
            tool = %tool.name,
            requested = %name,
            source = %source.id(),
            "executing tool"
        );
        source.execute(&tool.name, params).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.sources.iter().map(|s| s.id()).collect();
        f.debug_struct("ToolRegistry")
            .field("sources", &ids)
            .field("prefixes", &self.prefixes)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Static source
// ---------------------------------------------------------------------------

type ToolHandler = Arc<dyn Fn(&Parameters) -> Result<String, ToolError> + Send + Sync>;

/// A source whose tools are plain closures.
#[derive(Clone)]
pub struct StaticToolSource {
    id: String,
    kind: SourceKind,
    tools: BTreeMap<String, (ToolDescriptor, ToolHandler)>,
}

impl StaticToolSource {
    pub fn new(id: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            id: id.into(),
            kind,
            tools: BTreeMap::new(),
        }
    }

    /// Add an enabled tool.
    #[must_use]
    pub fn with_tool<F>(self, name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Parameters) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        self.insert(name.into(), description.into(), true, Arc::new(handler))
    }

    /// Add a tool that is listed but cannot run.
    #[must_use]
    pub fn with_disabled_tool(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        let missing = name.clone();
        let handler: ToolHandler = Arc::new(move |_: &Parameters| -> Result<String, ToolError> {
            Err(ToolError::NotFound(missing.clone()))
        });
        self.insert(name, description.into(), false, handler)
    }

    fn insert(mut self, name: String, description: String, enabled: bool, handler: ToolHandler) -> Self {
        let descriptor = ToolDescriptor {
            name: name.clone(),
            description,
            enabled,
        };
        self.tools.insert(name, (descriptor, handler));
        self
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[async_trait]
impl ToolSource for StaticToolSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn tools(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|(d, _)| d.clone()).collect()
    }

    async fn execute(&self, tool: &str, params: &Parameters) -> Result<String, ToolError> {
        let (_, handler) = self
            .tools
            .get(tool)
            .ok_or_else(|| ToolError::NotFound(tool.to_owned()))?;
        handler(params)
    }
}

impl std::fmt::Debug for StaticToolSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticToolSource")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}
