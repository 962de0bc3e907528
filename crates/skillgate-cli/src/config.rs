//! Application configuration.
//!
//! Read from the TOML file given by `--config` (a missing file means
//! defaults), then overridden by `SKILLGATE_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use skillgate_chat::FastPathConfig;
use skillgate_intent::MatcherConfig;
use skillgate_runtime::RuntimeConfig;

/// Settings loaded from `config/default.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory of skill JSON files.
    pub skills_dir: PathBuf,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub matcher: MatcherConfig,
    pub runtime: RuntimeConfig,
    pub fast_path: FastPathConfig,
    pub tools: ToolsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            skills_dir: PathBuf::from("skills"),
            log_level: "warn".to_owned(),
            matcher: MatcherConfig::default(),
            runtime: RuntimeConfig::default(),
            fast_path: FastPathConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

/// The `[tools]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Tool names to report as unavailable.
    pub unavailable: Vec<String>,
}

impl AppConfig {
    /// Load `path`, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid config in {}", path.display()))
    }

    /// Apply `SKILLGATE_*` overrides, looking each key up with `var`.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = var("SKILLGATE_SKILLS_DIR") {
            self.skills_dir = PathBuf::from(dir);
        }
        if let Some(level) = var("SKILLGATE_LOG") {
            self.log_level = level;
        }

        if let Some(v) = var("SKILLGATE_MIN_CONFIDENCE") {
            self.matcher.minimum_confidence = parse(&v, "SKILLGATE_MIN_CONFIDENCE")?;
        }
        if let Some(v) = var("SKILLGATE_FUZZY_MATCHING") {
            self.matcher.enable_fuzzy_matching = parse(&v, "SKILLGATE_FUZZY_MATCHING")?;
        }

        if let Some(v) = var("SKILLGATE_APPROVAL_TIMEOUT_SECS") {
            self.runtime.approval_timeout = seconds(&v, "SKILLGATE_APPROVAL_TIMEOUT_SECS")?;
        }
        if let Some(v) = var("SKILLGATE_MAX_EXECUTION_TIME_SECS") {
            self.runtime.max_execution_time = seconds(&v, "SKILLGATE_MAX_EXECUTION_TIME_SECS")?;
        }
        if let Some(v) = var("SKILLGATE_SAFETY_CHECKS") {
            self.runtime.enable_safety_checks = parse(&v, "SKILLGATE_SAFETY_CHECKS")?;
        }
        if let Some(v) = var("SKILLGATE_EXECUTE_FALLBACK") {
            self.runtime.execute_fallback = parse(&v, "SKILLGATE_EXECUTE_FALLBACK")?;
        }

        if let Some(v) = var("SKILLGATE_FAST_PATH") {
            self.fast_path.enabled = parse(&v, "SKILLGATE_FAST_PATH")?;
        }
        if let Some(v) = var("SKILLGATE_FAST_PATH_THRESHOLD") {
            self.fast_path.confidence_threshold = parse(&v, "SKILLGATE_FAST_PATH_THRESHOLD")?;
        }

        Ok(())
    }
}

fn parse<T>(value: &str, key: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {key}: `{value}`"))
}

fn seconds(value: &str, key: &str) -> Result<Duration> {
    let secs: f64 = parse(value, key)?;
    Duration::try_from_secs_f64(secs).with_context(|| format!("invalid duration for {key}: `{value}`"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.skills_dir, PathBuf::from("skills"));
        assert_eq!(config.matcher, MatcherConfig::default());
        assert_eq!(config.runtime, RuntimeConfig::default());
    }

    #[test]
    fn reads_every_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
skills_dir = "demo"

[matcher]
minimum_confidence = 0.5

[runtime]
approval_timeout_secs = 10
execute_fallback = true

[fast_path]
confidence_threshold = 0.9

[tools]
unavailable = ["gmail_send"]
"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.skills_dir, PathBuf::from("demo"));
        assert_eq!(config.matcher.minimum_confidence, 0.5);
        assert!(config.matcher.enable_fuzzy_matching);
        assert_eq!(config.runtime.approval_timeout, Duration::from_secs(10));
        assert!(config.runtime.execute_fallback);
        assert_eq!(config.fast_path.confidence_threshold, 0.9);
        assert_eq!(config.tools.unavailable, ["gmail_send"]);
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SKILLGATE_MIN_CONFIDENCE", "0.7"),
            ("SKILLGATE_FUZZY_MATCHING", "false"),
            ("SKILLGATE_APPROVAL_TIMEOUT_SECS", "0.5"),
            ("SKILLGATE_FAST_PATH", "false"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| (*v).to_owned()))
            .unwrap();

        assert_eq!(config.matcher.minimum_confidence, 0.7);
        assert!(!config.matcher.enable_fuzzy_matching);
        assert_eq!(config.runtime.approval_timeout, Duration::from_millis(500));
        assert!(!config.fast_path.enabled);
    }

    #[test]
    fn bad_override_is_an_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|key| (key == "SKILLGATE_SAFETY_CHECKS").then(|| "maybe".to_owned()))
            .unwrap_err();
        assert!(err.to_string().contains("SKILLGATE_SAFETY_CHECKS"));
    }
}
