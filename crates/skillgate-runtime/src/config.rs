//! Runtime configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for [`SkillRuntime`](crate::SkillRuntime).
///
/// Durations are written as (possibly fractional) seconds when serialized,
/// e.g. `approval_timeout_secs = 30`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// How long to wait for an approval decision.
    ///
    /// Default: **30 s**.  A skill's approval gates may override it.
    #[serde(rename = "approval_timeout_secs", with = "seconds")]
    pub approval_timeout: Duration,

    /// Wall-clock budget for a whole run, checked after every step.
    ///
    /// Default: **300 s**.
    #[serde(rename = "max_execution_time_secs", with = "seconds")]
    pub max_execution_time: Duration,

    /// Whether emergency keywords are checked before a run.
    pub enable_safety_checks: bool,

    /// Whether a declared fallback sequence runs after a step failure.
    ///
    /// When off, the fallback is only noted in the audit trail.  When on,
    /// fallback steps are appended to the run's step results after the
    /// primary ones and reuse their own step numbers, so a fallback step's
    /// `_stepN_output` replaces the primary step N output for later steps.
    /// Fallback tools are not part of the up-front capability check; a
    /// missing one fails its step.
    pub execute_fallback: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            approval_timeout: Duration::from_secs(30),
            max_execution_time: Duration::from_secs(300),
            enable_safety_checks: true,
            execute_fallback: false,
        }
    }
}

impl RuntimeConfig {
    pub fn with_approval_timeout(mut self, timeout: Duration) -> Self {
        self.approval_timeout = timeout;
        self
    }

    pub fn with_max_execution_time(mut self, budget: Duration) -> Self {
        self.max_execution_time = budget;
        self
    }

    pub fn with_safety_checks(mut self, enabled: bool) -> Self {
        self.enable_safety_checks = enabled;
        self
    }

    pub fn with_fallback_execution(mut self, enabled: bool) -> Self {
        self.execute_fallback = enabled;
        self
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
