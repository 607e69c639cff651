//! Configuration loading: test variables file plus environment signals

mod schema;

pub use schema::TestVars;

use crate::gate::RiskAcknowledgement;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const TESTVARS_FILENAME: &str = "testvars.json";

/// Environment signal that acknowledges the destructive-run risks
pub const ACKNOWLEDGED_RISKS_ENV: &str = "GAIATEST_ACKNOWLEDGED_RISKS";

/// Environment signal that skips the timed warning
pub const SKIP_WARNING_ENV: &str = "GAIATEST_SKIP_WARNING";

pub const DEFAULT_SETTINGS_TIMEOUT_SECS: u64 = 10;

/// Load test variables from `path`, or defaults when no file was given
pub fn load_testvars(path: Option<&Path>) -> Result<TestVars> {
    let Some(path) = path else {
        return Ok(TestVars::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read testvars: {}", path.display()))?;
    let vars: TestVars = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in testvars: {}", path.display()))?;
    Ok(vars)
}

/// Whether an environment value switches a flag on: set, non-empty, and not `0`/`false`
pub fn env_flag(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") | Some("0") => false,
        Some(v) => !v.eq_ignore_ascii_case("false"),
    }
}

impl TestVars {
    /// Merge CLI flags (CLI wins)
    pub fn merge_with_cli(mut self, settings_timeout_secs: Option<u64>) -> Self {
        if settings_timeout_secs.is_some() {
            self.settings_timeout_secs = settings_timeout_secs;
        }
        self
    }

    /// Risk flags from the file OR'ed with the process environment
    pub fn acknowledgement(&self) -> RiskAcknowledgement {
        self.acknowledgement_with_env(|key| std::env::var(key).ok())
    }

    /// Risk flags with an explicit environment lookup
    pub fn acknowledgement_with_env<F>(&self, lookup: F) -> RiskAcknowledgement
    where
        F: Fn(&str) -> Option<String>,
    {
        RiskAcknowledgement {
            acknowledged_risks: self.acknowledged_risks
                || env_flag(lookup(ACKNOWLEDGED_RISKS_ENV).as_deref()),
            skip_warning: self.skip_warning || env_flag(lookup(SKIP_WARNING_ENV).as_deref()),
        }
    }

    pub fn settings_timeout(&self) -> Duration {
        Duration::from_secs(
            self.settings_timeout_secs
                .unwrap_or(DEFAULT_SETTINGS_TIMEOUT_SECS),
        )
    }

    /// Compact JSON handed to the automation client
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Contents of a fresh test variables file: every risk flag off
pub fn starter_testvars() -> String {
    format!(
        r#"{{
  "acknowledged_risks": false,
  "skip_warning": false,
  "settings_timeout_secs": {}
}}
"#,
        DEFAULT_SETTINGS_TIMEOUT_SECS
    )
}
