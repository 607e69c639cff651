//! Automation client seam
//!
//! The runner never talks to the device itself; everything goes through an
//! [`AutomationClient`]. Clients that cannot reach a live target keep the
//! default debug hooks, which report [`ClientError::Unsupported`].

mod command;

pub use command::{CommandClient, SKIP_EXIT_CODE};

use crate::CaseIdentity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0} is not supported by this automation client")]
    Unsupported(&'static str),

    #[error("Case has no command to run")]
    EmptyCommand,

    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{0}` was terminated by a signal")]
    Terminated(String),

    #[error("Target unreachable: {0}")]
    Unreachable(String),

    #[error("Script failed: {0}")]
    Script(String),
}

/// One case as listed in a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSpec {
    #[serde(rename = "class")]
    pub class_name: String,
    pub name: String,
    /// Program and arguments that execute the case
    #[serde(default)]
    pub command: Vec<String>,
    /// The case is known to fail; a pass is reported as unexpected
    #[serde(default)]
    pub expected_failure: bool,
    /// Reason the case is switched off; disabled cases are skipped unrun
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<String>,
}

impl CaseSpec {
    pub fn identity(&self) -> CaseIdentity {
        CaseIdentity::new(&self.class_name, &self.name)
    }
}

/// Raw status observed by a client, before expected-failure handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStatus {
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReport {
    pub status: CaseStatus,
    /// Traceback or skip reason text
    pub output: String,
}

/// Remote-control client driving the target
#[async_trait]
pub trait AutomationClient: Send {
    /// Execute one case to completion
    async fn run_case(&mut self, case: &CaseSpec) -> Result<CaseReport, ClientError>;

    /// PNG bytes of the current screen
    async fn screenshot(&mut self) -> Result<Vec<u8>, ClientError> {
        Err(ClientError::Unsupported("screenshot"))
    }

    /// Rendered page source of the current frame
    async fn page_source(&mut self) -> Result<String, ClientError> {
        Err(ClientError::Unsupported("page source"))
    }

    /// Switch to the top-level (system) frame
    async fn switch_to_frame(&mut self) -> Result<(), ClientError> {
        Err(ClientError::Unsupported("frame switching"))
    }

    /// Run a script that reports its result through a single callback
    async fn execute_async_script(
        &mut self,
        _script: &str,
        _special_powers: bool,
    ) -> Result<serde_json::Value, ClientError> {
        Err(ClientError::Unsupported("async scripts"))
    }

    /// Display name (e.g. "command")
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_spec_from_manifest_json() {
        let case: CaseSpec = serde_json::from_str(
            r#"{"class": "TestClock", "name": "test_alarm", "command": ["run", "alarm"], "expectedFailure": true}"#,
        )
        .unwrap();
        assert_eq!(case.identity(), CaseIdentity::new("TestClock", "test_alarm"));
        assert!(case.expected_failure);
        assert!(case.disabled.is_none());
        assert_eq!(case.command, vec!["run", "alarm"]);
    }
}
