//! Inline capture: pull artifacts from the live target at failure time

use super::DebugGatherer;
use crate::client::{AutomationClient, ClientError};
use crate::{Artifact, ArtifactKind, CaseIdentity, DebugBundle};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Privileged query returning the whole settings store through one callback
pub const SETTINGS_QUERY: &str = r#"
SpecialPowers.addPermission('settings-read', true, document);
var req = window.navigator.mozSettings.createLock().get('*');
req.onsuccess = function() {
  marionetteScriptFinished(req.result);
}"#;

#[derive(Debug, Error)]
enum CaptureError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("no settings response within {0:?}")]
    Timeout(Duration),
    #[error("settings snapshot is not serializable: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub struct InlineCapture {
    settings_timeout: Duration,
}

impl InlineCapture {
    pub fn new(settings_timeout: Duration) -> Self {
        Self { settings_timeout }
    }

    /// Single round-trip settings query, bounded by `settings_timeout`. No retry.
    async fn settings_snapshot(
        &self,
        client: &mut dyn AutomationClient,
    ) -> Result<String, CaptureError> {
        client.switch_to_frame().await?;
        let value = tokio::time::timeout(
            self.settings_timeout,
            client.execute_async_script(SETTINGS_QUERY, true),
        )
        .await
        .map_err(|_| CaptureError::Timeout(self.settings_timeout))??;
        Ok(serde_json::to_string(&value)?)
    }
}

#[async_trait]
impl DebugGatherer for InlineCapture {
    async fn gather(
        &self,
        case: &CaseIdentity,
        client: &mut dyn AutomationClient,
    ) -> DebugBundle {
        let mut bundle = DebugBundle::new();

        match client.screenshot().await {
            Ok(png) => bundle.push(Artifact::inline(ArtifactKind::Screenshot, png)),
            Err(e) => debug!(case = %case, error = %e, "screenshot capture failed"),
        }
        match client.page_source().await {
            Ok(source) => bundle.push(Artifact::inline(ArtifactKind::Source, source)),
            Err(e) => debug!(case = %case, error = %e, "page source capture failed"),
        }
        match self.settings_snapshot(client).await {
            Ok(json) => bundle.push(Artifact::inline(ArtifactKind::Settings, json)),
            Err(e) => debug!(case = %case, error = %e, "settings snapshot failed"),
        }

        bundle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{CaseReport, CaseSpec, CaseStatus};
    use serde_json::json;

    /// Live target stand-in; each hook can be switched off
    struct FakeTarget {
        screenshot: bool,
        source: bool,
        settings: Option<serde_json::Value>,
        settings_delay: Duration,
        script_calls: usize,
    }

    impl FakeTarget {
        fn healthy() -> Self {
            Self {
                screenshot: true,
                source: true,
                settings: Some(json!({"wifi.enabled": true})),
                settings_delay: Duration::ZERO,
                script_calls: 0,
            }
        }
    }

    #[async_trait]
    impl AutomationClient for FakeTarget {
        async fn run_case(&mut self, _case: &CaseSpec) -> Result<CaseReport, ClientError> {
            Ok(CaseReport {
                status: CaseStatus::Failed,
                output: String::new(),
            })
        }

        async fn screenshot(&mut self) -> Result<Vec<u8>, ClientError> {
            if self.screenshot {
                Ok(vec![0x89, b'P', b'N', b'G'])
            } else {
                Err(ClientError::Unreachable("screen off".into()))
            }
        }

        async fn page_source(&mut self) -> Result<String, ClientError> {
            if self.source {
                Ok("<html><body id=\"clock\"/></html>".into())
            } else {
                Err(ClientError::Unreachable("no frame".into()))
            }
        }

        async fn switch_to_frame(&mut self) -> Result<(), ClientError> {
            Ok(())
        }

        async fn execute_async_script(
            &mut self,
            script: &str,
            special_powers: bool,
        ) -> Result<serde_json::Value, ClientError> {
            self.script_calls += 1;
            assert!(special_powers);
            assert!(script.contains("mozSettings"));
            tokio::time::sleep(self.settings_delay).await;
            self.settings
                .clone()
                .ok_or_else(|| ClientError::Script("permission denied".into()))
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn case() -> CaseIdentity {
        CaseIdentity::new("TestClock", "test_alarm")
    }

    #[tokio::test]
    async fn test_gathers_all_three_artifacts() {
        let mut target = FakeTarget::healthy();
        let bundle = InlineCapture::new(Duration::from_secs(1))
            .gather(&case(), &mut target)
            .await;
        assert_eq!(bundle.len(), 3);
        assert!(bundle.get(ArtifactKind::Screenshot).is_some());
        let settings = bundle.get(ArtifactKind::Settings).unwrap();
        assert_eq!(
            settings.content,
            crate::ArtifactContent::Inline {
                data: br#"{"wifi.enabled":true}"#.to_vec()
            }
        );
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let mut target = FakeTarget {
            screenshot: false,
            source: true,
            settings: None,
            ..FakeTarget::healthy()
        };
        let bundle = InlineCapture::new(Duration::from_secs(1))
            .gather(&case(), &mut target)
            .await;
        assert_eq!(bundle.len(), 1);
        assert!(bundle.get(ArtifactKind::Source).is_some());
    }

    #[tokio::test]
    async fn test_settings_timeout_gives_up_after_one_call() {
        let mut target = FakeTarget {
            settings_delay: Duration::from_secs(30),
            ..FakeTarget::healthy()
        };
        let bundle = InlineCapture::new(Duration::from_millis(20))
            .gather(&case(), &mut target)
            .await;
        assert!(bundle.get(ArtifactKind::Settings).is_none());
        assert_eq!(target.script_calls, 1);
        assert_eq!(bundle.len(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_client_gives_empty_bundle() {
        let mut client = crate::client::CommandClient::new(".");
        let bundle = InlineCapture::new(Duration::from_millis(10))
            .gather(&case(), &mut client)
            .await;
        assert!(bundle.is_empty());
    }
}
