//! Sequential run orchestration: one case at a time, one record per case

mod manifest;

pub use manifest::{load_manifest, Manifest};

use crate::capture::DebugGatherer;
use crate::client::{AutomationClient, CaseReport, CaseSpec, CaseStatus, ClientError};
use crate::reporter::ConsoleReporter;
use crate::{RunResult, TestOutcome, TestRecord};
use std::time::{Duration, Instant};
use tracing::debug;

/// Drives cases through an automation client and accumulates a [`RunResult`].
///
/// The result is owned by the run in progress and only handed out once
/// finalized.
pub struct TestRunner<'a> {
    client: &'a mut dyn AutomationClient,
    gatherer: &'a dyn DebugGatherer,
    console: Option<ConsoleReporter>,
}

impl<'a> TestRunner<'a> {
    pub fn new(client: &'a mut dyn AutomationClient, gatherer: &'a dyn DebugGatherer) -> Self {
        Self {
            client,
            gatherer,
            console: None,
        }
    }

    /// Print progress lines as cases start and finish
    pub fn with_console(mut self, console: ConsoleReporter) -> Self {
        self.console = Some(console);
        self
    }

    pub async fn run(&mut self, cases: &[CaseSpec]) -> RunResult {
        let started = Instant::now();
        let mut result = RunResult::new();
        for case in cases {
            let record = self.run_case(case).await;
            if let Some(ref console) = self.console {
                console.case_finished(&record);
            }
            result.record(record);
        }
        result.finish(started.elapsed());
        debug!(
            client = self.client.name(),
            tests = result.tests_run,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "run finished"
        );
        result
    }

    async fn run_case(&mut self, case: &CaseSpec) -> TestRecord {
        let identity = case.identity();
        if let Some(ref reason) = case.disabled {
            return TestRecord::new(
                identity,
                TestOutcome::Skipped,
                Duration::ZERO,
                Some(format!("disabled: {}", reason)),
                None,
            );
        }

        if let Some(ref console) = self.console {
            console.case_started(&identity);
        }
        let started = Instant::now();
        let observed = self.client.run_case(case).await;
        let duration = started.elapsed();

        let (outcome, narrative) = classify(case, observed);
        let debug = if matches!(outcome, TestOutcome::Failed | TestOutcome::Error) {
            Some(self.gatherer.gather(&identity, &mut *self.client).await)
        } else {
            None
        };
        TestRecord::new(identity, outcome, duration, narrative, debug)
    }
}

/// Map what the client observed onto an outcome, honouring expected failures
fn classify(
    case: &CaseSpec,
    observed: Result<CaseReport, ClientError>,
) -> (TestOutcome, Option<String>) {
    let report = match observed {
        Ok(report) => report,
        Err(e) => return (TestOutcome::Error, Some(e.to_string())),
    };
    match (report.status, case.expected_failure) {
        (CaseStatus::Passed, false) => (TestOutcome::Passed, None),
        (CaseStatus::Passed, true) => (TestOutcome::UnexpectedPass, None),
        (CaseStatus::Failed, false) => (TestOutcome::Failed, Some(report.output)),
        (CaseStatus::Failed, true) => (TestOutcome::ExpectedFailure, Some(report.output)),
        (CaseStatus::Skipped, _) => (TestOutcome::Skipped, Some(report.output)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::InlineCapture;
    use crate::{ArtifactKind, CaseIdentity, DebugBundle};
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Client replaying canned results keyed by case name
    struct ScriptedClient {
        results: HashMap<String, Result<CaseStatus, &'static str>>,
        ran: Vec<String>,
        screenshots: usize,
    }

    impl ScriptedClient {
        fn new(results: &[(&str, Result<CaseStatus, &'static str>)]) -> Self {
            Self {
                results: results
                    .iter()
                    .map(|(name, r)| (name.to_string(), *r))
                    .collect(),
                ran: Vec::new(),
                screenshots: 0,
            }
        }
    }

    #[async_trait]
    impl AutomationClient for ScriptedClient {
        async fn run_case(&mut self, case: &CaseSpec) -> Result<CaseReport, ClientError> {
            self.ran.push(case.name.clone());
            match self.results[&case.name] {
                Ok(status) => Ok(CaseReport {
                    status,
                    output: format!("Traceback\nAssertionError: {}", case.name),
                }),
                Err(msg) => Err(ClientError::Unreachable(msg.into())),
            }
        }

        async fn screenshot(&mut self) -> Result<Vec<u8>, ClientError> {
            self.screenshots += 1;
            Ok(vec![1, 2, 3])
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// Gatherer that must never be reached
    struct NoGather;

    #[async_trait]
    impl DebugGatherer for NoGather {
        async fn gather(
            &self,
            case: &CaseIdentity,
            _client: &mut dyn AutomationClient,
        ) -> DebugBundle {
            panic!("debug gathered for {}", case);
        }
    }

    fn case_spec(name: &str) -> CaseSpec {
        CaseSpec {
            class_name: "tests.TestClock".into(),
            name: name.into(),
            command: vec![],
            expected_failure: false,
            disabled: None,
        }
    }

    #[tokio::test]
    async fn test_cases_run_in_order_into_buckets() {
        let mut client = ScriptedClient::new(&[
            ("test_pass", Ok(CaseStatus::Passed)),
            ("test_fail", Ok(CaseStatus::Failed)),
            ("test_skip", Ok(CaseStatus::Skipped)),
            ("test_error", Err("device went away")),
        ]);
        let gatherer = InlineCapture::new(Duration::from_millis(10));
        let cases = vec![
            case_spec("test_pass"),
            case_spec("test_fail"),
            case_spec("test_skip"),
            case_spec("test_error"),
        ];

        let result = TestRunner::new(&mut client, &gatherer).run(&cases).await;

        assert_eq!(result.tests_run, 4);
        assert_eq!(result.passed.len(), 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0].narrative.as_deref(),
            Some("Target unreachable: device went away")
        );
        assert_eq!(client.ran, vec!["test_pass", "test_fail", "test_skip", "test_error"]);
        assert!(result.validate().is_ok());
    }

    #[tokio::test]
    async fn test_debug_gathered_only_for_failure_and_error() {
        let mut client = ScriptedClient::new(&[
            ("test_pass", Ok(CaseStatus::Passed)),
            ("test_fail", Ok(CaseStatus::Failed)),
            ("test_skip", Ok(CaseStatus::Skipped)),
            ("test_error", Err("gone")),
        ]);
        let gatherer = InlineCapture::new(Duration::from_millis(10));
        let cases = vec![
            case_spec("test_pass"),
            case_spec("test_fail"),
            case_spec("test_skip"),
            case_spec("test_error"),
        ];

        let result = TestRunner::new(&mut client, &gatherer).run(&cases).await;

        assert_eq!(client.screenshots, 2);
        assert!(result.passed[0].debug.is_none());
        assert!(result.skipped[0].debug.is_none());
        let bundle = result.failures[0].debug.as_ref().unwrap();
        assert!(bundle.get(ArtifactKind::Screenshot).is_some());
        assert!(result.errors[0].debug.is_some());
    }

    #[tokio::test]
    async fn test_expected_failure_handling() {
        let mut client = ScriptedClient::new(&[
            ("test_known_bug", Ok(CaseStatus::Failed)),
            ("test_fixed_bug", Ok(CaseStatus::Passed)),
        ]);
        let mut known = case_spec("test_known_bug");
        known.expected_failure = true;
        let mut fixed = case_spec("test_fixed_bug");
        fixed.expected_failure = true;

        let result = TestRunner::new(&mut client, &NoGather)
            .run(&[known, fixed])
            .await;

        assert_eq!(result.expected_failures.len(), 1);
        assert_eq!(result.unexpected_passes.len(), 1);
        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.skip_count(), 1);
        assert!(!result.was_successful());
    }

    #[tokio::test]
    async fn test_disabled_case_never_runs() {
        let mut client = ScriptedClient::new(&[]);
        let mut case = case_spec("test_disabled");
        case.disabled = Some("bug 812345".into());

        let result = TestRunner::new(&mut client, &NoGather).run(&[case]).await;

        assert!(client.ran.is_empty());
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(
            result.skipped[0].narrative.as_deref(),
            Some("disabled: bug 812345")
        );
    }

    #[tokio::test]
    async fn test_empty_case_list() {
        let mut client = ScriptedClient::new(&[]);
        let result = TestRunner::new(&mut client, &NoGather).run(&[]).await;
        assert_eq!(result.tests_run, 0);
        assert!(result.was_successful());
    }
}
