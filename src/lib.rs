//! gaiatest: destructive UI test runner and result reporter
//!
//! Runs a manifest of UI test cases through an automation client, records one
//! [`TestRecord`] per finished case and renders finalized [`RunResult`]s into a
//! single self-contained HTML report.

pub mod capture;
pub mod client;
pub mod config;
pub mod gate;
pub mod logging;
pub mod reporter;
pub mod runner;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Outcome bucket a finished case falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestOutcome {
    Passed,
    Failed,
    Error,
    Skipped,
    /// Case marked as expected to fail, and it did
    ExpectedFailure,
    /// Case marked as expected to fail, but it passed
    UnexpectedPass,
}

impl TestOutcome {
    pub fn is_passing(self) -> bool {
        matches!(self, TestOutcome::Passed)
    }

    /// Label used for the report row class and the Result column.
    ///
    /// Unexpected passes are reported as failures and expected failures as
    /// skips, matching how they are counted in the summary.
    pub fn row_label(self) -> &'static str {
        match self {
            TestOutcome::Passed => "passed",
            TestOutcome::Failed | TestOutcome::UnexpectedPass => "failure",
            TestOutcome::Error => "error",
            TestOutcome::Skipped | TestOutcome::ExpectedFailure => "skipped",
        }
    }
}

impl std::fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestOutcome::Passed => write!(f, "passed"),
            TestOutcome::Failed => write!(f, "failed"),
            TestOutcome::Error => write!(f, "error"),
            TestOutcome::Skipped => write!(f, "skipped"),
            TestOutcome::ExpectedFailure => write!(f, "expected-failure"),
            TestOutcome::UnexpectedPass => write!(f, "unexpected-pass"),
        }
    }
}

/// Owning class and case name of one executed case
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseIdentity {
    pub class_name: String,
    pub name: String,
}

impl CaseIdentity {
    pub fn new(class_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            name: name.into(),
        }
    }

    /// Class name without its module path (`tests.clock.TestAlarm` -> `TestAlarm`)
    pub fn display_class(&self) -> &str {
        self.class_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.class_name)
    }

    /// First whitespace-separated token of the case name.
    ///
    /// Harnesses often describe a case as `test_snooze (tests.clock.TestAlarm)`;
    /// only the leading method name is shown.
    pub fn display_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }
}

impl std::fmt::Display for CaseIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.display_class(), self.display_name())
    }
}

/// Kind of debug artifact attached to a non-passing case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Screenshot,
    Source,
    Settings,
}

impl ArtifactKind {
    /// Order in which a debug directory is probed
    pub const PROBE_ORDER: [ArtifactKind; 3] = [
        ArtifactKind::Screenshot,
        ArtifactKind::Settings,
        ArtifactKind::Source,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ArtifactKind::Screenshot => "screenshot",
            ArtifactKind::Source => "source",
            ArtifactKind::Settings => "settings",
        }
    }

    /// Media type used when the artifact is embedded as a `data:` URI.
    ///
    /// Text artifacts are base64 encoded too so that `#` in page source does
    /// not end the URI early.
    pub fn media_type(self) -> &'static str {
        match self {
            ArtifactKind::Screenshot => "image/png",
            ArtifactKind::Source | ArtifactKind::Settings => "text/plain;charset=utf-8",
        }
    }

    /// File name suffix in a by-reference debug directory
    pub fn file_suffix(self) -> &'static str {
        match self {
            ArtifactKind::Screenshot => "screenshot.png",
            ArtifactKind::Source => "source.txt",
            ArtifactKind::Settings => "settings.json",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where an artifact's content lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ArtifactContent {
    /// Bytes captured from the live target at failure time
    Inline {
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
    /// File written by an external harness
    Path { path: PathBuf },
}

/// One named diagnostic artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub content: ArtifactContent,
}

impl Artifact {
    pub fn inline(kind: ArtifactKind, data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            content: ArtifactContent::Inline { data: data.into() },
        }
    }

    pub fn by_path(kind: ArtifactKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            content: ArtifactContent::Path { path: path.into() },
        }
    }

    /// Link target: a base64 `data:` URI for inline content, a percent-encoded
    /// `file://` URI for absolute paths. Relative paths are linked as written.
    pub fn href(&self) -> String {
        match &self.content {
            ArtifactContent::Inline { data } => format!(
                "data:{};base64,{}",
                self.kind.media_type(),
                STANDARD.encode(data)
            ),
            ArtifactContent::Path { path } => match Url::from_file_path(path) {
                Ok(uri) => uri.into(),
                Err(()) => path.display().to_string(),
            },
        }
    }
}

/// Diagnostic artifacts gathered for a non-passing case. At most one per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugBundle {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

impl DebugBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact, replacing an earlier one of the same kind
    pub fn push(&mut self, artifact: Artifact) {
        match self.artifacts.iter_mut().find(|a| a.kind == artifact.kind) {
            Some(existing) => *existing = artifact,
            None => self.artifacts.push(artifact),
        }
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// A single finished case. Write-once: built when the case completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    #[serde(flatten)]
    pub case: CaseIdentity,
    pub outcome: TestOutcome,
    pub duration: Duration,
    /// Failure narrative (traceback, skip reason) for non-passing outcomes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugBundle>,
}

impl TestRecord {
    pub fn passed(case: CaseIdentity, duration: Duration) -> Self {
        Self {
            case,
            outcome: TestOutcome::Passed,
            duration,
            narrative: None,
            debug: None,
        }
    }

    /// Build a record; narrative and debug bundle are dropped for passing outcomes
    pub fn new(
        case: CaseIdentity,
        outcome: TestOutcome,
        duration: Duration,
        narrative: Option<String>,
        debug: Option<DebugBundle>,
    ) -> Self {
        if outcome.is_passing() {
            return Self::passed(case, duration);
        }
        Self {
            case,
            outcome,
            duration,
            narrative,
            debug,
        }
    }
}

/// Output of one batch execution: every outcome bucket is always present
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub tests_run: usize,
    #[serde(default)]
    pub passed: Vec<TestRecord>,
    #[serde(default)]
    pub failures: Vec<TestRecord>,
    #[serde(default)]
    pub errors: Vec<TestRecord>,
    #[serde(default)]
    pub skipped: Vec<TestRecord>,
    #[serde(default)]
    pub expected_failures: Vec<TestRecord>,
    #[serde(default)]
    pub unexpected_passes: Vec<TestRecord>,
    /// Wall-clock time of the whole run
    #[serde(default)]
    pub elapsed: Duration,
}

/// A serialized run whose counters do not match its records
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidRunResult {
    #[error("testsRun is {tests_run} but {recorded} records are present")]
    CountMismatch { tests_run: usize, recorded: usize },
    #[error("record {case} has outcome {outcome} but is stored under {bucket}")]
    MisplacedRecord {
        case: String,
        outcome: TestOutcome,
        bucket: TestOutcome,
    },
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished case to the bucket matching its outcome
    pub fn record(&mut self, record: TestRecord) {
        self.bucket_mut(record.outcome).push(record);
        self.tests_run += 1;
    }

    /// Stamp the run's total elapsed time
    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    pub fn bucket(&self, outcome: TestOutcome) -> &[TestRecord] {
        match outcome {
            TestOutcome::Passed => &self.passed,
            TestOutcome::Failed => &self.failures,
            TestOutcome::Error => &self.errors,
            TestOutcome::Skipped => &self.skipped,
            TestOutcome::ExpectedFailure => &self.expected_failures,
            TestOutcome::UnexpectedPass => &self.unexpected_passes,
        }
    }

    fn bucket_mut(&mut self, outcome: TestOutcome) -> &mut Vec<TestRecord> {
        match outcome {
            TestOutcome::Passed => &mut self.passed,
            TestOutcome::Failed => &mut self.failures,
            TestOutcome::Error => &mut self.errors,
            TestOutcome::Skipped => &mut self.skipped,
            TestOutcome::ExpectedFailure => &mut self.expected_failures,
            TestOutcome::UnexpectedPass => &mut self.unexpected_passes,
        }
    }

    /// Failures including unexpected passes
    pub fn failure_count(&self) -> usize {
        self.failures.len() + self.unexpected_passes.len()
    }

    /// Skips including expected failures
    pub fn skip_count(&self) -> usize {
        self.skipped.len() + self.expected_failures.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn was_successful(&self) -> bool {
        self.failure_count() == 0 && self.error_count() == 0
    }

    /// Check that `tests_run` and bucket membership agree
    pub fn validate(&self) -> Result<(), InvalidRunResult> {
        const ALL: [TestOutcome; 6] = [
            TestOutcome::Passed,
            TestOutcome::Failed,
            TestOutcome::Error,
            TestOutcome::Skipped,
            TestOutcome::ExpectedFailure,
            TestOutcome::UnexpectedPass,
        ];
        let mut recorded = 0;
        for bucket in ALL {
            for record in self.bucket(bucket) {
                if record.outcome != bucket {
                    return Err(InvalidRunResult::MisplacedRecord {
                        case: record.case.to_string(),
                        outcome: record.outcome,
                        bucket,
                    });
                }
            }
            recorded += self.bucket(bucket).len();
        }
        if recorded != self.tests_run {
            return Err(InvalidRunResult::CountMismatch {
                tests_run: self.tests_run,
                recorded,
            });
        }
        Ok(())
    }
}

/// Base64 string (de)serialization for inline artifact bytes
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
