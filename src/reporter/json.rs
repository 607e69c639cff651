//! JSON reporter: serialized runs that can be merged into one report later

use super::{ensure_parent_dir, ReportError};
use crate::RunResult;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
}

impl JsonReporter {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Serialize a finalized run
    pub fn report(&self, result: &RunResult) -> String {
        if self.pretty {
            serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string(result).unwrap_or_else(|_| "{}".to_string())
        }
    }

    /// Write a finalized run to `path`, creating missing parent directories
    pub fn write(&self, result: &RunResult, path: &Path) -> Result<(), ReportError> {
        ensure_parent_dir(path)?;
        fs::write(path, self.report(result)).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), tests = result.tests_run, "run written");
        Ok(())
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Load serialized runs in order, rejecting any whose counts disagree
pub fn load_runs(paths: &[PathBuf]) -> Result<Vec<RunResult>, ReportError> {
    paths.iter().map(|p| load_run(p)).collect()
}

fn load_run(path: &Path) -> Result<RunResult, ReportError> {
    let content = fs::read_to_string(path).map_err(|source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let run: RunResult = serde_json::from_str(&content).map_err(|source| ReportError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    run.validate().map_err(|source| ReportError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), tests = run.tests_run, "run loaded");
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Artifact, ArtifactKind, CaseIdentity, DebugBundle, TestOutcome, TestRecord};
    use std::time::Duration;
    use tempfile::TempDir;

    fn make_run() -> RunResult {
        let mut run = RunResult::new();
        run.record(TestRecord::passed(
            CaseIdentity::new("tests.TestClock", "test_alarm"),
            Duration::from_millis(120),
        ));
        let mut bundle = DebugBundle::new();
        bundle.push(Artifact::inline(ArtifactKind::Screenshot, vec![1u8, 2, 3]));
        bundle.push(Artifact::by_path(ArtifactKind::Settings, "/tmp/s.json"));
        run.record(TestRecord::new(
            CaseIdentity::new("tests.TestClock", "test_snooze"),
            TestOutcome::Failed,
            Duration::from_millis(800),
            Some("AssertionError".into()),
            Some(bundle),
        ));
        run.finish(Duration::from_secs(1));
        run
    }

    #[test]
    fn test_report_uses_camel_case_keys() {
        let json = JsonReporter::new().report(&make_run());
        assert!(json.contains("\"testsRun\":2"));
        assert!(json.contains("\"className\":\"tests.TestClock\""));
        assert!(json.contains("\"expectedFailures\":[]"));
        assert!(json.contains("\"unexpectedPasses\":[]"));
    }

    #[test]
    fn test_pretty_output() {
        let json = JsonReporter::new().pretty().report(&make_run());
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_write_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("runs").join("first.json");
        let run = make_run();
        JsonReporter::new().write(&run, &path).unwrap();

        let loaded = load_runs(&[path]).unwrap();
        assert_eq!(loaded, vec![run]);
    }

    #[test]
    fn test_load_rejects_inconsistent_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"testsRun": 3, "passed": []}"#).unwrap();
        let err = load_runs(&[path]).unwrap_err();
        assert!(matches!(err, ReportError::Invalid { .. }));
        assert!(err.to_string().contains("testsRun is 3"));
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            load_runs(&[missing]).unwrap_err(),
            ReportError::Read { .. }
        ));

        let garbage = dir.path().join("garbage.json");
        fs::write(&garbage, "not json").unwrap();
        assert!(matches!(
            load_runs(&[garbage]).unwrap_err(),
            ReportError::Parse { .. }
        ));
    }
}
