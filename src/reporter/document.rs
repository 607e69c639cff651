//! Report aggregation: summary counters and table rows from finalized runs

use crate::{Artifact, ArtifactKind, RunResult, TestOutcome, TestRecord};
use chrono::{DateTime, Local};
use std::time::Duration;

/// Buckets in the order their rows appear in the results table
const ROW_ORDER: [TestOutcome; 6] = [
    TestOutcome::Error,
    TestOutcome::Failed,
    TestOutcome::UnexpectedPass,
    TestOutcome::Skipped,
    TestOutcome::ExpectedFailure,
    TestOutcome::Passed,
];

/// Narrative lines indented this far are traceback separators
const SEPARATOR_INDENT: &str = "          ";
const SEPARATOR_MAX_CHARS: usize = 80;

/// Summary counters. `passed + failed + skipped + errors == tests` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub tests: usize,
    pub passed: usize,
    /// Failures plus unexpected passes
    pub failed: usize,
    /// Skips plus expected failures
    pub skipped: usize,
    pub errors: usize,
    pub elapsed: Duration,
}

impl Summary {
    /// Runs must satisfy [`RunResult::validate`]; passes are derived by subtraction.
    pub fn from_runs(runs: &[RunResult]) -> Self {
        debug_assert!(
            runs.iter().all(|r| r.validate().is_ok()),
            "summary built from an inconsistent run"
        );
        let tests: usize = runs.iter().map(|r| r.tests_run).sum();
        let failed: usize = runs.iter().map(RunResult::failure_count).sum();
        let skipped: usize = runs.iter().map(RunResult::skip_count).sum();
        let errors: usize = runs.iter().map(RunResult::error_count).sum();
        Self {
            tests,
            passed: tests.saturating_sub(failed + skipped + errors),
            failed,
            skipped,
            errors,
            elapsed: runs.iter().map(|r| r.elapsed).sum(),
        }
    }
}

/// One rendered line of a failure narrative
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    /// Deeply indented traceback separator, truncated to 80 characters
    Separator(String),
    /// Mentions "error" or "exception" (any case)
    Error(String),
    Plain(String),
}

impl LogLine {
    /// Classify one narrative line.
    ///
    /// The error check is a plain substring scan, so benign text such as a
    /// case called `ErrorHandlingTest` is highlighted too. Existing reports
    /// depend on this behaviour.
    pub fn classify(line: &str) -> Self {
        if line.starts_with(SEPARATOR_INDENT) {
            return LogLine::Separator(line.chars().take(SEPARATOR_MAX_CHARS).collect());
        }
        let lower = line.to_lowercase();
        if lower.contains("error") || lower.contains("exception") {
            LogLine::Error(line.to_string())
        } else {
            LogLine::Plain(line.to_string())
        }
    }

    pub fn text(&self) -> &str {
        match self {
            LogLine::Separator(s) | LogLine::Error(s) | LogLine::Plain(s) => s,
        }
    }
}

pub fn narrative_lines(text: &str) -> Vec<LogLine> {
    text.lines().map(LogLine::classify).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub name: String,
    pub href: String,
}

impl From<&Artifact> for Link {
    fn from(artifact: &Artifact) -> Self {
        Self {
            name: artifact.kind.name().to_string(),
            href: artifact.href(),
        }
    }
}

/// Inline debug panel shown under a non-passing row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugPanel {
    /// Screenshot target, rendered as a clickable thumbnail
    pub screenshot: Option<String>,
    pub log: Vec<LogLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    /// `error`, `failure`, `skipped` or `passed`
    pub label: &'static str,
    pub class_name: String,
    pub name: String,
    pub duration: Duration,
    pub links: Vec<Link>,
    /// Present for every non-passing row
    pub debug: Option<DebugPanel>,
}

impl ReportRow {
    pub fn from_record(record: &TestRecord) -> Self {
        let mut row = Self {
            label: record.outcome.row_label(),
            class_name: record.case.display_class().to_string(),
            name: record.case.display_name().to_string(),
            duration: record.duration,
            links: Vec::new(),
            debug: None,
        };
        if record.outcome.is_passing() {
            return row;
        }

        let bundle = record.debug.as_ref();
        row.links = bundle
            .map(|b| b.iter().map(Link::from).collect())
            .unwrap_or_default();
        row.debug = Some(DebugPanel {
            screenshot: bundle
                .and_then(|b| b.get(ArtifactKind::Screenshot))
                .map(Artifact::href),
            log: narrative_lines(record.narrative.as_deref().unwrap_or("")),
        });
        row
    }
}

/// Aggregation over one or more finalized runs. Built once, rendered, dropped.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub generated: DateTime<Local>,
    pub summary: Summary,
    pub rows: Vec<ReportRow>,
}

impl ReportDocument {
    /// Aggregate finalized runs. Runs loaded from disk go through
    /// [`load_runs`](super::json::load_runs), which validates them first.
    pub fn build(runs: &[RunResult]) -> Self {
        Self::build_at(runs, Local::now())
    }

    /// Build with a fixed generation timestamp
    pub fn build_at(runs: &[RunResult], generated: DateTime<Local>) -> Self {
        let rows = ROW_ORDER
            .iter()
            .flat_map(move |&outcome| runs.iter().flat_map(move |run| run.bucket(outcome)))
            .map(ReportRow::from_record)
            .collect();
        Self {
            generated,
            summary: Summary::from_runs(runs),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CaseIdentity, DebugBundle};

    fn record(name: &str, outcome: TestOutcome) -> TestRecord {
        TestRecord::new(
            CaseIdentity::new("tests.TestClock", name),
            outcome,
            Duration::from_millis(250),
            Some("Traceback (most recent call last):\nAssertionError: nope".into()),
            None,
        )
    }

    fn run_of(records: Vec<TestRecord>) -> RunResult {
        let mut run = RunResult::new();
        for r in records {
            run.record(r);
        }
        run
    }

    #[test]
    fn test_separator_line_truncated() {
        let line = format!("{}{}", " ".repeat(12), "-".repeat(100));
        match LogLine::classify(&line) {
            LogLine::Separator(s) => assert_eq!(s.chars().count(), 80),
            other => panic!("expected separator, got {:?}", other),
        }
    }

    #[test]
    fn test_separator_skips_error_check() {
        let line = format!("{}File \"x.py\", in raise Error", " ".repeat(10));
        assert!(matches!(LogLine::classify(&line), LogLine::Separator(_)));
        // nine spaces is an ordinary line
        let line = format!("{}Error", " ".repeat(9));
        assert!(matches!(LogLine::classify(&line), LogLine::Error(_)));
    }

    #[test]
    fn test_error_highlight_case_insensitive() {
        assert!(matches!(LogLine::classify("TimeoutError: 10s"), LogLine::Error(_)));
        assert!(matches!(
            LogLine::classify("JAVASCRIPT EXCEPTION thrown"),
            LogLine::Error(_)
        ));
        assert!(matches!(
            LogLine::classify("  File \"test_clock.py\", line 12"),
            LogLine::Plain(_)
        ));
    }

    #[test]
    fn test_benign_error_substring_still_highlighted() {
        assert!(matches!(
            LogLine::classify("in ErrorHandlingTest.setUp"),
            LogLine::Error(_)
        ));
    }

    #[test]
    fn test_zero_runs() {
        let doc = ReportDocument::build(&[]);
        assert_eq!(doc.summary, Summary::default());
        assert!(doc.rows.is_empty());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "inconsistent run")]
    fn test_inconsistent_run_rejected_in_debug() {
        let mut run = RunResult::new();
        run.failures.push(record("test_a", TestOutcome::Failed));
        Summary::from_runs(&[run]);
    }

    #[test]
    fn test_unexpected_pass_counted_as_failure() {
        let run = run_of(vec![
            record("test_a", TestOutcome::Passed),
            record("test_b", TestOutcome::UnexpectedPass),
        ]);
        let doc = ReportDocument::build(&[run]);
        assert_eq!(doc.summary.failed, 1);
        assert_eq!(doc.summary.passed, 1);
        assert_eq!(doc.rows[0].label, "failure");
        assert_eq!(doc.rows[0].name, "test_b");
    }

    #[test]
    fn test_rows_follow_bucket_order_across_runs() {
        let first = run_of(vec![
            record("test_pass_1", TestOutcome::Passed),
            record("test_fail_1", TestOutcome::Failed),
        ]);
        let second = run_of(vec![
            record("test_known", TestOutcome::ExpectedFailure),
            record("test_skip", TestOutcome::Skipped),
            record("test_error", TestOutcome::Error),
            record("test_fail_2", TestOutcome::Failed),
        ]);
        let doc = ReportDocument::build(&[first, second]);
        let names: Vec<&str> = doc.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "test_error",
                "test_fail_1",
                "test_fail_2",
                "test_skip",
                "test_known",
                "test_pass_1"
            ]
        );
        let s = &doc.summary;
        assert_eq!(s.tests, 6);
        assert_eq!(s.passed + s.failed + s.skipped + s.errors, s.tests);
    }

    #[test]
    fn test_passing_row_has_no_links_or_panel() {
        let row = ReportRow::from_record(&record("test_a", TestOutcome::Passed));
        assert!(row.links.is_empty());
        assert!(row.debug.is_none());
    }

    #[test]
    fn test_failure_row_links_and_thumbnail() {
        let mut bundle = DebugBundle::new();
        bundle.push(Artifact::inline(ArtifactKind::Screenshot, vec![0u8]));
        bundle.push(Artifact::inline(ArtifactKind::Source, "<html/>"));
        let mut rec = record("test_a (tests.TestClock)", TestOutcome::Failed);
        rec.debug = Some(bundle);

        let row = ReportRow::from_record(&rec);
        assert_eq!(row.name, "test_a");
        assert_eq!(row.class_name, "TestClock");
        let names: Vec<&str> = row.links.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["screenshot", "source"]);
        let panel = row.debug.unwrap();
        assert_eq!(panel.screenshot.as_deref(), Some("data:image/png;base64,AA=="));
        assert_eq!(panel.log.len(), 2);
        assert!(matches!(panel.log[1], LogLine::Error(_)));
    }

    #[test]
    fn test_skipped_row_without_bundle_has_panel_but_no_links() {
        let row = ReportRow::from_record(&record("test_a", TestOutcome::Skipped));
        assert!(row.links.is_empty());
        assert!(row.debug.is_some());
    }
}
