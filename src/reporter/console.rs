//! Console reporter: per-case progress lines and the end-of-run summary

use crate::{CaseIdentity, RunResult, TestOutcome, TestRecord};
use colored::Colorize;

/// Reporter for terminal output
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to echo failure narratives
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
        }
    }

    /// Disable colors
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Print narratives under non-passing cases
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    pub fn case_started(&self, case: &CaseIdentity) {
        println!("TEST-START | {}", case);
    }

    pub fn case_finished(&self, record: &TestRecord) {
        let tag = status_tag(record.outcome);
        let tag = if self.use_colors {
            self.colorize_tag(record.outcome, tag)
        } else {
            tag.to_string()
        };
        println!(
            "{} | {} | took {}ms",
            tag,
            record.case,
            record.duration.as_millis()
        );

        if self.verbose {
            if let Some(ref narrative) = record.narrative {
                for line in narrative.lines() {
                    println!("    {}", line.dimmed());
                }
            }
        }
    }

    /// Print the closing summary
    pub fn summary(&self, result: &RunResult) {
        let lines = summary_lines(result);
        println!();
        println!("{}", "-".repeat(70));
        for (i, line) in lines.iter().enumerate() {
            let last = i + 1 == lines.len();
            if last && self.use_colors {
                if result.was_successful() {
                    println!("{}", line.green().bold());
                } else {
                    println!("{}", line.red().bold());
                }
            } else {
                println!("{}", line);
            }
        }
    }

    fn colorize_tag(&self, outcome: TestOutcome, tag: &str) -> String {
        match outcome {
            TestOutcome::Passed => tag.green().to_string(),
            TestOutcome::Failed | TestOutcome::Error | TestOutcome::UnexpectedPass => {
                tag.red().bold().to_string()
            }
            TestOutcome::Skipped | TestOutcome::ExpectedFailure => tag.yellow().to_string(),
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn status_tag(outcome: TestOutcome) -> &'static str {
    match outcome {
        TestOutcome::Passed => "TEST-PASS",
        TestOutcome::Failed => "TEST-UNEXPECTED-FAIL",
        TestOutcome::Error => "TEST-UNEXPECTED-ERROR",
        TestOutcome::Skipped => "TEST-SKIP",
        TestOutcome::ExpectedFailure => "TEST-KNOWN-FAIL",
        TestOutcome::UnexpectedPass => "TEST-UNEXPECTED-PASS",
    }
}

/// `Ran N tests in X.XXXs`, then `OK` or `FAILED (...)` with the non-zero counts
pub fn summary_lines(result: &RunResult) -> Vec<String> {
    let plural = if result.tests_run == 1 { "" } else { "s" };
    let ran = format!(
        "Ran {} test{} in {:.3}s",
        result.tests_run,
        plural,
        result.elapsed.as_secs_f64()
    );

    let mut details = Vec::new();
    if !result.failures.is_empty() {
        details.push(format!("failures={}", result.failures.len()));
    }
    if result.error_count() > 0 {
        details.push(format!("errors={}", result.error_count()));
    }
    if !result.skipped.is_empty() {
        details.push(format!("skipped={}", result.skipped.len()));
    }
    if !result.expected_failures.is_empty() {
        details.push(format!("expected failures={}", result.expected_failures.len()));
    }
    if !result.unexpected_passes.is_empty() {
        details.push(format!(
            "unexpected successes={}",
            result.unexpected_passes.len()
        ));
    }

    let status = if result.was_successful() { "OK" } else { "FAILED" };
    let verdict = if details.is_empty() {
        status.to_string()
    } else {
        format!("{} ({})", status, details.join(", "))
    };
    vec![ran, String::new(), verdict]
}
