//! Client that executes every case as a child process

use super::{AutomationClient, CaseReport, CaseSpec, CaseStatus, ClientError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Exit status a case command uses to report itself as skipped
pub const SKIP_EXIT_CODE: i32 = 77;

/// Runs `case.command` in the manifest directory.
///
/// Exit 0 passes, [`SKIP_EXIT_CODE`] skips, anything else fails. The child
/// learns its identity and the debug directory through `GAIATEST_*` variables
/// so an out-of-process harness can drop by-reference artifacts.
pub struct CommandClient {
    work_dir: PathBuf,
    debug_root: Option<PathBuf>,
    testvars_json: Option<String>,
    restart: bool,
}

impl CommandClient {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            debug_root: None,
            testvars_json: None,
            restart: false,
        }
    }

    /// Forward the restart-between-cases request to every case
    pub fn restart(mut self, restart: bool) -> Self {
        self.restart = restart;
        self
    }

    pub fn with_debug_root(mut self, debug_root: impl Into<PathBuf>) -> Self {
        self.debug_root = Some(debug_root.into());
        self
    }

    pub fn with_testvars(mut self, json: String) -> Self {
        self.testvars_json = Some(json);
        self
    }

    fn resolve_program(&self, program: &str) -> PathBuf {
        let path = Path::new(program);
        if path.is_relative() && path.components().count() > 1 {
            self.work_dir.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

#[async_trait]
impl AutomationClient for CommandClient {
    async fn run_case(&mut self, case: &CaseSpec) -> Result<CaseReport, ClientError> {
        let (program, args) = case
            .command
            .split_first()
            .ok_or(ClientError::EmptyCommand)?;
        let identity = case.identity();

        let mut command = Command::new(self.resolve_program(program));
        command
            .args(args)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .env("GAIATEST_CASE_CLASS", identity.display_class())
            .env("GAIATEST_CASE_NAME", identity.display_name());
        if let Some(ref root) = self.debug_root {
            command.env("GAIATEST_DEBUG_DIR", root);
        }
        if let Some(ref json) = self.testvars_json {
            command.env("GAIATEST_TESTVARS", json);
        }
        if self.restart {
            command.env("GAIATEST_RESTART", "1");
        }

        debug!(case = %identity, program = %program, "spawning case");
        let output = command
            .output()
            .await
            .map_err(|source| ClientError::Spawn {
                command: case.command.join(" "),
                source,
            })?;
        let text = combined_output(&output.stdout, &output.stderr);

        match output.status.code() {
            Some(0) => Ok(CaseReport {
                status: CaseStatus::Passed,
                output: text,
            }),
            Some(SKIP_EXIT_CODE) => Ok(CaseReport {
                status: CaseStatus::Skipped,
                output: text,
            }),
            Some(code) => Ok(CaseReport {
                status: CaseStatus::Failed,
                output: if text.is_empty() {
                    format!("Case command exited with status {}", code)
                } else {
                    text
                },
            }),
            None => Err(ClientError::Terminated(case.command.join(" "))),
        }
    }

    fn name(&self) -> &str {
        "command"
    }
}

/// stderr (where tracebacks go) first, then stdout; trailing whitespace dropped
fn combined_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let stdout = String::from_utf8_lossy(stdout);
    let parts: Vec<&str> = [stderr.trim_end(), stdout.trim_end()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    parts.join("\n")
}
