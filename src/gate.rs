//! Pre-flight risk acknowledgement gate for destructive runs
//!
//! Nothing is executed until the operator has acknowledged that the run wipes
//! the target. Without `skip_warning` a bordered warning is printed and the run
//! waits out [`WARNING_DELAY`], which an interrupt cuts short.

use std::future::Future;
use std::io::{self, Write};
use std::time::Duration;

pub const RISKS_URL: &str = "https://developer.mozilla.org/en-US/docs/Gaia_Test_Runner#Risks";

/// How long the warning stays up before the run continues
pub const WARNING_DELAY: Duration = Duration::from_secs(30);

const BANNER_WIDTH: usize = 80;

const RISKS_MESSAGE: &str = "These tests are destructive and will remove data from the target \
Firefox OS instance as well as using services that may incur costs! Before you can run these \
tests you must follow the steps to indicate you have acknowledged the risks detailed at the \
following address:";

const WARNING_MESSAGE: &str = "You are about to run destructive tests against a Firefox OS \
instance. These tests will restore the target to a clean state, meaning any personal data such \
as contacts, messages, photos, videos, music, etc. will be removed. The tests may also attempt \
to initiate outgoing calls, or connect to services such as cellular data, wifi, gps, bluetooth, \
etc.";

/// Operator acknowledgement flags, from test variables or the environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskAcknowledgement {
    pub acknowledged_risks: bool,
    pub skip_warning: bool,
}

/// What the gate decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    /// Risks were not acknowledged; nothing may run
    Refused,
    /// The operator interrupted the warning delay
    Aborted,
}

impl GateDecision {
    pub fn should_run(self) -> bool {
        self == GateDecision::Proceed
    }
}

pub struct RiskGate {
    acknowledgement: RiskAcknowledgement,
    delay: Duration,
}

impl RiskGate {
    pub fn new(acknowledgement: RiskAcknowledgement) -> Self {
        Self {
            acknowledgement,
            delay: WARNING_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Run the gate, printing banners to `out`.
    ///
    /// `interrupt` resolves when the operator asks to abort; it is only polled
    /// while the warning delay is running.
    pub async fn check<W, F>(&self, out: &mut W, interrupt: F) -> io::Result<GateDecision>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        if !self.acknowledgement.acknowledged_risks {
            out.write_all(banner("Acknowledge risks", RISKS_MESSAGE, Some(RISKS_URL)).as_bytes())?;
            out.flush()?;
            return Ok(GateDecision::Refused);
        }
        if self.acknowledgement.skip_warning {
            return Ok(GateDecision::Proceed);
        }

        out.write_all(banner("Warning", WARNING_MESSAGE, None).as_bytes())?;
        writeln!(out, "To abort the test run hit Ctrl+C on your keyboard.")?;
        writeln!(
            out,
            "The test run will continue in {} seconds.",
            self.delay.as_secs()
        )?;
        out.flush()?;

        tokio::select! {
            _ = tokio::time::sleep(self.delay) => {
                writeln!(out, "Continuing with test run...\n")?;
                Ok(GateDecision::Proceed)
            }
            _ = interrupt => {
                writeln!(out, "\nTest run aborted by user.")?;
                Ok(GateDecision::Aborted)
            }
        }
    }
}

/// Bordered banner: `***** HEADING ****...`, wrapped message, optional URL, closing rule
pub fn banner(heading: &str, message: &str, url: Option<&str>) -> String {
    let heading = heading.to_uppercase();
    let tail = BANNER_WIDTH.saturating_sub(heading.chars().count() + 7);
    let mut out = format!("\n{} {} {}\n", "*".repeat(5), heading, "*".repeat(tail));
    for line in wrap(message, BANNER_WIDTH) {
        out.push_str(&line);
        out.push('\n');
    }
    if let Some(url) = url {
        out.push_str(url);
        out.push('\n');
    }
    out.push_str(&"*".repeat(BANNER_WIDTH));
    out.push_str("\n\n");
    out
}

/// Greedy word wrap; words longer than `width` get a line of their own
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
