//! Debug artifact capture for failing cases
//!
//! Two interchangeable strategies sit behind [`DebugGatherer`]: live inline
//! capture from the target, and by-reference lookup of files an external
//! harness left in a debug directory. Both are best effort; a failed capture
//! yields a partial or empty bundle and never touches the case outcome.

mod inline;
mod reference;

pub use inline::{InlineCapture, SETTINGS_QUERY};
pub use reference::ReferenceCapture;

use crate::client::AutomationClient;
use crate::{CaseIdentity, DebugBundle};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

#[async_trait]
pub trait DebugGatherer: Send + Sync {
    /// Collect whatever artifacts are available for `case`
    async fn gather(
        &self,
        case: &CaseIdentity,
        client: &mut dyn AutomationClient,
    ) -> DebugBundle;
}

/// Which capture strategy a run uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureMode {
    /// Screenshot, page source and settings snapshot from the live target
    Inline { settings_timeout: Duration },
    /// Files under `<debug_root>/<Class>/<case>_<artifact>.<ext>`
    Reference { debug_root: PathBuf },
}

/// Build the gatherer for a capture mode
pub fn gatherer(mode: CaptureMode) -> Box<dyn DebugGatherer> {
    match mode {
        CaptureMode::Inline { settings_timeout } => Box::new(InlineCapture::new(settings_timeout)),
        CaptureMode::Reference { debug_root } => Box::new(ReferenceCapture::new(debug_root)),
    }
}
