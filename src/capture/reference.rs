//! By-reference capture: link artifacts an external harness wrote to disk

use super::DebugGatherer;
use crate::client::AutomationClient;
use crate::{Artifact, ArtifactKind, CaseIdentity, DebugBundle};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

pub struct ReferenceCapture {
    debug_root: PathBuf,
}

impl ReferenceCapture {
    /// Relative roots are made absolute so report links survive being moved
    pub fn new(debug_root: impl Into<PathBuf>) -> Self {
        let debug_root = debug_root.into();
        let debug_root = std::path::absolute(&debug_root).unwrap_or(debug_root);
        Self { debug_root }
    }

    pub fn debug_root(&self) -> &std::path::Path {
        &self.debug_root
    }

    /// `<debug_root>/<Class>/<case>_<suffix>`
    pub fn artifact_path(&self, case: &CaseIdentity, kind: ArtifactKind) -> PathBuf {
        self.debug_root.join(case.display_class()).join(format!(
            "{}_{}",
            case.display_name(),
            kind.file_suffix()
        ))
    }

    /// Register every conventional artifact file that exists
    pub fn probe(&self, case: &CaseIdentity) -> DebugBundle {
        let mut bundle = DebugBundle::new();
        for kind in ArtifactKind::PROBE_ORDER {
            let path = self.artifact_path(case, kind);
            if path.is_file() {
                bundle.push(Artifact::by_path(kind, path));
            } else {
                debug!(case = %case, path = %path.display(), "no {} artifact", kind);
            }
        }
        bundle
    }
}

#[async_trait]
impl DebugGatherer for ReferenceCapture {
    async fn gather(
        &self,
        case: &CaseIdentity,
        _client: &mut dyn AutomationClient,
    ) -> DebugBundle {
        self.probe(case)
    }
}
