//! Case manifest loading

use crate::client::CaseSpec;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Ordered list of cases plus the directory they run in
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub cases: Vec<CaseSpec>,
    /// Directory containing the manifest; relative commands resolve here
    #[serde(skip)]
    pub base_dir: PathBuf,
}

pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    let mut manifest: Manifest = serde_json::from_str(&content)
        .with_context(|| format!("Invalid manifest: {}", path.display()))?;

    let base_dir = path.parent().unwrap_or(Path::new("."));
    manifest.base_dir = if base_dir.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        base_dir.to_path_buf()
    };
    Ok(manifest)
}
