//! Reporters: console progress, serialized runs and the HTML results page

pub mod console;
pub mod document;
pub mod html;
pub mod json;
pub mod markup;

pub use console::ConsoleReporter;
pub use document::ReportDocument;
pub use html::HtmlReporter;
pub use json::JsonReporter;
pub use markup::ReportEncoding;

use crate::InvalidRunResult;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure reading or writing a report artifact
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} is not a serialized run: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{} is inconsistent: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        source: InvalidRunResult,
    },
}

/// Create every missing directory above `path`
pub fn ensure_parent_dir(path: &Path) -> Result<(), ReportError> {
    let absolute = std::path::absolute(path).map_err(|source| ReportError::CreateDir {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = absolute.parent() {
        fs::create_dir_all(parent).map_err(|source| ReportError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_parent_dir_nested() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a").join("b").join("report.html");
        ensure_parent_dir(&target).unwrap();
        assert!(dir.path().join("a").join("b").is_dir());
        assert!(!target.exists());
    }

    #[test]
    fn test_ensure_parent_dir_blocked_by_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("taken");
        fs::write(&blocker, "x").unwrap();
        let err = ensure_parent_dir(&blocker.join("report.html")).unwrap_err();
        assert!(matches!(err, ReportError::CreateDir { .. }));
    }
}
