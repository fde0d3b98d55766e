//! Startup checks.
//!
//! # Responsibilities
//! - Verify the content document exists and parses
//! - Make sure the upload directory exists
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The content document is never created by the service

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::CmsConfig;
use crate::content::ContentStore;
use crate::error::CmsError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Content document not found at {0:?}; it must be provisioned before startup")]
    MissingContent(PathBuf),

    #[error("Content document is unreadable: {0}")]
    InvalidContent(#[from] CmsError),

    #[error("Cannot create upload directory {path:?}: {source}")]
    UploadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Run every check that must pass before traffic is accepted.
pub fn preflight(config: &CmsConfig) -> Result<(), StartupError> {
    let content_path = Path::new(&config.storage.content_path);
    if !content_path.is_file() {
        return Err(StartupError::MissingContent(content_path.to_path_buf()));
    }
    let doc = ContentStore::new(content_path).load()?;

    let upload_dir = Path::new(&config.storage.upload_dir);
    if !upload_dir.is_dir() {
        fs::create_dir_all(upload_dir).map_err(|source| StartupError::UploadDir {
            path: upload_dir.to_path_buf(),
            source,
        })?;
        tracing::info!(path = ?upload_dir, "Created upload directory");
    }

    tracing::info!(
        content_path = ?content_path,
        menu_items = doc.menu.len(),
        team_members = doc.team.len(),
        "Content document loaded"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path) -> CmsConfig {
        let mut config = CmsConfig::default();
        config.storage.content_path = dir.join("content.json").to_string_lossy().into_owned();
        config.storage.upload_dir = dir.join("static/img").to_string_lossy().into_owned();
        config
    }

    #[test]
    fn test_missing_content_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = preflight(&config_in(dir.path())).unwrap_err();
        assert!(matches!(err, StartupError::MissingContent(_)));
    }

    #[test]
    fn test_malformed_content_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("content.json"), "[oops").unwrap();
        let err = preflight(&config_in(dir.path())).unwrap_err();
        assert!(matches!(err, StartupError::InvalidContent(_)));
    }

    #[test]
    fn test_creates_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("content.json"), "{}").unwrap();
        preflight(&config_in(dir.path())).unwrap();
        assert!(dir.path().join("static/img").is_dir());
    }
}
