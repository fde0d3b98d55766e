//! Error taxonomy shared by the core operations and the HTTP boundary.

use std::path::{Path, PathBuf};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Errors returned by content, asset and session operations.
#[derive(Debug, Error)]
pub enum CmsError {
    /// The content document could not be read or written.
    #[error("Storage error at {path:?}: {reason}")]
    Storage { path: PathBuf, reason: String },

    /// A submitted field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// A path resolved outside of the asset directory.
    #[error("{0}")]
    Forbidden(String),

    /// The requested asset does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The caller is not an authenticated admin.
    #[error("{0}")]
    Unauthorized(String),
}

/// Result type for core operations.
pub type CmsResult<T> = Result<T, CmsError>;

impl CmsError {
    pub fn storage(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::Storage {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CmsError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CmsError::Validation(_) => StatusCode::BAD_REQUEST,
            CmsError::Forbidden(_) => StatusCode::FORBIDDEN,
            CmsError::NotFound(_) => StatusCode::NOT_FOUND,
            CmsError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for CmsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            CmsError::Storage { .. } => {
                tracing::error!(error = %self, "Content storage failure");
                "Internal storage error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
