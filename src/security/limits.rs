//! Request body limits.
//!
//! # Responsibilities
//! - Size the body limit of upload routes from the configured image limit
//!
//! # Design Decisions
//! - Oversized bodies are refused by the extractor before anything is
//!   written; the asset manager re-checks the decoded file size

use axum::extract::DefaultBodyLimit;

/// Allowance for multipart boundaries and part headers.
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Body limit for an upload route accepting images up to `max_bytes`.
pub fn upload_body_limit(max_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_bytes.saturating_add(MULTIPART_OVERHEAD))
}
