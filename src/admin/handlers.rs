//! Admin endpoints. Everything except login runs behind the session guard.

use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::admin::session::AdminSession;
use crate::assets::{AssetInfo, AssetRole};
use crate::error::CmsError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::service::outcome;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, CmsError> {
    let inner = state.inner.load();
    let ttl = Duration::from_secs(inner.config.admin.session_ttl_secs);

    let result = state.sessions.login(
        inner.authenticator.as_ref(),
        &request.username,
        &request.password,
        ttl,
    );
    metrics::record_login(outcome(&result));

    let session = result?;
    Ok(Json(LoginResponse {
        token: session.token().to_string(),
        expires_in: session.remaining().as_secs(),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
) -> Json<Value> {
    state.sessions.logout(session.token());
    tracing::info!(
        admin = %session.username(),
        session_id = %session.id(),
        "Admin logged out"
    );
    Json(json!({ "success": true }))
}

pub async fn update_content(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, CmsError> {
    let inner = state.inner.load();
    inner.service.update_content(&session, &payload)?;
    Ok(Json(json!({ "success": true })))
}

/// Multipart upload; the first part carrying a filename is the image.
pub async fn upload_asset(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(role): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, CmsError> {
    let role: AssetRole = role.parse()?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CmsError::validation(format!("Malformed upload: {}", e.body_text())))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| CmsError::validation(format!("Malformed upload: {}", e.body_text())))?;
        upload = Some((filename, bytes));
        break;
    }
    let (filename, bytes) = upload.ok_or_else(|| CmsError::validation("No file part"))?;

    let inner = state.inner.load();
    let stored = inner
        .service
        .upload_asset(&session, role, &filename, &bytes)?;
    Ok(Json(UploadResponse {
        success: true,
        filename: stored,
    }))
}

pub async fn delete_image(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<Value>, CmsError> {
    let inner = state.inner.load();
    inner.service.delete_asset(&session, &request.filename)?;
    Ok(Json(json!({ "success": true })))
}

pub async fn list_images(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
) -> Result<Json<Vec<AssetInfo>>, CmsError> {
    let inner = state.inner.load();
    inner.service.list_assets(&session).map(Json)
}
