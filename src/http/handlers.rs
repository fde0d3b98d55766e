//! Public endpoints.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::contact::{submit_contact, ContactSubmission};
use crate::content::ContentDocument;
use crate::error::CmsError;
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
    })
}

pub async fn get_content(State(state): State<AppState>) -> Result<Json<ContentDocument>, CmsError> {
    let inner = state.inner.load();
    inner.service.get_content().map(Json)
}

pub async fn contact(Json(submission): Json<ContactSubmission>) -> Result<Json<Value>, CmsError> {
    submit_contact(submission)?;
    Ok(Json(json!({ "success": true, "message": "Thank you for your feedback!" })))
}
