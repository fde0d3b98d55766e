//! Metrics collection and exposition.
//!
//! # Metrics
//! - `cms_http_requests_total` (counter): requests by method, status
//! - `cms_http_request_duration_seconds` (histogram): latency distribution
//! - `cms_content_updates_total` (counter): content updates by outcome
//! - `cms_asset_uploads_total` (counter): uploads by role, outcome
//! - `cms_asset_deletes_total` (counter): deletes by outcome
//! - `cms_logins_total` (counter): admin logins by outcome
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!(
        "cms_http_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "cms_http_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_content_update(outcome: &'static str) {
    metrics::counter!("cms_content_updates_total", "outcome" => outcome).increment(1);
}

pub fn record_asset_upload(role: &'static str, outcome: &'static str) {
    metrics::counter!("cms_asset_uploads_total", "role" => role, "outcome" => outcome).increment(1);
}

pub fn record_asset_delete(outcome: &'static str) {
    metrics::counter!("cms_asset_deletes_total", "outcome" => outcome).increment(1);
}

pub fn record_login(outcome: &'static str) {
    metrics::counter!("cms_logins_total", "outcome" => outcome).increment(1);
}

/// Middleware counting every request and its latency.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    record_request(&method, response.status().as_u16(), start);
    response
}
