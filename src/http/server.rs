//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, headers, metrics)
//! - Bind server to listener, plain or TLS
//! - Swap in reloaded configuration without dropping admin sessions
//! - Sweep expired sessions in the background

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{middleware, routing::get, routing::post, Router};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::auth::{Authenticator, StaticAuthenticator};
use crate::admin::session::SessionRegistry;
use crate::admin::setup_admin_router;
use crate::config::CmsConfig;
use crate::http::handlers;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::observability::metrics;
use crate::security::headers::with_security_headers;
use crate::security::rate_limit::LoginRateLimiter;
use crate::service::CmsService;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Everything derived from one configuration generation.
pub struct InnerState {
    pub config: CmsConfig,
    pub service: CmsService,
    pub authenticator: Arc<dyn Authenticator>,
}

impl InnerState {
    /// Build from `config`, using `authenticator` when given instead of the
    /// configured account.
    pub fn build(config: CmsConfig, authenticator: Option<Arc<dyn Authenticator>>) -> Self {
        let service = CmsService::from_config(&config);
        let authenticator = authenticator
            .unwrap_or_else(|| Arc::new(StaticAuthenticator::from_config(&config.admin)));
        Self {
            config,
            service,
            authenticator,
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<InnerState>>,
    pub sessions: SessionRegistry,
    pub login_limiter: Arc<LoginRateLimiter>,
}

/// HTTP server for the CMS API.
pub struct HttpServer {
    router: Router,
    state: AppState,
    authenticator_override: Option<Arc<dyn Authenticator>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: CmsConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a server that checks logins with `authenticator` instead of
    /// the configured account, across reloads too.
    pub fn with_authenticator(config: CmsConfig, authenticator: Arc<dyn Authenticator>) -> Self {
        Self::build(config, Some(authenticator))
    }

    fn build(config: CmsConfig, authenticator_override: Option<Arc<dyn Authenticator>>) -> Self {
        let router_config = config.clone();
        let state = AppState {
            inner: Arc::new(ArcSwap::from_pointee(InnerState::build(
                config,
                authenticator_override.clone(),
            ))),
            sessions: SessionRegistry::new(),
            login_limiter: Arc::new(LoginRateLimiter::new()),
        };

        let router = Self::build_router(&router_config, state.clone());
        Self {
            router,
            state,
            authenticator_override,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &CmsConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/health", get(handlers::health))
            .route("/api/content", get(handlers::get_content))
            .route("/api/contact", post(handlers::contact))
            .merge(setup_admin_router(state.clone(), config.uploads.max_bytes))
            .with_state(state)
            .layer(middleware::from_fn(metrics::track_requests));

        let router = if config.security.enable_headers {
            with_security_headers(router)
        } else {
            router
        };

        router.layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                .layer(propagate_request_id_layer())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.timeouts.request_secs,
                ))),
        )
    }

    /// Shared state, for inspection.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The fully layered router, e.g. for driving with `tower::ServiceExt`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<CmsConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let background = self.spawn_background(config_updates);
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        for task in background {
            task.abort();
        }
        tracing::info!("HTTP server stopped");
        result
    }

    /// Run over TLS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        config_updates: mpsc::UnboundedReceiver<CmsConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let background = self.spawn_background(config_updates);
        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        let request_timeout = Duration::from_secs(self.state.inner.load().config.timeouts.request_secs);
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            shutdown_handle.graceful_shutdown(Some(request_timeout));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let result = axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app)
            .await;

        for task in background {
            task.abort();
        }
        tracing::info!("HTTPS server stopped");
        result
    }

    fn spawn_background(
        &self,
        mut config_updates: mpsc::UnboundedReceiver<CmsConfig>,
    ) -> Vec<JoinHandle<()>> {
        let inner = self.state.inner.clone();
        let authenticator = self.authenticator_override.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                tracing::info!(
                    content_path = %config.storage.content_path,
                    upload_dir = %config.storage.upload_dir,
                    "Applying reloaded configuration"
                );
                inner.store(Arc::new(InnerState::build(config, authenticator.clone())));
            }
        });

        let sessions = self.state.sessions.clone();
        let sweeper = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                let purged = sessions.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "Expired admin sessions removed");
                }
            }
        });

        vec![reloader, sweeper]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_server() -> (tempfile::TempDir, HttpServer) {
        let dir = tempfile::tempdir().unwrap();
        let content_path = dir.path().join("content.json");
        std::fs::write(&content_path, r#"{"hero": {"title": "Hello"}}"#).unwrap();

        let mut config = CmsConfig::default();
        config.storage.content_path = content_path.to_string_lossy().into_owned();
        config.storage.upload_dir = dir.path().join("img").to_string_lossy().into_owned();
        config.admin.dev_mode = true;
        (dir, HttpServer::new(config))
    }

    #[tokio::test]
    async fn test_public_content_and_headers() {
        let (_dir, server) = test_server();
        let response = server
            .router()
            .oneshot(Request::get("/api/content").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(doc["hero"]["title"], "Hello");
    }

    #[tokio::test]
    async fn test_admin_routes_require_session() {
        let (_dir, server) = test_server();
        let response = server
            .router()
            .oneshot(
                Request::post("/api/update")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = server
            .router()
            .oneshot(
                Request::get("/api/images")
                    .header(header::AUTHORIZATION, "Bearer forged")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_storage_failure_is_500() {
        let (dir, server) = test_server();
        std::fs::remove_file(dir.path().join("content.json")).unwrap();

        let response = server
            .router()
            .oneshot(Request::get("/api/content").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(err["error"], "Internal storage error");
    }
}
