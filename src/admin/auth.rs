//! Admin credential checks and the bearer-token guard for admin routes.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::config::AdminConfig;
use crate::error::CmsError;
use crate::http::server::AppState;

/// Username of the fixed development account.
pub const DEV_USERNAME: &str = "admin";

/// Password of the fixed development account.
pub const DEV_PASSWORD: &str = "password";

/// Verifies admin credentials.
pub trait Authenticator: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Authenticator backed by a single configured account.
pub struct StaticAuthenticator {
    credentials: Option<(String, String)>,
}

impl StaticAuthenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Some((username.into(), password.into())),
        }
    }

    /// Refuses every login.
    pub fn disabled() -> Self {
        Self { credentials: None }
    }

    /// The fixed `admin` / `password` account. Development and tests only.
    pub fn dev_account() -> Self {
        Self::new(DEV_USERNAME, DEV_PASSWORD)
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        match (&config.username, &config.password) {
            (Some(username), Some(password)) => Self::new(username.trim(), password.trim()),
            _ if config.dev_mode => {
                tracing::warn!(
                    username = DEV_USERNAME,
                    "No admin credentials configured, dev_mode enables the fixed development account"
                );
                Self::dev_account()
            }
            _ => {
                tracing::warn!("No admin credentials configured, admin login is disabled");
                Self::disabled()
            }
        }
    }
}

impl Authenticator for StaticAuthenticator {
    fn verify(&self, username: &str, password: &str) -> bool {
        let Some((expected_user, expected_password)) = &self.credentials else {
            return false;
        };
        let user_ok = expected_user.as_bytes().ct_eq(username.as_bytes());
        let password_ok = expected_password.as_bytes().ct_eq(password.as_bytes());
        (user_ok & password_ok).into()
    }
}

impl std::fmt::Debug for StaticAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticAuthenticator")
            .field("username", &self.credentials.as_ref().map(|(u, _)| u))
            .finish()
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Reject requests without a live admin session; attach the session otherwise.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, CmsError> {
    let session = bearer_token(&request)
        .and_then(|token| state.sessions.validate(token))
        .ok_or_else(|| CmsError::Unauthorized("Unauthorized".into()))?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
