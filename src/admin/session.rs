//! Admin session tokens.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::{distributions::Alphanumeric, Rng};
use uuid::Uuid;

use crate::admin::auth::Authenticator;
use crate::config::validation::{MAX_SESSION_TTL_SECS, MIN_PASSWORD_LEN};
use crate::error::{CmsError, CmsResult};

const TOKEN_LEN: usize = 48;

/// Proof that the holder logged in as admin.
///
/// Only [`SessionRegistry::login`] hands these out; every mutating core
/// operation takes one by reference.
#[derive(Debug, Clone)]
pub struct AdminSession {
    id: Uuid,
    token: String,
    username: String,
    expires_at: Instant,
}

impl AdminSession {
    /// A TTL past what `Instant` can represent is capped at the configured
    /// maximum instead of overflowing.
    pub(crate) fn new(username: impl Into<String>, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).unwrap_or_else(|| {
            tracing::warn!(ttl_secs = ttl.as_secs(), "Session TTL out of range, capping");
            now + Duration::from_secs(MAX_SESSION_TTL_SECS)
        });
        let token = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        Self {
            id: Uuid::new_v4(),
            token,
            username: username.into(),
            expires_at,
        }
    }

    /// Identifier safe to log, unlike the token.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Time left before the token stops working.
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// Live admin sessions keyed by token.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<DashMap<String, AdminSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the submitted credentials and open a session.
    ///
    /// Blank fields and short passwords are validation errors; wrong
    /// credentials are unauthorized.
    pub fn login(
        &self,
        authenticator: &dyn Authenticator,
        username: &str,
        password: &str,
        ttl: Duration,
    ) -> CmsResult<AdminSession> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(CmsError::validation("Username and password required"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CmsError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if !authenticator.verify(username, password) {
            tracing::warn!(username = %username, "Rejected admin login");
            return Err(CmsError::Unauthorized("Invalid credentials".into()));
        }

        let session = AdminSession::new(username, ttl);
        self.inner.insert(session.token.clone(), session.clone());
        tracing::info!(
            username = %username,
            session_id = %session.id,
            ttl_secs = ttl.as_secs(),
            "Admin logged in"
        );
        Ok(session)
    }

    /// Look up a live session; expired ones are dropped on sight.
    pub fn validate(&self, token: &str) -> Option<AdminSession> {
        let session = self.inner.get(token).map(|r| r.value().clone())?;
        if session.is_expired() {
            self.inner.remove(token);
            tracing::debug!(username = %session.username, "Admin session expired");
            return None;
        }
        Some(session)
    }

    /// Revoke a token. Returns whether it was live.
    pub fn logout(&self, token: &str) -> bool {
        self.inner.remove(token).is_some()
    }

    /// Drop every expired session, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        // Counted inside retain: logins may insert while the sweep runs.
        let mut purged = 0;
        self.inner.retain(|_, s| {
            let keep = !s.is_expired();
            if !keep {
                purged += 1;
            }
            keep
        });
        purged
    }

    /// Count of (active, expired) sessions.
    pub fn summary(&self) -> (usize, usize) {
        let mut active = 0;
        let mut expired = 0;
        for r in self.inner.iter() {
            if r.value().is_expired() {
                expired += 1;
            } else {
                active += 1;
            }
        }
        (active, expired)
    }
}
