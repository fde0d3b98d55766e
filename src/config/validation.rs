//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parse)
//! - Check that admin credentials are either complete or absent
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CmsConfig → Result<(), Vec<ConfigIssue>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;
use std::path::Path;

use crate::config::schema::CmsConfig;

/// Minimum admin password length, matching the login form rule.
pub const MIN_PASSWORD_LEN: usize = 4;

/// Longest admin session lifetime accepted (30 days).
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: &'static str,
    pub message: String,
}

impl ConfigIssue {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration for semantic problems.
pub fn validate_config(config: &CmsConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        issues.push(ConfigIssue::new(
            "listener.bind_address",
            format!("not a socket address: {}", config.listener.bind_address),
        ));
    }
    if let Some(tls) = &config.listener.tls {
        if !Path::new(&tls.cert_path).exists() {
            issues.push(ConfigIssue::new(
                "listener.tls.cert_path",
                format!("file not found: {}", tls.cert_path),
            ));
        }
        if !Path::new(&tls.key_path).exists() {
            issues.push(ConfigIssue::new(
                "listener.tls.key_path",
                format!("file not found: {}", tls.key_path),
            ));
        }
    }

    if config.storage.content_path.trim().is_empty() {
        issues.push(ConfigIssue::new("storage.content_path", "must not be empty"));
    }
    if config.storage.upload_dir.trim().is_empty() {
        issues.push(ConfigIssue::new("storage.upload_dir", "must not be empty"));
    }
    if config.uploads.max_bytes == 0 {
        issues.push(ConfigIssue::new("uploads.max_bytes", "must be greater than 0"));
    }

    let admin = &config.admin;
    match (&admin.username, &admin.password) {
        (Some(user), Some(password)) => {
            if user.trim().is_empty() {
                issues.push(ConfigIssue::new("admin.username", "must not be blank"));
            }
            if password.trim().chars().count() < MIN_PASSWORD_LEN {
                issues.push(ConfigIssue::new(
                    "admin.password",
                    format!("must be at least {MIN_PASSWORD_LEN} characters"),
                ));
            }
        }
        (Some(_), None) => issues.push(ConfigIssue::new(
            "admin.password",
            "required when admin.username is set",
        )),
        (None, Some(_)) => issues.push(ConfigIssue::new(
            "admin.username",
            "required when admin.password is set",
        )),
        (None, None) => {}
    }
    if admin.session_ttl_secs == 0 {
        issues.push(ConfigIssue::new("admin.session_ttl_secs", "must be greater than 0"));
    } else if admin.session_ttl_secs > MAX_SESSION_TTL_SECS {
        issues.push(ConfigIssue::new(
            "admin.session_ttl_secs",
            format!("must be at most {MAX_SESSION_TTL_SECS} (30 days)"),
        ));
    }
    if admin.login_attempts_per_minute == 0 {
        issues.push(ConfigIssue::new(
            "admin.login_attempts_per_minute",
            "must be greater than 0",
        ));
    }

    if config.timeouts.request_secs == 0 {
        issues.push(ConfigIssue::new("timeouts.request_secs", "must be greater than 0"));
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        issues.push(ConfigIssue::new(
            "observability.metrics_address",
            format!("not a socket address: {}", obs.metrics_address),
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
