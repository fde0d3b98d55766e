//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the CMS.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default maximum upload size (2 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Root configuration for the CMS service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CmsConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Content document and upload directory locations.
    pub storage: StorageConfig,

    /// Upload limits.
    pub uploads: UploadConfig,

    /// Admin credentials and session settings.
    pub admin: AdminConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Security hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Where the content document and images live.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON content document. Must exist before startup.
    pub content_path: String,

    /// Directory holding uploaded and shipped images.
    pub upload_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            content_path: "data/content.json".to_string(),
            upload_dir: "static/img".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum accepted image size in bytes.
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Admin authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Admin username. Unset means no configured account.
    pub username: Option<String>,

    /// Admin password.
    pub password: Option<String>,

    /// Fall back to the fixed development account when no credentials are set.
    pub dev_mode: bool,

    /// Lifetime of an admin session token in seconds.
    pub session_ttl_secs: u64,

    /// Login attempts allowed per client IP per minute.
    pub login_attempts_per_minute: u32,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            dev_mode: false,
            session_ttl_secs: 8 * 60 * 60,
            login_attempts_per_minute: 10,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security response headers.
    pub enable_headers: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CmsConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.storage.content_path, "data/content.json");
        assert_eq!(config.storage.upload_dir, "static/img");
        assert_eq!(config.uploads.max_bytes, 2 * 1024 * 1024);
        assert!(!config.admin.dev_mode);
        assert!(config.admin.username.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: CmsConfig = toml::from_str(
            r#"
            [storage]
            content_path = "/srv/cafe/content.json"

            [admin]
            username = "owner"
            password = "espresso"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.content_path, "/srv/cafe/content.json");
        assert_eq!(config.storage.upload_dir, "static/img");
        assert_eq!(config.admin.username.as_deref(), Some("owner"));
        assert_eq!(config.admin.session_ttl_secs, 8 * 60 * 60);
    }
}
