//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::CmsConfig;
use crate::config::validation::{validate_config, ConfigIssue};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ConfigIssue>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(issues) => {
                write!(f, "Validation failed: ")?;
                for (i, issue) in issues.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", issue)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<CmsConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: CmsConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load the file if it exists, otherwise validate and use built-in defaults.
pub fn load_or_default(path: &Path) -> Result<CmsConfig, ConfigError> {
    if path.exists() {
        return load_config(path);
    }
    tracing::warn!(path = ?path, "Config file not found, using defaults");
    let config = CmsConfig::default();
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
