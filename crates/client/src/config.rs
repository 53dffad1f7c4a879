//! Configuration management for the VneFiles client.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/vnefiles/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must start with http:// or https://, got {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("request_timeout_secs must be between 1 and 600, got {0}")]
    InvalidTimeout(u64),

    #[error("log level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// File name of the client database inside the data directory.
pub const DATABASE_FILE_NAME: &str = "client.db";

/// Main configuration structure for the VneFiles client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Service endpoints.
    pub service: ServiceConfig,

    /// Local persistence.
    pub storage: StorageConfig,

    /// Log output.
    pub logging: LoggingConfig,
}

/// Endpoints of the file-exchange service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Login and registration.
    pub auth_url: String,

    /// File listing and download accounting.
    pub files_url: String,

    /// File upload.
    pub upload_url: String,

    /// Profile read and write.
    pub profile_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

/// Local persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the client database.
    pub data_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    pub level: String,

    /// Directory for daily rolling log files. Logs go to stderr only when unset.
    pub directory: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            auth_url: "http://localhost:8080/auth".to_string(),
            files_url: "http://localhost:8080/files".to_string(),
            upload_url: "http://localhost:8080/upload".to_string(),
            profile_url: "http://localhost:8080/profile".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    /// Create a configuration whose endpoints all live under `base_url`.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            auth_url: format!("{}/auth", base),
            files_url: format!("{}/files", base),
            upload_url: format!("{}/upload", base),
            profile_url: format!("{}/profile", base),
            ..Default::default()
        }
    }

    /// The request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// Path of the SQLite database holding the persisted session.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vnefiles")
        .join("config.toml")
}

/// Returns the default data directory path.
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vnefiles")
}

impl ClientConfig {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values; empty
    /// values are ignored. Supported variables:
    /// - VNEFILES_AUTH_URL, VNEFILES_FILES_URL, VNEFILES_UPLOAD_URL,
    ///   VNEFILES_PROFILE_URL: override service endpoints
    /// - VNEFILES_LOG_LEVEL: override log level
    pub fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 5] = [
            ("VNEFILES_AUTH_URL", &mut self.service.auth_url),
            ("VNEFILES_FILES_URL", &mut self.service.files_url),
            ("VNEFILES_UPLOAD_URL", &mut self.service.upload_url),
            ("VNEFILES_PROFILE_URL", &mut self.service.profile_url),
            ("VNEFILES_LOG_LEVEL", &mut self.logging.level),
        ];

        for (var, slot) in overrides {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    tracing::info!("Overriding {} from environment: {}", var, value);
                    *slot = value;
                }
            }
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let urls = [
            ("auth_url", &self.service.auth_url),
            ("files_url", &self.service.files_url),
            ("upload_url", &self.service.upload_url),
            ("profile_url", &self.service.profile_url),
        ];
        for (field, value) in urls {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(ConfigError::InvalidUrl {
                    field,
                    value: value.clone(),
                });
            }
        }

        let timeout = self.service.request_timeout_secs;
        if !(1..=600).contains(&timeout) {
            return Err(ConfigError::InvalidTimeout(timeout));
        }

        let level = self.logging.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.logging.level.clone()));
        }

        Ok(())
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load the effective configuration: the file at `path` (or defaults),
    /// then environment overrides, then validation.
    pub fn resolve<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::resolve(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}
