//! Configuration loading and typed config structures for the catalog server.
//!
//! The canonical configuration lives in `reel-config.yaml` at the project
//! root. Every field has a default, so a missing file or a partial file is
//! valid. Deployment-specific values can be overridden from the environment:
//!
//! - `DATABASE_URL` overrides `database.url`
//! - `REEL_HOST` overrides `server.host`
//! - `REEL_PORT` overrides `server.port`
//! - `REEL_LOG_FORMAT` overrides `logging.format` (`pretty` or `json`)

use std::path::Path;

use reel_catalog::{DEFAULT_ERROR_MESSAGE_LIMIT, ImportSettings, MAX_ERROR_MESSAGE_LIMIT};
use reel_db::DatabaseConfig;
use serde::Deserialize;

use crate::server::ServerConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is out of range.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration, mirroring `reel-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReelConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// `PostgreSQL` connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Bulk import settings.
    #[serde(default)]
    pub import: ImportConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ReelConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides are
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.import.check()?;
        Ok(config)
    }

    /// Override values from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override values from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(host) = lookup("REEL_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("REEL_PORT") {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(e) => tracing::warn!(value = %port, error = %e, "ignoring invalid REEL_PORT"),
            }
        }
        if let Some(format) = lookup("REEL_LOG_FORMAT") {
            match LogFormat::parse(&format) {
                Some(format) => self.logging.format = format,
                None => tracing::warn!(value = %format, "ignoring invalid REEL_LOG_FORMAT"),
            }
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSection {
    /// Listener settings for [`start_server`](crate::server::start_server).
    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Bulk import configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportConfig {
    /// Maximum characters of an error message kept in the audit trail.
    #[serde(default = "default_error_message_limit")]
    pub error_message_limit: usize,

    /// Username recorded when a request names none.
    #[serde(default = "default_user")]
    pub default_user: String,
}

impl ImportConfig {
    /// Stored error messages must fit `import_history.error_message`.
    fn check(&self) -> Result<(), ConfigError> {
        if self.error_message_limit > MAX_ERROR_MESSAGE_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "import.error_message_limit {} exceeds {MAX_ERROR_MESSAGE_LIMIT}",
                self.error_message_limit
            )));
        }
        Ok(())
    }

    /// Settings for the import pipeline.
    pub const fn settings(&self) -> ImportSettings {
        ImportSettings {
            error_message_limit: self.error_message_limit,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            error_message_limit: default_error_message_limit(),
            default_user: default_user(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parse `pretty` or `json`, ignoring case.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

const fn default_error_message_limit() -> usize {
    DEFAULT_ERROR_MESSAGE_LIMIT
}

fn default_user() -> String {
    String::from("user")
}

fn default_log_level() -> String {
    String::from("info")
}
