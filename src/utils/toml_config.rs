//! TOML configuration for the routebook server
//!
//! Read from `routebook.toml` by default. Every field has a default, so an
//! empty file (or no file at all, for the binary) yields a working server.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//! trim_trailing_slash = true
//!
//! [logging]
//! level = "info"
//! format = "pretty"   # or "json"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "routebook.toml";

/// Environment variable overriding `server.host`.
pub const ENV_HOST: &str = "ROUTEBOOK_HOST";
/// Environment variable overriding `server.port`.
pub const ENV_PORT: &str = "ROUTEBOOK_PORT";
/// Environment variable overriding `logging.level`.
pub const ENV_LOG_LEVEL: &str = "ROUTEBOOK_LOG_LEVEL";

const LOG_FORMATS: &[&str] = &["pretty", "json"];

/// Root configuration structure loaded from routebook.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutebookConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Serve `/users/1/` as `/users/1`.
    #[serde(default = "default_trim_trailing_slash")]
    pub trim_trailing_slash: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_trim_trailing_slash() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            trim_trailing_slash: default_trim_trailing_slash(),
        }
    }
}

impl ServerConfig {
    /// `host:port`, as passed to the listener.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

// ============= Errors =============

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{name}' has an invalid value '{value}'")]
    InvalidEnvVar { name: String, value: String },
}

// ============= Loading =============

impl RoutebookConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file gives the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::FileNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Parse and validate TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: RoutebookConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.host must not be empty".to_string(),
            ));
        }
        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be one of {}, got '{}'",
                LOG_FORMATS.join(", "),
                self.logging.format
            )));
        }
        Ok(())
    }

    /// Apply `ROUTEBOOK_*` environment overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: ENV_PORT.to_string(),
                value: port.clone(),
            })?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        self.validate()
    }

    /// Render as TOML, as written by `routebook-server init`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
