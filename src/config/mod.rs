//! Configuration management
//!
//! Configuration is loaded from an optional `relata.yml` file and then
//! overridden by environment variables. Missing values fall back to defaults.
//!
//! The storage connection string has one extra override point,
//! `DATABASE_URI`, which wins over both the file and `RELATA_DATABASE_URL`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "relata.yml";

/// Environment variable that overrides the storage connection string
pub const DATABASE_URI_ENV: &str = "DATABASE_URI";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URI or plain file path
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

/// Where the SQLite database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// Private in-memory database
    Memory,
    /// Database file on disk
    File(PathBuf),
}

impl fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseLocation::Memory => write!(f, ":memory:"),
            DatabaseLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl DatabaseConfig {
    /// Configuration for a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            url: ":memory:".to_string(),
        }
    }

    /// Resolve the connection string into a database location.
    ///
    /// Accepted forms:
    /// - `:memory:`, `sqlite::memory:` and `sqlite://` (in-memory)
    /// - `sqlite:///<path>` where `<path>` is everything after the third slash,
    ///   so `sqlite:////abs/data.db` is absolute and `sqlite:///data.db` is relative
    /// - `sqlite://<path>` and `sqlite:<path>`
    /// - a bare file path
    pub fn location(&self) -> DatabaseLocation {
        let url = self.url.trim();
        if url == ":memory:" || url == "sqlite::memory:" {
            return DatabaseLocation::Memory;
        }

        let path = if let Some(rest) = url.strip_prefix("sqlite:///") {
            rest
        } else if let Some(rest) = url.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = url.strip_prefix("sqlite:") {
            rest
        } else {
            url
        };

        // Drop connection options such as `?mode=rwc`
        let path = path.split('?').next().unwrap_or_default();

        if path.is_empty() || path == ":memory:" {
            DatabaseLocation::Memory
        } else {
            DatabaseLocation::File(PathBuf::from(path))
        }
    }
}

/// Build a `sqlite:` URI for a file path.
///
/// The path is appended after `sqlite:///`. POSIX absolute paths start with
/// `/`, giving four slashes in total; Windows paths start with a drive letter
/// and end up with three.
pub fn sqlite_uri(path: &Path) -> String {
    format!("sqlite:///{}", path.display())
}

fn default_database_url() -> String {
    let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    sqlite_uri(&base.join("data.db"))
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables, in increasing precedence:
    /// - RELATA_SERVER_HOST
    /// - RELATA_SERVER_PORT
    /// - RELATA_DATABASE_URL
    /// - DATABASE_URI
    pub fn load_with_env(path: &Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("RELATA_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("RELATA_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(url) = std::env::var("RELATA_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(uri) = std::env::var(DATABASE_URI_ENV) {
            self.database.url = uri;
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every test that touches process environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "RELATA_SERVER_HOST",
    "RELATA_SERVER_PORT",
    "RELATA_DATABASE_URL",
    DATABASE_URI_ENV,
];
