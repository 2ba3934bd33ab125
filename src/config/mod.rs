//! Configuration management for toyshelf
//!
//! This module handles loading, parsing, and validating application
//! configuration from YAML files and environment variables.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // Expand environment variables in the YAML string first
        let expanded = expand_env_vars(yaml);
        serde_yaml::from_str(&expanded)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse YAML: {}", e)))
    }

    /// Load configuration from environment variables with prefix TOYSHELF_
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Ok(host) = std::env::var("TOYSHELF_SERVER_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("TOYSHELF_SERVER_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid port number".to_string()))?;
        }

        if let Ok(path) = std::env::var("TOYSHELF_DATABASE_PATH") {
            config.database.path = path;
        }

        if let Ok(cost) = std::env::var("TOYSHELF_AUTH_BCRYPT_COST") {
            config.auth.bcrypt_cost = cost
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid bcrypt cost".to_string()))?;
        }

        if let Ok(level) = std::env::var("TOYSHELF_LOGGING_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
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
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file; `:memory:` for an in-memory store
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "toyshelf.db".to_string()
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthConfig {
    /// bcrypt work factor applied to every password hash operation
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

fn default_bcrypt_cost() -> u32 {
    12
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Replace `${VAR}` references with environment variable values
fn expand_env_vars(input: &str) -> String {
    static VAR_PATTERN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("var pattern must compile"));

    VAR_PATTERN
        .replace_all(input, |caps: &regex::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("{0}")]
    FileRead(String),

    /// Failed to parse the configuration
    #[error("{0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test 1: Defaults are sensible
    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.database.path, "toyshelf.db");
        assert_eq!(config.auth.bcrypt_cost, 12);
        assert_eq!(config.logging.level, "info");
    }

    // Test 2: Partial YAML falls back to defaults per field
    #[test]
    fn test_from_yaml_partial() {
        let yaml = r#"
server:
  port: 8080
auth:
  bcrypt_cost: 10
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.bcrypt_cost, 10);
        assert_eq!(config.logging.level, "info");
    }

    // Test 3: Invalid YAML is a parse error
    #[test]
    fn test_from_yaml_invalid() {
        let result = Config::from_yaml("server: [not, a, map]");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    // Test 4: ${VAR} references expand from the environment
    #[test]
    fn test_env_expansion() {
        std::env::set_var("TOYSHELF_TEST_DB_PATH", "/tmp/toyshelf-test.db");

        let yaml = r#"
database:
  path: ${TOYSHELF_TEST_DB_PATH}
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.database.path, "/tmp/toyshelf-test.db");

        std::env::remove_var("TOYSHELF_TEST_DB_PATH");
    }

    // Test 5: Config round-trips through YAML
    #[test]
    fn test_yaml_round_trip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = Config::from_yaml(&yaml).unwrap();

        assert_eq!(config, parsed);
    }
}
