//! Configuration management for gnucash-web
//!
//! This module handles loading, validation, and management of
//! gnucash-web configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::{ConfigError, ConfigResult};

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
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
    8080
}

/// Where the GnuCash book lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to a book saved in the SQLite format
    #[serde(default = "default_sqlite_file")]
    pub sqlite_file: PathBuf,
    /// `sqlite://` URI, preferred over `sqlite_file` when set
    #[serde(default)]
    pub uri: Option<String>,
    /// Open the book without taking the GnuCash lock
    #[serde(default = "default_true")]
    pub readonly: bool,
    /// Refuse to open a book file that does not exist
    #[serde(default = "default_true")]
    pub check_exists: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_file: default_sqlite_file(),
            uri: None,
            readonly: true,
            check_exists: true,
        }
    }
}

fn default_sqlite_file() -> PathBuf {
    PathBuf::from("./data/book.gnucash")
}

fn default_true() -> bool {
    true
}

/// Resolved location of the book
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookLocation {
    SqliteFile(PathBuf),
    Uri(String),
}

impl std::fmt::Display for BookLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookLocation::SqliteFile(path) => write!(f, "{}", path.display()),
            BookLocation::Uri(uri) => write!(f, "{}", uri),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
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

/// Number formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Number of decimal places
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Thousands separator
    #[serde(default = "default_thousands_sep")]
    pub thousands_separator: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            decimal_places: default_decimal_places(),
            thousands_separator: default_thousands_sep(),
        }
    }
}

fn default_decimal_places() -> u32 {
    2
}

fn default_thousands_sep() -> String {
    ",".to_string()
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub currency: CurrencyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => ConfigError::IoError {
                message: e.to_string(),
            },
        })?;

        let config = Self::from_yaml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML text without validating it
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        match &self.database.uri {
            Some(uri) if !uri.starts_with("sqlite:") => {
                return Err(ConfigError::InvalidValue {
                    field: "database.uri".to_string(),
                    reason: "Only sqlite:// URIs are supported".to_string(),
                });
            }
            Some(_) => {}
            None if self.database.sqlite_file.as_os_str().is_empty() => {
                return Err(ConfigError::MissingField {
                    field: "database.sqlite_file".to_string(),
                });
            }
            None => {}
        }

        if self.currency.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "currency.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Log level must be one of {}", LOG_LEVELS.join(", ")),
            });
        }

        Ok(())
    }

    /// The bundled default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Where to find the book, the URI winning over the file path
    pub fn book_location(&self) -> BookLocation {
        match &self.database.uri {
            Some(uri) => BookLocation::Uri(uri.clone()),
            None => BookLocation::SqliteFile(self.database.sqlite_file.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use error::{ConfigErrorCode, ConfigErrorSeverity};
    use std::io::Write;

    #[test]
    fn test_default_template_parses_and_validates() {
        let config = Config::from_yaml(Config::generate_default()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.database.readonly);
        assert_eq!(
            config.book_location(),
            BookLocation::SqliteFile(PathBuf::from("./data/book.gnucash"))
        );
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.currency.decimal_places, 2);
        assert_eq!(config.logging.level, "info");
        assert!(config.database.check_exists);
    }

    #[test]
    fn test_uri_takes_precedence() {
        let config = Config::from_yaml(
            "database:\n  sqlite_file: ignored.gnucash\n  uri: sqlite:///srv/book.gnucash\n",
        )
        .unwrap();
        assert_eq!(
            config.book_location(),
            BookLocation::Uri("sqlite:///srv/book.gnucash".to_string())
        );
    }

    #[test]
    fn test_rejects_non_sqlite_uri() {
        let config =
            Config::from_yaml("database:\n  uri: mysql://user@localhost/book\n").unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), ConfigErrorCode::InvalidValue);
        assert_eq!(err.to_details().field.as_deref(), Some("database.uri"));
    }

    #[test]
    fn test_rejects_zero_port() {
        let config = Config::from_yaml("server:\n  port: 0\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "server.port"
        ));
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let config = Config::from_yaml("logging:\n  level: chatty\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_sqlite_file_is_missing() {
        let config = Config::from_yaml("database:\n  sqlite_file: \"\"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), ConfigErrorCode::MissingField);
        assert_eq!(err.severity(), ConfigErrorSeverity::Error);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("nope.yaml")).unwrap_err();
        assert_eq!(err.code(), ConfigErrorCode::FileNotFound);
        assert!(!err.to_details().suggestions.is_empty());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server: [unclosed").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert_eq!(err.code(), ConfigErrorCode::InvalidYaml);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 9000\ndatabase:\n  readonly: false").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(!config.database.readonly);
    }
}
