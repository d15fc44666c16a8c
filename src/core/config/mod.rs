//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! The client reads one user-scope config file with two sections:
//! `[connection]` (service URL, user) and `[defaults]` (per-call
//! protocol defaults).
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Config file
//! 3. Per-call options (handled by the parameter merger, not here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$CMIS_BROWSER_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/cmis-browser/config.toml`
//! 3. `~/.cmis-browser/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use cmis_browser::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("charset: {}", config.charset());
//! println!("succinct: {}", config.succinct());
//! if let Some(url) = config.service_url() {
//!     println!("service: {}", url);
//! }
//! ```

pub mod schema;

pub use schema::{ClientConfig, ConnectionConfig, ProtocolDefaults};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Built-in response character set.
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with default-applying accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents (empty when no file was found).
    pub client: ClientConfig,
    /// Path the config was loaded from (if any).
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read,
    /// parsed or validated. A missing file is not an error (built-in
    /// defaults are used).
    pub fn load() -> Result<Self, ConfigError> {
        let (client, path) = Self::locate_and_read()?;
        client.validate()?;
        Ok(Config { client, path })
    }

    /// Load configuration from an explicit file path.
    ///
    /// # Errors
    ///
    /// Unlike [`load`](Config::load), a missing file here is an error:
    /// the caller named the file deliberately.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let client = Self::read_file(path)?;
        client.validate()?;
        Ok(Config {
            client,
            path: Some(path.to_path_buf()),
        })
    }

    /// Locate and read the config file from standard locations.
    fn locate_and_read() -> Result<(ClientConfig, Option<PathBuf>), ConfigError> {
        // 1. Check $CMIS_BROWSER_CONFIG
        if let Ok(path) = std::env::var("CMIS_BROWSER_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok((Self::read_file(&path)?, Some(path)));
            }
        }

        // 2. Check $XDG_CONFIG_HOME/cmis-browser/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("cmis-browser/config.toml");
            if path.exists() {
                return Ok((Self::read_file(&path)?, Some(path)));
            }
        }

        // 3. Check ~/.cmis-browser/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".cmis-browser/config.toml");
            if path.exists() {
                return Ok((Self::read_file(&path)?, Some(path)));
            }
        }

        // No config found, use defaults
        Ok((ClientConfig::default(), None))
    }

    /// Read and parse a config file.
    fn read_file(path: &Path) -> Result<ClientConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical path for the config file.
    ///
    /// Returns `~/.cmis-browser/config.toml`.
    pub fn canonical_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".cmis-browser/config.toml"))
    }

    /// Write the configuration atomically to the canonical path.
    ///
    /// Creates parent directories if needed. Writes to a temp file in
    /// the same directory, then renames, to prevent corruption.
    pub fn write(client: &ClientConfig) -> Result<PathBuf, ConfigError> {
        let path = Self::canonical_path()?;
        Self::write_atomic(&path, client)?;
        Ok(path)
    }

    /// Write a config file atomically.
    fn write_atomic(path: &Path, client: &ClientConfig) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(client).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with defaults applied
    // =========================================================================

    /// Path the config was loaded from, if a file was found.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Service URL, if configured.
    pub fn service_url(&self) -> Option<&str> {
        self.client
            .connection
            .as_ref()
            .and_then(|c| c.service_url.as_deref())
    }

    /// User name for basic authentication, if configured.
    pub fn user(&self) -> Option<&str> {
        self.client
            .connection
            .as_ref()
            .and_then(|c| c.user.as_deref())
    }

    /// Response character set (default: `UTF-8`).
    pub fn charset(&self) -> &str {
        self.client
            .defaults
            .as_ref()
            .and_then(|d| d.charset.as_deref())
            .unwrap_or(DEFAULT_CHARSET)
    }

    /// Whether to request succinct properties (default: true).
    pub fn succinct(&self) -> bool {
        self.client
            .defaults
            .as_ref()
            .and_then(|d| d.succinct)
            .unwrap_or(true)
    }

    /// Configured default repository id, if any.
    pub fn default_repository(&self) -> Option<&str> {
        self.client
            .defaults
            .as_ref()
            .and_then(|d| d.repository.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn defaults_when_empty() {
        let config = Config::default();
        assert_eq!(config.charset(), "UTF-8");
        assert!(config.succinct());
        assert!(config.service_url().is_none());
        assert!(config.default_repository().is_none());
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
                [connection]
                service_url = "https://ecm.example.com/cmis/browser"
                user = "integration"

                [defaults]
                charset = "ISO-8859-1"
                succinct = false
                repository = "A1"
            "#,
        );

        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config.service_url(),
            Some("https://ecm.example.com/cmis/browser")
        );
        assert_eq!(config.user(), Some("integration"));
        assert_eq!(config.charset(), "ISO-8859-1");
        assert!(!config.succinct());
        assert_eq!(config.default_repository(), Some("A1"));
        assert_eq!(config.path(), Some(path.as_path()));
    }

    #[test]
    fn load_from_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = Config::load_from(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn invalid_url_rejected_at_load() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
                [connection]
                service_url = "not-a-url"
            "#,
        );

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn parse_error_includes_path() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "not [ valid toml");

        let err = Config::load_from(&path).unwrap_err();
        match err {
            ConfigError::ParseError { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn write_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");

        let client = ClientConfig {
            defaults: Some(ProtocolDefaults {
                charset: Some("UTF-8".to_string()),
                succinct: Some(true),
                repository: None,
            }),
            ..Default::default()
        };

        Config::write_atomic(&path, &client).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.client, client);
    }
}
