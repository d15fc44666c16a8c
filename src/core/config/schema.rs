//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Layout
//!
//! ```toml
//! [connection]
//! service_url = "https://ecm.example.com/cmis/browser"
//! user = "integration"
//!
//! [defaults]
//! charset = "UTF-8"
//! succinct = true
//! repository = "A1"
//! ```
//!
//! # Validation
//!
//! Config values are validated after parsing so that a malformed file
//! fails at load time, not at the first request.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Client configuration (user scope).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Service connection settings
    pub connection: Option<ConnectionConfig>,

    /// Per-call protocol defaults
    pub defaults: Option<ProtocolDefaults>,
}

impl ClientConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(connection) = &self.connection {
            connection.validate()?;
        }
        if let Some(defaults) = &self.defaults {
            defaults.validate()?;
        }
        Ok(())
    }
}

/// Service connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Base URL of the browser-binding service document
    pub service_url: Option<String>,

    /// User name for basic authentication
    pub user: Option<String>,
}

impl ConnectionConfig {
    /// Validate the connection settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.service_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue(format!(
                    "service_url must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }
        if let Some(user) = &self.user {
            if user.is_empty() {
                return Err(ConfigError::InvalidValue("user cannot be empty".to_string()));
            }
        }
        Ok(())
    }
}

/// Protocol defaults merged into every call unless overridden.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProtocolDefaults {
    /// Response character set (default: "UTF-8")
    pub charset: Option<String>,

    /// Request the compact property representation (default: true)
    pub succinct: Option<bool>,

    /// Repository id to select when none is set explicitly
    pub repository: Option<String>,
}

impl ProtocolDefaults {
    /// Validate the protocol defaults.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(charset) = &self.charset {
            if charset.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "charset cannot be empty".to_string(),
                ));
            }
        }
        if let Some(repository) = &self.repository {
            if repository.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "repository cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
