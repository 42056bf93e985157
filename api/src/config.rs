use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Store attempts must be at least 1")]
    NoStoreAttempts,

    #[error("Store timeout must be at least 1 second")]
    NoStoreTimeout,

    #[error("Auth salt cannot be empty")]
    EmptySalt,
}

/// Scoring API configuration
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for method calls
    #[serde(default)]
    pub listener: Listener,
    /// Optional listener for health and readiness probes
    pub admin_listener: Option<Listener>,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub store: store::config::Config,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.listener.validate()?;
        if let Some(admin_listener) = &self.admin_listener {
            admin_listener.validate()?;
        }

        if self.store.attempts == 0 {
            return Err(ConfigValidationError::NoStoreAttempts);
        }

        if self.store.timeout_secs == 0 {
            return Err(ConfigValidationError::NoStoreTimeout);
        }

        if self.auth.salt.is_empty() || self.auth.admin_salt.is_empty() {
            return Err(ConfigValidationError::EmptySalt);
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Salts mixed into caller tokens.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AuthConfig {
    /// Appended to account and login for regular callers
    #[serde(default = "default_salt")]
    pub salt: String,
    /// Appended to the current hour for the admin caller
    #[serde(default = "default_admin_salt")]
    pub admin_salt: String,
}

fn default_salt() -> String {
    "Otus".into()
}

fn default_admin_salt() -> String {
    "42".into()
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            salt: default_salt(),
            admin_salt: default_admin_salt(),
        }
    }
}
