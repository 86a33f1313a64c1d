//! Server configuration module.
//!
//! This module provides configuration loading for the storefront server from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_JWT_SECRET`: HS256 token signing secret (required)
//! - `STOREFRONT_TOKEN_TTL_SECS`: Token lifetime in seconds (default: `3600`)
//! - `STOREFRONT_CLOCK_SKEW_SECS`: Tolerated clock skew on expiry (default: `0`)
//! - `STOREFRONT_LISTEN_PORT`: Port to listen on (default: `3000`)
//! - `STOREFRONT_NOTIFIER_URL`: Base URL of the messaging service
//!   (default: `http://127.0.0.1:5000`)
//!
//! # Invariants
//!
//! - `signing_key` is never empty and never printed
//! - `token_settings.default_ttl` is at least one second
//! - `listen_port` is always a valid port number (1-65535)

use std::time::Duration;

use crate::auth::{SigningKey, TokenSettings};

const JWT_SECRET: &str = "STOREFRONT_JWT_SECRET";
const TOKEN_TTL_SECS: &str = "STOREFRONT_TOKEN_TTL_SECS";
const CLOCK_SKEW_SECS: &str = "STOREFRONT_CLOCK_SKEW_SECS";
const LISTEN_PORT: &str = "STOREFRONT_LISTEN_PORT";
const NOTIFIER_URL: &str = "STOREFRONT_NOTIFIER_URL";

/// Server configuration.
///
/// Contains all configuration parameters needed to run the storefront server.
///
/// # Pre-conditions
///
/// When constructed via `from_env()`:
/// - `STOREFRONT_JWT_SECRET` must be set and non-empty
/// - All other values, if set, must be valid for their respective types
///
/// # Post-conditions
///
/// - `listen_port` is always in the valid range (1-65535)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Process-wide token signing key.
    pub signing_key: SigningKey,
    /// Token lifetime and expiry leeway.
    pub token_settings: TokenSettings,
    /// Port to listen on for HTTP connections.
    pub listen_port: u16,
    /// Base URL of the email and SMS messaging service.
    pub notifier_url: String,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The signing secret is missing or empty.
    SigningKeyUnconfigured,
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SigningKeyUnconfigured => {
                write!(f, "token signing key is not configured: set {JWT_SECRET}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 3000;
    /// Default messaging service URL.
    pub const DEFAULT_NOTIFIER_URL: &'static str = "http://127.0.0.1:5000";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `STOREFRONT_JWT_SECRET` is not set or is empty
    /// - any other variable is set but not valid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through a variable lookup function.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let signing_key = Self::load_signing_key(&lookup)?;
        let default_ttl = Self::load_token_ttl(&lookup)?;
        let leeway = Duration::from_secs(parse_or(&lookup, CLOCK_SKEW_SECS, 0)?);
        let listen_port = Self::load_listen_port(&lookup)?;
        let notifier_url = lookup(NOTIFIER_URL)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_NOTIFIER_URL.to_string());

        Ok(Self {
            signing_key,
            token_settings: TokenSettings {
                default_ttl,
                leeway,
            },
            listen_port,
            notifier_url,
        })
    }

    /// Load the signing key.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is not set or is empty.
    fn load_signing_key(
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<SigningKey, ConfigError> {
        let secret = lookup(JWT_SECRET).ok_or(ConfigError::SigningKeyUnconfigured)?;
        SigningKey::new_hs256(secret.into_bytes()).map_err(|_| ConfigError::SigningKeyUnconfigured)
    }

    /// Load the token lifetime. Zero is refused.
    fn load_token_ttl(lookup: &impl Fn(&str) -> Option<String>) -> Result<Duration, ConfigError> {
        let secs = parse_or(lookup, TOKEN_TTL_SECS, TokenSettings::DEFAULT_TTL.as_secs())?;
        if secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: TOKEN_TTL_SECS.to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(Duration::from_secs(secs))
    }

    /// Load the listen port.
    ///
    /// Returns the default if not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is set but not a valid port number.
    fn load_listen_port(lookup: &impl Fn(&str) -> Option<String>) -> Result<u16, ConfigError> {
        match lookup(LISTEN_PORT) {
            Some(value) => match value.parse::<u16>() {
                Ok(port) if port > 0 => Ok(port),
                _ => Err(ConfigError::InvalidValue {
                    name: LISTEN_PORT.to_string(),
                    message: format!("'{value}' is not a valid port number (must be 1-65535)"),
                }),
            },
            None => Ok(Self::DEFAULT_PORT),
        }
    }
}

/// Parse an unsigned integer variable, falling back to `default` if unset.
fn parse_or(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    match lookup(name) {
        Some(value) => value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a non-negative integer"),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = load(&[(JWT_SECRET, "s3cret")]).expect("valid config");

        assert_eq!(config.listen_port, 3000);
        assert_eq!(config.notifier_url, "http://127.0.0.1:5000");
        assert_eq!(config.token_settings, TokenSettings::default());
    }

    #[test]
    fn test_missing_or_empty_secret_is_unconfigured() {
        assert_eq!(load(&[]).err(), Some(ConfigError::SigningKeyUnconfigured));
        assert_eq!(
            load(&[(JWT_SECRET, "")]).err(),
            Some(ConfigError::SigningKeyUnconfigured)
        );
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            (JWT_SECRET, "s3cret"),
            (TOKEN_TTL_SECS, "60"),
            (CLOCK_SKEW_SECS, "5"),
            (LISTEN_PORT, "8080"),
            (NOTIFIER_URL, "http://notifier.internal"),
        ])
        .expect("valid config");

        assert_eq!(config.token_settings.default_ttl, Duration::from_secs(60));
        assert_eq!(config.token_settings.leeway, Duration::from_secs(5));
        assert_eq!(config.listen_port, 8080);
        assert_eq!(config.notifier_url, "http://notifier.internal");
    }

    #[test]
    fn test_invalid_values() {
        for (name, value) in [
            (LISTEN_PORT, "0"),
            (LISTEN_PORT, "70000"),
            (TOKEN_TTL_SECS, "0"),
            (TOKEN_TTL_SECS, "soon"),
            (CLOCK_SKEW_SECS, "-1"),
        ] {
            assert!(
                matches!(
                    load(&[(JWT_SECRET, "s3cret"), (name, value)]),
                    Err(ConfigError::InvalidValue { .. })
                ),
                "{name}={value}"
            );
        }
    }

    #[test]
    fn test_debug_does_not_print_secret() {
        let config = load(&[(JWT_SECRET, "do-not-print-me")]).expect("valid config");

        assert!(!format!("{config:?}").contains("do-not-print-me"));
    }

    #[test]
    fn test_config_error_display_invalid() {
        let error = ConfigError::InvalidValue {
            name: "TEST_VAR".to_string(),
            message: "bad value".to_string(),
        };
        assert_eq!(error.to_string(), "invalid value for TEST_VAR: bad value");
    }
}
