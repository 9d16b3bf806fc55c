//! Server configuration module.
//!
//! This module provides configuration loading for the quill server from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `QUILL_JWT_SECRET`: Shared secret for signing access tokens (required)
//! - `QUILL_JWT_ISSUER`: `iss` claim for issued tokens (default: `quill`)
//! - `QUILL_JWT_AUDIENCE`: `aud` claim for issued tokens (default: `quill-clients`)
//! - `QUILL_ACCESS_TOKEN_MINUTES`: Access-token lifetime in minutes (default: `15`)
//! - `QUILL_REFRESH_TOKEN_DAYS`: Refresh-token lifetime in days (default: `7`)
//! - `QUILL_ALLOWED_ORIGIN`: Cross-origin caller allowed by CORS (default: `http://localhost:4200`)
//! - `QUILL_LISTEN_PORT`: Port to listen on (default: `3000`)
//!
//! # Invariants
//!
//! - `jwt_secret` is never empty (a missing signing key is a fatal startup
//!   error, not a per-request condition)
//! - `access_token_minutes` and `refresh_token_days` are always positive
//! - `listen_port` is always a valid port number (1-65535)

/// Server configuration.
///
/// Contains all configuration parameters needed to run the quill server.
///
/// # Pre-conditions
///
/// When constructed via `from_env()`:
/// - All required environment variables must be set
/// - All values must be valid for their respective types
///
/// # Post-conditions
///
/// - `jwt_secret` is non-empty
/// - Token lifetimes are positive
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Shared secret used to sign and verify access tokens.
    pub jwt_secret: String,
    /// Issuer claim embedded in and required of every access token.
    pub jwt_issuer: String,
    /// Audience claim embedded in and required of every access token.
    pub jwt_audience: String,
    /// Access-token lifetime in minutes.
    pub access_token_minutes: i64,
    /// Refresh-token lifetime in days.
    pub refresh_token_days: i64,
    /// The single cross-origin caller allowed by the CORS layer.
    pub allowed_origin: String,
    /// Port to listen on for HTTP connections.
    pub listen_port: u16,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
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
    /// Default issuer claim.
    pub const DEFAULT_ISSUER: &'static str = "quill";
    /// Default audience claim.
    pub const DEFAULT_AUDIENCE: &'static str = "quill-clients";
    /// Default access-token lifetime in minutes.
    pub const DEFAULT_ACCESS_TOKEN_MINUTES: i64 = 15;
    /// Default refresh-token lifetime in days.
    pub const DEFAULT_REFRESH_TOKEN_DAYS: i64 = 7;
    /// Default allowed cross-origin caller.
    pub const DEFAULT_ALLOWED_ORIGIN: &'static str = "http://localhost:4200";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `QUILL_JWT_SECRET` is not set or is empty
    /// - `QUILL_ACCESS_TOKEN_MINUTES` or `QUILL_REFRESH_TOKEN_DAYS` is set
    ///   but not a positive integer
    /// - `QUILL_LISTEN_PORT` is set but not a valid port number
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = Self::load_jwt_secret()?;
        let jwt_issuer = Self::load_string("QUILL_JWT_ISSUER", Self::DEFAULT_ISSUER);
        let jwt_audience = Self::load_string("QUILL_JWT_AUDIENCE", Self::DEFAULT_AUDIENCE);
        let access_token_minutes = Self::load_positive(
            "QUILL_ACCESS_TOKEN_MINUTES",
            Self::DEFAULT_ACCESS_TOKEN_MINUTES,
        )?;
        let refresh_token_days =
            Self::load_positive("QUILL_REFRESH_TOKEN_DAYS", Self::DEFAULT_REFRESH_TOKEN_DAYS)?;
        let allowed_origin = Self::load_string("QUILL_ALLOWED_ORIGIN", Self::DEFAULT_ALLOWED_ORIGIN);
        let listen_port = Self::load_listen_port()?;

        Ok(Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            access_token_minutes,
            refresh_token_days,
            allowed_origin,
            listen_port,
        })
    }

    /// Load the signing secret from environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variable is not set or is empty.
    fn load_jwt_secret() -> Result<String, ConfigError> {
        let secret = std::env::var("QUILL_JWT_SECRET")
            .map_err(|_| ConfigError::MissingEnvVar("QUILL_JWT_SECRET".to_string()))?;

        if secret.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "QUILL_JWT_SECRET".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(secret)
    }

    /// Load a string variable, falling back to the default if not set.
    fn load_string(name: &str, default: &str) -> String {
        std::env::var(name).unwrap_or_else(|_| default.to_string())
    }

    /// Load a positive integer variable, falling back to the default if not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is set but not a positive integer.
    fn load_positive(name: &str, default: i64) -> Result<i64, ConfigError> {
        match std::env::var(name) {
            Ok(value) => match value.parse::<i64>() {
                Ok(parsed) if parsed > 0 => Ok(parsed),
                _ => Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: format!("'{value}' is not a positive integer"),
                }),
            },
            Err(_) => Ok(default),
        }
    }

    /// Load the listen port from environment.
    ///
    /// Returns the default if not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is set but not a valid port number.
    fn load_listen_port() -> Result<u16, ConfigError> {
        match std::env::var("QUILL_LISTEN_PORT") {
            Ok(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: "QUILL_LISTEN_PORT".to_string(),
                message: format!("'{value}' is not a valid port number (must be 1-65535)"),
            }),
            Err(_) => Ok(Self::DEFAULT_PORT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(ServerConfig::DEFAULT_PORT, 3000);
        assert_eq!(ServerConfig::DEFAULT_ISSUER, "quill");
        assert_eq!(ServerConfig::DEFAULT_AUDIENCE, "quill-clients");
        assert_eq!(ServerConfig::DEFAULT_ACCESS_TOKEN_MINUTES, 15);
        assert_eq!(ServerConfig::DEFAULT_REFRESH_TOKEN_DAYS, 7);
        assert_eq!(
            ServerConfig::DEFAULT_ALLOWED_ORIGIN,
            "http://localhost:4200"
        );
    }

    #[test]
    fn test_config_error_display_missing() {
        let error = ConfigError::MissingEnvVar("TEST_VAR".to_string());
        assert_eq!(
            error.to_string(),
            "missing required environment variable: TEST_VAR"
        );
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
