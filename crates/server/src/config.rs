//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PLATED_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `PLATED_BASE_URL` - Public URL of the API, used to decide cookie security
//!
//! ## Optional
//! - `PLATED_HOST` - Bind address (default: 127.0.0.1)
//! - `PLATED_PORT` - Listen port (default: 3000)
//! - `PLATED_AUTH_RATE_LIMIT` - Rate limit auth endpoints per client IP (default: true)
//! - `PLATED_LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// How log lines are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{other}'")),
        }
    }
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: Url,
    /// Whether auth endpoints are rate limited
    pub auth_rate_limit: bool,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let database_url = env.database_url("PLATED_DATABASE_URL")?;
        let host = env
            .or_default("PLATED_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PLATED_HOST".to_string(), e.to_string()))?;
        let port = env
            .or_default("PLATED_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PLATED_PORT".to_string(), e.to_string()))?;
        let base_url = Url::parse(&env.required("PLATED_BASE_URL")?).map_err(|e| {
            ConfigError::InvalidEnvVar("PLATED_BASE_URL".to_string(), e.to_string())
        })?;
        let auth_rate_limit = parse_bool(
            "PLATED_AUTH_RATE_LIMIT",
            &env.or_default("PLATED_AUTH_RATE_LIMIT", "true"),
        )?;
        let log_format = env
            .or_default("PLATED_LOG_FORMAT", "pretty")
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::InvalidEnvVar("PLATED_LOG_FORMAT".to_string(), e))?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            auth_rate_limit,
            log_format,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` flag.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("PLATED_DATABASE_URL", "postgres://localhost/plated"),
        ("PLATED_BASE_URL", "http://localhost:3000"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(MINIMAL).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(config.auth_rate_limit);
        assert!(!config.secure_cookies());
        assert!(config.sentry_dsn.is_none());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_log_format() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("PLATED_LOG_FORMAT", "JSON"));
        assert_eq!(load(&vars).unwrap().log_format, LogFormat::Json);

        let mut vars = MINIMAL.to_vec();
        vars.push(("PLATED_LOG_FORMAT", "xml"));
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidEnvVar(ref k, _) if k == "PLATED_LOG_FORMAT"
        ));
    }

    #[test]
    fn test_missing_base_url() {
        let err = load(&[("PLATED_DATABASE_URL", "postgres://localhost/plated")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "PLATED_BASE_URL"));
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[
            ("DATABASE_URL", "postgres://fly/plated"),
            ("PLATED_BASE_URL", "https://api.plated.dev"),
        ])
        .unwrap();
        assert_eq!(
            config.database_url.expose_secret(),
            "postgres://fly/plated"
        );
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[("PLATED_BASE_URL", "http://localhost:3000")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "PLATED_DATABASE_URL"));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("PLATED_PORT", "http"));
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidEnvVar(..)
        ));
    }

    #[test]
    fn test_rate_limit_toggle() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("PLATED_AUTH_RATE_LIMIT", "off"));
        assert!(!load(&vars).unwrap().auth_rate_limit);

        let mut vars = MINIMAL.to_vec();
        vars.push(("PLATED_AUTH_RATE_LIMIT", "maybe"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let mut vars = MINIMAL.to_vec();
        vars[0] = ("PLATED_DATABASE_URL", "postgres://user:hunter2@db/plated");
        let debug_output = format!("{:?}", load(&vars).unwrap());
        assert!(!debug_output.contains("hunter2"));
    }
}
