//! Frontend configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `URL_BASE` - Base URL of the REST backend (default: <http://localhost:9090>)
//! - `WEB_HOST` - Bind address (default: 127.0.0.1)
//! - `WEB_PORT` or `PORT` - Listen port (default: 3000)
//! - `WEB_COOKIE_SECURE` - Mark the session cookie `Secure` (default: false)
//! - `WEB_STATIC_DIR` - Directory served under `/static` (default: this crate's `static/`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Backend used when `URL_BASE` is unset.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:9090";

/// Static assets shipped with this crate.
pub const DEFAULT_STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Frontend configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Base URL of the REST backend
    pub backend_url: Url,
    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("WEB_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("WEB_HOST".to_string(), e.to_string()))?;
        let port = get_port(&["WEB_PORT", "PORT"], 3000)?;
        let backend_url = parse_backend_url(&get_env_or_default("URL_BASE", DEFAULT_BACKEND_URL))?;
        let cookie_secure = get_bool_env("WEB_COOKIE_SECURE", false)?;
        let static_dir = PathBuf::from(get_env_or_default("WEB_STATIC_DIR", DEFAULT_STATIC_DIR));

        Ok(Self {
            host,
            port,
            backend_url,
            cookie_secure,
            static_dir,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the backend base URL. Only http(s) URLs that can carry a path are
/// accepted.
fn parse_backend_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("URL_BASE".to_string(), reason);

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(invalid(format!("expected an http(s) URL, got '{raw}'")));
    }
    Ok(url)
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// First port found among `keys`, else `default`.
fn get_port(keys: &[&str], default: u16) -> Result<u16, ConfigError> {
    for key in keys {
        if let Some(value) = get_optional_env(key) {
            return value
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidEnvVar((*key).to_string(), e.to_string()));
        }
    }
    Ok(default)
}

fn get_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    match get_optional_env(key) {
        None => Ok(default),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got '{value}'"),
            )),
        },
    }
}
