//! Edge proxy configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `EDGE_HOST` - Bind address (default: 127.0.0.1)
//! - `EDGE_PORT` - Listen port (default: 3080)
//! - `EDGE_ORIGIN_URL` - Site to proxy (default: `http://127.0.0.1:3000`)
//! - `EDGE_CACHE_DIR` - Keep buckets on disk here; in memory when unset
//! - `EDGE_CACHE_VERSION` - Bucket version suffix (default: [`CACHE_VERSION`])
//! - `EDGE_WAIT_FOR_SKIP` - Stay installed until a `SKIP_WAITING` message
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::buckets::CACHE_VERSION;

const DEFAULT_ORIGIN: &str = "http://127.0.0.1:3000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Edge proxy configuration.
#[derive(Debug, Clone)]
pub struct EdgeConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Origin base URL without a trailing slash
    pub origin_url: String,
    pub cache_dir: Option<PathBuf>,
    pub cache_version: String,
    pub wait_for_skip: bool,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl EdgeConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let origin_url = get_optional_env("EDGE_ORIGIN_URL").unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
        let origin_url = normalize_origin(&origin_url).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "EDGE_ORIGIN_URL".to_string(),
                "must be an absolute http(s) URL".to_string(),
            )
        })?;

        let cache_version =
            get_optional_env("EDGE_CACHE_VERSION").unwrap_or_else(|| CACHE_VERSION.to_string());
        if !is_valid_version(&cache_version) {
            return Err(ConfigError::InvalidEnvVar(
                "EDGE_CACHE_VERSION".to_string(),
                "use letters, digits, '.', '-' or '_'".to_string(),
            ));
        }

        Ok(Self {
            host: get_parsed_or("EDGE_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: get_parsed_or("EDGE_PORT", 3080_u16)?,
            origin_url,
            cache_dir: get_optional_env("EDGE_CACHE_DIR")
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),
            cache_version,
            wait_for_skip: get_flag("EDGE_WAIT_FOR_SKIP")?,
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

fn normalize_origin(raw: &str) -> Option<String> {
    let url = url::Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    Some(url.as_str().trim_end_matches('/').to_string())
}

fn is_valid_version(version: &str) -> bool {
    !version.is_empty()
        && version.len() <= 32
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn get_parsed_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

fn get_flag(key: &str) -> Result<bool, ConfigError> {
    get_optional_env(key).map_or(Ok(false), |raw| parse_flag(&raw).ok_or_else(|| {
        ConfigError::InvalidEnvVar(key.to_string(), format!("expected true or false, got '{raw}'"))
    }))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_trailing_slash_is_removed() {
        assert_eq!(
            normalize_origin("http://127.0.0.1:3000/").as_deref(),
            Some("http://127.0.0.1:3000")
        );
        assert_eq!(normalize_origin("127.0.0.1:3000"), None);
    }

    #[test]
    fn versions_must_be_path_safe() {
        assert!(is_valid_version("v1"));
        assert!(is_valid_version("2026.03-a"));
        assert!(!is_valid_version(""));
        assert!(!is_valid_version("../v1"));
        assert!(!is_valid_version("v 1"));
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
