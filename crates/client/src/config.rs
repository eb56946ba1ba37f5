//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `KOTOB_API_URL` - Base URL of the bookstore REST API (e.g. `https://api.example.com/api`)
//!
//! ## Optional
//! - `KOTOB_STORAGE_DIR` - Directory for the persisted client store (default: `.kotob`)
//! - `KOTOB_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `KOTOB_CATALOG_RETRIES` - Retries for catalog list calls (default: 2)
//! - `KOTOB_CATALOG_CACHE_TTL_SECS` - Book list cache TTL, 0 disables (default: 300)
//! - `KOTOB_LOG_FORMAT` - `pretty` or `json` (default: `pretty`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_STORAGE_DIR: &str = ".kotob";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CATALOG_RETRIES: u32 = 2;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format for the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Bookstore client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API; endpoint paths are appended to it.
    pub api_url: Url,
    /// Directory holding the persisted client store.
    pub storage_dir: PathBuf,
    /// Per-request timeout.
    pub http_timeout: Duration,
    /// Retries for catalog list calls.
    pub catalog_retries: u32,
    /// TTL of the book list cache (zero disables caching).
    pub catalog_cache_ttl: Duration,
    /// Log output format.
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
    /// Sentry environment name.
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Build a configuration with defaults for everything but the API URL.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            catalog_retries: DEFAULT_CATALOG_RETRIES,
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            log_format: LogFormat::Pretty,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

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

        let api_url = parse_api_url(&get_required_env("KOTOB_API_URL")?)?;
        let storage_dir = PathBuf::from(get_env_or_default("KOTOB_STORAGE_DIR", DEFAULT_STORAGE_DIR));
        let http_timeout = Duration::from_secs(parse_env("KOTOB_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?);
        let catalog_retries = parse_env("KOTOB_CATALOG_RETRIES", DEFAULT_CATALOG_RETRIES)?;
        let catalog_cache_ttl =
            Duration::from_secs(parse_env("KOTOB_CATALOG_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?);
        let log_format = match get_env_or_default("KOTOB_LOG_FORMAT", "pretty").as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "KOTOB_LOG_FORMAT".to_string(),
                    format!("expected `pretty` or `json`, got `{other}`"),
                ));
            }
        };

        Ok(Self {
            api_url,
            storage_dir,
            http_timeout,
            catalog_retries,
            catalog_cache_ttl,
            log_format,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Path of the persisted client store file.
    #[must_use]
    pub fn storage_file(&self) -> PathBuf {
        self.storage_dir.join("storage.json")
    }
}

/// Parse and normalize the API base URL.
///
/// The URL must be absolute `http` or `https`. A trailing slash is stripped so
/// that endpoint paths (which start with `/`) can be appended directly.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unparseable or non-HTTP URLs.
pub fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("KOTOB_API_URL".to_string(), msg);

    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("URL must have a host".to_string()));
    }
    Ok(url)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to a default when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_url_strips_trailing_slash() {
        let url = parse_api_url("https://api.example.com/api/").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api");
    }

    #[test]
    fn test_parse_api_url_rejects_other_schemes() {
        assert!(matches!(
            parse_api_url("ftp://files.example.com"),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(parse_api_url("not a url").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(parse_api_url("http://localhost:5000/api").unwrap());
        assert_eq!(config.catalog_retries, 2);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.storage_file(), PathBuf::from(".kotob/storage.json"));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }
}
