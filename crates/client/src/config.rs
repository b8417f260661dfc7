//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `TIFFIN_API_BASE_URL` - Base URL of the ordering API (default: `http://localhost:8000/api`)
//! - `TIFFIN_STATE_PATH` - JSON file holding the session and cart (default: `~/.tiffin/state.json`)
//! - `TIFFIN_CATALOG_CACHE_TTL_SECS` - Restaurant/menu cache lifetime, `0` disables (default: 300)
//! - `TIFFIN_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: none)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;
const STATE_DIR: &str = ".tiffin";
const STATE_FILE: &str = "state.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every API path is appended to, without a trailing slash
    pub api_base_url: String,
    /// Location of the durable session/cart snapshot
    pub state_path: PathBuf,
    /// Catalog cache lifetime; `None` disables caching
    pub catalog_cache_ttl: Option<Duration>,
    /// Per-request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = lookup("TIFFIN_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = normalize_base_url("TIFFIN_API_BASE_URL", &api_base_url)?;

        let state_path = lookup("TIFFIN_STATE_PATH").map_or_else(
            || default_state_path(lookup("HOME")),
            PathBuf::from,
        );

        let cache_secs = parse_secs(
            "TIFFIN_CATALOG_CACHE_TTL_SECS",
            lookup("TIFFIN_CATALOG_CACHE_TTL_SECS"),
        )?
        .unwrap_or(DEFAULT_CATALOG_CACHE_TTL_SECS);
        let catalog_cache_ttl = (cache_secs > 0).then(|| Duration::from_secs(cache_secs));

        let request_timeout = parse_secs(
            "TIFFIN_REQUEST_TIMEOUT_SECS",
            lookup("TIFFIN_REQUEST_TIMEOUT_SECS"),
        )?
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);

        Ok(Self {
            api_base_url,
            state_path,
            catalog_cache_ttl,
            request_timeout,
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at `base_url` with every other setting at its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not an absolute http(s) URL.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|_| None)?;
        config.api_base_url = normalize_base_url("base_url", base_url)?;
        Ok(config)
    }

    /// Disable the catalog cache.
    #[must_use]
    pub const fn without_catalog_cache(mut self) -> Self {
        self.catalog_cache_ttl = None;
        self
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate an http(s) base URL and strip any trailing slash.
fn normalize_base_url(var_name: &str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(value.trim_end_matches('/').to_string())
}

/// Parse an optional whole number of seconds.
fn parse_secs(var_name: &str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))
        })
        .transpose()
}

fn default_state_path(home: Option<String>) -> PathBuf {
    home.map_or_else(PathBuf::new, PathBuf::from)
        .join(STATE_DIR)
        .join(STATE_FILE)
}
