//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BASKET_API_BASE_URL` - Base URL of the storefront API (e.g. `https://api.example.com/v1`)
//!
//! ## Optional
//! - `BASKET_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `BASKET_PREDICTION_CACHE_TTL_SECS` - Prediction cache lifetime (default: 300)
//! - `BASKET_PREDICTION_CACHE_CAPACITY` - Maximum cached prediction entries (default: 1000)
//! - `BASKET_CURRENCY` - Display currency code (default: USD)
//! - `BASKET_LOG_FORMAT` - `pretty` or `json` (default: pretty)

use std::str::FromStr;
use std::time::Duration;

use basket_core::CurrencyCode;
use thiserror::Error;
use url::Url;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PREDICTION_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_PREDICTION_CACHE_CAPACITY: u64 = 1000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected pretty or json)")),
        }
    }
}

/// Storefront session configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL every endpoint path is appended to
    pub api_base_url: Url,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// How long a fetched prediction comparison stays cached
    pub prediction_cache_ttl: Duration,
    /// Maximum number of cached prediction comparisons
    pub prediction_cache_capacity: u64,
    /// Currency used when formatting prices
    pub currency: CurrencyCode,
    /// Log output format
    pub log_format: LogFormat,
}

impl StorefrontConfig {
    /// Configuration with defaults for everything but the base URL.
    #[must_use]
    pub const fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            prediction_cache_ttl: Duration::from_secs(DEFAULT_PREDICTION_CACHE_TTL_SECS),
            prediction_cache_capacity: DEFAULT_PREDICTION_CACHE_CAPACITY,
            currency: CurrencyCode::USD,
            log_format: LogFormat::Pretty,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = get_required(&lookup, "BASKET_API_BASE_URL")?;
        let api_base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("BASKET_API_BASE_URL".to_string(), e.to_string())
        })?;
        if api_base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "BASKET_API_BASE_URL".to_string(),
                "must be an absolute http(s) URL".to_string(),
            ));
        }

        let http_timeout = Duration::from_secs(get_parsed_or_default(
            &lookup,
            "BASKET_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);
        let prediction_cache_ttl = Duration::from_secs(get_parsed_or_default(
            &lookup,
            "BASKET_PREDICTION_CACHE_TTL_SECS",
            DEFAULT_PREDICTION_CACHE_TTL_SECS,
        )?);
        let prediction_cache_capacity = get_parsed_or_default(
            &lookup,
            "BASKET_PREDICTION_CACHE_CAPACITY",
            DEFAULT_PREDICTION_CACHE_CAPACITY,
        )?;
        let currency = get_parsed_or_default(&lookup, "BASKET_CURRENCY", CurrencyCode::USD)?;
        let log_format = get_parsed_or_default(&lookup, "BASKET_LOG_FORMAT", LogFormat::Pretty)?;

        Ok(Self {
            api_base_url,
            http_timeout,
            prediction_cache_ttl,
            prediction_cache_capacity,
            currency,
            log_format,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable.
fn get_required(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse a variable, falling back to `default` when unset.
fn get_parsed_or_default<T>(
    lookup: impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
