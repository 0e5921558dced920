//! Runtime configuration read from environment variables.

use insight_chat_auth::{AuthError, validate_base_url};
use url::Url;

/// Env var selecting the analysis API base URL.
pub const API_BASE_URL_ENV: &str = "INSIGHT_CHAT_API_BASE_URL";
/// Env var holding the `tracing` filter directive.
pub const LOG_FILTER_ENV: &str = "INSIGHT_CHAT_LOG";
/// Base URL used when [`API_BASE_URL_ENV`] is unset.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001/api";
/// Filter used when [`LOG_FILTER_ENV`] is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Validated runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Analysis API base URL.
    pub api_base_url: Url,
    /// `tracing-subscriber` env-filter directive.
    pub log_filter: String,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidEndpoint`] when the base URL violates the
    /// transport policy.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary lookup. Blank values count
    /// as unset.
    ///
    /// # Errors
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AuthError> {
        let read = |key: &str, default: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            api_base_url: validate_base_url(&read(API_BASE_URL_ENV, DEFAULT_API_BASE_URL))?,
            log_filter: read(LOG_FILTER_ENV, DEFAULT_LOG_FILTER),
        })
    }
}
