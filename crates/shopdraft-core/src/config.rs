//! Sync configuration for the remote draft resource.

use std::time::Duration;

use thiserror::Error;

use crate::scheduler::DEFAULT_QUIET_PERIOD;
use crate::util::{is_http_url, normalize_text_option};

/// Invalid sync configuration.
#[derive(Debug, Error)]
#[error("Invalid sync configuration: {0}")]
pub struct ConfigError(pub(crate) String);

/// Configuration for remote draft persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    api_base_url: String,
    auth_token: Option<String>,
    quiet_period: Duration,
}

impl SyncConfig {
    /// Create a configuration for the given API base URL.
    ///
    /// The URL must include `http://` or `https://`; a trailing slash is
    /// trimmed so endpoint paths can be appended uniformly.
    pub fn new(api_base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let api_base_url = normalize_text_option(Some(api_base_url.into()))
            .ok_or_else(|| ConfigError("API base URL must not be empty".to_string()))?;
        if !is_http_url(&api_base_url) {
            return Err(ConfigError(
                "API base URL must include http:// or https://".to_string(),
            ));
        }

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            auth_token: None,
            quiet_period: DEFAULT_QUIET_PERIOD,
        })
    }

    /// Attach a bearer token for authenticated draft operations.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = normalize_text_option(Some(token.into()));
        self
    }

    /// Override the autosave quiet period (default: 2 seconds).
    #[must_use]
    pub const fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    /// API base URL without a trailing slash.
    #[must_use]
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Bearer token, if configured.
    #[must_use]
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Quiet period between the last edit and the remote write.
    #[must_use]
    pub const fn quiet_period(&self) -> Duration {
        self.quiet_period
    }
}
