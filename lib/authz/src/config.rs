//! PDP client configuration.
//!
//! Holds the API key and the base URL of the policy decision point. The
//! configuration can be deserialized from the environment (see the server's
//! `ServerConfig`) or assembled in code through [`PdpConfigBuilder`].

use crate::error::AuthzError;
use reqwest::Url;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::time::Duration;

/// PDP URL used when none is configured.
pub const DEFAULT_PDP_URL: &str = "http://localhost:7766";

/// Configuration for the policy decision point client.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Clone, Deserialize)]
pub struct PdpConfig {
    /// API key sent as a bearer token on every check.
    api_key: String,
    /// Base URL of the PDP.
    /// Default: "http://localhost:7766"
    #[serde(default = "default_url")]
    url: String,
    /// Per-request timeout, read from whole seconds. Unset means the HTTP
    /// client default.
    #[serde(default, rename = "timeout_seconds", deserialize_with = "seconds")]
    timeout: Option<Duration>,
}

fn default_url() -> String {
    DEFAULT_PDP_URL.to_string()
}

fn seconds<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
}

// Hand-written so the API key never reaches a log line.
impl fmt::Debug for PdpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdpConfig")
            .field("api_key", &"<redacted>")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PdpConfig {
    /// Creates a new configuration pointing at the default PDP URL.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            url: default_url(),
            timeout: None,
        }
    }

    /// Creates a configuration builder for more customization.
    #[must_use]
    pub fn builder(api_key: impl Into<String>) -> PdpConfigBuilder {
        PdpConfigBuilder::new(api_key)
    }

    /// Returns the API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the configured PDP URL as written.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the request timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Checks the configuration and returns the parsed PDP base URL.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::InvalidConfig` if the API key is blank, the
    /// timeout is zero, or the URL is not an absolute `http`/`https` URL.
    pub fn validate(&self) -> Result<Url, AuthzError> {
        if self.api_key.trim().is_empty() {
            return Err(AuthzError::InvalidConfig {
                details: "API key must not be empty".to_string(),
            });
        }

        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(AuthzError::InvalidConfig {
                details: "timeout must be greater than zero".to_string(),
            });
        }

        let url = Url::parse(self.url.trim()).map_err(|e| AuthzError::InvalidConfig {
            details: format!("PDP URL '{}' is invalid: {e}", self.url),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(AuthzError::InvalidConfig {
                details: format!("PDP URL '{}' must use http or https", self.url),
            });
        }
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(AuthzError::InvalidConfig {
                details: format!("PDP URL '{}' has no host", self.url),
            });
        }

        Ok(url)
    }
}

/// Builder for `PdpConfig`.
#[derive(Debug)]
pub struct PdpConfigBuilder {
    config: PdpConfig,
}

impl PdpConfigBuilder {
    /// Creates a new builder with the required API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            config: PdpConfig::new(api_key),
        }
    }

    /// Sets the PDP base URL.
    #[must_use]
    pub fn with_pdp_url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Builds the `PdpConfig`.
    #[must_use]
    pub fn build(self) -> PdpConfig {
        self.config
    }
}
