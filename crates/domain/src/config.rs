//! Client configuration

use std::fmt;
use std::time::Duration;

use payx_common::duration_secs;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TIMEOUT_SECS;
use crate::errors::{PayxError, Result};

/// Settings the request pipeline depends on.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL all resources are resolved against.
    pub url_endpoint: String,
    /// OAuth client id.
    pub api_key: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Bound on each network call, including authentication.
    #[serde(rename = "timeout_secs", with = "duration_secs", default = "default_timeout")]
    pub timeout: Duration,
}

const fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}

impl ClientConfig {
    pub fn new(
        url_endpoint: impl Into<String>,
        api_key: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            url_endpoint: url_endpoint.into(),
            api_key: api_key.into(),
            client_secret: client_secret.into(),
            timeout: default_timeout(),
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject configurations the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`PayxError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("url_endpoint", &self.url_endpoint),
            ("api_key", &self.api_key),
            ("client_secret", &self.client_secret),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(PayxError::Config(format!("{field} must not be empty")));
        }
        if self.timeout.is_zero() {
            return Err(PayxError::Config("timeout must be greater than zero".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url_endpoint", &self.url_endpoint)
            .field("api_key", &self.api_key)
            .field("client_secret", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}
