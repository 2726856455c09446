//! Error types returned by every stage of the request pipeline

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::envelope::ApiError;

/// Main error type for the payx client.
///
/// Callers can branch exhaustively on the variant to decide their own
/// retry policy; the pipeline never retries on its own apart from the one
/// lenient decode pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayxError {
    /// The auth endpoint rejected the credentials or could not be reached.
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    /// The transport wait bound elapsed.
    #[error("Timeout")]
    Timeout,

    /// The server answered with one or more structured errors.
    #[error(transparent)]
    Api(#[from] ApiFailure),

    /// A 5xx outside the normal envelope.
    #[error(transparent)]
    ServerFault(#[from] ServerFault),

    /// Non-success status with nothing more specific to report.
    #[error("Server returned {status} {description} for {url}")]
    Status { status: u16, description: String, url: String },

    /// The body could not be decoded even after the lenient retry.
    #[error("Decode error: {message}")]
    Decode { message: String, raw: String },

    /// The request could not be built (unresolved placeholder, bad URL).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

/// Coarse grouping used for logging and caller-side policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Auth,
    Timeout,
    Api,
    Server,
    Decode,
    Client,
    Config,
    Cache,
}

impl ErrorCategory {
    /// Stable label for structured log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Timeout => "timeout",
            Self::Api => "api",
            Self::Server => "server",
            Self::Decode => "decode",
            Self::Client => "client",
            Self::Config => "config",
            Self::Cache => "cache",
        }
    }
}

impl PayxError {
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Auth,
            Self::Timeout => ErrorCategory::Timeout,
            Self::Api(_) => ErrorCategory::Api,
            Self::ServerFault(_) | Self::Status { .. } => ErrorCategory::Server,
            Self::Decode { .. } => ErrorCategory::Decode,
            Self::InvalidRequest(_) => ErrorCategory::Client,
            Self::Config(_) => ErrorCategory::Config,
            Self::Cache(_) => ErrorCategory::Cache,
        }
    }

    /// Whether a caller-driven retry (with backoff) could plausibly succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::ServerFault(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Server transaction ids carried by this error, for support escalation.
    #[must_use]
    pub fn transaction_ids(&self) -> Vec<&str> {
        match self {
            Self::Api(failure) => {
                failure.errors.iter().filter_map(|e| e.transaction_id.as_deref()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Error body returned by the auth endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationError {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    /// HTTP status of the auth response, when one was received.
    #[serde(skip)]
    pub status: Option<u16>,
}

impl AuthenticationError {
    /// Failure that happened before any auth response was received.
    pub fn transport(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self { error: Some(error.into()), error_description: Some(description.into()), status: None }
    }
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Authentication failed")?;
        if let Some(status) = self.status {
            write!(f, " ({status})")?;
        }
        if let Some(error) = self.error.as_deref().filter(|s| !s.is_empty()) {
            write!(f, ": {error}")?;
        }
        if let Some(description) = self.error_description.as_deref().filter(|s| !s.is_empty()) {
            write!(f, "\t{description}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AuthenticationError {}

/// Aggregate of the structured errors returned by one call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiFailure {
    /// Resolved URL of the failing response.
    pub url: String,
    pub errors: Vec<ApiError>,
}

impl ApiFailure {
    pub fn new(url: impl Into<String>, errors: Vec<ApiError>) -> Self {
        Self { url: url.into(), errors }
    }

    /// Number of server-supplied errors.
    #[must_use]
    pub fn count(&self) -> usize {
        self.errors.len()
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} API error(s) returned by {}", self.count(), self.url)?;
        for error in &self.errors {
            write!(f, "\n{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiFailure {}

/// Alternate body shape some 5xx responses use instead of the envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerFault {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    pub status: u16,
    #[serde(default)]
    pub error: Option<String>,
}

impl fmt::Display for ServerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Server fault {}", self.status)?;
        if let Some(error) = &self.error {
            write!(f, ": {error}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " at {path}")?;
        }
        if let Some(timestamp) = &self.timestamp {
            write!(f, " ({timestamp})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ServerFault {}

/// Result type alias for payx operations
pub type Result<T> = std::result::Result<T, PayxError>;
