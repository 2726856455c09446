//! Tracing setup and structured call logging

use std::time::Duration;

use payx_domain::PayxError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Output format for [`init_tracing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install a global fmt subscriber.
///
/// `RUST_LOG` overrides the default `info` filter. Returns `false` when a
/// subscriber was already installed, so repeated calls are harmless.
pub fn init_tracing(format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .json()
            .try_init(),
    };
    installed.is_ok()
}

/// Fields describing one pipeline call.
///
/// Callers must not put credentials in `resource`.
#[derive(Debug, Clone)]
pub struct ApiCallRecord<'a> {
    pub resource: &'a str,
    pub method: &'a str,
    /// HTTP status, when a response arrived.
    pub status: Option<u16>,
    pub elapsed: Duration,
    pub correlation_id: Option<&'a str>,
    pub transaction_id: Option<&'a str>,
    pub cache_hit: bool,
    pub error: Option<&'a PayxError>,
}

/// Emit `api_call_completed` or `api_call_failed` for one call.
#[inline]
pub fn log_api_call(record: &ApiCallRecord<'_>) {
    let elapsed_ms = u64::try_from(record.elapsed.as_millis()).unwrap_or(u64::MAX);
    let correlation_id = record.correlation_id.unwrap_or_default();
    let transaction_id = record.transaction_id.unwrap_or_default();

    match record.error {
        None => info!(
            resource = record.resource,
            method = record.method,
            status = record.status,
            elapsed_ms,
            correlation_id,
            transaction_id,
            cache_hit = record.cache_hit,
            "api_call_completed"
        ),
        Some(error) => warn!(
            resource = record.resource,
            method = record.method,
            status = record.status,
            elapsed_ms,
            correlation_id,
            transaction_id,
            error_category = error.category().as_str(),
            retryable = error.is_retryable(),
            error = %error,
            "api_call_failed"
        ),
    }
}
