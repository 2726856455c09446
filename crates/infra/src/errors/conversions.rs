//! Conversions from external infrastructure errors into domain errors.

use std::fmt::Display;

use payx_domain::{ApiError, AuthenticationError, PayxError};
use reqwest::Error as HttpError;

/* -------------------------------------------------------------------------- */
/* reqwest::Error → envelope / auth errors */
/* -------------------------------------------------------------------------- */

/// Short label naming what went wrong below the HTTP layer.
#[must_use]
pub fn transport_error_kind(err: &HttpError) -> &'static str {
    if err.is_timeout() {
        return "TimeoutError";
    }

    #[cfg(not(target_arch = "wasm32"))]
    if err.is_connect() {
        return "ConnectError";
    }

    if err.is_builder() {
        "BuilderError"
    } else if err.is_redirect() {
        "RedirectError"
    } else if err.is_body() {
        "BodyError"
    } else if err.is_decode() {
        "DecodeError"
    } else if err.is_status() {
        "StatusError"
    } else {
        "RequestError"
    }
}

/// Envelope error describing a failed exchange.
#[must_use]
pub fn transport_api_error(err: &HttpError) -> ApiError {
    ApiError::transport(transport_error_kind(err), err.to_string())
}

/// Auth failure for an exchange that never produced a response.
#[must_use]
pub fn auth_transport_error(err: &HttpError) -> AuthenticationError {
    AuthenticationError::transport(transport_error_kind(err), err.to_string())
}

/* -------------------------------------------------------------------------- */
/* cache backends → PayxError */
/* -------------------------------------------------------------------------- */

pub fn cache_error(context: &str, err: impl Display) -> PayxError {
    PayxError::Cache(format!("{context}: {err}"))
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
