//! Error classification
//!
//! Decides whether a post-processed envelope is returned to the caller or
//! turned into a typed failure.

use payx_domain::{ApiFailure, Envelope, PayxError, Result, ServerFault};
use reqwest::StatusCode;
use url::Url;

/// What is known about the HTTP response, if one arrived.
#[derive(Debug, Clone, Copy)]
pub struct ResponseSummary<'a> {
    pub status: StatusCode,
    pub url: &'a Url,
    pub body: &'a str,
}

/// Classify a completed call.
///
/// Order: success, structured errors, alternate 5xx shape, bare status.
/// `response` is `None` when the transport failed; the envelope then
/// carries the transport error and `request_url` is reported.
///
/// # Errors
///
/// [`PayxError::Api`], [`PayxError::ServerFault`] or [`PayxError::Status`].
pub fn classify<T>(
    envelope: Envelope<T>,
    response: Option<ResponseSummary<'_>>,
    request_url: &Url,
) -> Result<Envelope<T>> {
    let transport_ok = response.is_some_and(|r| r.status.is_success());
    if transport_ok && envelope.is_success() {
        return Ok(envelope);
    }

    let url = response.map_or(request_url, |r| r.url);

    if !envelope.errors.is_empty() {
        return Err(ApiFailure::new(url.as_str(), envelope.errors).into());
    }

    let Some(response) = response else {
        return Err(PayxError::Status {
            status: 0,
            description: "no response received".into(),
            url: url.to_string(),
        });
    };

    if let Ok(fault) = serde_json::from_str::<ServerFault>(response.body) {
        return Err(fault.into());
    }

    Err(PayxError::Status {
        status: response.status.as_u16(),
        description: response.status.canonical_reason().unwrap_or("Unknown").to_string(),
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use payx_domain::ApiError;

    use super::*;

    fn url() -> Url {
        Url::parse("https://api.test/companies/1").unwrap()
    }

    fn summary<'a>(status: u16, url: &'a Url, body: &'a str) -> Option<ResponseSummary<'a>> {
        Some(ResponseSummary { status: StatusCode::from_u16(status).unwrap(), url, body })
    }

    #[test]
    fn success_passes_through() {
        let url = url();
        let envelope: Envelope<u8> = Envelope { content: vec![1], ..Envelope::default() };
        assert_eq!(classify(envelope, summary(200, &url, ""), &url).unwrap().content, vec![1]);
    }

    #[test]
    fn structured_errors_become_aggregate_with_response_url() {
        let url = url();
        let response_url = Url::parse("https://api.test/companies/1?redirected=1").unwrap();
        let envelope: Envelope<u8> = Envelope {
            errors: vec![ApiError::default(), ApiError::default(), ApiError::default()],
            ..Envelope::default()
        };

        match classify(envelope, summary(400, &response_url, ""), &url).unwrap_err() {
            PayxError::Api(failure) => {
                assert_eq!(failure.count(), 3);
                assert_eq!(failure.url, response_url.as_str());
            }
            other => panic!("expected api failure, got {other:?}"),
        }
    }

    #[test]
    fn errors_in_2xx_still_fail() {
        let url = url();
        let envelope: Envelope<u8> = Envelope::from_error(ApiError::default());
        assert!(matches!(classify(envelope, summary(200, &url, ""), &url), Err(PayxError::Api(_))));
    }

    #[test]
    fn transport_failure_reports_request_url() {
        let url = url();
        let envelope: Envelope<u8> = Envelope::from_error(ApiError::transport("ConnectError", "refused"));
        match classify(envelope, None, &url).unwrap_err() {
            PayxError::Api(failure) => assert_eq!(failure.url, url.as_str()),
            other => panic!("expected api failure, got {other:?}"),
        }
    }

    #[test]
    fn alternate_shape_becomes_server_fault() {
        let url = url();
        let body = r#"{"Timestamp":"2024-01-01T00:00:00Z","Path":"/companies/1","Status":500,"Error":"boom"}"#;
        match classify(Envelope::<u8>::default(), summary(500, &url, body), &url).unwrap_err() {
            PayxError::ServerFault(fault) => {
                assert_eq!(fault.status, 500);
                assert_eq!(fault.error.as_deref(), Some("boom"));
            }
            other => panic!("expected server fault, got {other:?}"),
        }
    }

    #[test]
    fn anything_else_is_generic_status() {
        let url = url();
        let err = classify(Envelope::<u8>::default(), summary(503, &url, "<html>down</html>"), &url).unwrap_err();
        assert_eq!(
            err,
            PayxError::Status {
                status: 503,
                description: "Service Unavailable".into(),
                url: url.to_string()
            }
        );
        assert!(err.is_retryable());
    }
}
