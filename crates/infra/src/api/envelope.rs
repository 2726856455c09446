//! Envelope post-processing
//!
//! Copies correlation data from response headers into the decoded
//! envelope. Never fails: missing headers leave fields as they are.

use payx_domain::constants::{CLIENT_CORRELATION_ID_HEADER, ETAG_HEADER, TRANSACTION_ID_HEADER};
use payx_domain::Envelope;
use reqwest::header::HeaderMap;

use super::request::PreparedRequest;

/// Fill correlation fields, stamp the transaction id on every error and
/// refresh the pagination ETag.
///
/// `headers` is `None` when the transport failed before a response; the
/// client correlation id then falls back to the one that was sent.
pub fn post_process<T>(envelope: &mut Envelope<T>, headers: Option<&HeaderMap>, request: &PreparedRequest) {
    let header = |name: &str| {
        headers
            .and_then(|h| h.get(name))
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    envelope.correlation_id =
        header(CLIENT_CORRELATION_ID_HEADER).or_else(|| Some(request.correlation_id.clone()));

    let transaction_id = header(TRANSACTION_ID_HEADER);
    if let Some(txid) = &transaction_id {
        for error in &mut envelope.errors {
            error.transaction_id = Some(txid.clone());
        }
    }
    envelope.transaction_id = transaction_id;

    if let Some(pagination) = envelope.metadata.pagination.as_mut() {
        pagination.etag = header(ETAG_HEADER);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use payx_common::SystemClock;
    use payx_domain::{ApiError, Metadata, Pagination};
    use reqwest::header::HeaderValue;
    use reqwest::Method;

    use super::*;
    use crate::api::request::RequestBuilder;

    fn request() -> PreparedRequest {
        RequestBuilder::new("https://api.test", Arc::new(SystemClock))
            .unwrap()
            .build("companies", Method::GET, &[])
            .unwrap()
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn copies_headers_and_stamps_errors() {
        let request = request();
        let mut envelope: Envelope<()> = Envelope {
            errors: vec![ApiError::default(), ApiError::default()],
            ..Envelope::default()
        };
        let response_headers = headers(&[("x-payx-txid", "tx-1"), ("x-payx-client-correlationid", "echoed")]);

        post_process(&mut envelope, Some(&response_headers), &request);

        assert_eq!(envelope.transaction_id.as_deref(), Some("tx-1"));
        assert_eq!(envelope.correlation_id.as_deref(), Some("echoed"));
        assert!(envelope.errors.iter().all(|e| e.transaction_id.as_deref() == Some("tx-1")));
    }

    #[test]
    fn etag_comes_from_response_header_only() {
        let request = request();
        let mut envelope: Envelope<()> = Envelope {
            metadata: Metadata {
                content_item_count: 0,
                pagination: Some(Pagination { etag: Some("request-tag".into()), ..Pagination::first(5) }),
            },
            ..Envelope::default()
        };

        post_process(&mut envelope, Some(&headers(&[("etag", "response-tag")])), &request);
        assert_eq!(envelope.pagination().unwrap().etag.as_deref(), Some("response-tag"));
    }

    #[test]
    fn without_response_keeps_sent_correlation_id() {
        let request = request();
        let mut envelope: Envelope<()> = Envelope::from_error(ApiError::transport("ConnectError", "refused"));

        post_process(&mut envelope, None, &request);

        assert_eq!(envelope.correlation_id.as_deref(), Some(request.correlation_id.as_str()));
        assert_eq!(envelope.transaction_id, None);
        assert_eq!(envelope.errors[0].transaction_id, None);
    }
}
