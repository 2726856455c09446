//! Transport executor
//!
//! Sends one prepared request and reads the whole body under a single wait
//! bound. Authentication happens before the bound starts.

use std::sync::Arc;
use std::time::Duration;

use payx_domain::{ApiError, PayxError, Result};
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

use super::auth::AccessTokenProvider;
use super::request::PreparedRequest;
use crate::errors::transport_api_error;
use crate::http::HttpClient;

/// A response that arrived in full.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    /// Final URL after redirects.
    pub url: Url,
    pub headers: HeaderMap,
    pub body: String,
}

/// Outcome of one exchange that did not time out.
#[derive(Debug, Clone)]
pub enum Exchange {
    Completed(RawResponse),
    /// The request never produced a readable response.
    Failed(ApiError),
}

pub struct TransportExecutor {
    http: HttpClient,
    auth: Arc<dyn AccessTokenProvider>,
    timeout: Duration,
}

impl TransportExecutor {
    pub fn new(http: HttpClient, auth: Arc<dyn AccessTokenProvider>, timeout: Duration) -> Self {
        Self { http, auth, timeout }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute `request` once.
    ///
    /// # Errors
    ///
    /// - [`PayxError::Authentication`] if no token could be obtained
    /// - [`PayxError::Timeout`] if the response was not fully read in time
    ///
    /// Every other transport failure is returned as [`Exchange::Failed`].
    pub async fn execute(&self, request: &PreparedRequest) -> Result<Exchange> {
        let authorization = self.auth.authorization().await?;

        let mut builder =
            self.http.request(request.method.clone(), request.url.clone()).headers(request.headers.clone());
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let exchange = async {
            let response = self.http.send(builder).await?;
            let status = response.status();
            let url = response.url().clone();
            let headers = response.headers().clone();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(RawResponse { status, url, headers, body })
        };

        // Elapsing drops `exchange`, which cancels the request and any body read.
        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(raw)) => {
                debug!(url = %raw.url, status = raw.status.as_u16(), bytes = raw.body.len(), "exchange completed");
                Ok(Exchange::Completed(raw))
            }
            Ok(Err(err)) if err.is_timeout() => Err(self.timed_out(request)),
            Ok(Err(err)) => {
                warn!(url = %request.url, correlation_id = %request.correlation_id, error = %err, "transport failure");
                Ok(Exchange::Failed(transport_api_error(&err)))
            }
            Err(_) => Err(self.timed_out(request)),
        }
    }

    fn timed_out(&self, request: &PreparedRequest) -> PayxError {
        warn!(
            url = %request.url,
            correlation_id = %request.correlation_id,
            timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            "request timed out"
        );
        PayxError::Timeout
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use async_trait::async_trait;
    use payx_common::SystemClock;
    use payx_domain::{AuthenticationError, Parameter};
    use reqwest::Method;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::request::RequestBuilder;

    struct StaticToken(Option<&'static str>);

    #[async_trait]
    impl AccessTokenProvider for StaticToken {
        async fn authorization(&self) -> Result<Option<String>> {
            Ok(self.0.map(str::to_string))
        }
    }

    struct Rejecting;

    #[async_trait]
    impl AccessTokenProvider for Rejecting {
        async fn authorization(&self) -> Result<Option<String>> {
            Err(AuthenticationError { status: Some(401), ..AuthenticationError::default() }.into())
        }
    }

    fn executor(auth: impl AccessTokenProvider + 'static, timeout: Duration) -> TransportExecutor {
        TransportExecutor::new(HttpClient::new().unwrap(), Arc::new(auth), timeout)
    }

    fn prepare(base: &str, method: Method, params: &[Parameter]) -> PreparedRequest {
        RequestBuilder::new(base, Arc::new(SystemClock)).unwrap().build("companies", method, params).unwrap()
    }

    #[tokio::test]
    async fn sends_authorization_and_reads_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/companies"))
            .and(header("authorization", "Bearer abc"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"content":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let exchange = executor(StaticToken(Some("Bearer abc")), Duration::from_secs(5))
            .execute(&prepare(&server.uri(), Method::GET, &[]))
            .await
            .unwrap();

        match exchange {
            Exchange::Completed(raw) => {
                assert_eq!(raw.status, StatusCode::OK);
                assert_eq!(raw.body, r#"{"content":[]}"#);
            }
            Exchange::Failed(err) => panic!("unexpected transport failure: {err}"),
        }
    }

    #[tokio::test]
    async fn writes_send_form_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string("limit=5"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let request = prepare(&server.uri(), Method::POST, &[Parameter::query("limit", "5")]);
        let exchange = executor(StaticToken(None), Duration::from_secs(5)).execute(&request).await.unwrap();
        assert!(matches!(exchange, Exchange::Completed(raw) if raw.status == StatusCode::CREATED));
    }

    #[tokio::test]
    async fn slow_response_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let err = executor(StaticToken(None), Duration::from_millis(20))
            .execute(&prepare(&server.uri(), Method::GET, &[]))
            .await
            .unwrap_err();

        assert_eq!(err, PayxError::Timeout);
        assert_eq!(err.to_string(), "Timeout");
    }

    #[tokio::test]
    async fn connection_failure_becomes_failed_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let exchange = executor(StaticToken(None), Duration::from_secs(5))
            .execute(&prepare(&format!("http://{addr}"), Method::GET, &[]))
            .await
            .unwrap();

        match exchange {
            Exchange::Failed(err) => assert_eq!(err.error.as_deref(), Some("ConnectError")),
            Exchange::Completed(raw) => panic!("unexpected response {}", raw.status),
        }
    }

    #[tokio::test]
    async fn auth_failure_stops_before_sending() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let err = executor(Rejecting, Duration::from_secs(5))
            .execute(&prepare(&server.uri(), Method::GET, &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, PayxError::Authentication(_)));
    }
}
