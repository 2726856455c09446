//! API client facade
//!
//! Wires the pipeline stages together: build, cache lookup, execute,
//! decode, post-process, classify, cache store.

use std::sync::Arc;
use std::time::Instant;

use payx_common::{SharedClock, SystemClock};
use payx_domain::{ClientConfig, Envelope, Parameter, PayxError, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::auth::{AccessTokenProvider, Authenticator};
use super::classify::{classify, ResponseSummary};
use super::decode::{LenientSwitch, ResponseDecoder};
use super::envelope::post_process;
use super::request::{PreparedRequest, RequestBuilder};
use super::transport::{Exchange, TransportExecutor};
use crate::cache::{ResponseCache, TokenCache};
use crate::http::HttpClient;
use crate::logging::{log_api_call, ApiCallRecord};

/// Typed client for the payroll REST API.
///
/// Safe to share across tasks; every call is independent apart from the
/// token, the decoder mode and the response cache.
pub struct ApiClient {
    config: ClientConfig,
    requests: RequestBuilder,
    executor: TransportExecutor,
    auth: Arc<dyn AccessTokenProvider>,
    decoder: ResponseDecoder,
    response_cache: Option<Arc<dyn ResponseCache>>,
}

impl ApiClient {
    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Token provider used for every call.
    #[must_use]
    pub fn authenticator(&self) -> &Arc<dyn AccessTokenProvider> {
        &self.auth
    }

    /// Whether the decoder has switched to ignoring unknown members.
    #[must_use]
    pub fn decoder_is_lenient(&self) -> bool {
        self.decoder.is_lenient()
    }

    /// Unknown members seen by the payload that made the decoder lenient.
    #[must_use]
    pub fn decoder_lenient_switch(&self) -> Option<&LenientSwitch> {
        self.decoder.lenient_switch()
    }

    #[must_use]
    pub fn response_cache(&self) -> Option<&Arc<dyn ResponseCache>> {
        self.response_cache.as_ref()
    }

    /// Drop the held token, e.g. after the server answered 401.
    pub async fn invalidate_token(&self) {
        self.auth.invalidate().await;
    }

    /// Run one request through the full pipeline.
    ///
    /// `resource` is relative to the configured endpoint and may contain
    /// `{name}` placeholders filled from path parameters.
    ///
    /// # Errors
    ///
    /// Any [`PayxError`] variant except `Config` and `Cache`; cache
    /// failures are logged and the call continues without the cache.
    #[instrument(skip(self, params), fields(resource = %resource, method = %method))]
    pub async fn call<T>(&self, resource: &str, method: Method, params: &[Parameter]) -> Result<Envelope<T>>
    where
        T: DeserializeOwned + Serialize,
    {
        let started = Instant::now();
        let request = self.requests.build(resource, method, params)?;

        if let Some(envelope) = self.cached::<T>(&request).await {
            log_api_call(&ApiCallRecord {
                resource,
                method: request.method.as_str(),
                status: None,
                elapsed: started.elapsed(),
                correlation_id: envelope.correlation_id.as_deref(),
                transaction_id: envelope.transaction_id.as_deref(),
                cache_hit: true,
                error: None,
            });
            return Ok(envelope);
        }

        let mut status = None;
        let result = self.dispatch::<T>(&request, &mut status).await;

        if let Ok(envelope) = &result {
            self.store(&request, envelope).await;
        }

        let (correlation_id, transaction_id) = match &result {
            Ok(envelope) => (envelope.correlation_id.as_deref(), envelope.transaction_id.as_deref()),
            Err(err) => (Some(request.correlation_id.as_str()), err.transaction_ids().first().copied()),
        };
        log_api_call(&ApiCallRecord {
            resource,
            method: request.method.as_str(),
            status,
            elapsed: started.elapsed(),
            correlation_id,
            transaction_id,
            cache_hit: false,
            error: result.as_ref().err(),
        });

        result
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        request: &PreparedRequest,
        status: &mut Option<u16>,
    ) -> Result<Envelope<T>> {
        let raw = match self.executor.execute(request).await? {
            Exchange::Completed(raw) => raw,
            Exchange::Failed(error) => {
                let mut envelope = Envelope::from_error(error);
                post_process(&mut envelope, None, request);
                return classify(envelope, None, &request.url);
            }
        };
        *status = Some(raw.status.as_u16());

        let mut envelope: Envelope<T> = if raw.status.is_success() {
            self.decoder.decode(&raw.body)?
        } else {
            self.decoder.decode_error_body(&raw.body).unwrap_or_default()
        };
        post_process(&mut envelope, Some(&raw.headers), request);

        let summary = ResponseSummary { status: raw.status, url: &raw.url, body: &raw.body };
        classify(envelope, Some(summary), &request.url)
    }

    async fn cached<T: DeserializeOwned>(&self, request: &PreparedRequest) -> Option<Envelope<T>> {
        let cache = self.response_cache.as_ref()?;
        if !request.is_cacheable() || cache.ignore_reads() {
            return None;
        }

        match cache.get(&request.cache_key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(envelope) => {
                    debug!(cache_key = %request.cache_key, "response cache hit");
                    Some(envelope)
                }
                Err(err) => {
                    warn!(cache_key = %request.cache_key, error = %err, "cached response has unexpected shape");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(cache_key = %request.cache_key, error = %err, "response cache read failed");
                None
            }
        }
    }

    async fn store<T: Serialize>(&self, request: &PreparedRequest, envelope: &Envelope<T>) {
        let Some(cache) = self.response_cache.as_ref() else {
            return;
        };
        if !request.is_cacheable() {
            return;
        }

        let value = match serde_json::to_value(envelope) {
            Ok(value) => value,
            Err(err) => {
                warn!(cache_key = %request.cache_key, error = %err, "response not cacheable");
                return;
            }
        };
        if let Err(err) = cache.set(&request.cache_key, value).await {
            warn!(cache_key = %request.cache_key, error = %err, "response cache write failed");
        }
    }
}

/// Builder for [`ApiClient`].
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    token_cache: Option<Arc<dyn TokenCache>>,
    response_cache: Option<Arc<dyn ResponseCache>>,
    clock: Option<SharedClock>,
    token_provider: Option<Arc<dyn AccessTokenProvider>>,
    http: Option<HttpClient>,
}

impl ApiClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn token_cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
        self.token_cache = Some(cache);
        self
    }

    pub fn response_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.response_cache = Some(cache);
        self
    }

    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the built-in [`Authenticator`]; the token cache is then unused.
    pub fn token_provider(mut self, provider: Arc<dyn AccessTokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    pub fn http_client(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// # Errors
    ///
    /// Returns [`PayxError::Config`] when no configuration was supplied or
    /// it does not validate.
    pub fn build(self) -> Result<ApiClient> {
        let config = self
            .config
            .ok_or_else(|| PayxError::Config("ApiClient requires a ClientConfig".into()))?;
        config.validate()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let http = match self.http {
            Some(http) => http,
            None => HttpClient::new()?,
        };

        let auth: Arc<dyn AccessTokenProvider> = match self.token_provider {
            Some(provider) => provider,
            None => Arc::new(Authenticator::new(&config, http.clone(), self.token_cache, Arc::clone(&clock))?),
        };

        let requests = RequestBuilder::new(&config.url_endpoint, clock)?;
        let executor = TransportExecutor::new(http, Arc::clone(&auth), config.timeout);

        Ok(ApiClient {
            config,
            requests,
            executor,
            auth,
            decoder: ResponseDecoder::new(),
            response_cache: self.response_cache,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new("https://api.test", "key", "secret")
    }

    #[test]
    fn build_requires_config() {
        let err = ApiClient::builder().build().err().unwrap();
        assert!(matches!(err, PayxError::Config(_)));
    }

    #[test]
    fn build_rejects_invalid_config() {
        let err = ApiClient::builder().config(config().with_timeout(Duration::ZERO)).build().err().unwrap();
        assert!(matches!(err, PayxError::Config(_)));
    }

    #[test]
    fn fresh_client_is_strict_and_uncached() {
        let client = ApiClient::builder().config(config()).build().unwrap();
        assert!(!client.decoder_is_lenient());
        assert!(client.response_cache().is_none());
        assert_eq!(client.config().timeout, Duration::from_secs(30));
    }
}
