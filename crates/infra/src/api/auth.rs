//! OAuth2 client-credentials authentication
//!
//! [`Authenticator`] owns the current token. Lookups go memory, then token
//! cache, then the auth endpoint. Refreshes are serialized by a gate so at
//! most one token request is in flight per authenticator; a caller that
//! waits longer than [`AUTH_LOCK_WAIT`] proceeds with whatever token exists
//! instead of blocking further.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use payx_common::SharedClock;
use payx_domain::constants::{AUTH_LOCK_WAIT, AUTH_RESOURCE, GRANT_TYPE_CLIENT_CREDENTIALS};
use payx_domain::{AuthToken, AuthenticationError, ClientConfig, PayxError, Result};
use reqwest::Method;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::cache::TokenCache;
use crate::errors::auth_transport_error;
use crate::http::HttpClient;

/// Supplies the `Authorization` header for outgoing requests.
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Header value for the next request.
    ///
    /// `None` means the request goes out unauthenticated, which happens
    /// when a refresh by another caller outlasts the wait bound and no
    /// token is held yet.
    async fn authorization(&self) -> Result<Option<String>>;

    /// Drop the current token so the next call re-authenticates.
    async fn invalidate(&self) {}
}

/// Token lifecycle manager for one set of client credentials.
pub struct Authenticator {
    http: HttpClient,
    token_url: Url,
    client_id: String,
    client_secret: String,
    timeout: Duration,
    lock_wait: Duration,
    current: RwLock<Option<AuthToken>>,
    refresh_gate: Mutex<()>,
    cache: Option<Arc<dyn TokenCache>>,
    clock: SharedClock,
}

impl Authenticator {
    /// # Errors
    ///
    /// Returns [`PayxError::Config`] if the auth URL cannot be derived from
    /// `config.url_endpoint`.
    pub fn new(
        config: &ClientConfig,
        http: HttpClient,
        cache: Option<Arc<dyn TokenCache>>,
        clock: SharedClock,
    ) -> Result<Self> {
        let base = crate::config::normalize_base_url(&config.url_endpoint)?;
        let token_url = Url::parse(&base)
            .and_then(|base| base.join(AUTH_RESOURCE))
            .map_err(|e| PayxError::Config(format!("Invalid auth URL: {e}")))?;

        Ok(Self {
            http,
            token_url,
            client_id: config.api_key.clone(),
            client_secret: config.client_secret.clone(),
            timeout: config.timeout,
            lock_wait: AUTH_LOCK_WAIT,
            current: RwLock::new(None),
            refresh_gate: Mutex::new(()),
            cache,
            clock,
        })
    }

    /// Override the refresh gate wait bound.
    #[must_use]
    pub const fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    /// Copy of the token currently held in memory, valid or not.
    pub async fn current_token(&self) -> Option<AuthToken> {
        self.current.read().await.clone()
    }

    /// Make sure a valid token is held, authenticating if needed.
    ///
    /// # Errors
    ///
    /// Returns [`PayxError::Authentication`] if the auth endpoint rejects
    /// the credentials or cannot be reached.
    #[instrument(skip(self), fields(token_url = %self.token_url))]
    pub async fn ensure_authenticated(&self) -> Result<()> {
        if self.valid_token().await.is_some() {
            return Ok(());
        }

        if let Some(token) = self.load_cached().await {
            debug!("using token from token cache");
            *self.current.write().await = Some(token);
            return Ok(());
        }

        let _guard = match tokio::time::timeout(self.lock_wait, self.refresh_gate.lock()).await {
            Ok(guard) => guard,
            Err(_) => {
                warn!(
                    wait_secs = self.lock_wait.as_secs(),
                    "timed out waiting for token refresh, continuing with current token"
                );
                return Ok(());
            }
        };

        // Another caller may have refreshed while we waited
        if self.valid_token().await.is_some() {
            return Ok(());
        }

        let token = self.request_token().await?;
        *self.current.write().await = Some(token.clone());
        self.save_cached(&token).await;
        info!(expires_in = token.expires_in, "authenticated");
        Ok(())
    }

    /// Drop the in-memory token and the cached copy.
    pub async fn invalidate_token(&self) {
        *self.current.write().await = None;
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.invalidate().await {
                warn!(error = %err, "failed to invalidate cached token");
            }
        }
    }

    async fn valid_token(&self) -> Option<AuthToken> {
        let now = self.clock.now();
        self.current.read().await.as_ref().filter(|t| t.is_valid_at(now)).cloned()
    }

    async fn load_cached(&self) -> Option<AuthToken> {
        let cache = self.cache.as_ref()?;
        match cache.load().await {
            Ok(token) => token.filter(|t| t.is_valid_at(self.clock.now())),
            Err(err) => {
                warn!(error = %err, "failed to load cached token");
                None
            }
        }
    }

    async fn save_cached(&self, token: &AuthToken) {
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.save(token).await {
                warn!(error = %err, "failed to persist token");
            }
        }
    }

    async fn request_token(&self) -> Result<AuthToken> {
        let form = [
            ("grant_type", GRANT_TYPE_CLIENT_CREDENTIALS),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let request = self.http.request(Method::POST, self.token_url.clone()).form(&form);

        let exchange = async {
            let response = self.http.send(request).await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => return Err(auth_transport_error(&err).into()),
            Err(_) => {
                return Err(AuthenticationError::transport("TimeoutError", "auth request timed out").into())
            }
        };

        if !status.is_success() {
            let mut error: AuthenticationError = serde_json::from_str(&body).unwrap_or_default();
            error.status = Some(status.as_u16());
            if error.error.is_none() && error.error_description.is_none() {
                error.error_description = status.canonical_reason().map(str::to_string);
            }
            warn!(status = status.as_u16(), error = ?error.error, "authentication rejected");
            return Err(error.into());
        }

        let token: AuthToken = serde_json::from_str(&body).map_err(|e| {
            AuthenticationError {
                error: Some("invalid_token_response".into()),
                error_description: Some(e.to_string()),
                status: Some(status.as_u16()),
            }
        })?;

        Ok(token.issued(self.clock.now()))
    }
}

#[async_trait]
impl AccessTokenProvider for Authenticator {
    async fn authorization(&self) -> Result<Option<String>> {
        self.ensure_authenticated().await?;
        Ok(self.current.read().await.as_ref().map(AuthToken::authorization_header))
    }

    async fn invalidate(&self) {
        self.invalidate_token().await;
    }
}
