//! Token persistence
//!
//! Lets a token outlive the process (file) or be shared between
//! authenticators in one process (memory). A missing cache is valid: the
//! authenticator then requests a token on every process start.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use payx_domain::{AuthToken, Result};
use tracing::warn;

use crate::errors::cache_error;

#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Last saved token, if any. Validity is checked by the caller.
    async fn load(&self) -> Result<Option<AuthToken>>;

    async fn save(&self, token: &AuthToken) -> Result<()>;

    async fn invalidate(&self) -> Result<()>;
}

/// Token stored as JSON in a single file.
#[derive(Debug, Clone)]
pub struct FileTokenCache {
    path: PathBuf,
}

impl FileTokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenCache for FileTokenCache {
    async fn load(&self) -> Result<Option<AuthToken>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(cache_error("reading token file", err)),
        };

        match serde_json::from_str(&contents) {
            Ok(token) => Ok(Some(token)),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable token file");
                Ok(None)
            }
        }
    }

    async fn save(&self, token: &AuthToken) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| cache_error("creating token directory", err))?;
        }
        let contents =
            serde_json::to_vec(token).map_err(|err| cache_error("serializing token", err))?;
        tokio::fs::write(&self.path, contents).await.map_err(|err| cache_error("writing token file", err))
    }

    async fn invalidate(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(cache_error("removing token file", err)),
        }
    }
}

const TOKEN_KEY: &str = "paychex:token";

/// Upper bound on how long a token stays in the memory cache.
const MAX_TOKEN_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Expire each token `expires_in` seconds after it was cached, capped at
/// [`MAX_TOKEN_RETENTION`].
struct TokenExpiry;

impl Expiry<&'static str, AuthToken> for TokenExpiry {
    fn expire_after_create(
        &self,
        _key: &&'static str,
        value: &AuthToken,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(Duration::from_secs(value.expires_in).min(MAX_TOKEN_RETENTION))
    }
}

/// In-process token cache backed by moka.
#[derive(Clone)]
pub struct MemoryTokenCache {
    entries: Cache<&'static str, AuthToken>,
}

impl MemoryTokenCache {
    pub fn new() -> Self {
        let entries = Cache::builder().max_capacity(1).expire_after(TokenExpiry).build();
        Self { entries }
    }
}

impl Default for MemoryTokenCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenCache for MemoryTokenCache {
    async fn load(&self) -> Result<Option<AuthToken>> {
        Ok(self.entries.get(&TOKEN_KEY).await)
    }

    async fn save(&self, token: &AuthToken) -> Result<()> {
        self.entries.insert(TOKEN_KEY, token.clone()).await;
        Ok(())
    }

    async fn invalidate(&self) -> Result<()> {
        self.entries.invalidate(&TOKEN_KEY).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;

    fn token(expires_in: u64) -> AuthToken {
        AuthToken {
            access_token: "cached".into(),
            token_type: "Bearer".into(),
            expires_in,
            scope: None,
            issued_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_file_cache_save_load_invalidate() {
        let dir = TempDir::new().unwrap();
        let cache = FileTokenCache::new(dir.path().join("auth").join("token.json"));

        assert_eq!(cache.load().await.unwrap(), None);

        let saved = token(3600);
        cache.save(&saved).await.unwrap();
        assert_eq!(cache.load().await.unwrap(), Some(saved));

        cache.invalidate().await.unwrap();
        assert_eq!(cache.load().await.unwrap(), None);
        cache.invalidate().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_cache_ignores_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "not a token").unwrap();

        assert_eq!(FileTokenCache::new(path).load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_cache_round_trip() {
        let cache = MemoryTokenCache::new();
        let saved = token(3600);

        cache.save(&saved).await.unwrap();
        assert_eq!(cache.load().await.unwrap(), Some(saved));

        cache.invalidate().await.unwrap();
        assert_eq!(cache.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_cache_accepts_oversized_lifetime() {
        let cache = MemoryTokenCache::new();
        let saved = token(u64::MAX);

        cache.save(&saved).await.unwrap();
        assert_eq!(cache.load().await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn test_memory_cache_expires_with_token() {
        let cache = MemoryTokenCache::new();
        cache.save(&token(0)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.load().await.unwrap(), None);
    }
}
