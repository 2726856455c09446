//! Response caching with moka or the filesystem
//!
//! Stores decoded envelopes as JSON keyed by the request cache key.
//!
//! # Read bypass
//!
//! When `ignore_reads` is set the pipeline skips [`ResponseCache::get`] but
//! keeps calling [`ResponseCache::set`], so the cache is refreshed without
//! serving stale data.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use payx_domain::constants::{RESPONSE_CACHE_KEY_PREFIX, RESPONSE_CACHE_TTL};
use payx_domain::Result;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::cache_error;

/// Default max capacity for the in-memory response cache
///
/// Override via `PAYX_RESPONSE_CACHE_MAX_CAPACITY` environment variable
pub const DEFAULT_RESPONSE_CACHE_MAX_CAPACITY: u64 = 1000;

/// Longest key used verbatim as a file stem; longer keys are hashed.
const MAX_FILE_KEY_LEN: usize = 200;

/// Keyed store of previously decoded envelopes.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    /// Whether the pipeline should bypass reads.
    fn ignore_reads(&self) -> bool;

    fn set_ignore_reads(&self, ignore: bool);
}

/// In-memory response cache configuration
#[derive(Debug, Clone)]
pub struct ResponseCacheConfig {
    /// Time-to-live for cache entries
    pub ttl: Duration,

    /// Maximum number of cached envelopes
    pub max_capacity: u64,
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            ttl: RESPONSE_CACHE_TTL,
            max_capacity: std::env::var("PAYX_RESPONSE_CACHE_MAX_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RESPONSE_CACHE_MAX_CAPACITY),
        }
    }
}

impl ResponseCacheConfig {
    /// Log configuration at startup
    pub fn log_config(&self) {
        tracing::info!(
            ttl_seconds = self.ttl.as_secs(),
            max_capacity = self.max_capacity,
            "response cache configuration loaded"
        );
    }
}

/// Process-local cache; entries expire five minutes after insertion.
pub struct MemoryResponseCache {
    entries: Cache<String, Value>,
    ignore_reads: AtomicBool,
}

impl MemoryResponseCache {
    pub fn new(config: ResponseCacheConfig) -> Self {
        config.log_config();
        let entries = Cache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();
        Self { entries, ignore_reads: AtomicBool::new(false) }
    }

    fn entry_key(key: &str) -> String {
        format!("{RESPONSE_CACHE_KEY_PREFIX}{key}")
    }
}

impl Default for MemoryResponseCache {
    fn default() -> Self {
        Self::new(ResponseCacheConfig::default())
    }
}

#[async_trait]
impl ResponseCache for MemoryResponseCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(&Self::entry_key(key)).await)
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(Self::entry_key(key), value).await;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.invalidate_all();
        Ok(())
    }

    fn ignore_reads(&self) -> bool {
        self.ignore_reads.load(Ordering::Relaxed)
    }

    fn set_ignore_reads(&self, ignore: bool) {
        self.ignore_reads.store(ignore, Ordering::Relaxed);
    }
}

/// One `<key>.json` file per entry under a directory.
///
/// Keys longer than 200 bytes are stored under their BLAKE3 hex digest so
/// the file name stays within filesystem limits. Entries do not expire; use
/// [`ResponseCache::clear`] to drop them.
#[derive(Debug)]
pub struct FileResponseCache {
    dir: PathBuf,
    ignore_reads: AtomicBool,
}

impl FileResponseCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), ignore_reads: AtomicBool::new(false) }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        if key.len() > MAX_FILE_KEY_LEN {
            let digest = blake3::hash(key.as_bytes());
            return self.dir.join(format!("{}.json", digest.to_hex()));
        }
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl ResponseCache for FileResponseCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.entry_path(key);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(cache_error("reading response cache entry", err)),
        };

        match serde_json::from_str(&contents) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "discarding corrupt response cache entry");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| cache_error("creating response cache directory", err))?;
        let contents = serde_json::to_vec(&value)
            .map_err(|err| cache_error("serializing response cache entry", err))?;
        tokio::fs::write(self.entry_path(key), contents)
            .await
            .map_err(|err| cache_error("writing response cache entry", err))
    }

    async fn clear(&self) -> Result<()> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(cache_error("listing response cache directory", err)),
        };

        let mut removed = 0usize;
        while let Some(entry) =
            entries.next_entry().await.map_err(|err| cache_error("listing response cache directory", err))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|err| cache_error("removing response cache entry", err))?;
                removed += 1;
            }
        }
        debug!(dir = %self.dir.display(), removed, "response cache cleared");
        Ok(())
    }

    fn ignore_reads(&self) -> bool {
        self.ignore_reads.load(Ordering::Relaxed)
    }

    fn set_ignore_reads(&self, ignore: bool) {
        self.ignore_reads.store(ignore, Ordering::Relaxed);
    }
}
