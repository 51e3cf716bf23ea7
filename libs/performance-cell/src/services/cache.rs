use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Key-value store behind the result cache. Per-key atomicity only;
/// concurrent writers to the same key are last-writer-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError>;
    async fn clear(&self) -> Result<(), CacheError>;
    async fn entry_count(&self) -> Result<u64, CacheError>;
}

const KEY_NAMESPACE: &str = "wellcare:";

pub struct RedisCacheStore {
    pool: Pool,
}

impl RedisCacheStore {
    pub async fn new(redis_url: &str) -> Result<Self, CacheError> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::Unavailable(format!("Pool creation error: {}", e)))?;

        // Test connection
        let mut conn = pool
            .get()
            .await
            .map_err(|e| CacheError::Unavailable(format!("Connection error: {}", e)))?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Redis cache store initialized successfully");

        Ok(Self { pool })
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))
    }

    fn namespaced(key: &str) -> String {
        format!("{}{}", KEY_NAMESPACE, key)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(Self::namespaced(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .set_ex(Self::namespaced(key), value, ttl.as_secs() as usize)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(Self::namespaced(key)).await?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut conn = self.connection().await?;
        let pattern = format!("{}{}*", KEY_NAMESPACE, prefix);
        let keys: Vec<String> = conn.keys(pattern).await?;

        let removed = keys.len() as u64;
        if !keys.is_empty() {
            let _: () = conn.del(keys).await?;
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        // Only this service's namespace, never the whole database
        self.delete_prefix("").await?;
        Ok(())
    }

    async fn entry_count(&self) -> Result<u64, CacheError> {
        let mut conn = self.connection().await?;
        let keys: Vec<String> = conn.keys(format!("{}*", KEY_NAMESPACE)).await?;
        Ok(keys.len() as u64)
    }
}

struct InMemoryEntry {
    value: String,
    expires_at: Instant,
}

/// Process-local store. Test substitute for Redis and the fallback when no
/// REDIS_URL is configured; expired entries are dropped lazily.
#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, InMemoryEntry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Entry exists but has expired
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > Instant::now());
        entries.insert(
            key.to_string(),
            InMemoryEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn entry_count(&self) -> Result<u64, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .filter(|entry| entry.expires_at > Instant::now())
            .count() as u64)
    }
}

/// Memoization layer in front of deterministic computations. Store failures
/// fail open: a broken cache degrades to live computation, never to a
/// failed request. Compute failures propagate to the caller.
pub struct CacheService {
    store: Arc<dyn CacheStore>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheService {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Derive a stable cache key from a set of named inputs. Pairs are
    /// canonicalized by sorting on name before digesting, so logically
    /// identical input sets always map to the same key regardless of the
    /// order they were supplied in.
    pub fn cache_key(namespace: &str, parts: &[(&str, &str)]) -> String {
        let mut pairs = parts.to_vec();
        pairs.sort();

        let canonical = pairs
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&");

        let digest = Sha256::digest(canonical.as_bytes());
        let mut hex = String::with_capacity(32);
        for byte in &digest[..16] {
            hex.push_str(&format!("{:02x}", byte));
        }

        format!("{}_{}", namespace, hex)
    }

    /// Return the cached value for `key` if present and unexpired, otherwise
    /// run `compute`, store its result for `ttl`, and return it. Concurrent
    /// callers on a cold key may each compute; computations are read-only
    /// and idempotent, so the duplicate work is a cost, not a bug.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!("Cache hit for {}", key);
                    return Ok(value);
                }
                Err(e) => warn!("Discarding undecodable cache entry {}: {}", key, e),
            },
            Ok(None) => {}
            Err(e) => warn!("Cache read for {} failed, computing live: {}", key, e),
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss for {}", key);

        let value = compute().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(e) = self.store.set(key, &raw, ttl).await {
                    warn!("Cache write for {} failed: {}", key, e);
                }
            }
            Err(e) => warn!("Could not serialize cache entry {}: {}", key, e),
        }

        Ok(value)
    }

    pub async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        debug!("Invalidating cache entry {}", key);
        self.store.delete(key).await
    }

    pub async fn invalidate_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let removed = self.store.delete_prefix(prefix).await?;
        info!("Invalidated {} cache entries under {}", removed, prefix);
        Ok(removed)
    }

    pub async fn clear(&self) -> Result<(), CacheError> {
        self.store.clear().await
    }

    pub async fn stats(&self) -> Result<crate::models::CacheStats, CacheError> {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        let hit_rate = if lookups > 0 {
            hits as f64 / lookups as f64
        } else {
            0.0
        };

        Ok(crate::models::CacheStats {
            hits,
            misses,
            hit_rate,
            total_entries: self.store.entry_count().await?,
        })
    }
}
