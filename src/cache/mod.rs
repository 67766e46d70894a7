// Cache: TTL key/value, atomic counters and sorted-set leaderboards.
//
// `Cache` wraps an optional CacheBackend. Every operation degrades instead
// of failing: when no backend is configured, or the backend errors or times
// out, reads are misses and writes are no-ops. Callers never see a cache
// error, they only see an absent value.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod traits;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{CacheMode, Config};
use crate::error::AppError;
pub use memory::MemoryCache;
pub use traits::CacheBackend;

/// How long any single cache operation may take before it counts as a miss.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct Cache {
    backend: Option<Arc<dyn CacheBackend>>,
    op_timeout: Duration,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend: Some(backend),
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    /// An in-process cache.
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()))
    }

    /// A cache that is permanently unavailable.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    /// Build the cache the configuration asks for. Never fails: an
    /// unreachable Redis yields a disabled cache.
    pub async fn from_config(config: &Config) -> Self {
        match config.cache_mode {
            CacheMode::Off => {
                info!("Cache disabled");
                Self::disabled()
            }
            CacheMode::Memory => {
                if config.redis_url.is_some() {
                    return Self::from_redis(config).await;
                }
                info!("Using in-process cache");
                Self::memory()
            }
        }
    }

    #[cfg(feature = "redis")]
    async fn from_redis(config: &Config) -> Self {
        let url = config.redis_url.as_deref().unwrap_or_default();
        match self::redis::RedisCache::connect(url).await {
            Ok(backend) => {
                info!("Using Redis cache");
                Self::new(Arc::new(backend))
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable, running without a cache");
                Self::disabled()
            }
        }
    }

    #[cfg(not(feature = "redis"))]
    async fn from_redis(_config: &Config) -> Self {
        warn!("REDIS_URL is set but this build has no `redis` feature; using in-process cache");
        Self::memory()
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Run one backend operation under the timeout. Failures and timeouts
    /// come back as `DependencyDegraded`.
    async fn attempt<T, F>(&self, op: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(AppError::DependencyDegraded(format!("cache {op} failed: {e}"))),
            Err(_) => Err(AppError::DependencyDegraded(format!(
                "cache {op} timed out after {}ms",
                self.op_timeout.as_millis()
            ))),
        }
    }

    /// Like `attempt`, but logs and swallows the degradation.
    async fn guarded<T, F>(&self, op: &'static str, key: &str, fut: F) -> Option<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match self.attempt(op, fut).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(op, key, error = %e, "Cache degraded, continuing without it");
                None
            }
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let backend = self.backend.as_ref()?;
        self.guarded("get", key, backend.get(key)).await.flatten()
    }

    /// Get and deserialize a JSON value. Undecodable values count as misses.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        if let Some(backend) = self.backend.as_ref() {
            self.guarded("set", key, backend.set(key, value, ttl)).await;
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, &raw, ttl).await,
            Err(e) => warn!(key, error = %e, "Failed to encode cache entry"),
        }
    }

    pub async fn del(&self, keys: &[&str]) {
        if let Some(backend) = self.backend.as_ref() {
            let label = keys.first().copied().unwrap_or_default();
            self.guarded("del", label, backend.del(keys)).await;
        }
    }

    /// Atomically increment a counter, setting `ttl` only when the counter
    /// is created. `None` means the cache could not count.
    pub async fn increment(&self, key: &str, ttl: Duration) -> Option<i64> {
        let backend = self.backend.as_ref()?;
        self.guarded("incr", key, backend.incr(key, ttl)).await
    }

    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let backend = self.backend.as_ref()?;
        self.guarded("ttl", key, backend.ttl(key)).await.flatten()
    }

    pub async fn sorted_set_add(&self, key: &str, member: &str, score: f64, ttl: Option<Duration>) {
        if let Some(backend) = self.backend.as_ref() {
            self.guarded("zadd", key, backend.zadd(key, member, score, ttl))
                .await;
        }
    }

    pub async fn top_n(&self, key: &str, n: usize) -> Vec<(String, f64)> {
        let Some(backend) = self.backend.as_ref() else {
            return Vec::new();
        };
        self.guarded("ztop", key, backend.ztop(key, n))
            .await
            .unwrap_or_default()
    }

    pub async fn rank(&self, key: &str, member: &str) -> Option<u64> {
        let backend = self.backend.as_ref()?;
        self.guarded("zrank", key, backend.zrank(key, member))
            .await
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use async_trait::async_trait;

    /// Backend whose every call fails, standing in for an unreachable server.
    struct BrokenBackend;

    #[async_trait]
    impl CacheBackend for BrokenBackend {
        fn name(&self) -> &'static str {
            "broken"
        }
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            bail!("connection refused")
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<()> {
            bail!("connection refused")
        }
        async fn del(&self, _keys: &[&str]) -> Result<()> {
            bail!("connection refused")
        }
        async fn incr(&self, _key: &str, _ttl: Duration) -> Result<i64> {
            bail!("connection refused")
        }
        async fn ttl(&self, _key: &str) -> Result<Option<Duration>> {
            bail!("connection refused")
        }
        async fn zadd(&self, _: &str, _: &str, _: f64, _: Option<Duration>) -> Result<()> {
            bail!("connection refused")
        }
        async fn ztop(&self, _key: &str, _n: usize) -> Result<Vec<(String, f64)>> {
            bail!("connection refused")
        }
        async fn zrank(&self, _key: &str, _member: &str) -> Result<Option<u64>> {
            bail!("connection refused")
        }
    }

    /// Backend that never answers.
    struct HangingBackend;

    #[async_trait]
    impl CacheBackend for HangingBackend {
        fn name(&self) -> &'static str {
            "hanging"
        }
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            std::future::pending().await
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<()> {
            std::future::pending().await
        }
        async fn del(&self, _keys: &[&str]) -> Result<()> {
            std::future::pending().await
        }
        async fn incr(&self, _key: &str, _ttl: Duration) -> Result<i64> {
            std::future::pending().await
        }
        async fn ttl(&self, _key: &str) -> Result<Option<Duration>> {
            std::future::pending().await
        }
        async fn zadd(&self, _: &str, _: &str, _: f64, _: Option<Duration>) -> Result<()> {
            std::future::pending().await
        }
        async fn ztop(&self, _key: &str, _n: usize) -> Result<Vec<(String, f64)>> {
            std::future::pending().await
        }
        async fn zrank(&self, _key: &str, _member: &str) -> Result<Option<u64>> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_disabled_cache_degrades_to_defaults() {
        let cache = Cache::disabled();
        cache.set("k", "v", None).await;
        assert!(!cache.is_available());
        assert_eq!(cache.get("k").await, None);
        assert_eq!(cache.increment("c", Duration::from_secs(1)).await, None);
        assert!(cache.top_n("lb", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_failing_backend_degrades_to_defaults() {
        let cache = Cache::new(Arc::new(BrokenBackend));
        cache.set("k", "v", None).await;
        cache.del(&["k"]).await;
        assert_eq!(cache.get("k").await, None);
        assert_eq!(cache.increment("c", Duration::from_secs(1)).await, None);
        assert_eq!(cache.rank("lb", "x").await, None);
    }

    #[tokio::test]
    async fn test_backend_failures_are_degradations() {
        let cache = Cache::new(Arc::new(BrokenBackend));
        let err = cache.attempt("get", BrokenBackend.get("k")).await.unwrap_err();
        assert!(matches!(err, AppError::DependencyDegraded(ref d) if d.contains("connection refused")));

        let cache =
            Cache::new(Arc::new(HangingBackend)).with_timeout(Duration::from_millis(20));
        let err = cache.attempt("incr", HangingBackend.incr("c", Duration::from_secs(1))).await;
        assert!(matches!(err, Err(AppError::DependencyDegraded(ref d)) if d.contains("timed out")));
    }

    #[tokio::test]
    async fn test_hanging_backend_times_out() {
        let cache =
            Cache::new(Arc::new(HangingBackend)).with_timeout(Duration::from_millis(20));
        let start = std::time::Instant::now();
        assert_eq!(cache.get("k").await, None);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_json_roundtrip_and_garbage() {
        let cache = Cache::memory();
        cache.set_json("nums", &vec![1, 2, 3], None).await;
        assert_eq!(cache.get_json::<Vec<i32>>("nums").await, Some(vec![1, 2, 3]));
        cache.set("nums", "not json", None).await;
        assert_eq!(cache.get_json::<Vec<i32>>("nums").await, None);
    }
}
