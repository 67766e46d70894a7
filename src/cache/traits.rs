// Cache backend trait: the swap-ready abstraction under `Cache`.
//
// Backends report failures honestly through anyhow::Result. The `Cache`
// wrapper is what turns those failures into misses and no-ops, so a
// backend never has to decide fail-open policy itself.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short name for logs ("memory", "redis").
    fn name(&self) -> &'static str;

    /// Get a string value. `Ok(None)` on miss or expiry.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a string value, optionally expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Delete keys. Missing keys are ignored.
    async fn del(&self, keys: &[&str]) -> Result<()>;

    /// Atomically increment a counter, creating it at 0 first if absent.
    /// `ttl` is applied only by the increment that creates the counter.
    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64>;

    /// Remaining time to live. `None` if the key is missing or never expires.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// Add or update a member's score in a sorted set.
    async fn zadd(&self, key: &str, member: &str, score: f64, ttl: Option<Duration>)
        -> Result<()>;

    /// Highest-scored members, best first.
    async fn ztop(&self, key: &str, n: usize) -> Result<Vec<(String, f64)>>;

    /// Zero-based rank of a member counted from the highest score.
    async fn zrank(&self, key: &str, member: &str) -> Result<Option<u64>>;
}
