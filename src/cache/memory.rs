// In-process cache backend.
//
// Good enough for a single node and for tests. Entries carry their own
// expiry instant and are dropped lazily on access. Keys that are never read
// again (a rate-limit counter for a client that doesn't come back) are
// reclaimed by a sweep that runs every few hundred writes, so there is no
// sweeper task to manage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::traits::CacheBackend;

/// Writes between full sweeps of expired entries.
const SWEEP_EVERY: u64 = 512;

enum Value {
    Text(String),
    Counter(i64),
    Sorted(HashMap<String, f64>),
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    writes: AtomicU64,
    sweep_every: u64,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::with_sweep_interval(SWEEP_EVERY)
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sweep expired entries every `writes` writes instead of the default.
    pub fn with_sweep_interval(writes: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            writes: AtomicU64::new(0),
            sweep_every: writes.max(1),
        }
    }

    /// Count a write and sweep when the interval comes round.
    fn note_write(&self, entries: &mut HashMap<String, Entry>, now: Instant) {
        let n = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if n % self.sweep_every == 0 {
            let before = entries.len();
            entries.retain(|_, e| e.is_live(now));
            let dropped = before - entries.len();
            if dropped > 0 {
                debug!(dropped, remaining = entries.len(), "Swept expired cache entries");
            }
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Drop the entry under `key` if it has expired.
fn evict_expired(entries: &mut HashMap<String, Entry>, key: &str, now: Instant) {
    if entries.get(key).is_some_and(|e| !e.is_live(now)) {
        entries.remove(key);
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        evict_expired(&mut entries, key, Instant::now());
        Ok(match entries.get(key).map(|e| &e.value) {
            Some(Value::Text(s)) => Some(s.clone()),
            Some(Value::Counter(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        self.note_write(&mut entries, now);
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value.to_string()),
                expires_at: ttl.map(|t| now + t),
            },
        );
        Ok(())
    }

    async fn del(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.entries.lock().await;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }

    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        evict_expired(&mut entries, key, now);
        self.note_write(&mut entries, now);

        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Counter(0),
            expires_at: Some(now + ttl),
        });
        match entry.value {
            Value::Counter(ref mut n) => {
                *n += 1;
                Ok(*n)
            }
            _ => bail!("key {key} does not hold a counter"),
        }
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        evict_expired(&mut entries, key, now);
        Ok(entries
            .get(key)
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(now)))
    }

    async fn zadd(
        &self,
        key: &str,
        member: &str,
        score: f64,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        evict_expired(&mut entries, key, now);
        self.note_write(&mut entries, now);

        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Sorted(HashMap::new()),
            expires_at: ttl.map(|t| now + t),
        });
        match entry.value {
            Value::Sorted(ref mut members) => {
                members.insert(member.to_string(), score);
                Ok(())
            }
            _ => bail!("key {key} does not hold a sorted set"),
        }
    }

    async fn ztop(&self, key: &str, n: usize) -> Result<Vec<(String, f64)>> {
        let mut entries = self.entries.lock().await;
        evict_expired(&mut entries, key, Instant::now());
        let Some(Value::Sorted(members)) = entries.get(key).map(|e| &e.value) else {
            return Ok(Vec::new());
        };
        Ok(ranked(members).into_iter().take(n).collect())
    }

    async fn zrank(&self, key: &str, member: &str) -> Result<Option<u64>> {
        let mut entries = self.entries.lock().await;
        evict_expired(&mut entries, key, Instant::now());
        let Some(Value::Sorted(members)) = entries.get(key).map(|e| &e.value) else {
            return Ok(None);
        };
        Ok(ranked(members)
            .iter()
            .position(|(m, _)| m == member)
            .map(|p| p as u64))
    }
}

/// Members sorted by score descending, ties broken by member name.
fn ranked(members: &HashMap<String, f64>) -> Vec<(String, f64)> {
    let mut list: Vec<(String, f64)> = members.iter().map(|(m, s)| (m.clone(), *s)).collect();
    list.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_and_expiry() {
        let cache = MemoryCache::new();
        cache
            .set("k", "v", Some(Duration::from_millis(50)))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_incr_sets_ttl_only_on_create() {
        let cache = MemoryCache::new();
        assert_eq!(cache.incr("c", Duration::from_secs(60)).await.unwrap(), 1);
        let first_ttl = cache.ttl("c").await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        // A later increment with a longer TTL must not extend the window.
        assert_eq!(cache.incr("c", Duration::from_secs(600)).await.unwrap(), 2);
        let second_ttl = cache.ttl("c").await.unwrap().unwrap();
        assert!(second_ttl <= first_ttl);
    }

    #[tokio::test]
    async fn test_incr_is_atomic_under_concurrency() {
        let cache = std::sync::Arc::new(MemoryCache::new());
        let mut handles = Vec::new();
        for _ in 0..50 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.incr("hits", Duration::from_secs(60)).await.unwrap()
            }));
        }
        let mut seen = Vec::new();
        for h in handles {
            seen.push(h.await.unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, (1..=50).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_incr_on_text_key_errors() {
        let cache = MemoryCache::new();
        cache.set("k", "v", None).await.unwrap();
        assert!(cache.incr("k", Duration::from_secs(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_sorted_set_top_and_rank() {
        let cache = MemoryCache::new();
        cache.zadd("lb", "cricket", 3.0, None).await.unwrap();
        cache.zadd("lb", "chess", 7.0, None).await.unwrap();
        cache.zadd("lb", "tennis", 1.0, None).await.unwrap();
        cache.zadd("lb", "cricket", 9.0, None).await.unwrap();

        let top = cache.ztop("lb", 2).await.unwrap();
        assert_eq!(top[0], ("cricket".to_string(), 9.0));
        assert_eq!(top[1], ("chess".to_string(), 7.0));
        assert_eq!(cache.zrank("lb", "tennis").await.unwrap(), Some(2));
        assert_eq!(cache.zrank("lb", "golf").await.unwrap(), None);
        assert!(cache.ztop("missing", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_off_keys_are_swept_after_expiry() {
        let cache = MemoryCache::with_sweep_interval(100);
        for i in 0..300 {
            cache
                .incr(&format!("ratelimit:post:10.0.0.{i}"), Duration::from_millis(30))
                .await
                .unwrap();
        }
        cache.set("keep", "v", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        // None of the expired keys is touched again; writes elsewhere
        // trigger the sweep.
        for i in 0..100 {
            cache
                .incr(&format!("ratelimit:react:10.0.1.{i}"), Duration::from_secs(60))
                .await
                .unwrap();
        }
        assert!(cache.len().await <= 101, "left {} entries", cache.len().await);
        assert_eq!(cache.get("keep").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_del_removes_keys() {
        let cache = MemoryCache::new();
        cache.set("a", "1", None).await.unwrap();
        cache.set("b", "2", None).await.unwrap();
        cache.del(&["a", "b", "c"]).await.unwrap();
        assert!(cache.get("a").await.unwrap().is_none());
        assert!(cache.get("b").await.unwrap().is_none());
    }
}
