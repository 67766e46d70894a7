// TrendAggregator: a cached pool of trending items from several sources.
//
// A refresh fans out to every source at once, each under its own timeout,
// and waits for all of them to settle. Whatever succeeded is normalized,
// de-duplicated, shuffled, truncated to the pool size and cached. An empty
// result is retried with capped exponential backoff; if it stays empty the
// last known-good pool (kept for a day) is served and marked stale. The
// fallback is written back under the pool key for a short while, so an
// outage costs one retry cycle per interval instead of one per read.
//
// Only one refresh runs at a time. Readers that find the cache cold wait
// for it and then re-check the cache. Feed backfill never waits: it takes
// whatever is cached and kicks off a refresh in the background.
//
// Reads never return the whole pool, only a random subset of it.

pub mod ghost;
pub mod github;
pub mod google;
pub mod reddit;
pub mod traits;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::Cache;
use crate::config::Config;
pub use ghost::GhostPost;
pub use traits::{TrendItem, TrendSource};

pub const POOL_KEY: &str = "trending:pool";
pub const LAST_GOOD_KEY: &str = "trending:pool:last_good";
const LAST_GOOD_TTL: Duration = Duration::from_secs(24 * 3600);
/// How long a fallback pool stands in for a fresh one before sources are
/// tried again.
const FALLBACK_TTL: Duration = Duration::from_secs(60);

/// Refresh attempts before falling back to the last good pool.
const MAX_REFRESH_ATTEMPTS: u32 = 3;
/// Default delay before the second attempt. Doubles each attempt.
const BASE_BACKOFF: Duration = Duration::from_millis(500);
/// Cap on the backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(4);

/// Most items a single read may ask for.
pub const MAX_SAMPLE: usize = 50;

/// Pool as stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPool {
    pub items: Vec<TrendItem>,
    pub fetched_at: DateTime<Utc>,
    /// Written back after a failed refresh rather than fetched.
    #[serde(default)]
    pub stale: bool,
}

/// A pool plus where it came from.
#[derive(Debug, Clone)]
pub struct PoolState {
    pub pool: CachedPool,
    /// Served from the fresh cache entry without fetching.
    pub cached: bool,
    /// Served from the last-good copy after refreshes came back empty.
    pub stale: bool,
}

/// Trending endpoint response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingResponse {
    pub posts: Vec<GhostPost>,
    pub pool_size: usize,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_age: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale: Option<bool>,
}

#[derive(Clone)]
pub struct TrendAggregator {
    sources: Vec<Arc<dyn TrendSource>>,
    cache: Cache,
    pool_size: usize,
    ttl: Duration,
    source_timeout: Duration,
    base_backoff: Duration,
    max_backoff: Duration,
    refresh_lock: Arc<Mutex<()>>,
}

impl TrendAggregator {
    pub fn new(
        sources: Vec<Arc<dyn TrendSource>>,
        cache: Cache,
        pool_size: usize,
        ttl: Duration,
        source_timeout: Duration,
    ) -> Self {
        Self {
            sources,
            cache,
            pool_size,
            ttl,
            source_timeout,
            base_backoff: BASE_BACKOFF,
            max_backoff: MAX_BACKOFF,
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The three HTTP sources with one shared client.
    pub fn from_config(config: &Config, cache: Cache) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rarely/", env!("CARGO_PKG_VERSION")))
            .timeout(config.trend_source_timeout)
            .build()?;
        let sources: Vec<Arc<dyn TrendSource>> = vec![
            Arc::new(reddit::RedditSource::new(client.clone())),
            Arc::new(github::GithubSource::new(
                client.clone(),
                config.github_token.clone(),
            )),
            Arc::new(google::GoogleTrendsSource::new(client)),
        ];
        Ok(Self::new(
            sources,
            cache,
            config.trend_pool_size,
            config.trend_ttl,
            config.trend_source_timeout,
        ))
    }

    /// Override the retry delays (tests use milliseconds).
    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_backoff = base;
        self.max_backoff = max;
        self
    }

    /// Fetch every source concurrently and keep whatever succeeded.
    pub async fn fetch_all(&self) -> Vec<TrendItem> {
        let fetches = self.sources.iter().map(|source| async move {
            match tokio::time::timeout(self.source_timeout, source.fetch()).await {
                Ok(Ok(items)) => {
                    debug!(source = source.name(), count = items.len(), "Trend source fetched");
                    items
                }
                Ok(Err(e)) => {
                    warn!(source = source.name(), error = %e, "Trend source failed");
                    Vec::new()
                }
                Err(_) => {
                    warn!(
                        source = source.name(),
                        timeout_ms = self.source_timeout.as_millis() as u64,
                        "Trend source timed out"
                    );
                    Vec::new()
                }
            }
        });

        let mut seen = HashSet::new();
        let mut items: Vec<TrendItem> = join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .filter(|item| seen.insert(item.content.to_lowercase()))
            .collect();

        items.shuffle(&mut rand::rng());
        items.truncate(self.pool_size);
        items
    }

    /// Fetch a new pool, retrying empty results, and cache it.
    /// Falls back to the last good pool, then to an empty one.
    pub async fn refresh(&self) -> PoolState {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Caller holds `refresh_lock`.
    async fn refresh_locked(&self) -> PoolState {
        for attempt in 0..MAX_REFRESH_ATTEMPTS {
            if attempt > 0 {
                let backoff = self
                    .base_backoff
                    .saturating_mul(1u32 << (attempt - 1))
                    .min(self.max_backoff);
                warn!(
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Trending pool came back empty, retrying"
                );
                tokio::time::sleep(backoff).await;
            }

            let items = self.fetch_all().await;
            if items.is_empty() {
                continue;
            }

            let pool = CachedPool {
                items,
                fetched_at: Utc::now(),
                stale: false,
            };
            self.cache.set_json(POOL_KEY, &pool, Some(self.ttl)).await;
            self.cache
                .set_json(LAST_GOOD_KEY, &pool, Some(LAST_GOOD_TTL))
                .await;
            info!(pool_size = pool.items.len(), "Trending pool refreshed");
            return PoolState {
                pool,
                cached: false,
                stale: false,
            };
        }

        let fallback_ttl = FALLBACK_TTL.min(self.ttl);
        match self.cache.get_json::<CachedPool>(LAST_GOOD_KEY).await {
            Some(mut pool) => {
                warn!(pool_size = pool.items.len(), "All trend sources empty, serving last good pool");
                pool.stale = true;
                self.cache.set_json(POOL_KEY, &pool, Some(fallback_ttl)).await;
                PoolState {
                    pool,
                    cached: true,
                    stale: true,
                }
            }
            None => {
                warn!("All trend sources empty and no previous pool");
                let pool = CachedPool {
                    items: Vec::new(),
                    fetched_at: Utc::now(),
                    stale: false,
                };
                self.cache.set_json(POOL_KEY, &pool, Some(fallback_ttl)).await;
                PoolState {
                    pool,
                    cached: false,
                    stale: false,
                }
            }
        }
    }

    async fn cached_pool(&self) -> Option<PoolState> {
        let pool = self.cache.get_json::<CachedPool>(POOL_KEY).await?;
        Some(PoolState {
            stale: pool.stale,
            pool,
            cached: true,
        })
    }

    /// The current pool, from cache unless `force` or the cache is cold.
    pub async fn pool(&self, force: bool) -> PoolState {
        if force {
            return self.refresh().await;
        }
        if let Some(state) = self.cached_pool().await {
            return state;
        }

        let _guard = self.refresh_lock.lock().await;
        // Another reader may have refreshed while we waited.
        if let Some(state) = self.cached_pool().await {
            return state;
        }
        self.refresh_locked().await
    }

    /// A random subset of `count` items from the pool.
    pub async fn sample(&self, count: usize, force: bool) -> TrendingResponse {
        let state = self.pool(force).await;
        let now = Utc::now();
        let posts = pick(&state.pool.items, count.min(MAX_SAMPLE))
            .iter()
            .map(|item| GhostPost::from_item(item, now))
            .collect();

        let age = (now - state.pool.fetched_at).num_seconds().max(0) as u64;
        TrendingResponse {
            posts,
            pool_size: state.pool.items.len(),
            cached: state.cached,
            cache_age: state.cached.then_some(age),
            stale: state.stale.then_some(true),
        }
    }

    /// Ghost posts for feed backfill. Only serves what is already cached;
    /// a cold cache starts a background refresh and yields the last good
    /// pool, or nothing.
    pub async fn ghosts(&self, count: usize) -> Vec<GhostPost> {
        if count == 0 {
            return Vec::new();
        }

        let items = match self.cached_pool().await {
            Some(state) => state.pool.items,
            None => {
                self.spawn_refresh();
                self.cache
                    .get_json::<CachedPool>(LAST_GOOD_KEY)
                    .await
                    .map(|pool| pool.items)
                    .unwrap_or_default()
            }
        };

        let now = Utc::now();
        pick(&items, count.min(MAX_SAMPLE))
            .iter()
            .map(|item| GhostPost::from_item(item, now))
            .collect()
    }

    /// Warm the pool without making the caller wait. Skipped when a
    /// refresh is already running.
    fn spawn_refresh(&self) {
        let Ok(guard) = self.refresh_lock.clone().try_lock_owned() else {
            debug!("Trending refresh already in flight");
            return;
        };
        let aggregator = self.clone();
        tokio::spawn(async move {
            let _guard = guard;
            if aggregator.cached_pool().await.is_none() {
                aggregator.refresh_locked().await;
            }
        });
    }
}

/// Draw up to `count` distinct items at random.
fn pick(items: &[TrendItem], count: usize) -> Vec<TrendItem> {
    let amount = count.min(items.len());
    let mut rng = rand::rng();
    rand::seq::index::sample(&mut rng, items.len(), amount)
        .iter()
        .map(|i| items[i].clone())
        .collect()
}
