// Trend aggregator tests: partial failure, caching, forced refresh and
// the last-good fallback, all over mocked sources.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use rarely::cache::Cache;
use rarely::trends::{TrendAggregator, TrendItem, TrendSource, POOL_KEY};

struct StaticSource {
    name: &'static str,
    items: Vec<&'static str>,
    fetches: AtomicUsize,
}

impl StaticSource {
    fn new(name: &'static str, items: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            name,
            items,
            fetches: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TrendSource for StaticSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self) -> anyhow::Result<Vec<TrendItem>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .items
            .iter()
            .filter_map(|content| TrendItem::new(content, 1000, self.name))
            .collect())
    }
}

struct FailingSource;

#[async_trait]
impl TrendSource for FailingSource {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn fetch(&self) -> anyhow::Result<Vec<TrendItem>> {
        anyhow::bail!("upstream returned 500")
    }
}

struct SlowSource;

#[async_trait]
impl TrendSource for SlowSource {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn fetch(&self) -> anyhow::Result<Vec<TrendItem>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

fn aggregator(sources: Vec<Arc<dyn TrendSource>>, cache: Cache) -> TrendAggregator {
    TrendAggregator::new(
        sources,
        cache,
        100,
        Duration::from_secs(300),
        Duration::from_millis(100),
    )
    .with_backoff(Duration::from_millis(1), Duration::from_millis(5))
}

// ============================================================
// Partial failure
// ============================================================

#[tokio::test]
async fn one_healthy_source_is_enough() {
    let good = StaticSource::new("good", vec!["Searched for the eclipse", "Starred ripgrep"]);
    let agg = aggregator(
        vec![
            good as Arc<dyn TrendSource>,
            Arc::new(FailingSource),
            Arc::new(SlowSource),
        ],
        Cache::memory(),
    );

    let response = agg.sample(10, false).await;
    assert_eq!(response.pool_size, 2);
    assert_eq!(response.posts.len(), 2);
    assert!(response.posts.iter().all(|g| g.is_ghost && !g.reactable));
    assert!(!response.cached);
}

#[tokio::test]
async fn duplicates_across_sources_are_dropped() {
    let a = StaticSource::new("a", vec!["Searched for the eclipse"]);
    let b = StaticSource::new("b", vec!["searched for the ECLIPSE", "Starred ripgrep"]);
    let agg = aggregator(vec![a as Arc<dyn TrendSource>, b], Cache::memory());
    assert_eq!(agg.fetch_all().await.len(), 2);
}

// ============================================================
// Caching
// ============================================================

#[tokio::test]
async fn consecutive_reads_share_one_pool() {
    let source = StaticSource::new("s", vec!["Read about a", "Read about b", "Read about c"]);
    let agg = aggregator(vec![source.clone() as Arc<dyn TrendSource>], Cache::memory());

    let first = agg.sample(2, false).await;
    let second = agg.sample(2, false).await;
    assert_eq!(first.pool_size, second.pool_size);
    assert!(second.cached);
    assert!(second.cache_age.is_some());
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn force_bypasses_the_cache() {
    let source = StaticSource::new("s", vec!["Read about a"]);
    let agg = aggregator(vec![source.clone() as Arc<dyn TrendSource>], Cache::memory());

    agg.sample(1, false).await;
    let forced = agg.sample(1, true).await;
    assert!(!forced.cached);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
}

// ============================================================
// Empty results
// ============================================================

#[tokio::test]
async fn empty_refresh_serves_last_good_pool_as_stale() {
    let cache = Cache::memory();
    let good = StaticSource::new("good", vec!["Read about a", "Read about b"]);
    aggregator(vec![good as Arc<dyn TrendSource>], cache.clone()).refresh().await;

    // Fresh entry expires; every source now comes back empty.
    cache.del(&[POOL_KEY]).await;
    let empty = StaticSource::new("empty", vec![]);
    let agg = aggregator(vec![empty.clone() as Arc<dyn TrendSource>], cache);

    let response = agg.sample(5, false).await;
    assert_eq!(response.pool_size, 2);
    assert_eq!(response.stale, Some(true));
    assert!(response.cached);
    // Empty results are retried before falling back.
    assert_eq!(empty.fetches.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn nothing_anywhere_is_an_empty_pool() {
    let agg = aggregator(vec![Arc::new(FailingSource) as Arc<dyn TrendSource>], Cache::memory());
    let response = agg.sample(5, false).await;
    assert_eq!(response.pool_size, 0);
    assert!(response.posts.is_empty());
    assert_eq!(response.stale, None);
}

#[tokio::test]
async fn fallback_pool_is_reused_until_it_expires() {
    let cache = Cache::memory();
    let good = StaticSource::new("good", vec!["Read about a", "Read about b"]);
    aggregator(vec![good as Arc<dyn TrendSource>], cache.clone()).refresh().await;
    cache.del(&[POOL_KEY]).await;

    let empty = StaticSource::new("empty", vec![]);
    let agg = aggregator(vec![empty.clone() as Arc<dyn TrendSource>], cache);
    agg.sample(5, false).await;

    for _ in 0..5 {
        let response = agg.sample(5, false).await;
        assert_eq!(response.pool_size, 2);
        assert_eq!(response.stale, Some(true));
    }
    assert_eq!(empty.fetches.load(Ordering::SeqCst), 3);
}

// ============================================================
// Concurrency
// ============================================================

#[tokio::test]
async fn cold_cache_burst_refreshes_once() {
    let source = StaticSource::new("s", vec!["Read about a", "Read about b"]);
    let agg = aggregator(vec![source.clone() as Arc<dyn TrendSource>], Cache::memory());

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let agg = agg.clone();
            tokio::spawn(async move { agg.sample(1, false).await.pool_size })
        })
        .collect();
    for h in handles {
        assert_eq!(h.await.unwrap(), 2);
    }
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
}

// ============================================================
// Feed backfill
// ============================================================

#[tokio::test]
async fn ghosts_serve_cached_pool_and_warm_in_background() {
    let source = StaticSource::new("s", vec!["Read about a", "Read about b", "Read about c"]);
    let agg = aggregator(vec![source.clone() as Arc<dyn TrendSource>], Cache::memory());

    // Cold cache and no previous pool: nothing to show yet.
    assert!(agg.ghosts(2).await.is_empty());

    // Waits for the background refresh instead of starting another one.
    let state = agg.pool(false).await;
    assert_eq!(state.pool.items.len(), 3);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

    assert_eq!(agg.ghosts(2).await.len(), 2);
    assert!(agg.ghosts(0).await.is_empty());
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn ghosts_during_an_outage_do_not_refetch_per_read() {
    let cache = Cache::memory();
    let good = StaticSource::new("good", vec!["Read about a", "Read about b", "Read about c"]);
    aggregator(vec![good as Arc<dyn TrendSource>], cache.clone()).refresh().await;
    cache.del(&[POOL_KEY]).await;

    let empty = StaticSource::new("empty", vec![]);
    let agg = aggregator(vec![empty.clone() as Arc<dyn TrendSource>], cache);

    for _ in 0..5 {
        assert_eq!(agg.ghosts(3).await.len(), 3);
    }
    let state = agg.pool(false).await;
    assert!(state.stale);
    assert_eq!(empty.fetches.load(Ordering::SeqCst), 3);
}
