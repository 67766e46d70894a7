// Per-identifier, per-action fixed-window rate limiting on top of Cache.
//
// Each (identifier, action) pair gets a counter key. The increment that
// creates the counter also gives it a TTL equal to the window, so the
// count drops back to zero exactly when the window expires. Increments are
// atomic in the cache backend, so concurrent requests from the same client
// are counted correctly.
//
// If the cache can't count, the limiter fails open: the request is allowed.
// Moderation is the second line of defence against abuse.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::Cache;
use crate::error::AppError;

/// A named limit applied to one kind of request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPreset {
    pub action: &'static str,
    pub limit: u32,
    pub window: Duration,
}

/// Writes are strict, reads are generous.
pub mod presets {
    use super::RateLimitPreset;
    use std::time::Duration;

    pub const CREATE_POST: RateLimitPreset = RateLimitPreset {
        action: "create_post",
        limit: 10,
        window: Duration::from_secs(3600),
    };

    pub const REACT: RateLimitPreset = RateLimitPreset {
        action: "react",
        limit: 30,
        window: Duration::from_secs(60),
    };

    pub const READ_FEED: RateLimitPreset = RateLimitPreset {
        action: "read_feed",
        limit: 120,
        window: Duration::from_secs(60),
    };

    pub const TRENDING: RateLimitPreset = RateLimitPreset {
        action: "trending",
        limit: 60,
        window: Duration::from_secs(60),
    };
}

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_seconds: u64,
}

#[derive(Clone)]
pub struct RateLimiter {
    cache: Cache,
}

impl RateLimiter {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    /// Count one request against `preset` for `identifier`.
    pub async fn check(&self, identifier: &str, preset: RateLimitPreset) -> RateLimitDecision {
        self.check_with(identifier, preset.action, preset.limit, preset.window)
            .await
    }

    /// Count one request against an explicit limit and window.
    pub async fn check_with(
        &self,
        identifier: &str,
        action: &str,
        limit: u32,
        window: Duration,
    ) -> RateLimitDecision {
        let key = format!("ratelimit:{action}:{identifier}");

        let Some(count) = self.cache.increment(&key, window).await else {
            warn!(action, "Rate limiter has no cache, failing open");
            return RateLimitDecision {
                allowed: true,
                limit,
                remaining: limit,
                reset_seconds: window.as_secs(),
            };
        };

        let reset_seconds = self
            .cache
            .ttl(&key)
            .await
            .map(|ttl| ttl.as_secs_f64().ceil() as u64)
            .unwrap_or(window.as_secs());

        let count = u32::try_from(count.max(0)).unwrap_or(u32::MAX);
        let decision = RateLimitDecision {
            allowed: count <= limit,
            limit,
            remaining: limit.saturating_sub(count),
            reset_seconds,
        };

        if !decision.allowed {
            debug!(action, count, limit, "Rate limit exceeded");
        }
        decision
    }

    /// Like `check`, but turns a rejection into `AppError::RateLimitExceeded`.
    pub async fn enforce(
        &self,
        identifier: &str,
        preset: RateLimitPreset,
    ) -> Result<RateLimitDecision, AppError> {
        let decision = self.check(identifier, preset).await;
        if decision.allowed {
            Ok(decision)
        } else {
            Err(AppError::RateLimitExceeded {
                limit: decision.limit,
                remaining: decision.remaining,
                reset_seconds: decision.reset_seconds,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(Cache::memory());
        for i in 1..=3u32 {
            let d = limiter
                .check_with("1.2.3.4", "post", 3, Duration::from_secs(60))
                .await;
            assert!(d.allowed, "request {i} should pass");
            assert_eq!(d.remaining, 3 - i);
        }
        let d = limiter
            .check_with("1.2.3.4", "post", 3, Duration::from_secs(60))
            .await;
        assert!(!d.allowed);
        assert_eq!(d.remaining, 0);
        assert!(d.reset_seconds > 0 && d.reset_seconds <= 60);
    }

    #[tokio::test]
    async fn test_window_expiry_resets_counter() {
        let limiter = RateLimiter::new(Cache::memory());
        let window = Duration::from_secs(1);
        assert!(limiter.check_with("ip", "post", 1, window).await.allowed);
        assert!(!limiter.check_with("ip", "post", 1, window).await.allowed);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        let d = limiter.check_with("ip", "post", 1, window).await;
        assert!(d.allowed, "counter should reset after the window");
        assert_eq!(d.remaining, 0);
    }

    #[tokio::test]
    async fn test_identifiers_and_actions_are_independent() {
        let limiter = RateLimiter::new(Cache::memory());
        let window = Duration::from_secs(60);
        assert!(limiter.check_with("a", "post", 1, window).await.allowed);
        assert!(limiter.check_with("b", "post", 1, window).await.allowed);
        assert!(limiter.check_with("a", "react", 1, window).await.allowed);
        assert!(!limiter.check_with("a", "post", 1, window).await.allowed);
    }

    #[tokio::test]
    async fn test_fails_open_without_cache() {
        let limiter = RateLimiter::new(Cache::disabled());
        for _ in 0..20 {
            let d = limiter.check_with("ip", "post", 1, Duration::from_secs(60)).await;
            assert!(d.allowed);
        }
    }

    #[tokio::test]
    async fn test_enforce_maps_to_error() {
        let limiter = RateLimiter::new(Cache::memory());
        let preset = RateLimitPreset {
            action: "tiny",
            limit: 1,
            window: Duration::from_secs(30),
        };
        assert!(limiter.enforce("ip", preset).await.is_ok());
        match limiter.enforce("ip", preset).await {
            Err(AppError::RateLimitExceeded { limit, remaining, .. }) => {
                assert_eq!(limit, 1);
                assert_eq!(remaining, 0);
            }
            other => panic!("expected RateLimitExceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_requests_counted_atomically() {
        let limiter = RateLimiter::new(Cache::memory());
        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter
                    .check_with("ip", "burst", 5, Duration::from_secs(60))
                    .await
                    .allowed
            }));
        }
        let mut allowed = 0;
        for h in handles {
            if h.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 5);
    }
}
