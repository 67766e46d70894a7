// UniquenessScorer: match counting and rarity against the store.
//
// Write path: count posts sharing the fingerprint (and all posts) in the
// same effective scope over the last 24 hours, before the new post is
// inserted, and turn that into a snapshot score.
//
// Read path: redo the same counts from "now", leaving the post itself out,
// so the displayed score reflects everything that happened since it was
// written. If the store can't answer, the stored snapshot is shown.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::warn;

use super::percentile::{place_label, PercentileResult};
use super::rarity::rarity_score;
use super::temporal::{TemporalBreakdown, TemporalWindow, WindowScore};
use crate::db::models::{Location, Post, Scope, ScopeWindow};
use crate::db::PostStore;

/// Rolling window for match counts and percentiles.
pub const MATCH_WINDOW_HOURS: i64 = 24;

/// Counts and score for one fingerprint at one moment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniquenessSnapshot {
    /// Other posts sharing the fingerprint.
    pub match_count: i64,
    /// Other posts in the same scope and window.
    pub total: i64,
    pub uniqueness_score: f64,
}

/// What a detail view shows for one post.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveUniqueness {
    pub match_count: i64,
    pub uniqueness_score: f64,
    pub percentile: PercentileResult,
    /// False when the store failed and the write-time snapshot is shown.
    pub live: bool,
}

#[derive(Clone)]
pub struct UniquenessScorer {
    store: Arc<dyn PostStore>,
}

impl UniquenessScorer {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    fn day_window(scope: Scope, location: &Location, now: DateTime<Utc>) -> ScopeWindow {
        ScopeWindow::new(scope, location, Some(now - Duration::hours(MATCH_WINDOW_HOURS)))
    }

    async fn snapshot_in(&self, content_hash: &str, window: &ScopeWindow) -> Result<UniquenessSnapshot> {
        let match_count = self.store.count_matching(content_hash, window).await?;
        let total = self.store.count_total(window).await?;
        Ok(UniquenessSnapshot {
            match_count,
            total,
            uniqueness_score: rarity_score(match_count, total),
        })
    }

    /// Score a post that hasn't been inserted yet.
    pub async fn score_new(
        &self,
        content_hash: &str,
        scope: Scope,
        location: &Location,
        now: DateTime<Utc>,
    ) -> Result<UniquenessSnapshot> {
        self.snapshot_in(content_hash, &Self::day_window(scope, location, now))
            .await
    }

    /// Percentile of a (score, match count) pair among the other posts in
    /// the window. The post being ranked counts toward the population but
    /// never ranks against itself.
    pub async fn percentile(
        &self,
        score: f64,
        match_count: i64,
        scope: Scope,
        location: &Location,
        now: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> Result<PercentileResult> {
        let mut window = Self::day_window(scope, location, now);
        if let Some(id) = exclude_id {
            window = window.excluding(id);
        }
        let rank = self.store.rank_counts(score, match_count, &window).await?;
        let others = self.store.count_total(&window).await?;
        Ok(PercentileResult::from_rank(
            rank.rarer,
            rank.tied,
            others + 1,
            &place_label(scope, location),
        ))
    }

    /// Recompute a stored post's score from current counts.
    pub async fn live(&self, post: &Post, now: DateTime<Utc>) -> LiveUniqueness {
        let location = post.location();
        let window = Self::day_window(post.scope, &location, now).excluding(&post.id);

        let recount = async {
            let snap = self.snapshot_in(&post.content_hash, &window).await?;
            let percentile = self
                .percentile(
                    snap.uniqueness_score,
                    snap.match_count,
                    post.scope,
                    &location,
                    now,
                    Some(&post.id),
                )
                .await?;
            anyhow::Ok((snap, percentile))
        };

        match recount.await {
            Ok((snap, percentile)) => LiveUniqueness {
                match_count: snap.match_count,
                uniqueness_score: snap.uniqueness_score,
                percentile,
                live: true,
            },
            Err(e) => {
                warn!(post_id = %post.id, error = %e, "Live recount failed, showing snapshot");
                LiveUniqueness {
                    match_count: post.match_count,
                    uniqueness_score: post.uniqueness_score,
                    percentile: estimated_percentile(post.uniqueness_score, post.scope, &location),
                    live: false,
                }
            }
        }
    }

    /// Most recent other posts sharing the fingerprint in the window.
    pub async fn similar(
        &self,
        content_hash: &str,
        scope: Scope,
        location: &Location,
        now: DateTime<Utc>,
        exclude_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Post>> {
        let mut window = Self::day_window(scope, location, now);
        if let Some(id) = exclude_id {
            window = window.excluding(id);
        }
        self.store.similar_posts(content_hash, &window, limit).await
    }

    /// One rarity value per temporal window plus the trend between the
    /// two most recent ones.
    pub async fn temporal(
        &self,
        content_hash: &str,
        scope: Scope,
        location: &Location,
        now: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> Result<TemporalBreakdown> {
        let mut windows = Vec::with_capacity(TemporalWindow::ALL.len());
        for window in TemporalWindow::ALL {
            let mut scoped = ScopeWindow::new(scope, location, window.since(now));
            if let Some(id) = exclude_id {
                scoped = scoped.excluding(id);
            }
            let snap = self.snapshot_in(content_hash, &scoped).await?;
            windows.push(WindowScore {
                window,
                match_count: snap.match_count,
                total: snap.total,
                uniqueness_score: snap.uniqueness_score,
            });
        }
        Ok(TemporalBreakdown::new(windows))
    }
}

/// Without store access the rarity score is the only signal left; treat
/// it as the complement of the percentile.
fn estimated_percentile(score: f64, scope: Scope, location: &Location) -> PercentileResult {
    let rarer = (100.0 - score.clamp(0.0, 100.0)).round() as i64;
    PercentileResult::from_counts(rarer, 100, &place_label(scope, location))
}
