// Write pipeline: quality gate, moderation, scoring, persist.
//
// Runs on a ValidatedSubmission, so rate limiting and the input gate have
// already happened in the web layer. Stages run in order and stop at the
// first rejection; the cheap ones come first so the classifier is only
// paid for on content that could actually be posted.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::leaderboard;
use crate::cache::Cache;
use crate::db::models::{format_timestamp, Post};
use crate::db::PostStore;
use crate::error::AppError;
use crate::input::ValidatedSubmission;
use crate::moderation::ModerationOrchestrator;
use crate::quality;
use crate::scoring::{fingerprint, PercentileResult, UniquenessScorer};

/// How many similar posts the write response carries.
pub const SIMILAR_LIMIT: u32 = 5;

/// 201 body of the write endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub post: Post,
    pub similar_posts: Vec<Post>,
    pub match_count: i64,
    pub uniqueness_score: f64,
    pub percentile: PercentileResult,
}

/// A fresh random post id: 16 bytes, hex encoded.
pub fn new_post_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn PostStore>,
    scorer: UniquenessScorer,
    moderation: ModerationOrchestrator,
    cache: Cache,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn PostStore>, moderation: ModerationOrchestrator, cache: Cache) -> Self {
        Self {
            scorer: UniquenessScorer::new(store.clone()),
            store,
            moderation,
            cache,
        }
    }

    pub async fn submit(&self, submission: ValidatedSubmission) -> Result<SubmissionResult, AppError> {
        let ValidatedSubmission {
            content,
            input_type,
            scope,
            location,
        } = submission;

        let assessment = quality::analyze(&content, input_type);
        if !assessment.allowed {
            info!(
                score = assessment.score,
                reason = assessment.reason.as_deref().unwrap_or(""),
                "Quality gate rejected post"
            );
        }
        assessment.into_result()?;

        self.moderation.moderate(&content).await.into_result()?;

        let now = Utc::now();
        let content_hash = fingerprint(&content);
        let snapshot = self
            .scorer
            .score_new(&content_hash, scope, &location, now)
            .await?;
        let percentile = self
            .scorer
            .percentile(
                snapshot.uniqueness_score,
                snapshot.match_count,
                scope,
                &location,
                now,
                None,
            )
            .await?;

        let post = Post {
            id: new_post_id(),
            content,
            content_hash,
            input_type,
            scope: scope.effective(&location),
            location_city: location.city.clone(),
            location_state: location.state.clone(),
            location_country: location.country.clone(),
            uniqueness_score: snapshot.uniqueness_score,
            match_count: snapshot.match_count,
            funny_count: 0,
            creative_count: 0,
            must_try_count: 0,
            total_reactions: 0,
            created_at: format_timestamp(now),
        };
        self.store.insert_post(&post).await?;

        info!(
            post_id = %post.id,
            scope = %post.scope,
            match_count = snapshot.match_count,
            uniqueness = snapshot.uniqueness_score,
            tier = percentile.tier.as_str(),
            "Post created"
        );

        // Everything below is display sugar; the post is already stored.
        let similar_posts = self
            .scorer
            .similar(
                &post.content_hash,
                post.scope,
                &location,
                now,
                Some(&post.id),
                SIMILAR_LIMIT,
            )
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load similar posts");
                Vec::new()
            });

        leaderboard::record(
            &self.cache,
            post.scope,
            &location,
            &post.content,
            snapshot.match_count + 1,
            now,
        )
        .await;

        Ok(SubmissionResult {
            match_count: snapshot.match_count,
            uniqueness_score: snapshot.uniqueness_score,
            post,
            similar_posts,
            percentile,
        })
    }
}
