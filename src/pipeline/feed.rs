// Read pipeline: feed pages, post detail, reactions.
//
// Feed pages come straight from the store. The first page of the "all"
// feed is topped up with ghost posts from the trending pool when it is
// short. Detail views recompute uniqueness live.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use super::leaderboard;
use crate::cache::Cache;
use crate::db::models::{FeedFilter, FeedQuery, Location, Post, Reaction, Scope};
use crate::db::PostStore;
use crate::error::AppError;
use crate::scoring::temporal::TemporalBreakdown;
use crate::scoring::{LiveUniqueness, UniquenessScorer};
use crate::trends::{GhostPost, TrendAggregator};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
const DETAIL_SIMILAR_LIMIT: u32 = 10;

/// A real post as it appears in a feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub is_ghost: bool,
    pub reactable: bool,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            post,
            is_ghost: false,
            reactable: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FeedEntry {
    Post(PostView),
    Ghost(GhostPost),
}

impl FeedEntry {
    pub fn is_ghost(&self) -> bool {
        matches!(self, FeedEntry::Ghost(_))
    }
}

#[derive(Debug, Clone)]
pub struct FeedRequest {
    pub filter: FeedFilter,
    pub scope: Option<Scope>,
    pub location: Location,
    pub limit: u32,
    pub offset: u32,
    /// Top up a short first page with ghost posts.
    pub ghosts: bool,
}

impl Default for FeedRequest {
    fn default() -> Self {
        Self {
            filter: FeedFilter::All,
            scope: None,
            location: Location::default(),
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            ghosts: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub posts: Vec<FeedEntry>,
    /// Real posts matching the filter. Ghosts are not counted.
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub post: PostView,
    #[serde(flatten)]
    pub uniqueness: LiveUniqueness,
    pub similar_posts: Vec<Post>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal: Option<TemporalBreakdown>,
    /// Position on today's leaderboard for this action, 1 = most common.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u64>,
}

#[derive(Clone)]
pub struct FeedService {
    store: Arc<dyn PostStore>,
    scorer: UniquenessScorer,
    trends: Option<TrendAggregator>,
    cache: Cache,
}

impl FeedService {
    pub fn new(store: Arc<dyn PostStore>, trends: Option<TrendAggregator>, cache: Cache) -> Self {
        Self {
            scorer: UniquenessScorer::new(store.clone()),
            store,
            trends,
            cache,
        }
    }

    pub async fn list(&self, request: FeedRequest) -> Result<FeedPage, AppError> {
        let limit = request.limit.clamp(1, MAX_PAGE_SIZE);
        let query = FeedQuery {
            filter: request.filter,
            scope: request.scope,
            location: request.location,
            limit,
            offset: request.offset,
        };
        let (posts, total) = self.store.list_posts(&query).await?;

        let mut entries: Vec<FeedEntry> = posts
            .into_iter()
            .map(|p| FeedEntry::Post(p.into()))
            .collect();

        let short_by = (limit as usize).saturating_sub(entries.len());
        let backfill = request.ghosts
            && request.filter == FeedFilter::All
            && request.offset == 0
            && short_by > 0;
        if backfill {
            if let Some(trends) = &self.trends {
                entries.extend(trends.ghosts(short_by).await.into_iter().map(FeedEntry::Ghost));
            }
        }

        Ok(FeedPage {
            posts: entries,
            total,
        })
    }

    pub async fn detail(&self, id: &str) -> Result<PostDetail, AppError> {
        let post = self
            .store
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound("post".to_string()))?;

        let now = Utc::now();
        let location = post.location();
        let uniqueness = self.scorer.live(&post, now).await;

        let similar_posts = self
            .scorer
            .similar(
                &post.content_hash,
                post.scope,
                &location,
                now,
                Some(&post.id),
                DETAIL_SIMILAR_LIMIT,
            )
            .await
            .unwrap_or_else(|e| {
                warn!(post_id = %post.id, error = %e, "Failed to load similar posts");
                Vec::new()
            });

        let temporal = match self
            .scorer
            .temporal(&post.content_hash, post.scope, &location, now, Some(&post.id))
            .await
        {
            Ok(t) => Some(t),
            Err(e) => {
                warn!(post_id = %post.id, error = %e, "Failed to compute temporal breakdown");
                None
            }
        };

        let rank = leaderboard::rank(&self.cache, post.scope, &location, &post.content, now).await;

        Ok(PostDetail {
            post: post.into(),
            uniqueness,
            similar_posts,
            temporal,
            rank,
        })
    }

    pub async fn react(&self, id: &str, reaction: Reaction) -> Result<Post, AppError> {
        self.store
            .add_reaction(id, reaction)
            .await?
            .ok_or_else(|| AppError::NotFound("post".to_string()))
    }
}
