// Store trait: backend-agnostic async interface for all post operations.
//
// Implementors: SqliteStore (wraps rusqlite). All methods are async so a
// native async backend can sit behind the same interface later. Callers
// hold an `Arc<dyn PostStore>`.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{FeedQuery, Post, RankCounts, Reaction, ScopeWindow};

#[async_trait]
pub trait PostStore: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Posts ---

    /// Persist a new post.
    async fn insert_post(&self, post: &Post) -> Result<()>;

    /// Fetch a post by id.
    async fn get_post(&self, id: &str) -> Result<Option<Post>>;

    /// One feed page plus the total number of matching rows.
    async fn list_posts(&self, query: &FeedQuery) -> Result<(Vec<Post>, i64)>;

    /// Increment a reaction counter. `None` if the post doesn't exist.
    async fn add_reaction(&self, id: &str, reaction: Reaction) -> Result<Option<Post>>;

    // --- Uniqueness statistics ---

    /// Number of posts sharing `content_hash` inside the window.
    async fn count_matching(&self, content_hash: &str, window: &ScopeWindow) -> Result<i64>;

    /// Number of posts inside the window.
    async fn count_total(&self, window: &ScopeWindow) -> Result<i64>;

    /// How many posts inside the window rank rarer than, or level with,
    /// a post with this stored score and match count.
    async fn rank_counts(
        &self,
        score: f64,
        match_count: i64,
        window: &ScopeWindow,
    ) -> Result<RankCounts>;

    /// The most recent posts sharing `content_hash` inside the window.
    async fn similar_posts(
        &self,
        content_hash: &str,
        window: &ScopeWindow,
        limit: u32,
    ) -> Result<Vec<Post>>;
}
