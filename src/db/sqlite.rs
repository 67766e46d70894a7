// SqliteStore: rusqlite backend implementing the PostStore trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Send.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{FeedQuery, Post, RankCounts, Reaction, ScopeWindow};
use super::traits::PostStore;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// An in-memory store with the schema applied. Used by tests and `check`.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        super::schema::create_tables(&conn)?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl PostStore for SqliteStore {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn insert_post(&self, post: &Post) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::insert_post(&conn, post)
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        let conn = self.conn.lock().await;
        super::queries::get_post(&conn, id)
    }

    async fn list_posts(&self, query: &FeedQuery) -> Result<(Vec<Post>, i64)> {
        let conn = self.conn.lock().await;
        super::queries::list_posts(&conn, query)
    }

    async fn add_reaction(&self, id: &str, reaction: Reaction) -> Result<Option<Post>> {
        let conn = self.conn.lock().await;
        super::queries::add_reaction(&conn, id, reaction)
    }

    async fn count_matching(&self, content_hash: &str, window: &ScopeWindow) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_matching(&conn, content_hash, window)
    }

    async fn count_total(&self, window: &ScopeWindow) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_total(&conn, window)
    }

    async fn rank_counts(
        &self,
        score: f64,
        match_count: i64,
        window: &ScopeWindow,
    ) -> Result<RankCounts> {
        let conn = self.conn.lock().await;
        super::queries::rank_counts(&conn, score, match_count, window)
    }

    async fn similar_posts(
        &self,
        content_hash: &str,
        window: &ScopeWindow,
        limit: u32,
    ) -> Result<Vec<Post>> {
        let conn = self.conn.lock().await;
        super::queries::similar_posts(&conn, content_hash, window, limit)
    }
}
