// Database queries: CRUD operations for the posts table.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::models::{
    format_timestamp, FeedFilter, FeedQuery, InputType, Location, Post, RankCounts, Reaction,
    Scope, ScopeWindow,
};

const POST_COLUMNS: &str = "id, content, content_hash, input_type, scope, \
    location_city, location_state, location_country, uniqueness_score, match_count, \
    funny_count, creative_count, must_try_count, total_reactions, created_at";

/// Insert a new post.
pub fn insert_post(conn: &Connection, post: &Post) -> Result<()> {
    conn.execute(
        "INSERT INTO posts (id, content, content_hash, input_type, scope,
            location_city, location_state, location_country,
            uniqueness_score, match_count,
            funny_count, creative_count, must_try_count, total_reactions, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            post.id,
            post.content,
            post.content_hash,
            post.input_type.as_str(),
            post.scope.as_str(),
            post.location_city,
            post.location_state,
            post.location_country,
            post.uniqueness_score,
            post.match_count,
            post.funny_count,
            post.creative_count,
            post.must_try_count,
            post.total_reactions,
            post.created_at,
        ],
    )?;
    Ok(())
}

/// Fetch a single post by id.
pub fn get_post(conn: &Connection, id: &str) -> Result<Option<Post>> {
    let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let post = stmt.query_row(params![id], row_to_post).optional()?;
    Ok(post)
}

/// Count posts sharing a fingerprint inside a scope window.
pub fn count_matching(conn: &Connection, content_hash: &str, window: &ScopeWindow) -> Result<i64> {
    let mut sql = String::from("SELECT COUNT(*) FROM posts WHERE content_hash = ?");
    let mut values = vec![Value::Text(content_hash.to_string())];
    push_window(&mut sql, &mut values, window);
    count(conn, &sql, values)
}

/// Count every post inside a scope window.
pub fn count_total(conn: &Connection, window: &ScopeWindow) -> Result<i64> {
    let mut sql = String::from("SELECT COUNT(*) FROM posts WHERE 1 = 1");
    let mut values = Vec::new();
    push_window(&mut sql, &mut values, window);
    count(conn, &sql, values)
}

/// Where a (score, match count) pair ranks inside a scope window.
///
/// A post ranks rarer when its stored score is higher, or equal with fewer
/// stored matches. Equal on both counts is a tie.
pub fn rank_counts(
    conn: &Connection,
    score: f64,
    match_count: i64,
    window: &ScopeWindow,
) -> Result<RankCounts> {
    let mut sql = String::from(
        "SELECT
            COALESCE(SUM(CASE WHEN uniqueness_score > ?
                OR (uniqueness_score = ? AND match_count < ?) THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN uniqueness_score = ?
                AND match_count = ? THEN 1 ELSE 0 END), 0)
         FROM posts WHERE 1 = 1",
    );
    let mut values = vec![
        Value::Real(score),
        Value::Real(score),
        Value::Integer(match_count),
        Value::Real(score),
        Value::Integer(match_count),
    ];
    push_window(&mut sql, &mut values, window);
    let counts = conn.query_row(&sql, params_from_iter(values), |row| {
        Ok(RankCounts {
            rarer: row.get(0)?,
            tied: row.get(1)?,
        })
    })?;
    Ok(counts)
}

/// Most recent posts sharing a fingerprint inside a scope window.
pub fn similar_posts(
    conn: &Connection,
    content_hash: &str,
    window: &ScopeWindow,
    limit: u32,
) -> Result<Vec<Post>> {
    let mut sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE content_hash = ?");
    let mut values = vec![Value::Text(content_hash.to_string())];
    push_window(&mut sql, &mut values, window);
    sql.push_str(" ORDER BY created_at DESC, rowid DESC LIMIT ?");
    values.push(Value::Integer(i64::from(limit)));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), row_to_post)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// One feed page plus the total number of rows matching the filter.
pub fn list_posts(conn: &Connection, query: &FeedQuery) -> Result<(Vec<Post>, i64)> {
    let mut where_sql = String::from(" WHERE 1 = 1");
    let mut values = Vec::new();
    if let Some(scope) = query.scope {
        push_location(&mut where_sql, &mut values, scope.effective(&query.location), &query.location);
    }

    let total = count(
        conn,
        &format!("SELECT COUNT(*) FROM posts{where_sql}"),
        values.clone(),
    )?;

    let order = match query.filter {
        FeedFilter::All => "created_at DESC, rowid DESC",
        FeedFilter::Unique => "uniqueness_score DESC, created_at DESC",
        FeedFilter::Common => "match_count DESC, created_at DESC",
    };
    let sql = format!("SELECT {POST_COLUMNS} FROM posts{where_sql} ORDER BY {order} LIMIT ? OFFSET ?");
    values.push(Value::Integer(i64::from(query.limit)));
    values.push(Value::Integer(i64::from(query.offset)));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), row_to_post)?;
    Ok((rows.collect::<rusqlite::Result<Vec<_>>>()?, total))
}

/// Bump one reaction counter plus the total. Returns the updated post, or
/// `None` if no post has that id.
pub fn add_reaction(conn: &Connection, id: &str, reaction: Reaction) -> Result<Option<Post>> {
    // The column name comes from a closed enum, never from user input.
    let column = reaction.column();
    let sql = format!(
        "UPDATE posts SET {column} = {column} + 1, total_reactions = total_reactions + 1
         WHERE id = ?1"
    );
    let changed = conn.execute(&sql, params![id])?;
    if changed == 0 {
        return Ok(None);
    }
    get_post(conn, id)
}

// --- Helpers ---

fn count(conn: &Connection, sql: &str, values: Vec<Value>) -> Result<i64> {
    let n: i64 = conn.query_row(sql, params_from_iter(values), |row| row.get(0))?;
    Ok(n)
}

/// Append the scope, time and exclusion filters of a window.
fn push_window(sql: &mut String, values: &mut Vec<Value>, window: &ScopeWindow) {
    push_location(sql, values, window.scope, &window.location);
    if let Some(since) = window.since {
        sql.push_str(" AND created_at >= ?");
        values.push(Value::Text(format_timestamp(since)));
    }
    if let Some(ref id) = window.exclude_id {
        sql.push_str(" AND id != ?");
        values.push(Value::Text(id.clone()));
    }
}

/// Restrict to posts made from the same place at the given granularity.
/// Callers pass an already-effective scope, so every component used is set.
fn push_location(sql: &mut String, values: &mut Vec<Value>, scope: Scope, location: &Location) {
    let mut component = |column: &str, value: &Option<String>| {
        if let Some(v) = value {
            sql.push_str(&format!(" AND lower({column}) = lower(?)"));
            values.push(Value::Text(v.clone()));
        }
    };
    match scope {
        Scope::World => {}
        Scope::Country => component("location_country", &location.country),
        Scope::State => {
            component("location_country", &location.country);
            component("location_state", &location.state);
        }
        Scope::City => {
            component("location_country", &location.country);
            component("location_state", &location.state);
            component("location_city", &location.city);
        }
    }
}

fn row_to_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    let input_type: String = row.get(3)?;
    let scope: String = row.get(4)?;
    Ok(Post {
        id: row.get(0)?,
        content: row.get(1)?,
        content_hash: row.get(2)?,
        input_type: input_type.parse().unwrap_or(InputType::Action),
        scope: scope.parse().unwrap_or(Scope::World),
        location_city: row.get(5)?,
        location_state: row.get(6)?,
        location_country: row.get(7)?,
        uniqueness_score: row.get(8)?,
        match_count: row.get(9)?,
        funny_count: row.get(10)?,
        creative_count: row.get(11)?,
        must_try_count: row.get(12)?,
        total_reactions: row.get(13)?,
        created_at: row.get(14)?,
    })
}
