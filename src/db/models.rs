// Data models: Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so other modules can use them without depending
// on rusqlite directly.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp format used for `created_at` columns. Lexicographic order
/// matches chronological order, so window filters are plain string compares.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a UTC timestamp the way the store keeps it.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// What kind of statement the user is submitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    /// A single thing done today ("played cricket").
    Action,
    /// A free-form summary of the whole day.
    DaySummary,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Action => "action",
            InputType::DaySummary => "day_summary",
        }
    }
}

impl FromStr for InputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "action" => Ok(InputType::Action),
            "day_summary" => Ok(InputType::DaySummary),
            other => Err(format!("unknown input type: {other}")),
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Geographic granularity within which uniqueness is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    City,
    State,
    Country,
    World,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::City => "city",
            Scope::State => "state",
            Scope::Country => "country",
            Scope::World => "world",
        }
    }

    /// Narrow the requested scope to the most specific one the location
    /// can actually support. `city` without a city falls back to `state`,
    /// and so on down to `world`.
    pub fn effective(self, location: &Location) -> Scope {
        let has_country = location.country.is_some();
        let has_state = has_country && location.state.is_some();
        let has_city = has_state && location.city.is_some();
        match self {
            Scope::City if has_city => Scope::City,
            Scope::City | Scope::State if has_state => Scope::State,
            Scope::City | Scope::State | Scope::Country if has_country => Scope::Country,
            _ => Scope::World,
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "city" => Ok(Scope::City),
            "state" => Ok(Scope::State),
            "country" => Ok(Scope::Country),
            "world" => Ok(Scope::World),
            other => Err(format!("unknown scope: {other}")),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional location triple attached to a submission. Already sanitized by
/// the time it reaches the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// A persisted post.
///
/// `uniqueness_score` and `match_count` are the snapshot taken at write
/// time. Read paths may recompute them live without touching the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub content: String,
    pub content_hash: String,
    pub input_type: InputType,
    pub scope: Scope,
    pub location_city: Option<String>,
    pub location_state: Option<String>,
    pub location_country: Option<String>,
    pub uniqueness_score: f64,
    pub match_count: i64,
    pub funny_count: i64,
    pub creative_count: i64,
    pub must_try_count: i64,
    pub total_reactions: i64,
    pub created_at: String,
}

impl Post {
    pub fn location(&self) -> Location {
        Location {
            city: self.location_city.clone(),
            state: self.location_state.clone(),
            country: self.location_country.clone(),
        }
    }
}

/// Reactions a visitor can leave on a real (non-ghost) post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    Funny,
    Creative,
    MustTry,
}

impl Reaction {
    /// Column holding this reaction's counter.
    pub fn column(&self) -> &'static str {
        match self {
            Reaction::Funny => "funny_count",
            Reaction::Creative => "creative_count",
            Reaction::MustTry => "must_try_count",
        }
    }
}

/// Ordering/selection for the public feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedFilter {
    /// Newest first.
    #[default]
    All,
    /// Rarest first (highest uniqueness snapshot).
    Unique,
    /// Most shared first (highest match count snapshot).
    Common,
}

impl FromStr for FeedFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" | "recent" => Ok(FeedFilter::All),
            "unique" => Ok(FeedFilter::Unique),
            "common" => Ok(FeedFilter::Common),
            other => Err(format!("unknown filter: {other}")),
        }
    }
}

/// Which slice of the store a count or listing applies to.
#[derive(Debug, Clone)]
pub struct ScopeWindow {
    pub scope: Scope,
    pub location: Location,
    /// Only rows created at or after this instant. `None` = all time.
    pub since: Option<DateTime<Utc>>,
    /// Leave this post out of the count (the post being scored).
    pub exclude_id: Option<String>,
}

impl ScopeWindow {
    pub fn new(scope: Scope, location: &Location, since: Option<DateTime<Utc>>) -> Self {
        Self {
            scope: scope.effective(location),
            location: location.clone(),
            since,
            exclude_id: None,
        }
    }

    pub fn excluding(mut self, id: &str) -> Self {
        self.exclude_id = Some(id.to_string());
        self
    }
}

/// How many posts in a window rank rarer than, or level with, a given one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RankCounts {
    pub rarer: i64,
    pub tied: i64,
}

/// Parameters for a feed page.
#[derive(Debug, Clone)]
pub struct FeedQuery {
    pub filter: FeedFilter,
    /// `None` = every scope.
    pub scope: Option<Scope>,
    pub location: Location,
    pub limit: u32,
    pub offset: u32,
}
