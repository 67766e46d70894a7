// Daily action leaderboard.
//
// One sorted set per scope, place and UTC day. Members are normalized
// action texts, scores are how many posts share them. Lives only in the
// cache; a cold or missing cache just means an empty leaderboard.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::Cache;
use crate::db::models::{Location, Scope};
use crate::scoring::normalize;

/// Kept a little past midnight so late readers still see yesterday's board.
const LEADERBOARD_TTL: Duration = Duration::from_secs(48 * 3600);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub action: String,
    pub count: u64,
}

/// `leaderboard:<scope>:<place>:<yyyy-mm-dd>` for the effective scope.
pub fn key(scope: Scope, location: &Location, day: DateTime<Utc>) -> String {
    let effective = scope.effective(location);
    let part = |v: &Option<String>| v.as_deref().unwrap_or("").to_lowercase();
    let place = match effective {
        Scope::World => "all".to_string(),
        Scope::Country => part(&location.country),
        Scope::State => format!("{}/{}", part(&location.country), part(&location.state)),
        Scope::City => format!(
            "{}/{}/{}",
            part(&location.country),
            part(&location.state),
            part(&location.city)
        ),
    };
    format!(
        "leaderboard:{}:{place}:{}",
        effective.as_str(),
        day.format("%Y-%m-%d")
    )
}

/// Record that `content` now has `count` posts in this scope today.
pub async fn record(
    cache: &Cache,
    scope: Scope,
    location: &Location,
    content: &str,
    count: i64,
    now: DateTime<Utc>,
) {
    cache
        .sorted_set_add(
            &key(scope, location, now),
            &normalize(content),
            count as f64,
            Some(LEADERBOARD_TTL),
        )
        .await;
}

/// 1-based rank of `content` on today's board, if it's there.
pub async fn rank(
    cache: &Cache,
    scope: Scope,
    location: &Location,
    content: &str,
    now: DateTime<Utc>,
) -> Option<u64> {
    cache
        .rank(&key(scope, location, now), &normalize(content))
        .await
        .map(|r| r + 1)
}

pub async fn top(
    cache: &Cache,
    scope: Scope,
    location: &Location,
    n: usize,
    now: DateTime<Utc>,
) -> Vec<LeaderboardEntry> {
    cache
        .top_n(&key(scope, location, now), n)
        .await
        .into_iter()
        .map(|(action, score)| LeaderboardEntry {
            action,
            count: score.max(0.0) as u64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_uses_effective_scope() {
        let now = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let loc = Location {
            city: Some("Pune".into()),
            state: None,
            country: Some("India".into()),
        };
        assert_eq!(key(Scope::City, &loc, now), "leaderboard:country:india:2026-03-01");
        assert_eq!(
            key(Scope::World, &loc, now),
            "leaderboard:world:all:2026-03-01"
        );
    }

    #[tokio::test]
    async fn test_record_rank_and_top() {
        let cache = Cache::memory();
        let loc = Location::default();
        let now = Utc::now();
        record(&cache, Scope::World, &loc, "Went surfing!", 3, now).await;
        record(&cache, Scope::World, &loc, "baked bread", 7, now).await;

        assert_eq!(rank(&cache, Scope::World, &loc, "baked bread", now).await, Some(1));
        assert_eq!(rank(&cache, Scope::World, &loc, "went surfing", now).await, Some(2));
        let board = top(&cache, Scope::World, &loc, 10, now).await;
        assert_eq!(board[0].action, "baked bread");
        assert_eq!(board[0].count, 7);

        assert_eq!(rank(&Cache::disabled(), Scope::World, &loc, "x", now).await, None);
    }
}
