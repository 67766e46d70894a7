// Temporal windows for uniqueness: today, this week, this month, all time.
//
// Each window gets its own rarity value for the same fingerprint and scope.
// The trend compares the two most recent windows: if the action is less
// rare today than over the week it is "rising" (catching on), if it is
// rarer today it is "falling", otherwise "flat".

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Rarity points that separate a real trend from noise.
pub const TREND_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalWindow {
    Today,
    Week,
    Month,
    AllTime,
}

impl TemporalWindow {
    pub const ALL: [TemporalWindow; 4] = [
        TemporalWindow::Today,
        TemporalWindow::Week,
        TemporalWindow::Month,
        TemporalWindow::AllTime,
    ];

    /// Start of the window relative to `now`. `None` = unbounded.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TemporalWindow::Today => Some(now - Duration::hours(24)),
            TemporalWindow::Week => Some(now - Duration::days(7)),
            TemporalWindow::Month => Some(now - Duration::days(30)),
            TemporalWindow::AllTime => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Flat,
}

impl Trend {
    /// Compare today's rarity with the week's.
    pub fn between(today: f64, week: f64) -> Self {
        if today < week - TREND_THRESHOLD {
            Trend::Rising
        } else if today > week + TREND_THRESHOLD {
            Trend::Falling
        } else {
            Trend::Flat
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowScore {
    pub window: TemporalWindow,
    pub match_count: i64,
    pub total: i64,
    pub uniqueness_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalBreakdown {
    pub windows: Vec<WindowScore>,
    pub trend: Trend,
}

impl TemporalBreakdown {
    /// Build from per-window scores given in `TemporalWindow::ALL` order.
    pub fn new(windows: Vec<WindowScore>) -> Self {
        let score_of = |w: TemporalWindow| {
            windows
                .iter()
                .find(|s| s.window == w)
                .map(|s| s.uniqueness_score)
        };
        let trend = match (score_of(TemporalWindow::Today), score_of(TemporalWindow::Week)) {
            (Some(today), Some(week)) => Trend::between(today, week),
            _ => Trend::Flat,
        };
        Self { windows, trend }
    }
}
