// Percentile tiers.
//
// percentile = share of in-scope posts (same window) ranked rarer than
// this one. Posts are ranked by stored score, highest first, and then by
// stored match count, lowest first. Exact ties count half. Lower
// percentile means rarer, which means a higher tier.

use serde::{Deserialize, Serialize};

use crate::db::models::{Location, Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PercentileTier {
    Elite,
    Rare,
    Unique,
    Notable,
    Common,
    Popular,
}

/// Upper percentile bound of each tier, rarest first.
const TIER_BOUNDS: [(f64, PercentileTier); 5] = [
    (1.0, PercentileTier::Elite),
    (5.0, PercentileTier::Rare),
    (10.0, PercentileTier::Unique),
    (25.0, PercentileTier::Notable),
    (50.0, PercentileTier::Common),
];

impl PercentileTier {
    pub fn from_percentile(percentile: f64) -> Self {
        TIER_BOUNDS
            .iter()
            .find(|(bound, _)| percentile <= *bound)
            .map(|(_, tier)| *tier)
            .unwrap_or(PercentileTier::Popular)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PercentileTier::Elite => "elite",
            PercentileTier::Rare => "rare",
            PercentileTier::Unique => "unique",
            PercentileTier::Notable => "notable",
            PercentileTier::Common => "common",
            PercentileTier::Popular => "popular",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentileResult {
    pub percentile: f64,
    pub tier: PercentileTier,
    pub comparison_text: String,
}

impl PercentileResult {
    /// `rarer` posts out of `total` in-scope posts are rarer than this one.
    pub fn from_counts(rarer: i64, total: i64, place: &str) -> Self {
        Self::from_rank(rarer, 0, total, place)
    }

    /// Midrank percentile: `rarer` posts rank above this one and `tied`
    /// rank exactly level with it, out of `total` in-scope posts.
    pub fn from_rank(rarer: i64, tied: i64, total: i64, place: &str) -> Self {
        let total = total.max(1) as f64;
        let rarer = rarer.max(0) as f64;
        let tied = tied.max(0) as f64;
        let position = (rarer + tied / 2.0).min(total);
        let percentile = ((position / total) * 1000.0).round() / 10.0;
        let tier = PercentileTier::from_percentile(percentile);
        let comparison_text = match tier {
            PercentileTier::Elite | PercentileTier::Rare | PercentileTier::Unique => {
                format!("Rarer than {:.0}% of posts {place} today", 100.0 - percentile)
            }
            PercentileTier::Notable | PercentileTier::Common => {
                format!("Less common than most posts {place} today")
            }
            PercentileTier::Popular => format!("One of the most shared things {place} today"),
        };
        Self {
            percentile,
            tier,
            comparison_text,
        }
    }
}

/// "in Pune", "in Maharashtra", "worldwide" for the effective scope.
pub fn place_label(scope: Scope, location: &Location) -> String {
    let named = match scope.effective(location) {
        Scope::City => location.city.as_deref(),
        Scope::State => location.state.as_deref(),
        Scope::Country => location.country.as_deref(),
        Scope::World => None,
    };
    match named {
        Some(name) => format!("in {name}"),
        None => "worldwide".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_are_monotonic() {
        let mut prev = PercentileTier::Elite;
        for p in 0..=100 {
            let tier = PercentileTier::from_percentile(f64::from(p));
            assert!(tier >= prev, "tier got rarer at {p}%");
            prev = tier;
        }
        assert_eq!(PercentileTier::from_percentile(0.0), PercentileTier::Elite);
        assert_eq!(PercentileTier::from_percentile(5.0), PercentileTier::Rare);
        assert_eq!(PercentileTier::from_percentile(50.1), PercentileTier::Popular);
    }

    #[test]
    fn test_first_post_is_elite() {
        let r = PercentileResult::from_counts(0, 1, "worldwide");
        assert_eq!(r.percentile, 0.0);
        assert_eq!(r.tier, PercentileTier::Elite);
        assert!(r.comparison_text.contains("worldwide"));
    }

    #[test]
    fn test_from_counts() {
        let r = PercentileResult::from_counts(30, 100, "in Pune");
        assert_eq!(r.percentile, 30.0);
        assert_eq!(r.tier, PercentileTier::Common);
        // empty population never divides by zero
        assert_eq!(PercentileResult::from_counts(0, 0, "x").percentile, 0.0);
    }

    #[test]
    fn test_ties_share_the_middle_of_their_band() {
        // Ten posts all equally rare: none of them is elite.
        let r = PercentileResult::from_rank(0, 9, 10, "worldwide");
        assert_eq!(r.percentile, 45.0);
        assert_eq!(r.tier, PercentileTier::Common);

        // Everything else outranks this post.
        let r = PercentileResult::from_rank(10, 0, 11, "worldwide");
        assert_eq!(r.tier, PercentileTier::Popular);
    }

    #[test]
    fn test_place_label() {
        let loc = Location {
            city: Some("Pune".into()),
            state: Some("MH".into()),
            country: Some("India".into()),
        };
        assert_eq!(place_label(Scope::City, &loc), "in Pune");
        assert_eq!(place_label(Scope::World, &loc), "worldwide");
        assert_eq!(place_label(Scope::City, &Location::default()), "worldwide");
    }
}
