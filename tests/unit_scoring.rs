// Scoring tests: the rarity curve, percentile tiers and temporal trend
// as a client would read them.

use rarely::db::models::{Location, Scope};
use rarely::scoring::percentile::place_label;
use rarely::scoring::rarity::rarity_score;
use rarely::scoring::temporal::{TemporalBreakdown, TemporalWindow, Trend, WindowScore};
use rarely::scoring::{fingerprint, normalize, PercentileResult, PercentileTier};

// ============================================================
// Rarity curve
// ============================================================

#[test]
fn first_of_its_kind_is_max_rarity() {
    assert_eq!(rarity_score(0, 0), 100.0);
    assert_eq!(rarity_score(0, 250), 100.0);
}

#[test]
fn ten_matches_cost_less_in_a_big_crowd() {
    let small = rarity_score(10, 20);
    let large = rarity_score(10, 100_000);
    assert!(small < large, "small={small} large={large}");
    assert!(large > 70.0);
}

#[test]
fn score_never_increases_with_matches() {
    let total = 500;
    let scores: Vec<f64> = (0..=total).map(|m| rarity_score(m, total)).collect();
    assert!(scores.windows(2).all(|w| w[1] <= w[0]));
    assert_eq!(*scores.last().unwrap(), 0.0);
}

// ============================================================
// Percentile tiers
// ============================================================

#[test]
fn nobody_rarer_is_elite() {
    let p = PercentileResult::from_counts(0, 1, "worldwide");
    assert_eq!(p.percentile, 0.0);
    assert_eq!(p.tier, PercentileTier::Elite);
    assert!(p.comparison_text.contains("worldwide"));
}

#[test]
fn tier_boundaries() {
    let tier = |rarer| PercentileResult::from_counts(rarer, 100, "worldwide").tier;
    assert_eq!(tier(1), PercentileTier::Elite);
    assert_eq!(tier(5), PercentileTier::Rare);
    assert_eq!(tier(10), PercentileTier::Unique);
    assert_eq!(tier(25), PercentileTier::Notable);
    assert_eq!(tier(50), PercentileTier::Common);
    assert_eq!(tier(51), PercentileTier::Popular);
}

#[test]
fn place_label_follows_effective_scope() {
    let location = Location {
        city: Some("Pune".into()),
        state: None,
        country: Some("India".into()),
    };
    // No state, so a city request falls back to the country.
    assert_eq!(place_label(Scope::City, &location), "in India");
    assert_eq!(place_label(Scope::World, &location), "worldwide");
}

// ============================================================
// Temporal trend
// ============================================================

fn window(window: TemporalWindow, score: f64) -> WindowScore {
    WindowScore {
        window,
        match_count: 0,
        total: 0,
        uniqueness_score: score,
    }
}

#[test]
fn catching_on_today_is_rising() {
    let b = TemporalBreakdown::new(vec![
        window(TemporalWindow::Today, 40.0),
        window(TemporalWindow::Week, 80.0),
    ]);
    assert_eq!(b.trend, Trend::Rising);
}

#[test]
fn small_wobbles_are_flat() {
    assert_eq!(Trend::between(70.0, 72.0), Trend::Flat);
    assert_eq!(Trend::between(90.0, 60.0), Trend::Falling);
}

#[test]
fn missing_week_is_flat() {
    let b = TemporalBreakdown::new(vec![window(TemporalWindow::Today, 10.0)]);
    assert_eq!(b.trend, Trend::Flat);
}

// ============================================================
// Fingerprints
// ============================================================

#[test]
fn fingerprint_is_stable_hex() {
    let fp = fingerprint("Went for a run!");
    assert_eq!(fp.len(), 64);
    assert_eq!(fp, fingerprint("went for a run"));
    assert_eq!(normalize("Went for a run!"), "went for a run");
}
