// Rarity curve.
//
//   score = 100 * (1 - ln(1 + matches) / ln(1 + total))
//
// `matches` is how many other posts share the fingerprint and `total` how
// many posts exist in the same scope and window. The log ratio makes the
// same absolute match count cost less in a large population than in a
// small one. No matches, or an empty population, is maximally rare.

pub const MAX_SCORE: f64 = 100.0;

/// Uniqueness score in 0..=100, rounded to one decimal.
pub fn rarity_score(match_count: i64, total: i64) -> f64 {
    let matches = match_count.max(0) as f64;
    // A population can't be smaller than the posts matching inside it.
    let total = total.max(match_count).max(0) as f64;
    if matches == 0.0 || total == 0.0 {
        return MAX_SCORE;
    }
    let share = (1.0 + matches).ln() / (1.0 + total).ln();
    let score = MAX_SCORE * (1.0 - share);
    (score.clamp(0.0, MAX_SCORE) * 10.0).round() / 10.0
}
