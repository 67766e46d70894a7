// Toxicity scorer trait: the swap-ready abstraction behind the AI
// moderation stage.
//
// Implementations call an external classifier. The orchestrator owns the
// timeout and the fail-open policy, so implementations just return errors.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// The result of scoring a single piece of text for toxicity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToxicityResult {
    /// Overall toxicity score from 0.0 (benign) to 1.0 (very toxic)
    pub toxicity: f64,
    /// Breakdown of specific attributes (if the provider supports them)
    pub attributes: ToxicityAttributes,
}

/// Detailed toxicity attribute scores (all 0.0 to 1.0).
/// Not all providers will populate every field.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToxicityAttributes {
    pub severe_toxicity: Option<f64>,
    /// Hate directed at a protected group.
    pub identity_attack: Option<f64>,
    pub insult: Option<f64>,
    pub harassment: Option<f64>,
    /// Threats and incitement to violence.
    pub threat: Option<f64>,
    pub sexual: Option<f64>,
    pub self_harm: Option<f64>,
}

impl ToxicityResult {
    /// Every named category with its score, overall toxicity first.
    pub fn categories(&self) -> Vec<(&'static str, f64)> {
        let a = &self.attributes;
        let mut out = vec![("toxicity", self.toxicity)];
        for (name, score) in [
            ("severe_toxicity", a.severe_toxicity),
            ("hate", a.identity_attack),
            ("insult", a.insult),
            ("harassment", a.harassment),
            ("threat", a.threat),
            ("sexual", a.sexual),
            ("self_harm", a.self_harm),
        ] {
            if let Some(score) = score {
                out.push((name, score));
            }
        }
        out
    }

    /// The highest-scoring category at or above `threshold`, if any.
    pub fn worst_category(&self, threshold: f64) -> Option<(&'static str, f64)> {
        self.categories()
            .into_iter()
            .filter(|(_, score)| *score >= threshold)
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// Trait for scoring text toxicity. Implementations must be async because
/// most providers require HTTP API calls.
#[async_trait]
pub trait ToxicityScorer: Send + Sync {
    /// Short provider name for logs and stats.
    fn name(&self) -> &'static str;

    /// Score a single text for toxicity.
    async fn score_text(&self, text: &str) -> Result<ToxicityResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worst_category() {
        let result = ToxicityResult {
            toxicity: 0.55,
            attributes: ToxicityAttributes {
                threat: Some(0.91),
                insult: Some(0.7),
                ..Default::default()
            },
        };
        assert_eq!(result.worst_category(0.8), Some(("threat", 0.91)));
        assert_eq!(result.worst_category(0.95), None);
    }
}
