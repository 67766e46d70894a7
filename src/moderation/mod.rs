// ModerationOrchestrator: static rules, then an optional classifier.
//
// Stage 1 runs the static rules. A hit is final and the classifier is never
// called. Stage 2 asks the configured ToxicityScorer under a timeout. If the
// classifier errors or times out we fail open to the static verdict (which
// at that point is Allowed) and record the failure.
//
// Every verdict bumps a counter in the cache. Counter writes go through
// Cache, which bounds and swallows failures, so they can't fail a request.

pub mod rules;
pub mod verdict;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::Cache;
use crate::toxicity::traits::ToxicityScorer;
pub use verdict::{BlockedBy, ModerationVerdict, Severity};

/// Classifier score at or above which a category blocks.
pub const AI_BLOCK_THRESHOLD: f64 = 0.8;

const AI_MESSAGE: &str =
    "This post can't be shared because it may be harmful or offensive. Try rephrasing it.";

/// Counters live for 30 days from their first increment.
const COUNTER_TTL: Duration = Duration::from_secs(30 * 24 * 3600);

const KEY_ALLOWED: &str = "moderation:allowed";
const KEY_BLOCKED_STATIC: &str = "moderation:blocked:static";
const KEY_BLOCKED_AI: &str = "moderation:blocked:ai";
const KEY_AI_ERRORS: &str = "moderation:ai_errors";

/// Snapshot of the moderation counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationStats {
    pub allowed: u64,
    pub blocked_static: u64,
    pub blocked_ai: u64,
    pub ai_errors: u64,
}

#[derive(Clone)]
pub struct ModerationOrchestrator {
    classifier: Option<Arc<dyn ToxicityScorer>>,
    cache: Cache,
    timeout: Duration,
}

impl ModerationOrchestrator {
    pub fn new(
        classifier: Option<Arc<dyn ToxicityScorer>>,
        cache: Cache,
        timeout: Duration,
    ) -> Self {
        Self {
            classifier,
            cache,
            timeout,
        }
    }

    /// Static rules only.
    pub fn static_only(cache: Cache) -> Self {
        Self::new(None, cache, Duration::from_secs(3))
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Run both stages over content that already passed the quality gate.
    pub async fn moderate(&self, content: &str) -> ModerationVerdict {
        if let Some(hit) = rules::check(content) {
            info!(category = hit.category, severity = %hit.severity, "Static moderation blocked post");
            self.count(KEY_BLOCKED_STATIC).await;
            return ModerationVerdict::Blocked {
                blocked_by: BlockedBy::Static,
                severity: hit.severity,
                reason: hit.category.to_string(),
                message: hit.message.to_string(),
            };
        }

        let verdict = match &self.classifier {
            Some(classifier) => self.classify(classifier.as_ref(), content).await,
            None => ModerationVerdict::Allowed,
        };

        match &verdict {
            ModerationVerdict::Allowed => self.count(KEY_ALLOWED).await,
            ModerationVerdict::Blocked { .. } => self.count(KEY_BLOCKED_AI).await,
        }
        verdict
    }

    async fn classify(&self, classifier: &dyn ToxicityScorer, content: &str) -> ModerationVerdict {
        let outcome = tokio::time::timeout(self.timeout, classifier.score_text(content)).await;
        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(classifier = classifier.name(), error = %e, "Classifier failed, allowing on static verdict");
                self.count(KEY_AI_ERRORS).await;
                return ModerationVerdict::Allowed;
            }
            Err(_) => {
                warn!(
                    classifier = classifier.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Classifier timed out, allowing on static verdict"
                );
                self.count(KEY_AI_ERRORS).await;
                return ModerationVerdict::Allowed;
            }
        };

        match result.worst_category(AI_BLOCK_THRESHOLD) {
            Some((category, score)) => {
                info!(classifier = classifier.name(), category, score, "Classifier blocked post");
                ModerationVerdict::Blocked {
                    blocked_by: BlockedBy::Ai,
                    severity: severity_for(category, score),
                    reason: category.to_string(),
                    message: AI_MESSAGE.to_string(),
                }
            }
            None => {
                debug!(classifier = classifier.name(), toxicity = result.toxicity, "Classifier allowed post");
                ModerationVerdict::Allowed
            }
        }
    }

    async fn count(&self, key: &str) {
        self.cache.increment(key, COUNTER_TTL).await;
    }

    /// Current counter values. Missing counters read as zero.
    pub async fn stats(&self) -> ModerationStats {
        let read = |key: &'static str| async move {
            self.cache
                .get(key)
                .await
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0)
        };
        ModerationStats {
            allowed: read(KEY_ALLOWED).await,
            blocked_static: read(KEY_BLOCKED_STATIC).await,
            blocked_ai: read(KEY_BLOCKED_AI).await,
            ai_errors: read(KEY_AI_ERRORS).await,
        }
    }
}

/// Map a classifier category and score onto a severity.
fn severity_for(category: &str, score: f64) -> Severity {
    let base = if score >= 0.95 {
        Severity::Critical
    } else if score >= 0.9 {
        Severity::High
    } else {
        Severity::Medium
    };
    match category {
        "threat" | "self_harm" | "severe_toxicity" => base.max(Severity::High),
        _ => base,
    }
}
