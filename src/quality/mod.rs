// QualityAnalyzer: cheap structural gate run before moderation.
//
// Three independent analyses over the sanitized text:
//   - gibberish: vowel balance, keyboard mashing, repetition
//   - spam: numbered entries, links, symbols, shouting
//   - action (kind = action only): does it read like something done
//
// They are folded into one overall score:
//   overall = 0.8 * coherence + 0.2 * (100 - spam confidence)
// and the content passes only if overall >= PASS_SCORE, it is coherent,
// it isn't spam, and (for actions) the action rubric accepts it.

pub mod action;
pub mod gibberish;
pub mod lexicon;
pub mod spam;

use serde::Serialize;

use crate::db::models::InputType;
use crate::error::AppError;

pub use action::ActionSignals;
pub use gibberish::GibberishReport;
pub use spam::SpamSignals;

pub const PASS_SCORE: u8 = 60;

/// Coherence assigned to text the gibberish checks rejected outright.
const INCOHERENT_SCORE: f64 = 20.0;

/// Verdict of the quality gate. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAssessment {
    /// Overall score, 0 to 100.
    pub score: u8,
    pub coherence_score: u8,
    pub is_coherent: bool,
    /// Only set for kind = action.
    pub is_action: Option<bool>,
    pub action_confidence: Option<u8>,
    pub spam_confidence: u8,
    pub is_spam: bool,
    /// Every problem found, most relevant first.
    pub issues: Vec<String>,
    pub allowed: bool,
    /// The single most relevant issue, when rejected.
    pub reason: Option<String>,
    pub suggestion: Option<String>,
}

impl QualityAssessment {
    /// Turn a rejection into the client-facing error.
    pub fn into_result(self) -> Result<QualityAssessment, AppError> {
        if self.allowed {
            return Ok(self);
        }
        Err(AppError::QualityRejected {
            reason: self
                .reason
                .clone()
                .unwrap_or_else(|| "Content didn't pass the quality check".to_string()),
            quality_score: self.score,
            suggestion: self.suggestion.clone().unwrap_or_default(),
        })
    }
}

pub fn suggestion_for(kind: InputType) -> &'static str {
    match kind {
        InputType::Action => {
            "Describe one thing you actually did today, like \"played cricket this evening\" or \"cooked dinner for my family\"."
        }
        InputType::DaySummary => "Write a sentence or two about how your day went, in your own words.",
    }
}

/// Score sanitized content for the given kind.
pub fn analyze(content: &str, kind: InputType) -> QualityAssessment {
    let tokens = lexicon::tokenize(content);
    let structure = gibberish::analyze(content, &tokens);
    let spam = spam::score(content, &tokens);
    let action = (kind == InputType::Action).then(|| action::score(content, &tokens));

    let structural = if structure.is_coherent() {
        100.0 - 60.0 * structure.flagged_fraction() - 20.0 * (1.0 - structure.diversity)
    } else {
        INCOHERENT_SCORE
    };
    let coherence = match &action {
        Some(a) => (structural + f64::from(a.confidence)) / 2.0,
        None => structural,
    };
    let overall = 0.8 * coherence + 0.2 * (100.0 - f64::from(spam.confidence));
    let score = overall.round().clamp(0.0, 100.0) as u8;

    let mut issues = Vec::new();
    if let Some(reason) = structure.rejection {
        issues.push(reason.to_string());
    }
    if spam.is_spam() {
        issues.push(spam.reason().to_string());
    }
    if let Some(a) = action.as_ref().filter(|a| !a.is_action()) {
        issues.push(a.rejection_reason().to_string());
    }
    if issues.is_empty() && score < PASS_SCORE {
        issues.push("Content didn't pass the quality check".to_string());
    }

    let allowed = issues.is_empty();
    QualityAssessment {
        score,
        coherence_score: coherence.round().clamp(0.0, 100.0) as u8,
        is_coherent: structure.is_coherent(),
        is_action: action.as_ref().map(ActionSignals::is_action),
        action_confidence: action.as_ref().map(|a| a.confidence),
        spam_confidence: spam.confidence,
        is_spam: spam.is_spam(),
        reason: issues.first().cloned(),
        suggestion: (!allowed).then(|| suggestion_for(kind).to_string()),
        issues,
        allowed,
    }
}
