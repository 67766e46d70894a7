// Gibberish and repetition checks.
//
// Purely structural: vowel balance per token, runs of one character,
// keyboard mashing, consonant pile-ups and repeated words. No dictionary.

use super::lexicon::{is_vowel, KEYBOARD_RUNS};

const MIN_ELIGIBLE_LEN: usize = 5;
const MIN_VOWEL_RATIO: f64 = 0.15;
const MAX_VOWEL_RATIO: f64 = 0.70;
const MAX_FLAGGED_FRACTION: f64 = 0.5;
const MAX_REPEATED_CHARS: usize = 5;
const MAX_CONSONANT_RUN: usize = 5;
const MIN_DIVERSITY: f64 = 0.5;

/// Structural findings for one piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct GibberishReport {
    /// Tokens long enough for the vowel-ratio test.
    pub eligible: usize,
    /// Eligible tokens whose vowel ratio is out of range.
    pub flagged: usize,
    /// Unique tokens / total tokens.
    pub diversity: f64,
    /// First reason the text was rejected, if it was.
    pub rejection: Option<&'static str>,
}

impl GibberishReport {
    pub fn is_coherent(&self) -> bool {
        self.rejection.is_none()
    }

    pub fn flagged_fraction(&self) -> f64 {
        if self.eligible == 0 {
            0.0
        } else {
            self.flagged as f64 / self.eligible as f64
        }
    }
}

/// Ratio of vowels (y included) to letters in an alphabetic token.
pub fn vowel_ratio(token: &str) -> f64 {
    let letters = token.chars().filter(|c| c.is_alphabetic()).count();
    if letters == 0 {
        return 0.0;
    }
    let vowels = token.chars().filter(|&c| is_vowel(c)).count();
    vowels as f64 / letters as f64
}

/// Longest run of one repeated character, ignoring whitespace.
fn longest_repeat(text: &str) -> usize {
    let mut best = 0;
    let mut run = 0;
    let mut prev = None;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        if Some(c) == prev {
            run += 1;
        } else {
            run = 1;
            prev = Some(c);
        }
        best = best.max(run);
    }
    best
}

/// True if the token has a run of consonants too long for English.
/// Runs containing an `h` are let through: digraphs like "th" and "ch"
/// produce legitimate long clusters ("strengths", "matchsticks").
fn has_consonant_pileup(token: &str) -> bool {
    let mut run = String::new();
    for c in token.chars() {
        if c.is_ascii_alphabetic() && !is_vowel(c) {
            run.push(c);
            if run.len() >= MAX_CONSONANT_RUN && !run.contains('h') {
                return true;
            }
        } else {
            run.clear();
        }
    }
    false
}

/// Run every structural check over already-tokenized text.
pub fn analyze(text: &str, tokens: &[String]) -> GibberishReport {
    let alphabetic: Vec<&String> = tokens
        .iter()
        .filter(|t| t.chars().all(|c| c.is_alphabetic() || c == '\''))
        .collect();

    let eligible: Vec<&&String> = alphabetic
        .iter()
        .filter(|t| t.chars().count() >= MIN_ELIGIBLE_LEN)
        .collect();
    let flagged = eligible
        .iter()
        .filter(|t| {
            let ratio = vowel_ratio(t);
            !(MIN_VOWEL_RATIO..=MAX_VOWEL_RATIO).contains(&ratio)
        })
        .count();

    let unique: std::collections::HashSet<&String> = tokens.iter().collect();
    let diversity = if tokens.is_empty() {
        0.0
    } else {
        unique.len() as f64 / tokens.len() as f64
    };

    let mut report = GibberishReport {
        eligible: eligible.len(),
        flagged,
        diversity,
        rejection: None,
    };

    let lowered = text.to_lowercase();
    report.rejection = if tokens.is_empty() {
        Some("Content has no words in it")
    } else if longest_repeat(&lowered) >= MAX_REPEATED_CHARS {
        Some("Content has too many repeated characters")
    } else if KEYBOARD_RUNS.iter().any(|run| lowered.contains(run)) {
        Some("Content looks like random keyboard input")
    } else if alphabetic.iter().any(|t| has_consonant_pileup(t)) {
        Some("Content contains words that don't look real")
    } else if report.flagged_fraction() > MAX_FLAGGED_FRACTION {
        Some("Content looks like gibberish")
    } else if tokens.len() >= 2 && diversity <= MIN_DIVERSITY {
        Some("Content repeats the same words too much")
    } else {
        None
    };

    report
}
