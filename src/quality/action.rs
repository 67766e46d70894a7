// Action validity: does this read like something the writer did?
//
// A weighted rubric over a shallow parse of the sentence. Each rule adds or
// subtracts a fixed weight; the sum is clamped to 0..=100 and compared to
// ACTION_THRESHOLD.

use serde::Serialize;

use super::lexicon::{
    contains, is_gerund, is_past_tense, AUX_STATE_VERBS, CLAUSE_JOINERS, COPULA_MODAL, DETERMINERS,
    FIRST_PERSON, GENERIC_SUBJECTS, IMPERATIVE_OPENERS, PREDICATE_LEADS,
};

pub const ACTION_THRESHOLD: u8 = 60;

const W_TENSE: i32 = 40;
const W_FIRST_PERSON: i32 = 30;
const W_GENERIC_SUBJECT: i32 = -20;
const W_CONCRETE_VERB: i32 = 20;
const W_OBJECT: i32 = 10;
const W_UNIVERSAL_STATEMENT: i32 = -50;
const W_QUESTION_OR_ADVICE: i32 = -30;
const W_PHILOSOPHICAL: i32 = -40;

const LONG_SENTENCE_CHARS: usize = 60;

/// Which rubric rules fired, plus the final confidence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSignals {
    pub past_tense: bool,
    pub gerund: bool,
    pub first_person: bool,
    pub implied_first_person: bool,
    pub generic_subject: bool,
    pub concrete_verb: bool,
    pub has_object: bool,
    pub universal_statement: bool,
    pub question_or_advice: bool,
    pub philosophical: bool,
    pub confidence: u8,
}

impl ActionSignals {
    pub fn is_action(&self) -> bool {
        self.confidence >= ACTION_THRESHOLD
    }

    /// The most useful thing to tell the writer when the rubric says no.
    pub fn rejection_reason(&self) -> &'static str {
        if self.question_or_advice {
            "Questions and advice aren't actions. Tell us what you did"
        } else if self.universal_statement || self.generic_subject {
            "General statements aren't actions. Tell us what you did"
        } else if self.philosophical {
            "This reads like a reflection, not an action"
        } else if !(self.past_tense || self.gerund) {
            "Describe something you did or are doing"
        } else {
            "This doesn't read like something you did"
        }
    }
}

/// Past forms that aren't predicate adjectives ("tired" in "I am tired").
fn past_verb_at(tokens: &[String], idx: usize) -> bool {
    is_past_tense(&tokens[idx]) && (idx == 0 || !contains(PREDICATE_LEADS, &tokens[idx - 1]))
}

/// The first two tokens that aren't determiners.
fn subject_candidates(tokens: &[String]) -> impl Iterator<Item = &String> {
    tokens
        .iter()
        .filter(|t| !contains(DETERMINERS, t))
        .take(2)
}

/// Score `text` (already tokenized) against the action rubric.
pub fn score(text: &str, tokens: &[String]) -> ActionSignals {
    let mut s = ActionSignals {
        past_tense: (0..tokens.len()).any(|i| past_verb_at(tokens, i)),
        gerund: tokens.iter().any(|t| is_gerund(t)),
        first_person: tokens.iter().any(|t| contains(FIRST_PERSON, t)),
        ..ActionSignals::default()
    };

    s.generic_subject = subject_candidates(tokens).any(|t| contains(GENERIC_SUBJECTS, t));
    s.implied_first_person = !s.first_person
        && !s.generic_subject
        && tokens
            .first()
            .is_some_and(|t| is_past_tense(t) || is_gerund(t));

    // Main verb: first past or -ing form that is not an auxiliary or state verb.
    let main_verb = (0..tokens.len()).find(|&i| {
        (past_verb_at(tokens, i) || is_gerund(&tokens[i])) && !contains(AUX_STATE_VERBS, &tokens[i])
    });
    if let Some(idx) = main_verb {
        s.concrete_verb = true;
        s.has_object = idx + 1 < tokens.len();
    }

    s.universal_statement = s.generic_subject && tokens.iter().any(|t| contains(COPULA_MODAL, t));

    let trimmed = text.trim();
    let lowered = trimmed.to_lowercase();
    s.question_or_advice = trimmed.ends_with('?')
        || IMPERATIVE_OPENERS.iter().any(|opener| {
            lowered.starts_with(opener)
                && lowered[opener.len()..]
                    .chars()
                    .next()
                    .is_none_or(|c| !c.is_alphanumeric())
        });

    let multi_clause = trimmed.contains([',', ';'])
        || tokens.iter().skip(1).any(|t| contains(CLAUSE_JOINERS, t));
    s.philosophical = trimmed.chars().count() > LONG_SENTENCE_CHARS
        && multi_clause
        && !s.past_tense
        && !s.first_person;

    let mut total = 0;
    if s.past_tense || s.gerund {
        total += W_TENSE;
    }
    if s.first_person || s.implied_first_person {
        total += W_FIRST_PERSON;
    }
    if s.generic_subject {
        total += W_GENERIC_SUBJECT;
    }
    if s.concrete_verb {
        total += W_CONCRETE_VERB;
    }
    if s.has_object {
        total += W_OBJECT;
    }
    if s.universal_statement {
        total += W_UNIVERSAL_STATEMENT;
    }
    if s.question_or_advice {
        total += W_QUESTION_OR_ADVICE;
    }
    if s.philosophical {
        total += W_PHILOSOPHICAL;
    }

    s.confidence = total.clamp(0, 100) as u8;
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::lexicon::tokenize;

    fn run(text: &str) -> ActionSignals {
        score(text, &tokenize(text))
    }

    #[test]
    fn test_implied_subject_actions_accepted() {
        for text in [
            "played cricket this evening",
            "cooked dinner for my family",
            "played cricket today",
            "went to the gym",
            "watching a movie with friends",
        ] {
            let s = run(text);
            assert!(s.is_action(), "{text:?} scored {}", s.confidence);
        }
    }

    #[test]
    fn test_explicit_first_person() {
        let s = run("I fixed my bike");
        assert!(s.first_person);
        assert!(!s.implied_first_person);
        assert_eq!(s.confidence, 100);
    }

    #[test]
    fn test_generic_statement_rejected() {
        let s = run("people should always be kind");
        assert!(s.generic_subject);
        assert!(s.universal_statement);
        assert_eq!(s.confidence, 0);
        assert!(!s.is_action());
    }

    #[test]
    fn test_question_rejected() {
        let s = run("did you eat yet?");
        assert!(s.question_or_advice);
        assert!(!s.is_action());
    }

    #[test]
    fn test_advice_rejected() {
        let s = run("don't forget to drink water");
        assert!(s.question_or_advice);
        assert!(!s.is_action());
    }

    #[test]
    fn test_state_verb_is_not_concrete() {
        let s = run("I am tired");
        assert!(!s.concrete_verb);
        assert!(!s.is_action());
    }

    #[test]
    fn test_progressive_counts() {
        let s = run("I am cooking dinner");
        assert!(s.gerund);
        assert!(s.concrete_verb);
        assert!(s.is_action());
    }

    #[test]
    fn test_long_reflection_penalized() {
        let s = run(
            "sometimes the quiet moments of a day matter more than the loud ones, and that is worth remembering",
        );
        assert!(s.philosophical);
        assert!(!s.is_action());
    }

    #[test]
    fn test_imperative_opener_needs_word_boundary() {
        // "trying" starts with "try" but is not advice
        let s = run("trying a new recipe");
        assert!(!s.question_or_advice);
        assert!(s.is_action());
    }
}
