// Spam-pattern scoring.
//
// Independent weighted signals. None of them is conclusive alone except
// numbered-sequence spam; two together push the total over SPAM_THRESHOLD.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

use super::lexicon::SEQUENCES;

pub const SPAM_THRESHOLD: u8 = 50;

const W_SEQUENCE: u32 = 50;
const W_URL: u32 = 40;
const W_EMAIL: u32 = 40;
const W_SYMBOLS: u32 = 30;
const W_SHOUTING: u32 = 25;

const MAX_SYMBOL_RATIO: f64 = 0.30;
const MAX_UPPER_RATIO: f64 = 0.50;
const MIN_LETTERS_FOR_CAPS: usize = 8;

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(https?://|www\.)\S+|\b[a-z0-9-]{2,}\.(com|net|org|io|xyz|ru|info|biz|co|ly|me)\b")
        .expect("static regex: url")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").expect("static regex: email")
});

/// Numbered identifiers like "test1 test2" or "item-3 item-4".
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([a-z]+)[-_]?(\d+)\b").expect("static regex: numbered"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpamSignals {
    pub sequential_identifiers: bool,
    pub url: bool,
    pub email: bool,
    pub excessive_symbols: bool,
    pub excessive_caps: bool,
    /// Sum of fired weights, capped at 100.
    pub confidence: u8,
}

impl SpamSignals {
    pub fn is_spam(&self) -> bool {
        self.confidence >= SPAM_THRESHOLD
    }

    pub fn reason(&self) -> &'static str {
        if self.sequential_identifiers {
            "Content looks like numbered test or spam entries"
        } else if self.url || self.email {
            "Links and contact details aren't allowed"
        } else if self.excessive_symbols {
            "Content has too many symbols"
        } else {
            "Please don't write in all caps"
        }
    }
}

/// Consecutive members of a known sequence written next to each other
/// ("alpha beta", "first, second"), or the same word with consecutive
/// numbers attached.
fn has_sequential_identifiers(text: &str, tokens: &[String]) -> bool {
    let adjacent_words = tokens.windows(2).any(|window| {
        SEQUENCES.iter().any(|seq| {
            seq.windows(2)
                .any(|pair| window[0] == pair[0] && window[1] == pair[1])
        })
    });
    if adjacent_words {
        return true;
    }

    let numbered: Vec<(String, u64)> = NUMBERED
        .captures_iter(text)
        .filter_map(|c| {
            let stem = c.get(1)?.as_str().to_lowercase();
            let n = c.get(2)?.as_str().parse().ok()?;
            Some((stem, n))
        })
        .collect();
    numbered.iter().any(|(stem, n)| {
        numbered
            .iter()
            .any(|(other, m)| other == stem && *m == n.saturating_add(1))
    })
}

pub fn score(text: &str, tokens: &[String]) -> SpamSignals {
    let mut s = SpamSignals {
        sequential_identifiers: has_sequential_identifiers(text, tokens),
        url: URL.is_match(text),
        email: EMAIL.is_match(text),
        ..SpamSignals::default()
    };

    let visible: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    if !visible.is_empty() {
        let symbols = visible.iter().filter(|c| !c.is_alphanumeric()).count();
        s.excessive_symbols = symbols as f64 / visible.len() as f64 > MAX_SYMBOL_RATIO;
    }

    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() >= MIN_LETTERS_FOR_CAPS {
        let upper = letters.iter().filter(|c| c.is_uppercase()).count();
        s.excessive_caps = upper as f64 / letters.len() as f64 > MAX_UPPER_RATIO;
    }

    let mut total = 0;
    for (fired, weight) in [
        (s.sequential_identifiers, W_SEQUENCE),
        (s.url, W_URL),
        (s.email, W_EMAIL),
        (s.excessive_symbols, W_SYMBOLS),
        (s.excessive_caps, W_SHOUTING),
    ] {
        if fired {
            total += weight;
        }
    }
    s.confidence = total.min(100) as u8;
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::lexicon::tokenize;

    fn run(text: &str) -> SpamSignals {
        score(text, &tokenize(text))
    }

    #[test]
    fn test_clean_text() {
        let s = run("played cricket this evening");
        assert_eq!(s.confidence, 0);
        assert!(!s.is_spam());
    }

    #[test]
    fn test_sequence_words_are_spam() {
        assert!(run("alpha beta launch").is_spam());
        assert!(run("post1 post2").is_spam());
        assert!(!run("post1 post5").sequential_identifiers);
    }

    #[test]
    fn test_url_and_email_add_up() {
        let s = run("visit www.example.com or mail bob@example.com");
        assert!(s.url);
        assert!(s.email);
        assert!(s.is_spam());

        let s = run("check out example.com");
        assert!(s.url);
        assert!(!s.is_spam());
    }

    #[test]
    fn test_symbols_and_caps() {
        assert!(run("$$$ !!! ### wow").excessive_symbols);
        let s = run("BEST DAY EVER AT THE BEACH");
        assert!(s.excessive_caps);
        assert!(!s.is_spam());
    }

    #[test]
    fn test_single_ordinal_is_fine() {
        assert!(!run("first swim of the year").sequential_identifiers);
    }

    #[test]
    fn test_ordinals_apart_are_fine() {
        let s = run("came first in the race and second in the relay");
        assert!(!s.sequential_identifiers);
        assert!(!s.is_spam());
        assert!(run("first, second, third").sequential_identifiers);
    }
}
