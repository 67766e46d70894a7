// Static moderation rules.
//
// Deterministic patterns checked before any classifier call. The first rule
// that fires decides the verdict; rules are ordered from most to least
// severe so the reported severity is the worst one present.

use std::sync::LazyLock;

use regex_lite::Regex;

use super::verdict::Severity;

/// One static rule match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    /// Category reported to the client as `reason`.
    pub category: &'static str,
    pub severity: Severity,
    pub message: &'static str,
}

struct Rule {
    category: &'static str,
    severity: Severity,
    message: &'static str,
    matcher: Matcher,
}

enum Matcher {
    Pattern(Regex),
    Phone,
}

const CONTACT_MESSAGE: &str =
    "Please don't share contact details like phone numbers, emails or social handles.";
const LINK_MESSAGE: &str = "Links aren't allowed in posts.";
const SOLICIT_MESSAGE: &str = "Posts can't be used to promote accounts or ask for messages.";
const THREAT_MESSAGE: &str = "This post can't be shared because it contains a threat of violence.";
const DOXX_MESSAGE: &str = "Please don't share anyone's personal or identifying information.";

fn pattern(category: &'static str, severity: Severity, message: &'static str, re: &str) -> Rule {
    Rule {
        category,
        severity,
        message,
        matcher: Matcher::Pattern(Regex::new(re).expect("static regex: moderation rule")),
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        pattern(
            "threat",
            Severity::Critical,
            THREAT_MESSAGE,
            r"(?i)\b(i('ll| will| am going to|'m going to|m gonna|'m gonna)|going to|gonna)\s+(kill|murder|shoot|stab|hurt|bomb)\b",
        ),
        pattern(
            "threat",
            Severity::Critical,
            THREAT_MESSAGE,
            r"(?i)\b(kill|murder|shoot|stab)\s+(you|him|her|them|everyone|all of you)\b",
        ),
        pattern(
            "doxxing",
            Severity::Critical,
            DOXX_MESSAGE,
            r"(?i)\b(social security( number)?|ssn|home address|lives at|passport number)\b",
        ),
        Rule {
            category: "contact_info",
            severity: Severity::High,
            message: CONTACT_MESSAGE,
            matcher: Matcher::Phone,
        },
        pattern(
            "contact_info",
            Severity::High,
            CONTACT_MESSAGE,
            r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b",
        ),
        pattern(
            "contact_info",
            Severity::Medium,
            CONTACT_MESSAGE,
            r"(?i)(^|[\s(])@[a-z0-9_.]{3,30}\b",
        ),
        pattern(
            "link",
            Severity::Medium,
            LINK_MESSAGE,
            r"(?i)(https?://|www\.)\S+|\b[a-z0-9-]{2,}\.(com|net|org|io|xyz|ru|info|biz|co|ly|me|gg)\b",
        ),
        pattern(
            "solicitation",
            Severity::Medium,
            SOLICIT_MESSAGE,
            r"(?i)\b(dm|message|text|call|follow|add|subscribe to)\s+(me|us)\b|\blink in (my )?bio\b|\bcheck out my (page|profile|channel|onlyfans)\b",
        ),
    ]
});

/// Runs of digits and separators that could be a phone number.
static PHONE_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?\(?\d[\d\s().-]{6,20}\d").expect("static regex: phone candidate")
});

/// Calendar dates (2024-01-15, 12/25/2026) blanked out before phone checks.
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{4}[-/.]\d{1,2}[-/.]\d{1,2}\b|\b\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4}\b")
        .expect("static regex: date")
});

fn has_phone_number(text: &str) -> bool {
    let text = DATE.replace_all(text, " ");
    PHONE_CANDIDATE
        .find_iter(&text)
        .any(|m| looks_like_phone(m.as_str().trim()))
}

/// Decide from digit grouping whether a candidate run is a phone number.
fn looks_like_phone(candidate: &str) -> bool {
    let groups: Vec<&str> = candidate
        .split(|c: char| !c.is_ascii_digit())
        .filter(|g| !g.is_empty())
        .collect();
    let digits: usize = groups.iter().map(|g| g.len()).sum();
    if !(8..=15).contains(&digits) {
        return false;
    }
    if candidate.starts_with('+') {
        return true;
    }
    // 10 000 000 style thousands grouping.
    let thousands = groups.len() > 1
        && groups[0].len() <= 3
        && groups[1..].iter().all(|g| g.len() == 3);
    if thousands {
        return false;
    }
    if digits >= 10 {
        return true;
    }
    // Eight or nine digits only as two blocks (2345 6789), and not a span
    // of years (2019-2024).
    let is_year = |g: &&str| g.len() == 4 && (g.starts_with("19") || g.starts_with("20"));
    groups.len() == 2
        && groups.iter().all(|g| (4..=5).contains(&g.len()))
        && !groups.iter().all(is_year)
}

/// Check `text` against every static rule, returning the first hit.
pub fn check(text: &str) -> Option<RuleHit> {
    RULES.iter().find_map(|rule| {
        let fired = match &rule.matcher {
            Matcher::Pattern(re) => re.is_match(text),
            Matcher::Phone => has_phone_number(text),
        };
        fired.then_some(RuleHit {
            category: rule.category,
            severity: rule.severity,
            message: rule.message,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(text: &str) -> Option<&'static str> {
        check(text).map(|h| h.category)
    }

    #[test]
    fn test_contact_info() {
        assert_eq!(category("call 555-123-4567 tonight"), Some("contact_info"));
        assert_eq!(category("ping +44 20 7946 0958"), Some("contact_info"));
        assert_eq!(category("mail me at sam@example.org"), Some("contact_info"));
        assert_eq!(category("find me @sunny_days"), Some("contact_info"));
        assert_eq!(category("text (555) 123-4567"), Some("contact_info"));
        assert_eq!(category("ring 98765 43210"), Some("contact_info"));
        assert_eq!(category("try 2345 6789 after six"), Some("contact_info"));
        assert_eq!(category("my number is 9876543210"), Some("contact_info"));
    }

    #[test]
    fn test_links_and_solicitation() {
        assert_eq!(category("see https://spam.example"), Some("link"));
        assert_eq!(category("great recipe on cookit.io"), Some("link"));
        assert_eq!(category("dm me for details"), Some("solicitation"));
    }

    #[test]
    fn test_threats_are_critical() {
        let hit = check("i will kill you").unwrap();
        assert_eq!(hit.category, "threat");
        assert_eq!(hit.severity, Severity::Critical);
    }

    #[test]
    fn test_ordinary_posts_pass() {
        for text in [
            "ran 5 km in 27 minutes",
            "cooked dinner for my family",
            "killed it at karaoke night",
            "watched the 2024 final again",
            "scored 12-3 in the match",
            "finished my thesis draft on 2024-01-15",
            "booked flights for 12-25-2026",
            "booked flights for 12/25/2026 at 10 30",
            "ran 10 000 000 steps",
            "worked there 2019-2024",
        ] {
            assert_eq!(check(text), None, "false positive on {text:?}");
        }
    }
}
