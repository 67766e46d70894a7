// Injection screens: SQL and markup patterns that have no business in a
// one-line "what I did today" post.
//
// The store only ever sees parameterized queries and the renderer escapes
// output, so these are a second layer. Matches are never echoed back to
// the client.

use std::sync::LazyLock;

use regex_lite::Regex;

/// What kind of injection a screen looks for. Only used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionKind {
    Sql,
    Markup,
}

struct Screen {
    pattern: Regex,
    kind: InjectionKind,
    label: &'static str,
}

static SCREENS: LazyLock<Vec<Screen>> = LazyLock::new(|| {
    vec![
        // SQL
        Screen {
            pattern: Regex::new(r"(?i)\bunion\s+(all\s+)?select\b")
                .expect("static regex: union select"),
            kind: InjectionKind::Sql,
            label: "union select",
        },
        Screen {
            pattern: Regex::new(r"(?i)\b(drop|truncate|alter)\s+(table|database|schema)\b")
                .expect("static regex: ddl"),
            kind: InjectionKind::Sql,
            label: "ddl statement",
        },
        Screen {
            pattern: Regex::new(r"(?i)\b(insert\s+into|delete\s+from)\s+\w+\s*(\(|values|where)")
                .expect("static regex: dml"),
            kind: InjectionKind::Sql,
            label: "dml statement",
        },
        Screen {
            pattern: Regex::new(r#"(?i)['"]\s*(or|and)\s+['"]?\w+['"]?\s*=\s*['"]?\w+"#)
                .expect("static regex: tautology"),
            kind: InjectionKind::Sql,
            label: "quoted tautology",
        },
        Screen {
            pattern: Regex::new(r"(;\s*--|/\*.*\*/|\bxp_cmdshell\b|\bsleep\s*\(\s*\d+\s*\))")
                .expect("static regex: sql comment/exec"),
            kind: InjectionKind::Sql,
            label: "comment or exec",
        },
        // Markup / script
        Screen {
            pattern: Regex::new(r"(?i)<\s*/?\s*(script|iframe|object|embed|svg|img|style|link|meta)\b")
                .expect("static regex: dangerous tag"),
            kind: InjectionKind::Markup,
            label: "dangerous tag",
        },
        Screen {
            pattern: Regex::new(r"(?i)\b(javascript|vbscript)\s*:").expect("static regex: js uri"),
            kind: InjectionKind::Markup,
            label: "script uri",
        },
        Screen {
            pattern: Regex::new(r"(?i)\bon[a-z]{3,15}\s*=").expect("static regex: handler"),
            kind: InjectionKind::Markup,
            label: "event handler attribute",
        },
        Screen {
            pattern: Regex::new(r"(?i)\bdata\s*:\s*text/html").expect("static regex: data uri"),
            kind: InjectionKind::Markup,
            label: "html data uri",
        },
    ]
});

/// Return the first injection screen `text` trips, if any.
pub fn detect_injection(text: &str) -> Option<(InjectionKind, &'static str)> {
    SCREENS
        .iter()
        .find(|s| s.pattern.is_match(text))
        .map(|s| (s.kind, s.label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_sql() {
        assert_eq!(
            detect_injection("1 UNION SELECT password FROM users").map(|d| d.0),
            Some(InjectionKind::Sql)
        );
        assert!(detect_injection("'; DROP TABLE posts; --").is_some());
        assert!(detect_injection("admin' OR '1'='1").is_some());
    }

    #[test]
    fn test_detects_markup() {
        assert_eq!(
            detect_injection("<script>alert(1)</script>").map(|d| d.0),
            Some(InjectionKind::Markup)
        );
        assert!(detect_injection("<img src=x onerror=alert(1)>").is_some());
        assert!(detect_injection("click javascript:void(0)").is_some());
    }

    #[test]
    fn test_plain_sentences_pass() {
        for text in [
            "selected a gift from the store for my sister",
            "deleted old photos from my phone",
            "dropped my kids at school and went running",
            "finished the union paperwork at work",
            "went on a long walk",
        ] {
            assert!(detect_injection(text).is_none(), "false positive on {text:?}");
        }
    }
}
