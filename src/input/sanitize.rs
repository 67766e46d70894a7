// Content and location normalization.
//
// Content is stored as plain text: entities are decoded, leftover tags are
// stripped, control characters removed and whitespace collapsed. Escaping
// for display is the renderer's job.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Longest location component we keep, in characters.
pub const MAX_LOCATION_CHARS: usize = 100;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<>]{0,200}>").expect("static regex: tag"));

/// Decode the handful of HTML entities browsers and copy-paste produce.
/// Unknown entities are left as written.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').filter(|&end| end <= 10) {
            Some(end) => match decode_entity(&tail[1..end]) {
                Some(ch) => {
                    out.push(ch);
                    rest = &tail[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = &tail[1..];
                }
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
/// Control characters are dropped on the way.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else if ch.is_control() {
            continue;
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}

/// Final normalization applied once, after every check has passed.
pub fn sanitize_content(text: &str) -> String {
    let decoded = decode_entities(text);
    let untagged = TAG.replace_all(&decoded, " ");
    collapse_whitespace(&untagged)
}

/// Trim, strip control characters and cap a location component.
/// Empty values become `None`. No geocoding happens here.
pub fn sanitize_location(value: Option<&str>) -> Option<String> {
    let raw = value?;
    let untagged = TAG.replace_all(raw, " ");
    let cleaned: String = collapse_whitespace(&untagged)
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '`'))
        .take(MAX_LOCATION_CHARS)
        .collect();
    let cleaned = cleaned.trim().to_string();
    (!cleaned.is_empty()).then_some(cleaned)
}
