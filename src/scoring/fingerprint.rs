// Content fingerprints.
//
// Two submissions are "the same action" when their normalized text is
// identical. Normalization lower-cases, drops punctuation and collapses
// whitespace; the fingerprint is the SHA-256 of the result.

use sha2::{Digest, Sha256};

/// Lower-case, strip punctuation and collapse whitespace.
pub fn normalize(content: &str) -> String {
    let stripped: String = content
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Hex-encoded SHA-256 of the normalized content (64 characters).
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(content).as_bytes());
    hex::encode(hasher.finalize())
}
