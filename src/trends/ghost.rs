// Ghost posts: trend items dressed up as feed entries.
//
// Never persisted, never scored, never reactable. They carry a display key
// instead of an id so there's nothing to react to or claim ownership of.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::traits::TrendItem;
use crate::scoring::fingerprint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GhostPost {
    /// Stable per-content key for client-side lists. Not a post id.
    pub key: String,
    pub content: String,
    pub estimated_count: u64,
    pub source: String,
    pub is_ghost: bool,
    pub reactable: bool,
    pub created_at: String,
}

impl GhostPost {
    pub fn from_item(item: &TrendItem, now: DateTime<Utc>) -> Self {
        Self {
            key: format!("ghost-{}", &fingerprint(&item.content)[..12]),
            content: item.content.clone(),
            estimated_count: item.estimated_count,
            source: item.source.clone(),
            is_ghost: true,
            reactable: false,
            created_at: now.to_rfc3339(),
        }
    }
}
