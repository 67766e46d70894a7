// Trend source trait.
//
// A source fetches one external feed and normalizes it into TrendItems.
// Sources don't retry or time themselves out; the aggregator does both and
// treats any error as "this source contributed nothing".

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::input::sanitize::collapse_whitespace;

/// Longest ghost sentence we keep, in characters.
pub const MAX_CONTENT_CHARS: usize = 140;

/// One normalized trending item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendItem {
    /// A short human sentence ("Searched for the eclipse").
    pub content: String,
    /// Rough number of people behind the trend (upvotes, stars, searches).
    pub estimated_count: u64,
    pub source: String,
}

impl TrendItem {
    /// Build an item, collapsing whitespace and capping the sentence length.
    /// Returns `None` when nothing readable is left.
    pub fn new(content: &str, estimated_count: u64, source: &str) -> Option<Self> {
        let cleaned = collapse_whitespace(content);
        if cleaned.chars().count() < 3 {
            return None;
        }
        let content = if cleaned.chars().count() > MAX_CONTENT_CHARS {
            let cut: String = cleaned.chars().take(MAX_CONTENT_CHARS - 3).collect();
            format!("{}...", cut.trim_end())
        } else {
            cleaned
        };
        Some(Self {
            content,
            estimated_count,
            source: source.to_string(),
        })
    }
}

#[async_trait]
pub trait TrendSource: Send + Sync {
    /// Stable identifier, also used as `TrendItem::source`.
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Result<Vec<TrendItem>>;
}
