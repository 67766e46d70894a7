// Reddit r/popular: the social-link aggregator source.
//
// Uses the public JSON listing. Each post becomes "Read about <title> on
// r/<subreddit>", counted by its score.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::traits::{TrendItem, TrendSource};
use crate::input::decode_entities;

const ENDPOINT: &str = "https://www.reddit.com/r/popular.json?limit=50";

pub struct RedditSource {
    client: Client,
    endpoint: String,
}

impl RedditSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            endpoint: ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl TrendSource for RedditSource {
    fn name(&self) -> &'static str {
        "reddit"
    }

    async fn fetch(&self) -> Result<Vec<TrendItem>> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .context("Failed to call Reddit")?;
        if !response.status().is_success() {
            anyhow::bail!("Reddit returned {}", response.status());
        }
        let listing: Listing = response
            .json()
            .await
            .context("Failed to parse Reddit listing")?;
        Ok(parse_listing(listing, self.name()))
    }
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Deserialize)]
struct Child {
    data: RedditPost,
}

#[derive(Deserialize)]
struct RedditPost {
    title: String,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    over_18: bool,
    #[serde(default)]
    stickied: bool,
}

fn parse_listing(listing: Listing, source: &str) -> Vec<TrendItem> {
    listing
        .data
        .children
        .into_iter()
        .map(|c| c.data)
        .filter(|p| !p.over_18 && !p.stickied)
        .filter_map(|p| {
            let title = decode_entities(p.title.trim());
            let sentence = if p.subreddit.is_empty() {
                format!("Read about {title}")
            } else {
                format!("Read about {title} on r/{}", p.subreddit)
            };
            TrendItem::new(&sentence, p.score.max(0) as u64, source)
        })
        .collect()
}
