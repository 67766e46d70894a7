// Google Trends daily RSS: the generic-search-trends source.
//
// The feed is small RSS with an `ht:approx_traffic` element per item
// ("200,000+"). Pulled apart with regexes rather than a full XML parser.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex_lite::Regex;
use reqwest::Client;

use super::traits::{TrendItem, TrendSource};
use crate::input::decode_entities;

const ENDPOINT: &str = "https://trends.google.com/trending/rss?geo=US";

static ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<item>(.*?)</item>").expect("static regex: rss item"));
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<title>(.*?)</title>").expect("static regex: rss title"));
static TRAFFIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<ht:approx_traffic>([\d,.]+)\+?</ht:approx_traffic>")
        .expect("static regex: rss traffic")
});

pub struct GoogleTrendsSource {
    client: Client,
    endpoint: String,
}

impl GoogleTrendsSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            endpoint: ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl TrendSource for GoogleTrendsSource {
    fn name(&self) -> &'static str {
        "google_trends"
    }

    async fn fetch(&self) -> Result<Vec<TrendItem>> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .context("Failed to call Google Trends")?;
        if !response.status().is_success() {
            anyhow::bail!("Google Trends returned {}", response.status());
        }
        let body = response
            .text()
            .await
            .context("Failed to read Google Trends feed")?;
        Ok(parse_feed(&body, self.name()))
    }
}

fn strip_cdata(text: &str) -> &str {
    text.trim()
        .strip_prefix("<![CDATA[")
        .and_then(|t| t.strip_suffix("]]>"))
        .unwrap_or(text.trim())
}

fn parse_feed(body: &str, source: &str) -> Vec<TrendItem> {
    ITEM.captures_iter(body)
        .filter_map(|item| {
            let block = item.get(1)?.as_str();
            let title = TITLE.captures(block)?.get(1)?.as_str();
            let title = decode_entities(strip_cdata(title));
            let traffic = TRAFFIC
                .captures(block)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().replace([',', '.'], "").parse::<u64>().ok())
                .unwrap_or(0);
            TrendItem::new(&format!("Searched for {title}"), traffic, source)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feed() {
        let body = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:ht="https://trends.google.com/trending/rss">
  <channel>
    <title>Daily Search Trends</title>
    <item>
      <title>solar eclipse</title>
      <ht:approx_traffic>200,000+</ht:approx_traffic>
    </item>
    <item>
      <title><![CDATA[Mac &amp; Cheese day]]></title>
    </item>
  </channel>
</rss>"#;
        let items = parse_feed(body, "google_trends");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].content, "Searched for solar eclipse");
        assert_eq!(items[0].estimated_count, 200_000);
        assert_eq!(items[1].content, "Searched for Mac & Cheese day");
        assert_eq!(items[1].estimated_count, 0);
    }
}
