// GitHub search: the developer-repository index source.
//
// Repositories created in the last week, sorted by stars. An optional
// token lifts the anonymous search rate limit.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::traits::{TrendItem, TrendSource};

const ENDPOINT: &str = "https://api.github.com/search/repositories";

pub struct GithubSource {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl GithubSource {
    pub fn new(client: Client, token: Option<String>) -> Self {
        Self {
            client,
            endpoint: ENDPOINT.to_string(),
            token,
        }
    }
}

#[async_trait]
impl TrendSource for GithubSource {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn fetch(&self) -> Result<Vec<TrendItem>> {
        let since = (Utc::now() - Duration::days(7)).format("%Y-%m-%d");
        let query = format!("created:>{since}");
        let mut request = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/vnd.github+json")
            .query(&[
                ("q", query.as_str()),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", "30"),
            ]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("Failed to call GitHub search")?;
        if !response.status().is_success() {
            anyhow::bail!("GitHub search returned {}", response.status());
        }
        let results: SearchResults = response
            .json()
            .await
            .context("Failed to parse GitHub search results")?;
        Ok(parse_results(results, self.name()))
    }
}

#[derive(Deserialize)]
struct SearchResults {
    #[serde(default)]
    items: Vec<Repository>,
}

#[derive(Deserialize)]
struct Repository {
    name: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
}

fn parse_results(results: SearchResults, source: &str) -> Vec<TrendItem> {
    results
        .items
        .into_iter()
        .filter_map(|repo| {
            let sentence = match repo.language {
                Some(lang) => format!("Starred {}, a new {lang} project on GitHub", repo.name),
                None => format!("Starred {}, a new project on GitHub", repo.name),
            };
            TrendItem::new(&sentence, repo.stargazers_count, source)
        })
        .collect()
}
