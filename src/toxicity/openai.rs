// OpenAI moderation endpoint implementation.
//
// The moderation model returns per-category probabilities. We fold the
// sub-categories ("hate/threatening", "violence/graphic", ...) into the
// attribute set shared with the other providers.
//
// API docs: https://platform.openai.com/docs/api-reference/moderations

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{ToxicityAttributes, ToxicityResult, ToxicityScorer};

const ENDPOINT: &str = "https://api.openai.com/v1/moderations";
const MODEL: &str = "omni-moderation-latest";

pub struct OpenAiScorer {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl OpenAiScorer {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(api_key, ENDPOINT.to_string())
    }

    pub fn with_endpoint(api_key: String, endpoint: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            endpoint,
        }
    }
}

#[async_trait]
impl ToxicityScorer for OpenAiScorer {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn score_text(&self, text: &str) -> Result<ToxicityResult> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&ModerationRequest { model: MODEL, input: text })
            .send()
            .await
            .context("Failed to call OpenAI moderation API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI moderation API returned {}: {}", status, body);
        }

        let parsed: ModerationResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI moderation response")?;

        let first = parsed
            .results
            .into_iter()
            .next()
            .context("OpenAI moderation response had no results")?;

        let flagged = first.flagged;
        let result = first.into_result();
        debug!(flagged, toxicity = result.toxicity, "OpenAI scored text");
        Ok(result)
    }
}

#[derive(Serialize)]
struct ModerationRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationResult>,
}

#[derive(Deserialize)]
struct ModerationResult {
    #[serde(default)]
    flagged: bool,
    #[serde(default)]
    category_scores: HashMap<String, f64>,
}

impl ModerationResult {
    fn max_of(&self, keys: &[&str]) -> Option<f64> {
        keys.iter()
            .filter_map(|k| self.category_scores.get(*k).copied())
            .reduce(f64::max)
    }

    fn into_result(self) -> ToxicityResult {
        let attributes = ToxicityAttributes {
            severe_toxicity: self.max_of(&["hate/threatening", "violence/graphic", "sexual/minors"]),
            identity_attack: self.max_of(&["hate", "hate/threatening"]),
            insult: None,
            harassment: self.max_of(&["harassment"]),
            threat: self.max_of(&["violence", "harassment/threatening", "hate/threatening"]),
            sexual: self.max_of(&["sexual", "sexual/minors"]),
            self_harm: self.max_of(&["self-harm", "self-harm/intent", "self-harm/instructions"]),
        };
        // Overall toxicity is the strongest signal the model reported.
        let toxicity = self
            .category_scores
            .values()
            .copied()
            .fold(0.0, f64::max);
        ToxicityResult { toxicity, attributes }
    }
}
