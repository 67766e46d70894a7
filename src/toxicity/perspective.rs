// Google Perspective API implementation.
//
// Perspective scores comments for toxicity, identity attacks, insults,
// threats and sexual content. One request per submission; the caller
// bounds it with a timeout.
//
// API docs: https://developers.perspectiveapi.com/s/about-the-api-methods

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{ToxicityAttributes, ToxicityResult, ToxicityScorer};

const ENDPOINT: &str = "https://commentanalyzer.googleapis.com/v1alpha1/comments:analyze";

/// Perspective API toxicity scorer.
pub struct PerspectiveScorer {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl PerspectiveScorer {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(api_key, ENDPOINT.to_string())
    }

    /// Point the scorer at a different host (tests, proxies).
    pub fn with_endpoint(api_key: String, endpoint: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            endpoint,
        }
    }
}

#[async_trait]
impl ToxicityScorer for PerspectiveScorer {
    fn name(&self) -> &'static str {
        "perspective"
    }

    async fn score_text(&self, text: &str) -> Result<ToxicityResult> {
        let request = PerspectiveRequest {
            comment: Comment {
                text: text.to_string(),
            },
            requested_attributes: RequestedAttributes::default(),
            languages: vec!["en".to_string()],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .context("Failed to call Perspective API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Perspective API returned {}: {}", status, body);
        }

        let parsed: PerspectiveResponse = response
            .json()
            .await
            .context("Failed to parse Perspective API response")?;

        let result = parsed.into_result();
        debug!(
            toxicity = result.toxicity,
            threat = ?result.attributes.threat,
            identity_attack = ?result.attributes.identity_attack,
            "Perspective scored text"
        );
        Ok(result)
    }
}

// --- Perspective API request/response types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PerspectiveRequest {
    comment: Comment,
    requested_attributes: RequestedAttributes,
    languages: Vec<String>,
}

#[derive(Serialize)]
struct Comment {
    text: String,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RequestedAttributes {
    toxicity: AttributeConfig,
    severe_toxicity: AttributeConfig,
    identity_attack: AttributeConfig,
    insult: AttributeConfig,
    threat: AttributeConfig,
    sexually_explicit: AttributeConfig,
}

#[derive(Serialize, Default)]
struct AttributeConfig {}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PerspectiveResponse {
    attribute_scores: HashMap<String, AttributeScore>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttributeScore {
    summary_score: SummaryScore,
}

#[derive(Deserialize)]
struct SummaryScore {
    value: f64,
}

impl PerspectiveResponse {
    fn score(&self, attribute: &str) -> Option<f64> {
        self.attribute_scores
            .get(attribute)
            .map(|score| score.summary_score.value)
    }

    fn into_result(self) -> ToxicityResult {
        ToxicityResult {
            toxicity: self.score("TOXICITY").unwrap_or(0.0),
            attributes: ToxicityAttributes {
                severe_toxicity: self.score("SEVERE_TOXICITY"),
                identity_attack: self.score("IDENTITY_ATTACK"),
                insult: self.score("INSULT"),
                harassment: None,
                threat: self.score("THREAT"),
                sexual: self.score("SEXUALLY_EXPLICIT"),
                self_harm: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = PerspectiveRequest {
            comment: Comment {
                text: "hello".to_string(),
            },
            requested_attributes: RequestedAttributes::default(),
            languages: vec!["en".to_string()],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["comment"]["text"], "hello");
        assert!(json["requestedAttributes"]["SEVERE_TOXICITY"].is_object());
        assert!(json["requestedAttributes"]["SEXUALLY_EXPLICIT"].is_object());
    }

    #[test]
    fn test_response_mapping() {
        let raw = serde_json::json!({
            "attributeScores": {
                "TOXICITY": {"summaryScore": {"value": 0.82, "type": "PROBABILITY"}},
                "THREAT": {"summaryScore": {"value": 0.91, "type": "PROBABILITY"}}
            },
            "languages": ["en"]
        });
        let parsed: PerspectiveResponse = serde_json::from_value(raw).unwrap();
        let result = parsed.into_result();
        assert!((result.toxicity - 0.82).abs() < 1e-9);
        assert_eq!(result.attributes.threat, Some(0.91));
        assert_eq!(result.attributes.insult, None);
    }
}
