// Toxicity scoring: trait-based abstraction for swappable providers.
//
// The ToxicityScorer trait defines the interface. OpenAiScorer and
// PerspectiveScorer implement it over HTTP; `scorer_from_config` picks one
// based on RARELY_CLASSIFIER.

pub mod openai;
pub mod perspective;
pub mod traits;

use std::sync::Arc;

use anyhow::Result;

use crate::config::{ClassifierBackend, Config};
use traits::ToxicityScorer;

/// Build the configured classifier, or `None` when the AI stage is off.
pub fn scorer_from_config(config: &Config) -> Result<Option<Arc<dyn ToxicityScorer>>> {
    config.require_classifier()?;
    let scorer: Option<Arc<dyn ToxicityScorer>> = match config.classifier_backend {
        ClassifierBackend::Off => None,
        ClassifierBackend::OpenAi => Some(Arc::new(openai::OpenAiScorer::new(
            config.openai_api_key.clone(),
        ))),
        ClassifierBackend::Perspective => Some(Arc::new(perspective::PerspectiveScorer::new(
            config.perspective_api_key.clone(),
        ))),
    };
    Ok(scorer)
}
