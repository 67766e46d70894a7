// InputGate: turns an untrusted request body into a ValidatedSubmission.
//
// Checks run in a fixed order and stop at the first failure:
//   1. raw body size
//   2. JSON parse
//   3. content length (characters, trimmed)
//   4. SQL / markup injection screens
//   5. inputType and scope against their closed sets
//   6. location sanitation
//   7. content sanitation
//
// Sanitation runs last so the screens see what the client actually sent.

pub mod patterns;
pub mod sanitize;

use serde::Deserialize;
use tracing::debug;

use crate::db::models::{InputType, Location, Scope};
use crate::error::AppError;

pub use patterns::{detect_injection, InjectionKind};
pub use sanitize::{decode_entities, sanitize_content, sanitize_location};

pub const MIN_CONTENT_CHARS: usize = 3;
pub const MAX_CONTENT_CHARS: usize = 500;

/// The write endpoint's body as it arrives. Enum fields are still strings
/// so that an unknown value is a validation error, not a parse error.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubmission {
    pub content: String,
    pub input_type: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub location_city: Option<String>,
    #[serde(default)]
    pub location_state: Option<String>,
    #[serde(default)]
    pub location_country: Option<String>,
}

/// A submission that passed every structural check. `content` is sanitized.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub content: String,
    pub input_type: InputType,
    pub scope: Scope,
    pub location: Location,
}

/// Run the full gate over a raw request body.
pub fn validate_body(body: &[u8], max_payload_bytes: usize) -> Result<ValidatedSubmission, AppError> {
    if body.len() > max_payload_bytes {
        return Err(AppError::PayloadTooLarge {
            size: body.len(),
            max: max_payload_bytes,
        });
    }

    let raw: RawSubmission = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?;

    validate_submission(raw)
}

/// Steps 3 to 7 over an already-parsed body.
pub fn validate_submission(raw: RawSubmission) -> Result<ValidatedSubmission, AppError> {
    let length = raw.content.trim().chars().count();
    if length < MIN_CONTENT_CHARS {
        return Err(AppError::ValidationError(format!(
            "Content must be at least {MIN_CONTENT_CHARS} characters"
        )));
    }
    if length > MAX_CONTENT_CHARS {
        return Err(AppError::ValidationError(format!(
            "Content must be at most {MAX_CONTENT_CHARS} characters"
        )));
    }

    // Screen both the raw text and its entity-decoded form, so
    // "&lt;script&gt;" can't slip past the markup screens.
    let decoded = decode_entities(&raw.content);
    let hit = detect_injection(&raw.content).or_else(|| detect_injection(&decoded));
    if let Some((kind, label)) = hit {
        debug!(?kind, label, "Submission tripped an injection screen");
        return Err(AppError::ValidationError(
            "Content contains invalid characters or patterns".to_string(),
        ));
    }

    let input_type: InputType = raw
        .input_type
        .parse()
        .map_err(|_| AppError::ValidationError("inputType must be 'action' or 'day_summary'".to_string()))?;

    let scope: Scope = match raw.scope.as_deref() {
        None | Some("") => Scope::World,
        Some(s) => s.parse().map_err(|_| {
            AppError::ValidationError(
                "scope must be one of 'city', 'state', 'country' or 'world'".to_string(),
            )
        })?,
    };

    let location = Location {
        city: sanitize_location(raw.location_city.as_deref()),
        state: sanitize_location(raw.location_state.as_deref()),
        country: sanitize_location(raw.location_country.as_deref()),
    };

    let content = sanitize_content(&raw.content);
    if content.chars().count() < MIN_CONTENT_CHARS {
        return Err(AppError::ValidationError(format!(
            "Content must be at least {MIN_CONTENT_CHARS} characters"
        )));
    }

    Ok(ValidatedSubmission {
        content,
        input_type,
        scope,
        location,
    })
}
