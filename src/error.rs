// Request-level error taxonomy.
//
// Internal plumbing (store, cache backends, HTTP clients) returns
// anyhow::Result. Anything that can reach a client is converted into an
// AppError first, so the web layer only ever has one type to render.

use thiserror::Error;

use crate::moderation::verdict::{BlockedBy, Severity};

/// Every failure a request can end in.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or out-of-bounds input.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The body could not be parsed at all.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The caller exhausted its rate-limit window.
    #[error("rate limit exceeded")]
    RateLimitExceeded {
        limit: u32,
        remaining: u32,
        reset_seconds: u64,
    },

    /// The raw body is larger than the configured ceiling.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Content failed the quality gate.
    #[error("quality rejected: {reason}")]
    QualityRejected {
        reason: String,
        quality_score: u8,
        suggestion: String,
    },

    /// Content failed moderation.
    #[error("moderation blocked ({blocked_by}): {reason}")]
    ModerationBlocked {
        blocked_by: BlockedBy,
        severity: Severity,
        reason: String,
        message: String,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    /// A non-critical dependency is down. Raised by `Cache` and absorbed
    /// there; never rendered to a client.
    #[error("dependency degraded: {0}")]
    DependencyDegraded(String),

    /// The primary store (or something equally fatal) failed.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::QualityRejected { .. }
            | AppError::ModerationBlocked { .. } => 400,
            AppError::Unauthorized => 401,
            AppError::NotFound(_) => 404,
            AppError::PayloadTooLarge { .. } => 413,
            AppError::RateLimitExceeded { .. } => 429,
            AppError::DependencyDegraded(_) | AppError::Internal(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::ValidationError("x".into()).status_code(), 400);
        assert_eq!(
            AppError::PayloadTooLarge { size: 20, max: 10 }.status_code(),
            413
        );
        assert_eq!(
            AppError::RateLimitExceeded {
                limit: 1,
                remaining: 0,
                reset_seconds: 5
            }
            .status_code(),
            429
        );
        assert_eq!(AppError::NotFound("post".into()).status_code(), 404);
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("disk on fire")).status_code(),
            500
        );
    }
}
