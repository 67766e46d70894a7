// Moderation verdicts.

use std::fmt;

use serde::Serialize;

use crate::error::AppError;

/// Which stage blocked the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockedBy {
    Static,
    Ai,
}

impl fmt::Display for BlockedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockedBy::Static => write!(f, "static"),
            BlockedBy::Ai => write!(f, "ai"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Outcome of moderation. Consumers have to handle both arms.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ModerationVerdict {
    Allowed,
    #[serde(rename_all = "camelCase")]
    Blocked {
        blocked_by: BlockedBy,
        severity: Severity,
        /// Category that fired, e.g. "contact_info" or "threat".
        reason: String,
        /// Copy shown to the writer.
        message: String,
    },
}

impl ModerationVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ModerationVerdict::Allowed)
    }

    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            ModerationVerdict::Allowed => Ok(()),
            ModerationVerdict::Blocked {
                blocked_by,
                severity,
                reason,
                message,
            } => Err(AppError::ModerationBlocked {
                blocked_by,
                severity,
                reason,
                message,
            }),
        }
    }
}
