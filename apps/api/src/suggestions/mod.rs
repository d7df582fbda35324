// Community edits: non-admin writes are queued as suggestions and applied
// only when an admin approves them.

pub mod handlers;
pub mod moderation;
pub mod workflow;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// `Pending -> Approved | Rejected`; both resolutions are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Approved => "approved",
            SuggestionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(SuggestionStatus::Pending),
            "approved" => Ok(SuggestionStatus::Approved),
            "rejected" => Ok(SuggestionStatus::Rejected),
            other => Err(AppError::invalid(
                "status",
                format!("Unknown suggestion status '{other}'"),
            )),
        }
    }

    /// Errors unless the suggestion can still be edited or resolved.
    pub fn ensure_pending(&self, id: i64) -> Result<(), AppError> {
        match self {
            SuggestionStatus::Pending => Ok(()),
            resolved => Err(AppError::BadRequest(format!(
                "Suggestion {id} is already {}",
                resolved.as_str()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_is_open() {
        assert!(SuggestionStatus::Pending.ensure_pending(1).is_ok());
        assert!(SuggestionStatus::Approved.ensure_pending(1).is_err());
        assert!(SuggestionStatus::Rejected.ensure_pending(1).is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(SuggestionStatus::parse(" Approved ").unwrap(), SuggestionStatus::Approved);
        assert!(SuggestionStatus::parse("reopened").is_err());
    }
}
