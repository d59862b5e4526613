//! Recommendation Errors
//!
//! Three failure classes surface from a recommendation call:
//! - `InvalidInput`: the request is missing a field or carries a value that is not a number
//! - `UnknownCategory`: a categorical value was never seen at training time
//! - `Internal`: everything else (classifier unavailable, artifact mismatch, task failure)

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("unknown {field} '{value}'; expected one of: {}", .known.join(", "))]
    UnknownCategory {
        field: String,
        value: String,
        known: Vec<String>,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RecommendError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        RecommendError::InvalidInput(message.into())
    }

    /// True for failures caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RecommendError::InvalidInput(_) | RecommendError::UnknownCategory { .. }
        )
    }
}
