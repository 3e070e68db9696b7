use thiserror::Error;

use crate::draft::Lifecycle;

#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: Lifecycle,
        to: Lifecycle,
        reason: String,
    },

    #[error("question index {index} out of range (draft has {total} questions)")]
    QuestionOutOfRange { index: usize, total: usize },

    #[error("invalid area key: {0}")]
    InvalidAreaKey(String),

    #[error("invalid suggestion level: {0}")]
    InvalidSuggestionLevel(String),
}

pub type Result<T> = std::result::Result<T, DecisionError>;
