// src/error.rs
// Error types for the query pipeline

use thiserror::Error;

use crate::pipeline::Stage;

/// Main error type for the QueryGenius library
#[derive(Error, Debug)]
pub enum QueryError {
    /// Question rejected before entering the pipeline
    #[error("{0}")]
    Validation(String),

    /// Reasoning service or data endpoint answered with a non-success status,
    /// or could not be reached at all
    #[error("{stage} upstream error: {detail}")]
    Upstream { stage: Stage, detail: String },

    /// Backend failed to run a generated artifact
    #[error("execution error: {0}")]
    Execution(String),

    /// Stage exceeded its time budget
    #[error("{0} timed out")]
    Timeout(Stage),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Convenience type alias for Result using QueryError
pub type Result<T> = std::result::Result<T, QueryError>;

impl QueryError {
    pub fn upstream(stage: Stage, detail: impl Into<String>) -> Self {
        QueryError::Upstream {
            stage,
            detail: detail.into(),
        }
    }

    /// Whether the caller caused this error (as opposed to a backend or service)
    pub fn is_client_error(&self) -> bool {
        matches!(self, QueryError::Validation(_) | QueryError::NotFound(_))
    }
}
