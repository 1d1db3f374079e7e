// src/web/error.rs
// Mapping pipeline errors to HTTP responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use tracing::{error, warn};

use crate::error::QueryError;
use crate::pipeline::Stage;

/// Error body: `{message, error?}`
#[derive(Debug)]
pub struct ApiError {
    pub status_code: StatusCode,
    pub message: String,
    /// Server-side cause, included on 5xx responses when known
    pub error: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::BAD_REQUEST,
            message: message.into(),
            error: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::NOT_FOUND,
            message: message.into(),
            error: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        if err.is_client_error() {
            warn!(error = %err, "Rejected request");
        } else {
            error!(error = %err, "Request failed");
        }

        match err {
            QueryError::Validation(message) => Self::bad_request(message),
            QueryError::NotFound(what) => Self::not_found(format!("Query not found: {}", what)),
            QueryError::Upstream { stage, detail } => {
                let message = match stage {
                    Stage::Classifying => "Error checking query type",
                    _ => "Error calling external service",
                };
                Self::internal(message).with_error(detail)
            }
            QueryError::Execution(detail) => Self::internal("Error executing query").with_error(detail),
            QueryError::Timeout(stage) => {
                Self::internal("External service timed out").with_error(format!("{} timed out", stage))
            }
            QueryError::Config(detail) => Self::internal("Service is not configured").with_error(detail),
            _ => Self::internal("Internal server error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "message": self.message });
        if let Some(error) = self.error {
            body["error"] = json!(error);
        }
        (self.status_code, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
