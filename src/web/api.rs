// src/web/api.rs
// HTTP handlers for the query endpoints

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::debug;

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::error::QueryError;
use crate::store::QueryRecord;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// Unpack the body, answering 400 when it is not `{question: string}`
fn read_question(body: Result<Json<AskRequest>, JsonRejection>) -> ApiResult<String> {
    match body {
        Ok(Json(req)) => Ok(req.question),
        Err(rejection) => {
            debug!(error = %rejection, "Unreadable request body");
            Err(ApiError::bad_request("Invalid request data").with_error(rejection.body_text()))
        }
    }
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn create_query(
    State(state): State<AppState>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> ApiResult<Json<QueryRecord>> {
    let question = read_question(body)?;
    let record = state.pipeline.answer(&question).await?;
    Ok(Json(record))
}

pub async fn create_structured_query(
    State(state): State<AppState>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> ApiResult<Json<QueryRecord>> {
    let question = read_question(body)?;
    let record = state.pipeline.answer_structured(&question).await?;
    Ok(Json(record))
}

pub async fn list_queries(State(state): State<AppState>) -> ApiResult<Json<Vec<QueryRecord>>> {
    let records = state.store().list().await?;
    Ok(Json(records))
}

pub async fn get_query(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<QueryRecord>> {
    state
        .store()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| QueryError::NotFound(id).into())
}
