// src/web/mod.rs
// HTTP layer for QueryGenius

pub mod api;
pub mod error;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Create the web server router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .route("/queries", get(api::list_queries).post(api::create_query))
        .route("/queries/{id}", get(api::get_query))
        .route("/structured-queries", post(api::create_structured_query))
        .with_state(state);

    Router::new()
        .route("/health", get(api::health))
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
