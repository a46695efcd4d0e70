//! Service-level API handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use super::helpers::json_error;
use super::super::AppState;

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// List every cache entry.
pub async fn list_cache(State(state): State<AppState>) -> impl IntoResponse {
    match state.albums.cache().entries().await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => {
            tracing::error!("Failed to list cache: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
