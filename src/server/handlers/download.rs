//! Bulk download endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use super::helpers::{invalid_index, json_error, parse_index};
use super::super::AppState;
use crate::models::AlbumKey;

/// Download every cached image of an album to the downloads directory.
pub async fn bulk_download(
    State(state): State<AppState>,
    Path((model, raw_index)): Path<(String, String)>,
) -> Response {
    let Some(index) = parse_index(&raw_index) else {
        return invalid_index(&raw_index);
    };
    let key = AlbumKey::new(&model, index);

    let records = match state.albums.cache().get(&key).await {
        Some(records) if !records.is_empty() => records,
        _ => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "error": format!("No cached album for {} gallery {}", key.model, key.index),
                    "suggestion": format!(
                        "Fetch /api/album/{}/{} first",
                        urlencoding::encode(&key.model),
                        key.index
                    ),
                })),
            )
                .into_response();
        }
    };

    match state.downloader.download_album(&key, &records).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            error!("Bulk download for {} failed: {}", key, e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
