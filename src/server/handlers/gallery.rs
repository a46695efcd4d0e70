//! Inline HTML gallery rendered from the cache.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use super::helpers::parse_index;
use super::super::templates;
use super::super::AppState;
use crate::models::AlbumKey;

/// Render a cached album. Never scrapes.
pub async fn nsfw_gallery(
    State(state): State<AppState>,
    Path((model, raw_index)): Path<(String, String)>,
) -> Response {
    let Some(index) = parse_index(&raw_index) else {
        return (
            StatusCode::BAD_REQUEST,
            Html(templates::message_page(
                "Bad Request",
                &format!("Invalid index '{}': must be a positive integer", raw_index),
            )),
        )
            .into_response();
    };
    let key = AlbumKey::new(&model, index);

    match state.albums.cache().get(&key).await {
        Some(records) if !records.is_empty() => {
            Html(templates::gallery_page(&key, &records)).into_response()
        }
        _ => (
            StatusCode::NOT_FOUND,
            Html(templates::message_page(
                "Not Found",
                &format!(
                    "No cached album for {} gallery {}. Load /api/album/{}/{} first.",
                    key.model, key.index, key.model, key.index
                ),
            )),
        )
            .into_response(),
    }
}
