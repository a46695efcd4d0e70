//! Album JSON endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::helpers::{invalid_index, is_truthy, json_error, parse_index};
use super::super::AppState;
use crate::models::{AlbumKey, AlbumSource, ImageRecord};
use crate::scrapers::ScrapeError;
use crate::services::{AlbumError, AlbumLookup};

/// Query parameters for album lookups.
#[derive(Debug, Deserialize)]
pub struct AlbumParams {
    /// Ignore the cache and scrape again.
    pub refresh: Option<String>,
}

/// Successful album response.
#[derive(Debug, Serialize)]
pub struct AlbumResponse {
    pub model: String,
    pub index: u32,
    pub album: Vec<ImageRecord>,
    pub total: usize,
    pub source: AlbumSource,
}

impl AlbumResponse {
    fn new(key: AlbumKey, album: Vec<ImageRecord>, source: AlbumSource) -> Self {
        Self {
            model: key.model,
            index: key.index,
            total: album.len(),
            album,
            source,
        }
    }
}

/// 404 for a key with no images, with a hint on what to try next.
fn album_not_found(key: &AlbumKey, site: &str, detail: Option<String>) -> Response {
    let mut body = serde_json::json!({
        "error": format!("No images found for {} gallery {}", key.model, key.index),
        "suggestion": format!(
            "Check that '{}' has galleries on {} or try another index. \
             Add ?refresh=true to scrape again.",
            key.model, site
        ),
    });
    if let Some(detail) = detail {
        body["detail"] = serde_json::Value::String(detail);
    }
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

/// Get an album, from the cache or by scraping.
pub async fn get_album(
    State(state): State<AppState>,
    Path((model, raw_index)): Path<(String, String)>,
    Query(params): Query<AlbumParams>,
) -> Response {
    let Some(index) = parse_index(&raw_index) else {
        return invalid_index(&raw_index);
    };
    let key = AlbumKey::new(&model, index);
    if key.model.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "Model name is required");
    }

    let refresh = is_truthy(params.refresh.as_deref());
    match state.albums.lookup(&key, refresh).await {
        Ok(AlbumLookup::Found { records, source }) => {
            Json(AlbumResponse::new(key, records, source)).into_response()
        }
        Ok(AlbumLookup::NotFound { detail }) => {
            album_not_found(&key, &state.albums.site_name(), detail)
        }
        Err(AlbumError::Scrape(ScrapeError::InvalidIndex { index, found })) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": format!(
                    "Index {} is out of range: {} galleries found for {}",
                    index, found, key.model
                ),
                "found": found,
            })),
        )
            .into_response(),
        Err(e) => {
            error!("Album lookup for {} failed: {}", key, e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Remove a cached album.
pub async fn delete_album(
    State(state): State<AppState>,
    Path((model, raw_index)): Path<(String, String)>,
) -> Response {
    let Some(index) = parse_index(&raw_index) else {
        return invalid_index(&raw_index);
    };
    let key = AlbumKey::new(&model, index);

    match state.albums.cache().remove(&key).await {
        Ok(removed) => {
            if removed {
                info!("Removed cache entry for {}", key);
            }
            Json(serde_json::json!({ "removed": removed })).into_response()
        }
        Err(e) => {
            error!("Failed to remove cache entry for {}: {}", key, e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
