//! Static file serving handlers.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};

use super::super::assets;
use super::super::templates;
use super::super::AppState;
use crate::models::AlbumKey;

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "File not found").into_response()
}

/// List the files downloaded for a model.
pub async fn list_downloads(State(state): State<AppState>, Path(model): Path<String>) -> Response {
    let key = AlbumKey::new(&model, 0);
    let dir = state.downloads_dir.join(key.slug());

    let mut read_dir = match tokio::fs::read_dir(&dir).await {
        Ok(rd) => rd,
        Err(_) => {
            return (
                StatusCode::NOT_FOUND,
                Html(templates::message_page(
                    "Not Found",
                    &format!("Nothing downloaded for {} yet", key.model),
                )),
            )
                .into_response();
        }
    };

    let mut files = Vec::new();
    while let Ok(Some(entry)) = read_dir.next_entry().await {
        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        if meta.is_file() {
            files.push((entry.file_name().to_string_lossy().into_owned(), meta.len()));
        }
    }
    files.sort();

    Html(templates::download_listing(&key.model, &files)).into_response()
}

/// Serve one downloaded file.
pub async fn serve_download(
    State(state): State<AppState>,
    Path((model, file)): Path<(String, String)>,
) -> Response {
    if file.contains("..") || file.contains('/') || file.contains('\\') {
        return not_found();
    }

    let model_dir = state.downloads_dir.join(AlbumKey::new(&model, 0).slug());
    let canonical_dir = match model_dir.canonicalize() {
        Ok(p) => p,
        Err(_) => return not_found(),
    };

    let canonical_file = match canonical_dir.join(&file).canonicalize() {
        Ok(p) => p,
        Err(_) => return not_found(),
    };

    if !canonical_file.starts_with(&canonical_dir) {
        return not_found();
    }

    let content = match tokio::fs::read(&canonical_file).await {
        Ok(c) => c,
        Err(_) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").into_response();
        }
    };

    let mime = mime_guess::from_path(&canonical_file)
        .first_or_octet_stream()
        .to_string();

    ([(header::CONTENT_TYPE, mime)], content).into_response()
}

/// Serve CSS.
pub async fn serve_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], assets::CSS)
}
