//! Router configuration for the web server.

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Albums
        .route(
            "/api/album/:model/:index",
            get(handlers::get_album).delete(handlers::delete_album),
        )
        .route("/api/nsfw/:model/:index", get(handlers::nsfw_gallery))
        .route(
            "/api/bulk-download/:model/:index",
            get(handlers::bulk_download),
        )
        .route("/api/cache", get(handlers::list_cache))
        // Downloaded files
        .route("/downloads/:model", get(handlers::list_downloads))
        .route("/downloads/:model/:file", get(handlers::serve_download))
        .route("/static/style.css", get(handlers::serve_css))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
