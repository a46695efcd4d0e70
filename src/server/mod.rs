//! Web server exposing scraped albums.
//!
//! - `/api/album/:model/:index`: JSON album, cached or freshly scraped
//! - `/api/nsfw/:model/:index`: HTML gallery from the cache
//! - `/api/bulk-download/:model/:index`: download a cached album to disk
//! - `/downloads/:model`: browse downloaded files

mod assets;
mod handlers;
mod routes;
mod templates;

pub use routes::create_router;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::config::Settings;
use crate::scrapers::{BrowserLoaderFactory, LoaderFactory};
use crate::services::{AlbumService, BulkDownloader};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub albums: Arc<AlbumService>,
    pub downloader: Arc<BulkDownloader>,
    pub downloads_dir: PathBuf,
}

impl AppState {
    /// State backed by a real browser.
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let loader = Arc::new(BrowserLoaderFactory::new(
            settings.browser_config(),
            settings.scrape.clone(),
        ));
        Self::with_loader(settings, loader)
    }

    /// State with a custom page loader.
    pub fn with_loader(settings: &Settings, loader: Arc<dyn LoaderFactory>) -> anyhow::Result<Self> {
        let downloader = BulkDownloader::new(settings.download_config())?;
        Ok(Self {
            albums: Arc::new(AlbumService::from_settings(settings, loader)),
            downloader: Arc::new(downloader),
            downloads_dir: settings.downloads_dir.clone(),
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    settings
        .ensure_directories()
        .context("Failed to prepare data directories")?;
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", host, port))?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;
    use tower::ServiceExt;

    use crate::models::{AlbumKey, ImageRecord};
    use crate::storage::AlbumCache;
    use crate::scrapers::album::tests::{
        fast_scrape, test_site, FakeLoaderFactory, GALLERY_TWO_HTML, SEARCH_HTML, SEARCH_URL,
    };

    struct TestApp {
        app: axum::Router,
        factory: Arc<FakeLoaderFactory>,
        settings: Settings,
        _dir: tempfile::TempDir,
    }

    fn setup_test_app(pages: &[(&str, &str)]) -> TestApp {
        let dir = tempdir().unwrap();
        let mut settings = Settings::with_data_dir(dir.path().to_path_buf());
        settings.site = test_site();
        settings.scrape = fast_scrape();
        settings.ensure_directories().unwrap();

        let factory = Arc::new(FakeLoaderFactory::with_pages(pages));
        let state = AppState::with_loader(&settings, factory.clone()).unwrap();

        TestApp {
            app: create_router(state),
            factory,
            settings,
            _dir: dir,
        }
    }

    const FULL_SITE: &[(&str, &str)] = &[
        (SEARCH_URL, SEARCH_HTML),
        ("https://gallery.test/gallery/two", GALLERY_TWO_HTML),
    ];

    async fn send(app: &axum::Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = send(app, "GET", uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn opened(t: &TestApp) -> usize {
        t.factory.opened.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_health() {
        let t = setup_test_app(&[]);
        let (status, _) = send(&t.app, "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_album_scrapes_then_serves_cache() {
        let t = setup_test_app(FULL_SITE);

        let (status, json) = get_json(&t.app, "/api/album/Jane/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["model"], "jane");
        assert_eq!(json["index"], 2);
        assert_eq!(json["total"], 2);
        assert_eq!(json["source"], "gallery.test");
        assert_eq!(json["album"][0]["id"], 1);
        assert_eq!(json["album"][0]["thumb"], json["album"][0]["url"]);

        let (status, json) = get_json(&t.app, "/api/album/jane/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "cache");
        assert_eq!(json["total"], 2);
        assert_eq!(opened(&t), 1);
    }

    #[tokio::test]
    async fn test_album_refresh_rescrapes() {
        let t = setup_test_app(FULL_SITE);

        get_json(&t.app, "/api/album/jane/2").await;
        let (status, json) = get_json(&t.app, "/api/album/jane/2?refresh=true").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "gallery.test");
        assert_eq!(opened(&t), 2);
    }

    #[tokio::test]
    async fn test_album_rejects_bad_index() {
        let t = setup_test_app(&[]);
        for uri in ["/api/album/jane/0", "/api/album/jane/abc", "/api/album/jane/-3"] {
            let (status, json) = get_json(&t.app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(json["error"].is_string());
        }
        assert_eq!(opened(&t), 0);
    }

    #[tokio::test]
    async fn test_album_index_beyond_links_is_400_and_not_cached() {
        let t = setup_test_app(&[(SEARCH_URL, SEARCH_HTML)]);

        let (status, json) = get_json(&t.app, "/api/album/jane/5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["found"], 2);

        let cache = AlbumCache::new(t.settings.cache_dir.clone());
        assert!(cache.get(&AlbumKey::new("jane", 5)).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_result_is_cached_as_negative() {
        let t = setup_test_app(&[]);

        let (status, json) = get_json(&t.app, "/api/album/jane/1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].is_string());
        assert!(json["suggestion"].is_string());
        let attempts = opened(&t);
        assert_eq!(attempts, 2);

        let (status, json) = get_json(&t.app, "/api/album/jane/1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["suggestion"].is_string());
        assert_eq!(opened(&t), attempts);

        let cache = AlbumCache::new(t.settings.cache_dir.clone());
        assert_eq!(cache.get(&AlbumKey::new("jane", 1)).await, Some(vec![]));
    }

    #[tokio::test]
    async fn test_delete_album() {
        let t = setup_test_app(&[]);
        let cache = AlbumCache::new(t.settings.cache_dir.clone());
        cache
            .put(
                &AlbumKey::new("jane", 1),
                &ImageRecord::from_urls(["https://a.test/1.jpg"]),
            )
            .await
            .unwrap();

        let (status, body) = send(&t.app, "DELETE", "/api/album/jane/1").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["removed"], true);

        let (_, body) = send(&t.app, "DELETE", "/api/album/jane/1").await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["removed"], false);
    }

    #[tokio::test]
    async fn test_cache_listing() {
        let t = setup_test_app(&[]);
        let cache = AlbumCache::new(t.settings.cache_dir.clone());
        cache.put(&AlbumKey::new("jane", 1), &[]).await.unwrap();

        let (status, json) = get_json(&t.app, "/api/cache").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["file"], "jane-1.json");
        assert_eq!(json[0]["negative"], true);
    }

    #[tokio::test]
    async fn test_nsfw_gallery_from_cache_only() {
        let t = setup_test_app(&[]);

        let (status, body) = send(&t.app, "GET", "/api/nsfw/jane/1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(String::from_utf8(body).unwrap().contains("Not Found"));
        assert_eq!(opened(&t), 0);

        let cache = AlbumCache::new(t.settings.cache_dir.clone());
        cache
            .put(
                &AlbumKey::new("jane", 1),
                &ImageRecord::from_urls(["https://cdn.test/a.jpg"]),
            )
            .await
            .unwrap();

        let (status, body) = send(&t.app, "GET", "/api/nsfw/Jane/1").await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains(r#"src="https://cdn.test/a.jpg""#));

        let (status, _) = send(&t.app, "GET", "/api/nsfw/jane/zero").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bulk_download_requires_cache() {
        let t = setup_test_app(&[]);
        let (status, json) = get_json(&t.app, "/api/bulk-download/jane/1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["suggestion"].as_str().unwrap().contains("/api/album/jane/1"));
    }

    #[tokio::test]
    async fn test_bulk_download_reports_failures() {
        let t = setup_test_app(&[]);
        let cache = AlbumCache::new(t.settings.cache_dir.clone());
        cache
            .put(
                &AlbumKey::new("jane", 1),
                &ImageRecord::from_urls(["http://127.0.0.1:9/a.jpg"]),
            )
            .await
            .unwrap();

        let (status, json) = get_json(&t.app, "/api/bulk-download/jane/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 1);
        assert_eq!(json["downloaded"], 0);
        assert_eq!(json["failed"][0]["url"], "http://127.0.0.1:9/a.jpg");
    }

    #[tokio::test]
    async fn test_downloads_listing_and_file() {
        let t = setup_test_app(&[]);
        let model_dir = t.settings.downloads_dir.join("jane");
        std::fs::create_dir_all(&model_dir).unwrap();
        std::fs::write(model_dir.join("001.jpg"), b"jpeg").unwrap();

        let (status, body) = send(&t.app, "GET", "/downloads/jane").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().contains("/downloads/jane/001.jpg"));

        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/downloads/jane/001.jpg")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/jpeg");

        let (status, _) = send(&t.app, "GET", "/downloads/jane/..%2Fjane").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&t.app, "GET", "/downloads/nobody").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let t = setup_test_app(&[]);
        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "https://elsewhere.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
