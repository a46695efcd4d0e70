//! End-to-end album flow through the public API, with canned pages in place
//! of a browser.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use albumgrab::config::Settings;
use albumgrab::models::{AlbumKey, AlbumSource};
use albumgrab::scrapers::{LoaderFactory, PageLoader, ScrapeConfig, ScrapeError, SiteConfig};
use albumgrab::server::{create_router, AppState};
use albumgrab::services::{AlbumLookup, AlbumService};

const SEARCH: &str = r#"
    <html><body>
      <div class="results">
        <a class="gallery-link" href="/gallery/beach">Beach</a>
        <a class="gallery-link" href="/gallery/studio">Studio</a>
        <a href="/about">About</a>
      </div>
    </body></html>
"#;

const STUDIO: &str = r#"
    <html><body>
      <img src="/static/logo.svg">
      <img data-src="https://img.site.test/studio/01.jpg" src="/blank.gif">
      <img data-src="https://img.site.test/studio/02.jpg">
      <a href="https://img.site.test/studio/03.webp">full</a>
    </body></html>
"#;

/// Serves pages from a map; counts loader sessions.
struct StaticSite {
    pages: HashMap<String, String>,
    sessions: AtomicUsize,
}

impl StaticSite {
    fn new() -> Arc<Self> {
        let pages = [
            ("https://site.test/search/?q=ann%20lee", SEARCH),
            ("https://site.test/gallery/studio", STUDIO),
        ]
        .into_iter()
        .map(|(u, h)| (u.to_string(), h.to_string()))
        .collect();
        Arc::new(Self {
            pages,
            sessions: AtomicUsize::new(0),
        })
    }
}

struct StaticPage {
    pages: HashMap<String, String>,
}

#[async_trait]
impl PageLoader for StaticPage {
    async fn load(&mut self, url: &str) -> Result<String, ScrapeError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::Navigation {
                url: url.to_string(),
                message: "404".to_string(),
            })
    }

    async fn close(&mut self) {}
}

#[async_trait]
impl LoaderFactory for StaticSite {
    async fn open(&self) -> Result<Box<dyn PageLoader>, ScrapeError> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticPage {
            pages: self.pages.clone(),
        }))
    }
}

fn settings(dir: &std::path::Path) -> Settings {
    let mut settings = Settings::with_data_dir(dir.to_path_buf());
    settings.site = SiteConfig {
        base_url: "https://site.test".to_string(),
        search_path: "/search/?q={query}".to_string(),
        allowed_image_hosts: vec!["img.site.test".to_string()],
        ..Default::default()
    };
    settings.scrape = ScrapeConfig {
        max_attempts: 1,
        retry_delay_ms: 0,
        ..Default::default()
    };
    settings
}

#[tokio::test]
async fn lookup_scrapes_second_gallery_and_caches_it() {
    let dir = tempfile::tempdir().unwrap();
    let site = StaticSite::new();
    let service = AlbumService::from_settings(&settings(dir.path()), site.clone());
    let key = AlbumKey::new("Ann Lee", 2);

    let AlbumLookup::Found { records, source } = service.lookup(&key, false).await.unwrap() else {
        panic!("expected images");
    };
    assert_eq!(source, AlbumSource::Site("site.test".to_string()));
    let urls: Vec<_> = records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://img.site.test/studio/01.jpg",
            "https://img.site.test/studio/02.jpg",
            "https://img.site.test/studio/03.webp",
        ]
    );
    assert_eq!(records[2].name, "003.webp");

    let cached = service.cache().get(&key).await.unwrap();
    assert_eq!(cached, records);

    let again = service.lookup(&key, false).await.unwrap();
    assert!(matches!(again, AlbumLookup::Found { source: AlbumSource::Cache, .. }));
    assert_eq!(site.sessions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn api_serves_album_then_gallery_page() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    settings.ensure_directories().unwrap();
    let app = create_router(AppState::with_loader(&settings, StaticSite::new()).unwrap());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/album/ann%20lee/2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["model"], "ann lee");
    assert_eq!(json["total"], 3);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/nsfw/ann%20lee/2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("https://img.site.test/studio/02.jpg"));
}
