//! Album lookup service: cache first, scrape on miss.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::Settings;
use crate::models::{AlbumKey, AlbumSource, ImageRecord};
use crate::scrapers::{
    AlbumScraper, BrowserLoaderFactory, LoaderFactory, ScrapeError, ScrapeOutcome,
};
use crate::storage::{AlbumCache, CacheError};

/// Errors that stop an album lookup.
#[derive(Debug, Error)]
pub enum AlbumError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Outcome of an album lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum AlbumLookup {
    Found {
        records: Vec<ImageRecord>,
        source: AlbumSource,
    },
    /// Nothing found, now or on an earlier scrape (negative entry).
    NotFound {
        /// Why the scrape came back empty, when freshly scraped.
        detail: Option<String>,
    },
}

/// Combines the album cache with the scraper.
pub struct AlbumService {
    cache: Arc<AlbumCache>,
    scraper: Arc<AlbumScraper>,
}

impl AlbumService {
    pub fn new(cache: Arc<AlbumCache>, scraper: Arc<AlbumScraper>) -> Self {
        Self { cache, scraper }
    }

    /// Build from settings with a custom page loader.
    pub fn from_settings(settings: &Settings, loader: Arc<dyn LoaderFactory>) -> Self {
        Self::new(
            Arc::new(AlbumCache::new(settings.cache_dir.clone())),
            Arc::new(AlbumScraper::new(
                loader,
                settings.site.clone(),
                settings.scrape.clone(),
            )),
        )
    }

    /// Build from settings, loading pages with a headless browser.
    pub fn with_browser(settings: &Settings) -> Self {
        let loader = Arc::new(BrowserLoaderFactory::new(
            settings.browser_config(),
            settings.scrape.clone(),
        ));
        Self::from_settings(settings, loader)
    }

    pub fn cache(&self) -> &AlbumCache {
        &self.cache
    }

    /// Host name of the scraped site.
    pub fn site_name(&self) -> String {
        self.scraper.site().site_name()
    }

    /// Look an album up, scraping when it is not cached or `refresh` is set.
    ///
    /// Scrape results are cached, including empty ones. An out-of-range
    /// index is returned as `ScrapeError::InvalidIndex` and never cached.
    pub async fn lookup(&self, key: &AlbumKey, refresh: bool) -> Result<AlbumLookup, AlbumError> {
        if !refresh {
            match self.cache.get(key).await {
                Some(records) if !records.is_empty() => {
                    info!("Cache hit for {} ({} images)", key, records.len());
                    return Ok(AlbumLookup::Found {
                        records,
                        source: AlbumSource::Cache,
                    });
                }
                Some(_) => {
                    info!("Negative cache hit for {}", key);
                    return Ok(AlbumLookup::NotFound { detail: None });
                }
                None => debug!("Cache miss for {}", key),
            }
        }

        match self.scraper.scrape(&key.model, key.index).await? {
            ScrapeOutcome::Found { records, source } => {
                self.cache.put(key, &records).await?;
                Ok(AlbumLookup::Found {
                    records,
                    source: AlbumSource::Site(source),
                })
            }
            ScrapeOutcome::Empty {
                links_found,
                last_error,
            } => {
                self.cache.put(key, &[]).await?;
                let detail = last_error
                    .unwrap_or_else(|| format!("{} gallery links found, no images", links_found));
                Ok(AlbumLookup::NotFound {
                    detail: Some(detail),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    use crate::scrapers::album::tests::{
        fast_scrape, test_site, FakeLoaderFactory, GALLERY_TWO_HTML, SEARCH_HTML, SEARCH_URL,
    };

    fn service(dir: &std::path::Path, factory: Arc<FakeLoaderFactory>) -> AlbumService {
        AlbumService::new(
            Arc::new(AlbumCache::new(dir)),
            Arc::new(AlbumScraper::new(factory, test_site(), fast_scrape())),
        )
    }

    #[tokio::test]
    async fn test_scrape_result_is_cached() {
        let dir = tempdir().unwrap();
        let factory = Arc::new(FakeLoaderFactory::with_pages(&[
            (SEARCH_URL, SEARCH_HTML),
            ("https://gallery.test/gallery/two", GALLERY_TWO_HTML),
        ]));
        let service = service(dir.path(), factory.clone());
        let key = AlbumKey::new("jane", 2);

        let first = service.lookup(&key, false).await.unwrap();
        assert!(matches!(
            first,
            AlbumLookup::Found { source: AlbumSource::Site(_), .. }
        ));

        let second = service.lookup(&key, false).await.unwrap();
        let AlbumLookup::Found { records, source } = second else {
            panic!("expected cached album");
        };
        assert_eq!(source, AlbumSource::Cache);
        assert_eq!(records.len(), 2);
        assert_eq!(factory.opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_negative_entry_skips_scrape() {
        let dir = tempdir().unwrap();
        let factory = Arc::new(FakeLoaderFactory::default());
        let service = service(dir.path(), factory.clone());
        let key = AlbumKey::new("jane", 1);

        let first = service.lookup(&key, false).await.unwrap();
        assert!(matches!(first, AlbumLookup::NotFound { detail: Some(_) }));
        let opened = factory.opened.load(Ordering::SeqCst);

        for _ in 0..3 {
            let again = service.lookup(&key, false).await.unwrap();
            assert_eq!(again, AlbumLookup::NotFound { detail: None });
        }
        assert_eq!(factory.opened.load(Ordering::SeqCst), opened);

        service.lookup(&key, true).await.unwrap();
        assert!(factory.opened.load(Ordering::SeqCst) > opened);
    }

    #[tokio::test]
    async fn test_invalid_index_is_not_cached() {
        let dir = tempdir().unwrap();
        let factory = Arc::new(FakeLoaderFactory::with_pages(&[(SEARCH_URL, SEARCH_HTML)]));
        let service = service(dir.path(), factory);
        let key = AlbumKey::new("jane", 9);

        let err = service.lookup(&key, false).await.unwrap_err();
        assert!(matches!(
            err,
            AlbumError::Scrape(ScrapeError::InvalidIndex { index: 9, found: 2 })
        ));
        assert!(service.cache().get(&key).await.is_none());
    }
}
