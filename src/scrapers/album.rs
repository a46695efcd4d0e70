//! Retrying search-then-gallery album scraper.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::config::{ScrapeConfig, SiteConfig};
use super::error::ScrapeError;
use super::extract::{ImageExtractor, LinkExtractor};
use super::loader::{LoaderFactory, PageLoader};
use crate::models::{AlbumKey, ImageRecord};

/// Result of a scrape that did not hit a hard error.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    /// Images were found.
    Found {
        records: Vec<ImageRecord>,
        /// Host name of the scraped site.
        source: String,
    },
    /// Every attempt came back empty or failed.
    Empty {
        /// Gallery links seen on the last search page that loaded.
        links_found: usize,
        /// Error of the last failed attempt, if any.
        last_error: Option<String>,
    },
}

/// What a single attempt produced.
enum Attempt {
    Images(Vec<String>),
    NoImages { links_found: usize },
}

/// Finds the gallery at a 1-based index for a model and extracts its images.
pub struct AlbumScraper {
    factory: Arc<dyn LoaderFactory>,
    site: SiteConfig,
    scrape: ScrapeConfig,
    links: LinkExtractor,
    images: ImageExtractor,
}

impl AlbumScraper {
    pub fn new(factory: Arc<dyn LoaderFactory>, site: SiteConfig, scrape: ScrapeConfig) -> Self {
        Self {
            links: LinkExtractor::new(&site),
            images: ImageExtractor::new(&site),
            factory,
            site,
            scrape,
        }
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Scrape the album at `index` for `model`.
    ///
    /// Retries up to `max_attempts` times with a fresh loader each time. An
    /// out-of-range index fails immediately with `InvalidIndex`.
    pub async fn scrape(&self, model: &str, index: u32) -> Result<ScrapeOutcome, ScrapeError> {
        let key = AlbumKey::new(model, index);
        let search_url = self.site.search_url(&key.model);
        let max_attempts = self.scrape.max_attempts.max(1);

        let mut links_found = 0;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            info!(
                "Scraping {} (attempt {}/{}): {}",
                key, attempt, max_attempts, search_url
            );

            match self.attempt(&search_url, index).await {
                Ok(Attempt::Images(urls)) => {
                    info!("Found {} images for {}", urls.len(), key);
                    return Ok(ScrapeOutcome::Found {
                        records: ImageRecord::from_urls(urls),
                        source: self.site.site_name(),
                    });
                }
                Ok(Attempt::NoImages { links_found: n }) => {
                    links_found = n;
                    warn!("Attempt {} for {} found no images", attempt, key);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    warn!("Attempt {} for {} failed: {}", attempt, key, e);
                    last_error = Some(e.to_string());
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(Duration::from_millis(self.scrape.retry_delay_ms)).await;
            }
        }

        Ok(ScrapeOutcome::Empty {
            links_found,
            last_error,
        })
    }

    /// One attempt with its own loader, closed whatever happens.
    async fn attempt(&self, search_url: &str, index: u32) -> Result<Attempt, ScrapeError> {
        let mut loader = self.factory.open().await?;
        let result = self.run(loader.as_mut(), search_url, index).await;
        loader.close().await;
        result
    }

    async fn run(
        &self,
        loader: &mut dyn PageLoader,
        search_url: &str,
        index: u32,
    ) -> Result<Attempt, ScrapeError> {
        let search_html = loader.load(search_url).await?;
        let links = self.links.extract(&search_html, search_url);

        if index == 0 || index as usize > links.len() {
            return Err(ScrapeError::InvalidIndex {
                index,
                found: links.len(),
            });
        }

        let gallery_url = &links[index as usize - 1];
        debug!("Gallery {} of {}: {}", index, links.len(), gallery_url);

        let gallery_html = loader.load(gallery_url).await?;
        let mut images = self.images.extract(&gallery_html, gallery_url);

        if images.is_empty() && self.site.search_fallback {
            debug!("Gallery page had no images, re-scanning search page");
            images = self.images.extract(&search_html, search_url);
        }

        if images.is_empty() {
            Ok(Attempt::NoImages {
                links_found: links.len(),
            })
        } else {
            Ok(Attempt::Images(images))
        }
    }
}
