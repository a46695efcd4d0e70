//! Page loading seam between the album scraper and the browser.
//!
//! Every scrape attempt opens a fresh loader and closes it when done, so a
//! wedged browser never leaks into the next attempt.

use async_trait::async_trait;

use super::browser::{BrowserEngineConfig, BrowserFetcher};
use super::config::ScrapeConfig;
use super::error::ScrapeError;

/// A live page session, usually one browser instance.
#[async_trait]
pub trait PageLoader: Send {
    /// Navigate to `url`, let lazy content load, and return the rendered HTML.
    async fn load(&mut self, url: &str) -> Result<String, ScrapeError>;

    /// Tear the session down. Called after every attempt.
    async fn close(&mut self);
}

/// Opens page loaders.
#[async_trait]
pub trait LoaderFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageLoader>, ScrapeError>;
}

/// Launches one headless browser per loader.
pub struct BrowserLoaderFactory {
    browser: BrowserEngineConfig,
    scrape: ScrapeConfig,
}

impl BrowserLoaderFactory {
    pub fn new(browser: BrowserEngineConfig, scrape: ScrapeConfig) -> Self {
        Self { browser, scrape }
    }
}

#[async_trait]
impl LoaderFactory for BrowserLoaderFactory {
    async fn open(&self) -> Result<Box<dyn PageLoader>, ScrapeError> {
        let mut fetcher = BrowserFetcher::new(self.browser.clone(), self.scrape.clone());
        fetcher.ensure_browser().await?;
        Ok(Box::new(fetcher))
    }
}

#[async_trait]
impl PageLoader for BrowserFetcher {
    async fn load(&mut self, url: &str) -> Result<String, ScrapeError> {
        self.fetch(url).await
    }

    async fn close(&mut self) {
        BrowserFetcher::close(self).await;
    }
}
