//! Album scraping: site configuration, page loading and HTML extraction.

pub mod album;
pub mod browser;
pub mod config;
pub mod error;
pub mod extract;
mod http_client;
pub mod loader;

pub use album::{AlbumScraper, ScrapeOutcome};
#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;
pub use browser::{find_chrome, BrowserEngineConfig};
pub use config::{ScrapeConfig, SiteConfig};
pub use error::ScrapeError;
pub use extract::{ImageExtractor, LinkExtractor};
pub use http_client::{HttpClient, USER_AGENT};
pub use loader::{BrowserLoaderFactory, LoaderFactory, PageLoader};
