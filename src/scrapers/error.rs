//! Scrape error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The requested gallery index is outside the discovered links.
    #[error("Invalid gallery index {index}: found {found} galleries")]
    InvalidIndex { index: u32, found: usize },
    #[error("Browser error: {0}")]
    Browser(String),
    #[error("Navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },
    #[error("Timed out after {secs}s loading {url}")]
    Timeout { url: String, secs: u64 },
    #[error("{0}")]
    Unsupported(String),
}

impl ScrapeError {
    /// Whether another attempt could change the outcome.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidIndex { .. } | Self::Unsupported(_))
    }
}
