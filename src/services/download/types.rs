//! Download service types.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Configuration for the bulk downloader.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Root directory; each model gets its own subdirectory.
    pub downloads_dir: PathBuf,
    pub request_timeout: Duration,
    /// Parallel downloads per album.
    pub concurrency: usize,
    pub user_agent: Option<String>,
    pub proxy: Option<String>,
    /// Referer sent with every image request.
    pub referer: Option<String>,
}

/// Errors from downloading a single image, or from setting up a batch.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One image that could not be downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDownload {
    pub url: String,
    pub error: String,
}

/// Result of downloading an album.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    pub downloaded: usize,
    pub total: usize,
    pub failed: Vec<FailedDownload>,
    /// Directory the files were written to.
    pub directory: String,
}
