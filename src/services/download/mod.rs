//! Bulk image download service.
//!
//! Fetches every image of a cached album into a per-model directory.
//! Individual failures are collected in the report and never abort the
//! batch.

mod types;

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::models::{AlbumKey, ImageRecord};
use crate::scrapers::HttpClient;

pub use types::{DownloadConfig, DownloadError, DownloadReport, FailedDownload};

/// Downloads album images with bounded concurrency.
pub struct BulkDownloader {
    client: HttpClient,
    config: DownloadConfig,
}

impl BulkDownloader {
    /// Create a downloader. Fails if the HTTP client cannot be built
    /// (e.g. an invalid proxy URL).
    pub fn new(config: DownloadConfig) -> Result<Self, DownloadError> {
        let client = HttpClient::with_options(
            config.request_timeout,
            config.user_agent.as_deref(),
            config.proxy.as_deref(),
        )?;
        Ok(Self { client, config })
    }

    /// Directory a model's files are written to, shared by all its albums.
    pub fn model_dir(&self, key: &AlbumKey) -> PathBuf {
        self.config.downloads_dir.join(key.slug())
    }

    /// Download all records of an album.
    pub async fn download_album(
        &self,
        key: &AlbumKey,
        records: &[ImageRecord],
    ) -> Result<DownloadReport, DownloadError> {
        let dir = self.model_dir(key);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DownloadError::Io {
                path: dir.clone(),
                source: e,
            })?;

        info!(
            "Downloading {} images for {} into {}",
            records.len(),
            key,
            dir.display()
        );

        let mut results: Vec<(u32, String, Result<u64, DownloadError>)> =
            stream::iter(records.iter().cloned())
                .map(|record| {
                    let path = dir.join(file_name_for(key.index, &record));
                    async move {
                        let result = self.download_one(&record.url, path).await;
                        (record.id, record.url, result)
                    }
                })
                .buffer_unordered(self.config.concurrency.max(1))
                .collect()
                .await;
        results.sort_by_key(|(id, _, _)| *id);

        let mut downloaded = 0;
        let mut failed = Vec::new();
        for (_, url, result) in results {
            match result {
                Ok(bytes) => {
                    debug!("Downloaded {} ({} bytes)", url, bytes);
                    downloaded += 1;
                }
                Err(e) => {
                    warn!("Failed to download {}: {}", url, e);
                    failed.push(FailedDownload {
                        url,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Downloaded {}/{} images for {}",
            downloaded,
            records.len(),
            key
        );

        Ok(DownloadReport {
            downloaded,
            total: records.len(),
            failed,
            directory: dir.display().to_string(),
        })
    }

    async fn download_one(&self, url: &str, path: PathBuf) -> Result<u64, DownloadError> {
        let response = self.client.get(url, self.config.referer.as_deref()).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| DownloadError::Io { path, source: e })?;
        Ok(bytes.len() as u64)
    }
}

/// Local file name for a record: the album index, then the final path
/// component of the stored name. Albums of one model share a directory.
fn file_name_for(index: u32, record: &ImageRecord) -> String {
    let name = Path::new(&record.name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.starts_with('.'))
        .map(str::to_string)
        .unwrap_or_else(|| ImageRecord::new(record.id, &record.url).name);
    format!("{}-{}", index, name)
}
