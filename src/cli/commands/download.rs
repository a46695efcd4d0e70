//! Bulk download command.

use console::style;

use super::scrape::fetch_records;
use crate::config::Settings;
use crate::models::AlbumKey;
use crate::services::{AlbumService, BulkDownloader};

/// Download an album into the downloads directory.
pub async fn cmd_download(settings: &Settings, model: &str, index: u32) -> anyhow::Result<()> {
    let key = AlbumKey::new(model, index);
    let service = AlbumService::with_browser(settings);
    let downloader = BulkDownloader::new(settings.download_config())?;

    let Some(records) = fetch_records(&service, &key, false).await? else {
        return Ok(());
    };

    println!(
        "{} Downloading {} images for {}",
        style("→").cyan(),
        records.len(),
        key
    );
    let report = downloader.download_album(&key, &records).await?;

    println!(
        "  {} {}/{} downloaded to {}",
        style("✓").green(),
        report.downloaded,
        report.total,
        report.directory
    );
    for failure in &report.failed {
        println!("  {} {}: {}", style("✗").red(), failure.url, failure.error);
    }
    Ok(())
}
