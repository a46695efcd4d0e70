//! Album lookup command.

use console::style;

use crate::config::Settings;
use crate::models::{AlbumKey, ImageRecord};
use crate::scrapers::ScrapeError;
use crate::services::{AlbumError, AlbumLookup, AlbumService};

/// Look up an album and print it.
pub async fn cmd_scrape(
    settings: &Settings,
    model: &str,
    index: u32,
    refresh: bool,
    json: bool,
) -> anyhow::Result<()> {
    let key = AlbumKey::new(model, index);
    let service = AlbumService::with_browser(settings);

    if !json {
        eprintln!(
            "{} Looking up {} gallery {} on {}",
            style("→").cyan(),
            style(&key.model).bold(),
            key.index,
            service.site_name()
        );
    }

    let records = match fetch_records(&service, &key, refresh).await? {
        Some(records) => records,
        None => return Ok(()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for record in &records {
            println!("  {} {}", style(&record.name).dim(), record.url);
        }
    }
    Ok(())
}

/// Look up records, reporting progress on stderr. `None` when the album
/// has no images.
pub(super) async fn fetch_records(
    service: &AlbumService,
    key: &AlbumKey,
    refresh: bool,
) -> anyhow::Result<Option<Vec<ImageRecord>>> {
    match service.lookup(key, refresh).await {
        Ok(AlbumLookup::Found { records, source }) => {
            eprintln!(
                "  {} {} images ({})",
                style("✓").green(),
                records.len(),
                source.as_str()
            );
            Ok(Some(records))
        }
        Ok(AlbumLookup::NotFound { detail }) => {
            eprintln!(
                "  {} No images found for {}{}",
                style("✗").red(),
                key,
                detail.map(|d| format!(": {}", d)).unwrap_or_default()
            );
            eprintln!(
                "  {} Empty result is cached; use --refresh to scrape again",
                style("!").yellow()
            );
            Ok(None)
        }
        Err(AlbumError::Scrape(ScrapeError::InvalidIndex { index, found })) => {
            anyhow::bail!(
                "Gallery index {} is out of range ({} galleries found for {})",
                index,
                found,
                key.model
            )
        }
        Err(e) => Err(e.into()),
    }
}
