//! Cache management commands.

use console::style;

use crate::config::Settings;
use crate::models::AlbumKey;
use crate::storage::AlbumCache;

/// List cached albums.
pub async fn cmd_cache_list(settings: &Settings) -> anyhow::Result<()> {
    let cache = AlbumCache::new(settings.cache_dir.clone());
    let entries = cache.entries().await?;

    if entries.is_empty() {
        println!("No cached albums in {}", cache.dir().display());
        return Ok(());
    }

    println!("{:<40} {:>7}  {}", "FILE", "IMAGES", "CACHED");
    for entry in entries {
        let images = if entry.negative {
            "empty".to_string()
        } else {
            entry.images.to_string()
        };
        let modified = entry
            .modified
            .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<40} {:>7}  {}", entry.file, images, modified);
    }
    Ok(())
}

/// Remove one cached album.
pub async fn cmd_cache_remove(settings: &Settings, model: &str, index: u32) -> anyhow::Result<()> {
    let cache = AlbumCache::new(settings.cache_dir.clone());
    let key = AlbumKey::new(model, index);

    if cache.remove(&key).await? {
        println!("{} Removed {}", style("✓").green(), key);
    } else {
        println!("{} {} was not cached", style("!").yellow(), key);
    }
    Ok(())
}

/// Remove every cached album of a model.
pub async fn cmd_cache_clear(settings: &Settings, model: &str) -> anyhow::Result<()> {
    let cache = AlbumCache::new(settings.cache_dir.clone());
    let removed = cache.clear_model(model).await?;
    println!(
        "{} Removed {} cached albums for {}",
        style("✓").green(),
        removed,
        model.trim().to_lowercase()
    );
    Ok(())
}
