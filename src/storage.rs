//! On-disk album cache.
//!
//! One JSON file per (model, index) under the cache directory. An empty
//! array is a negative entry: the key was scraped and nothing was found.
//! Writes go to a temp file in the same directory and are renamed over the
//! target, so readers never observe a partial file.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{AlbumKey, ImageRecord};

/// Errors from the album cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize album: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CacheError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Summary of one cache file, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryInfo {
    pub file: String,
    pub images: usize,
    /// True for an empty (negative) entry.
    pub negative: bool,
    pub modified: Option<DateTime<Utc>>,
}

/// File-per-key album cache.
#[derive(Debug, Clone)]
pub struct AlbumCache {
    dir: PathBuf,
}

impl AlbumCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the cache file for a key.
    pub fn path_for(&self, key: &AlbumKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Read a cached album. `None` when absent; unreadable or corrupt files
    /// are logged and treated as absent.
    pub async fn get(&self, key: &AlbumKey) -> Option<Vec<ImageRecord>> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read cache file {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(records) => Some(records),
            Err(e) => {
                warn!("Ignoring corrupt cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Write an album atomically, replacing any previous entry.
    pub async fn put(&self, key: &AlbumKey, records: &[ImageRecord]) -> Result<(), CacheError> {
        let json = serde_json::to_vec_pretty(records)?;
        let path = self.path_for(key);

        let dir = self.dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &json))
            .await
            .map_err(|e| CacheError::io(&path, std::io::Error::other(e)))??;

        debug!("Cached {} images for {} at {}", records.len(), key, path.display());
        Ok(())
    }

    /// Remove one entry. Returns whether a file was deleted.
    pub async fn remove(&self, key: &AlbumKey) -> Result<bool, CacheError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io(&path, e)),
        }
    }

    /// Remove every index cached for a model. Returns the number removed.
    pub async fn clear_model(&self, model: &str) -> Result<usize, CacheError> {
        let prefix = format!("{}-", AlbumKey::new(model, 0).slug());
        let mut removed = 0;
        for path in self.files().await? {
            let belongs = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|stem| stem.strip_prefix(&prefix))
                .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()));
            if belongs {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| CacheError::io(&path, e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// List every cache file, sorted by file name.
    pub async fn entries(&self) -> Result<Vec<CacheEntryInfo>, CacheError> {
        let mut entries = Vec::new();
        for path in self.files().await? {
            let records: Option<Vec<ImageRecord>> = tokio::fs::read(&path)
                .await
                .ok()
                .and_then(|b| serde_json::from_slice(&b).ok());
            let images = records.as_ref().map(|r| r.len()).unwrap_or(0);
            let modified = tokio::fs::metadata(&path)
                .await
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Utc>::from);
            entries.push(CacheEntryInfo {
                file: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                images,
                negative: records.is_some() && images == 0,
                modified,
            });
        }
        entries.sort_by(|a, b| a.file.cmp(&b.file));
        Ok(entries)
    }

    /// All `*.json` files in the cache directory.
    async fn files(&self) -> Result<Vec<PathBuf>, CacheError> {
        let mut read_dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CacheError::io(&self.dir, e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| CacheError::io(&self.dir, e))?
        {
            let path = entry.path();
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
            if is_file && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// Temp file in `dir`, fsync, rename over `path`. Runs on the blocking pool.
fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    std::fs::create_dir_all(dir).map_err(|e| CacheError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CacheError::io(dir, e))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| CacheError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| CacheError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Vec<ImageRecord> {
        ImageRecord::from_urls(["https://a.test/1.jpg", "https://a.test/2.png"])
    }

    #[tokio::test]
    async fn test_missing_entry_is_none() {
        let dir = tempdir().unwrap();
        let cache = AlbumCache::new(dir.path());
        assert!(cache.get(&AlbumKey::new("nobody", 1)).await.is_none());
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let cache = AlbumCache::new(dir.path().join("nested"));
        let key = AlbumKey::new("Jane", 3);

        cache.put(&key, &sample()).await.unwrap();

        assert_eq!(cache.get(&key).await, Some(sample()));
        assert!(dir.path().join("nested/jane-3.json").exists());
    }

    #[tokio::test]
    async fn test_negative_entry_is_empty_vec() {
        let dir = tempdir().unwrap();
        let cache = AlbumCache::new(dir.path());
        let key = AlbumKey::new("jane", 9);

        cache.put(&key, &[]).await.unwrap();

        assert_eq!(cache.get(&key).await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let dir = tempdir().unwrap();
        let cache = AlbumCache::new(dir.path());
        let key = AlbumKey::new("jane", 1);

        cache.put(&key, &[]).await.unwrap();
        cache.put(&key, &sample()).await.unwrap();

        assert_eq!(cache.get(&key).await.map(|r| r.len()), Some(2));
        // no temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_treated_as_absent() {
        let dir = tempdir().unwrap();
        let cache = AlbumCache::new(dir.path());
        let key = AlbumKey::new("jane", 1);
        std::fs::write(cache.path_for(&key), b"{not json").unwrap();

        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_and_clear_model() {
        let dir = tempdir().unwrap();
        let cache = AlbumCache::new(dir.path());
        cache.put(&AlbumKey::new("jane", 1), &sample()).await.unwrap();
        cache.put(&AlbumKey::new("jane", 2), &[]).await.unwrap();
        cache.put(&AlbumKey::new("jane-doe", 1), &sample()).await.unwrap();

        assert!(cache.remove(&AlbumKey::new("jane", 1)).await.unwrap());
        assert!(!cache.remove(&AlbumKey::new("jane", 1)).await.unwrap());

        cache.put(&AlbumKey::new("jane", 1), &sample()).await.unwrap();
        assert_eq!(cache.clear_model("Jane").await.unwrap(), 2);
        assert!(cache.get(&AlbumKey::new("jane-doe", 1)).await.is_some());
    }

    #[tokio::test]
    async fn test_entries_listing() {
        let dir = tempdir().unwrap();
        let cache = AlbumCache::new(dir.path());
        cache.put(&AlbumKey::new("b", 1), &[]).await.unwrap();
        cache.put(&AlbumKey::new("a", 1), &sample()).await.unwrap();

        let entries = cache.entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file, "a-1.json");
        assert_eq!(entries[0].images, 2);
        assert!(!entries[0].negative);
        assert!(entries[1].negative);
        assert!(entries[1].modified.is_some());
    }

    #[tokio::test]
    async fn test_entries_of_missing_dir() {
        let dir = tempdir().unwrap();
        let cache = AlbumCache::new(dir.path().join("absent"));
        assert!(cache.entries().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_concurrent_writers_leave_a_whole_file() {
        let dir = tempdir().unwrap();
        let cache = std::sync::Arc::new(AlbumCache::new(dir.path()));
        let key = AlbumKey::new("jane", 1);

        let mut tasks = Vec::new();
        for n in 1..=8u32 {
            let cache = cache.clone();
            let key = key.clone();
            tasks.push(tokio::spawn(async move {
                let urls: Vec<String> = (0..n).map(|i| format!("https://a.test/{}.jpg", i)).collect();
                cache.put(&key, &ImageRecord::from_urls(urls)).await.unwrap();
                cache.get(&key).await
            }));
        }
        for task in tasks {
            // every read sees a complete album, never a partial write
            assert!(task.await.unwrap().is_some());
        }

        let records = cache.get(&key).await.unwrap();
        assert!((1..=8).contains(&records.len()));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
