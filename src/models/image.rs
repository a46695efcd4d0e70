//! Scraped image records.

use serde::{Deserialize, Serialize};

/// Extensions kept verbatim when naming a record. Anything else becomes `jpg`.
const KNOWN_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "avif", "bmp"];

/// One image of an album, as cached and served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// 1-based position in the album.
    pub id: u32,
    /// Sequence number plus inferred extension, e.g. `007.png`.
    pub name: String,
    pub url: String,
    /// Same as `url`; the site does not expose separate thumbnails.
    pub thumb: String,
}

impl ImageRecord {
    /// Build a record for the image at 1-based position `id`.
    pub fn new(id: u32, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id,
            name: format!("{:03}.{}", id, infer_extension(&url)),
            thumb: url.clone(),
            url,
        }
    }

    /// Number a list of URLs into records, starting at 1.
    pub fn from_urls<I, S>(urls: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter()
            .enumerate()
            .map(|(i, url)| Self::new(i as u32 + 1, url))
            .collect()
    }
}

/// Infer a file extension from the path component of a URL.
pub fn infer_extension(url: &str) -> &'static str {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .rsplit('/')
        .next()
        .unwrap_or("");

    let ext = match path.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return "jpg",
    };

    KNOWN_EXTENSIONS
        .iter()
        .find(|known| **known == ext)
        .copied()
        .unwrap_or("jpg")
}
