//! Album cache keys and provenance.

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Cache key: a normalised model name and a 1-based gallery index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlbumKey {
    pub model: String,
    pub index: u32,
}

impl AlbumKey {
    pub fn new(model: &str, index: u32) -> Self {
        Self {
            model: normalize_model(model),
            index,
        }
    }

    /// Filesystem-safe form of the model name.
    ///
    /// Keeps `[a-z0-9_-]`, collapses every other run into `_`. When that
    /// changes the name, a short hash of the model is appended so distinct
    /// models never share a slug.
    pub fn slug(&self) -> String {
        model_slug(&self.model)
    }

    /// Cache file name, e.g. `jane-doe-2.json`.
    pub fn file_name(&self) -> String {
        format!("{}-{}.json", self.slug(), self.index)
    }
}

impl std::fmt::Display for AlbumKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.model, self.index)
    }
}

/// Trim and lower-case a model name.
pub fn normalize_model(model: &str) -> String {
    model.trim().to_lowercase()
}

/// Filesystem-safe slug for a (normalised) model name.
pub fn model_slug(model: &str) -> String {
    let mut slug = String::with_capacity(model.len());
    let mut in_gap = false;
    for c in model.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' {
            slug.push(c);
            in_gap = false;
        } else if !in_gap {
            slug.push('_');
            in_gap = true;
        }
    }

    let slug = slug.trim_matches('_').to_string();
    if slug == model && !slug.is_empty() {
        return slug;
    }

    let digest = Sha256::digest(model.as_bytes());
    let suffix = &hex::encode(digest)[..8];
    if slug.is_empty() {
        format!("model_{}", suffix)
    } else {
        format!("{}_{}", slug, suffix)
    }
}

/// Where an album response came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumSource {
    Cache,
    /// Freshly scraped from the named site.
    Site(String),
}

impl AlbumSource {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Cache => "cache",
            Self::Site(name) => name,
        }
    }
}

impl Serialize for AlbumSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
