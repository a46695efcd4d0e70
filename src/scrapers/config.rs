//! Scraper configuration types.
//!
//! `SiteConfig` describes where galleries live on the target site and how to
//! recognise them; `ScrapeConfig` tunes the retry and scroll loops.

use serde::{Deserialize, Serialize};
use url::Url;

/// Target site description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site root, e.g. "https://www.example.com".
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Search path template. `{query}` is replaced by the URL-encoded model.
    #[serde(default = "default_search_path")]
    pub search_path: String,
    /// Gallery link selectors, in priority order. Every selector contributes;
    /// earlier selectors win the ordering.
    #[serde(default = "default_link_selectors")]
    pub link_selectors: Vec<String>,
    /// Optional regex a gallery link must match.
    #[serde(default)]
    pub link_pattern: Option<String>,
    /// Host substrings images must come from. Empty allows every host.
    #[serde(default)]
    pub allowed_image_hosts: Vec<String>,
    /// Accepted image file extensions (lower-case, without dot).
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    /// Re-scan the search page for images when the gallery page yields none.
    #[serde(default = "default_true")]
    pub search_fallback: bool,
}

fn default_base_url() -> String {
    "https://www.example.com".to_string()
}

fn default_search_path() -> String {
    "/search/?q={query}".to_string()
}

fn default_link_selectors() -> Vec<String> {
    [
        "a.gallery-link",
        "a[href*='/gallery/']",
        "a[href*='/galleries/']",
        "a[href*='/album/']",
        ".thumb a[href]",
        ".gallery a[href]",
        "article a[href]",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub(crate) fn default_image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "webp", "avif"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_path: default_search_path(),
            link_selectors: default_link_selectors(),
            link_pattern: None,
            allowed_image_hosts: Vec::new(),
            image_extensions: default_image_extensions(),
            search_fallback: true,
        }
    }
}

impl SiteConfig {
    /// Build the search URL for a model keyword.
    pub fn search_url(&self, model: &str) -> String {
        let path = self
            .search_path
            .replace("{query}", &urlencoding::encode(model));
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Host name reported as the album source.
    pub fn site_name(&self) -> String {
        Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
            .unwrap_or_else(|| self.base_url.clone())
    }
}

/// Retry and scroll tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Attempts per scrape, each with a fresh browser.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Pause between failed attempts.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Pause after each scroll step.
    #[serde(default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,
    /// Consecutive unchanged page heights before scrolling stops.
    #[serde(default = "default_scroll_stall_rounds")]
    pub scroll_stall_rounds: u32,
    /// Hard cap on scroll steps.
    #[serde(default = "default_scroll_max_rounds")]
    pub scroll_max_rounds: u32,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_scroll_delay_ms() -> u64 {
    800
}

fn default_scroll_stall_rounds() -> u32 {
    3
}

fn default_scroll_max_rounds() -> u32 {
    30
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            scroll_delay_ms: default_scroll_delay_ms(),
            scroll_stall_rounds: default_scroll_stall_rounds(),
            scroll_max_rounds: default_scroll_max_rounds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_query() {
        let site = SiteConfig {
            base_url: "https://gallery.test/".to_string(),
            search_path: "/search?q={query}&sort=new".to_string(),
            ..Default::default()
        };
        assert_eq!(
            site.search_url("jane doe"),
            "https://gallery.test/search?q=jane%20doe&sort=new"
        );
    }

    #[test]
    fn test_site_name_strips_www() {
        let site = SiteConfig {
            base_url: "https://www.gallery.test".to_string(),
            ..Default::default()
        };
        assert_eq!(site.site_name(), "gallery.test");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let site: SiteConfig = toml::from_str("base_url = \"https://a.test\"").unwrap();
        assert_eq!(site.base_url, "https://a.test");
        assert_eq!(site.link_selectors, default_link_selectors());
        assert!(site.search_fallback);

        let scrape: ScrapeConfig = toml::from_str("max_attempts = 2").unwrap();
        assert_eq!(scrape.max_attempts, 2);
        assert_eq!(scrape.scroll_stall_rounds, 3);
    }
}
