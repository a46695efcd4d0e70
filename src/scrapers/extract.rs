//! HTML extraction of gallery links and image URLs.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::config::{default_image_extensions, SiteConfig};

/// `img` attributes checked for a source, lazy-load attributes first.
const IMG_SOURCE_ATTRS: &[&str] = &["data-src", "data-lazy-src", "data-original", "src"];

static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static SOURCE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("source[srcset]").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static STYLED: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[style]").unwrap());
static STYLE_BLOCK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("style").unwrap());

/// `url(...)` references in CSS.
static CSS_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url\(\s*['"]?([^'")]+?)['"]?\s*\)"#).unwrap());

/// Image extension check used when the configured list is empty or invalid.
static DEFAULT_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&extension_pattern(&default_image_extensions())).unwrap()
});

/// Case-insensitive `\.(?:jpg|png|...)$` for the given extensions.
fn extension_pattern(extensions: &[String]) -> String {
    let alternatives: Vec<String> = extensions
        .iter()
        .map(|e| regex::escape(e.trim().trim_start_matches('.')))
        .filter(|e| !e.is_empty())
        .collect();
    format!(r"(?i)\.(?:{})$", alternatives.join("|"))
}

/// Resolve `href` against `base`, keeping only http(s) URLs without fragment.
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

/// First URL of a `srcset` attribute.
fn first_srcset_candidate(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .next()
        .and_then(|candidate| candidate.split_whitespace().next())
}

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            warn!("Ignoring invalid selector {:?}: {}", css, e);
            None
        }
    }
}

/// Insert into `out` unless already seen.
fn push_unique(out: &mut Vec<String>, seen: &mut HashSet<String>, url: String) {
    if seen.insert(url.clone()) {
        out.push(url);
    }
}

/// Collects gallery links from a search results page.
pub struct LinkExtractor {
    selectors: Vec<Selector>,
    pattern: Option<Regex>,
}

impl LinkExtractor {
    pub fn new(site: &SiteConfig) -> Self {
        let selectors = site
            .link_selectors
            .iter()
            .filter_map(|css| parse_selector(css))
            .collect();

        let pattern = site.link_pattern.as_deref().and_then(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Ignoring invalid link pattern {:?}: {}", p, e);
                None
            }
        });

        Self { selectors, pattern }
    }

    /// Gallery links in selector priority order, de-duplicated.
    pub fn extract(&self, html: &str, page_url: &str) -> Vec<String> {
        let Ok(base) = Url::parse(page_url) else {
            warn!("Cannot resolve links against invalid page URL {}", page_url);
            return Vec::new();
        };
        let document = Html::parse_document(html);

        let mut links = Vec::new();
        let mut seen = HashSet::new();
        for selector in &self.selectors {
            for element in document.select(selector) {
                let Some(href) = element.value().attr("href") else {
                    continue;
                };
                let Some(url) = resolve_url(&base, href) else {
                    continue;
                };
                if url == base.as_str() {
                    continue;
                }
                if let Some(ref pattern) = self.pattern {
                    if !pattern.is_match(&url) {
                        continue;
                    }
                }
                push_unique(&mut links, &mut seen, url);
            }
        }

        debug!("Found {} gallery links on {}", links.len(), page_url);
        links
    }
}

/// Collects image URLs from a gallery page.
pub struct ImageExtractor {
    extension: Regex,
    allowed_hosts: Vec<String>,
}

impl ImageExtractor {
    pub fn new(site: &SiteConfig) -> Self {
        let usable = site
            .image_extensions
            .iter()
            .any(|e| !e.trim().trim_start_matches('.').is_empty());
        let extension = if usable {
            Regex::new(&extension_pattern(&site.image_extensions)).unwrap_or_else(|e| {
                warn!("Ignoring invalid image extensions: {}", e);
                DEFAULT_EXTENSION.clone()
            })
        } else {
            DEFAULT_EXTENSION.clone()
        };

        Self {
            extension,
            allowed_hosts: site
                .allowed_image_hosts
                .iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether an absolute URL passes the extension and host filters.
    pub fn accepts(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        if !self.extension.is_match(parsed.path()) {
            return false;
        }
        if self.allowed_hosts.is_empty() {
            return true;
        }
        let host = parsed.host_str().unwrap_or("").to_ascii_lowercase();
        self.allowed_hosts.iter().any(|allowed| host.contains(allowed))
    }

    /// Image URLs in document order, filtered and de-duplicated.
    pub fn extract(&self, html: &str, page_url: &str) -> Vec<String> {
        let Ok(base) = Url::parse(page_url) else {
            warn!("Cannot resolve images against invalid page URL {}", page_url);
            return Vec::new();
        };
        let document = Html::parse_document(html);
        let mut candidates: Vec<String> = Vec::new();

        for img in document.select(&IMG) {
            let el = img.value();
            for attr in IMG_SOURCE_ATTRS {
                if let Some(v) = el.attr(attr) {
                    candidates.push(v.to_string());
                }
            }
            if let Some(first) = el.attr("srcset").and_then(first_srcset_candidate) {
                candidates.push(first.to_string());
            }
        }

        for source in document.select(&SOURCE) {
            if let Some(first) = source.value().attr("srcset").and_then(first_srcset_candidate) {
                candidates.push(first.to_string());
            }
        }

        for anchor in document.select(&ANCHOR) {
            if let Some(href) = anchor.value().attr("href") {
                candidates.push(href.to_string());
            }
        }

        for el in document.select(&STYLED) {
            if let Some(style) = el.value().attr("style") {
                candidates.extend(css_urls(style));
            }
        }
        for block in document.select(&STYLE_BLOCK) {
            let css: String = block.text().collect();
            candidates.extend(css_urls(&css));
        }

        let mut images = Vec::new();
        let mut seen = HashSet::new();
        for candidate in candidates {
            if let Some(url) = resolve_url(&base, &candidate) {
                if self.accepts(&url) {
                    push_unique(&mut images, &mut seen, url);
                }
            }
        }

        debug!("Found {} images on {}", images.len(), page_url);
        images
    }
}

/// URLs referenced by `url(...)` in a CSS fragment.
fn css_urls(css: &str) -> Vec<String> {
    CSS_URL
        .captures_iter(css)
        .filter_map(|c| c.get(1).map(|m| m.as_str().trim().to_string()))
        .collect()
}
