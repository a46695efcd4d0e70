//! Configuration management for albumgrab using the prefer crate.
//!
//! Precedence, lowest to highest: built-in defaults, config file
//! (`--config` or discovered by prefer), environment variables, CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scrapers::{BrowserEngineConfig, ScrapeConfig, SiteConfig};
use crate::services::DownloadConfig;

/// Default cache subdirectory name.
const CACHE_SUBDIR: &str = "cache";

/// Default downloads subdirectory name.
const DOWNLOADS_SUBDIR: &str = "downloads";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Directory holding one JSON file per (model, index).
    pub cache_dir: PathBuf,
    /// Directory bulk downloads are written to and served from.
    pub downloads_dir: PathBuf,
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// User agent for image downloads. None uses the built-in default.
    pub user_agent: Option<String>,
    /// Download request timeout in seconds.
    pub request_timeout: u64,
    /// Parallel image downloads per bulk request.
    pub download_concurrency: usize,
    /// Upstream proxy for both the browser and the download client.
    pub proxy: Option<String>,
    pub browser: BrowserEngineConfig,
    pub site: SiteConfig,
    pub scrape: ScrapeConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_data_dir(default_data_dir())
    }
}

/// `~/.local/share/albumgrab` or the platform equivalent.
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("albumgrab")
}

impl Settings {
    /// Create settings rooted at a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            cache_dir: data_dir.join(CACHE_SUBDIR),
            downloads_dir: data_dir.join(DOWNLOADS_SUBDIR),
            data_dir,
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            user_agent: None,
            request_timeout: 30,
            download_concurrency: 4,
            proxy: None,
            browser: BrowserEngineConfig::default(),
            site: SiteConfig::default(),
            scrape: ScrapeConfig::default(),
        }
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for (label, dir) in [
            ("data", &self.data_dir),
            ("cache", &self.cache_dir),
            ("downloads", &self.downloads_dir),
        ] {
            tracing::debug!("Ensuring {} directory {}", label, dir.display());
            std::fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create {} directory '{}': {}",
                        label,
                        dir.display(),
                        e
                    ),
                )
            })?;
        }
        Ok(())
    }

    /// Browser configuration with the global proxy filled in.
    pub fn browser_config(&self) -> BrowserEngineConfig {
        let mut browser = self.browser.clone();
        if browser.proxy.is_none() {
            browser.proxy = self.proxy.clone();
        }
        browser
    }

    /// Bulk download configuration derived from these settings.
    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig {
            downloads_dir: self.downloads_dir.clone(),
            request_timeout: Duration::from_secs(self.request_timeout),
            concurrency: self.download_concurrency.max(1),
            user_agent: self.user_agent.clone(),
            proxy: self.proxy.clone(),
            referer: Some(self.site.base_url.clone()),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// `lookup` returns a variable's value; empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("ALBUMGRAB_HOST") {
            self.host = host;
        }
        if let Some(port) = get("PORT") {
            match port.trim().parse() {
                Ok(p) => self.port = p,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {}", port),
            }
        }
        if let Some(dir) = get("ALBUMGRAB_CACHE_DIR") {
            self.cache_dir = expand_path(&dir);
        }
        if let Some(dir) = get("ALBUMGRAB_DOWNLOADS_DIR") {
            self.downloads_dir = expand_path(&dir);
        }
        if let Some(chrome) = get("CHROME_PATH") {
            self.browser.chrome_path = Some(expand_path(&chrome));
        }
        if let Some(proxy) = get("ALBUMGRAB_PROXY").or_else(|| get("HTTPS_PROXY")) {
            self.proxy = Some(proxy);
        }
        if let Some(url) = get("ALBUMGRAB_BROWSER_URL") {
            self.browser.remote_url = Some(url);
        }
        if let Some(site) = get("ALBUMGRAB_SITE_URL") {
            self.site.base_url = site;
        }
        if let Some(attempts) = get("ALBUMGRAB_MAX_ATTEMPTS") {
            match attempts.trim().parse::<u32>() {
                Ok(n) if n > 0 => self.scrape.max_attempts = n,
                _ => tracing::warn!("Ignoring invalid ALBUMGRAB_MAX_ATTEMPTS: {}", attempts),
            }
        }
        if let Some(headless) = get("ALBUMGRAB_HEADLESS") {
            self.browser.headless = !matches!(
                headless.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
    }
}

/// Expand `~` and return a path.
fn expand_path(path_str: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path_str).as_ref())
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Cache directory (defaults to `<data_dir>/cache`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,
    /// Downloads directory (defaults to `<data_dir>/downloads`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// User agent string for downloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_concurrency: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers albumgrab config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("albumgrab").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        match ext {
            "json" => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => toml::from_str(contents).map_err(|e| format!("Failed to parse TOML config: {}", e)),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let path = expand_path(path_str);
        if path.is_absolute() {
            path
        } else {
            base_dir.join(path)
        }
    }

    /// Build settings from this config.
    ///
    /// `data_dir_override` (CLI or environment) wins over the file's data dir;
    /// cache and downloads dirs follow the data dir unless set explicitly.
    pub fn to_settings(&self, base_dir: &Path, data_dir_override: Option<PathBuf>) -> Settings {
        let data_dir = data_dir_override
            .or_else(|| self.data_dir.as_ref().map(|d| self.resolve_path(d, base_dir)))
            .unwrap_or_else(default_data_dir);

        let mut settings = Settings::with_data_dir(data_dir);
        if let Some(ref dir) = self.cache_dir {
            settings.cache_dir = self.resolve_path(dir, base_dir);
        }
        if let Some(ref dir) = self.downloads_dir {
            settings.downloads_dir = self.resolve_path(dir, base_dir);
        }
        if let Some(ref host) = self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(ref ua) = self.user_agent {
            settings.user_agent = Some(ua.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(n) = self.download_concurrency {
            settings.download_concurrency = n.max(1);
        }
        if let Some(ref proxy) = self.proxy {
            settings.proxy = Some(proxy.clone());
        }
        settings.browser = self.browser.clone();
        settings.site = self.site.clone();
        settings.scrape = self.scrape.clone();
        settings.scrape.max_attempts = settings.scrape.max_attempts.max(1);
        settings
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory override from the CLI.
    pub data_dir: Option<PathBuf>,
}

/// Load settings from config file, environment and CLI overrides.
pub async fn load_settings(options: LoadOptions) -> anyhow::Result<Settings> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path)
            .await
            .map_err(anyhow::Error::msg)?,
        None => Config::load().await,
    };

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let env = |key: &str| std::env::var(key).ok();
    let data_dir_override = options.data_dir.or_else(|| {
        env("ALBUMGRAB_DATA_DIR")
            .filter(|s| !s.is_empty())
            .map(|d| expand_path(&d))
    });

    let mut settings = config.to_settings(&base_dir, data_dir_override);
    settings.apply_env(env);
    Ok(settings)
}
