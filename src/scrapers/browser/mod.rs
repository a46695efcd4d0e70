//! Headless browser fetcher for JS-rendered gallery pages.
//!
//! Uses chromiumoxide (CDP). One fetcher owns one browser process (or one
//! remote connection) and is closed after a single scrape attempt.

mod config;
mod fetch;

pub use config::{default_headless, default_timeout, BrowserEngineConfig};
pub use fetch::ScrollTracker;

use std::path::{Path, PathBuf};

#[cfg(feature = "browser")]
use std::time::Duration;

#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

use super::config::ScrapeConfig;
use super::error::ScrapeError;

/// Common Chrome executable paths to check.
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Common install locations
    "/opt/google/chrome/google-chrome",
];

/// Executable names looked up in `$PATH`.
const CHROME_COMMANDS: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// Locate a Chrome/Chromium executable.
///
/// An explicit path must exist; otherwise well-known install paths are
/// checked before `$PATH`.
pub fn find_chrome(explicit: Option<&Path>) -> Result<PathBuf, ScrapeError> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(ScrapeError::Browser(format!(
            "Configured Chrome executable not found: {}",
            path.display()
        )));
    }

    if let Some(path) = CHROME_PATHS.iter().map(Path::new).find(|p| p.exists()) {
        return Ok(path.to_path_buf());
    }

    if let Some(path) = CHROME_COMMANDS.iter().find_map(|cmd| which::which(cmd).ok()) {
        return Ok(path);
    }

    Err(ScrapeError::Browser(
        "Chrome/Chromium not found. Install it or set CHROME_PATH:\n\
         - Arch/Manjaro: sudo pacman -S chromium\n\
         - Ubuntu/Debian: sudo apt install chromium-browser\n\
         - Fedora: sudo dnf install chromium"
            .to_string(),
    ))
}

/// Browser-based page fetcher.
#[cfg(feature = "browser")]
pub struct BrowserFetcher {
    pub(crate) config: BrowserEngineConfig,
    pub(crate) scrape: ScrapeConfig,
    pub(crate) browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    remote: bool,
}

#[cfg(feature = "browser")]
impl BrowserFetcher {
    pub fn new(config: BrowserEngineConfig, scrape: ScrapeConfig) -> Self {
        Self {
            config,
            scrape,
            browser: None,
            handler: None,
            remote: false,
        }
    }

    /// Launch or connect to browser if not already running.
    pub async fn ensure_browser(&mut self) -> Result<(), ScrapeError> {
        if self.browser.is_some() {
            return Ok(());
        }

        if let Some(remote_url) = self.config.remote_url.clone() {
            return self.connect_remote(&remote_url).await;
        }

        let chrome_path = find_chrome(self.config.chrome_path.as_deref())?;
        info!(
            "Launching browser {} (headless={})",
            chrome_path.display(),
            self.config.headless
        );

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(Duration::from_secs(self.config.timeout));

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--no-sandbox") // Often needed for headless in containers
            .arg("--disable-gpu")
            .arg("--disable-software-rasterizer");

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| ScrapeError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Browser(format!("Failed to launch browser: {}", e)))?;

        self.attach(browser, handler, false);
        Ok(())
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(&mut self, url: &str) -> Result<(), ScrapeError> {
        info!("Connecting to remote browser at {}", url);

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .timeout(Duration::from_secs(self.config.timeout))
            .send()
            .await
            .map_err(|e| ScrapeError::Browser(format!("Failed to reach remote browser: {}", e)))?
            .json()
            .await
            .map_err(|e| ScrapeError::Browser(format!("Bad browser version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ScrapeError::Browser("No webSocketDebuggerUrl in response".into()))?;

        debug!("Connecting to WebSocket: {}", ws_url);

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: Duration::from_secs(self.config.timeout),
            ..Default::default()
        };

        let (browser, handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| ScrapeError::Browser(format!("Failed to connect to browser: {}", e)))?;

        self.attach(browser, handler, true);
        Ok(())
    }

    /// Keep the browser and drive its CDP event loop in the background.
    fn attach(&mut self, browser: Browser, mut handler: chromiumoxide::Handler, remote: bool) {
        self.handler = Some(tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        }));
        self.browser = Some(browser);
        self.remote = remote;
    }

    /// Close the browser. Local processes are shut down; remote connections
    /// are only dropped.
    pub async fn close(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            if !self.remote {
                if let Err(e) = browser.close().await {
                    warn!("Browser close failed: {}", e);
                }
            }
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct BrowserFetcher;

#[cfg(not(feature = "browser"))]
impl BrowserFetcher {
    pub fn new(_config: BrowserEngineConfig, _scrape: ScrapeConfig) -> Self {
        Self
    }

    pub async fn ensure_browser(&mut self) -> Result<(), ScrapeError> {
        Err(ScrapeError::Unsupported(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
                .to_string(),
        ))
    }

    pub async fn fetch(&mut self, _url: &str) -> Result<String, ScrapeError> {
        self.ensure_browser().await.map(|_| String::new())
    }

    pub async fn close(&mut self) {}
}
