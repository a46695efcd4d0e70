//! Page fetch methods for browser.

#[cfg(feature = "browser")]
use std::time::Duration;

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
#[cfg(feature = "browser")]
use chromiumoxide::Page;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use super::BrowserFetcher;
#[cfg(feature = "browser")]
use crate::scrapers::error::ScrapeError;

/// Default user agent for browser requests.
#[cfg(feature = "browser")]
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// JavaScript to wait for page ready state.
#[cfg(feature = "browser")]
const WAIT_FOR_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
            setTimeout(() => resolve('timeout'), 10000);
        }
    })
"#;

/// Scrolls to the bottom and reports the resulting document height.
#[cfg(feature = "browser")]
const SCROLL_SCRIPT: &str = r#"
    (() => {
        window.scrollTo(0, document.body ? document.body.scrollHeight : 0);
        return document.body ? document.body.scrollHeight : 0;
    })()
"#;

/// Decides when the scroll-to-bottom loop has stalled.
///
/// Scrolling stops after `stall_limit` consecutive rounds without the page
/// growing, or after `max_rounds` rounds in total.
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    last_height: Option<u64>,
    stalls: u32,
    rounds: u32,
    stall_limit: u32,
    max_rounds: u32,
}

impl ScrollTracker {
    pub fn new(stall_limit: u32, max_rounds: u32) -> Self {
        Self {
            last_height: None,
            stalls: 0,
            rounds: 0,
            stall_limit: stall_limit.max(1),
            max_rounds,
        }
    }

    /// Record the height seen after a scroll. Returns true to keep scrolling.
    pub fn observe(&mut self, height: u64) -> bool {
        self.rounds += 1;
        match self.last_height {
            Some(last) if height <= last => self.stalls += 1,
            _ => self.stalls = 0,
        }
        self.last_height = Some(height);
        self.stalls < self.stall_limit && self.rounds < self.max_rounds
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }
}

/// Map `Page.navigate`'s `errorText` to an error. Chrome reports a failed
/// load there and then renders its own error page.
#[cfg(feature = "browser")]
fn check_navigation(url: &str, error_text: Option<&str>) -> Result<(), ScrapeError> {
    match error_text.map(str::trim) {
        Some(text) if !text.is_empty() => Err(ScrapeError::Navigation {
            url: url.to_string(),
            message: text.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Wait for the page to reach a ready state.
#[cfg(feature = "browser")]
async fn wait_for_page_ready(page: &Page, timeout_secs: u64) {
    let ready_timeout = Duration::from_secs(timeout_secs);
    match tokio::time::timeout(
        ready_timeout,
        page.evaluate(WAIT_FOR_READY_SCRIPT.to_string()),
    )
    .await
    {
        Ok(Ok(result)) => {
            let state: String = result
                .into_value()
                .unwrap_or_else(|_| "unknown".to_string());
            debug!("Page ready state: {}", state);
        }
        Ok(Err(e)) => debug!("Could not check ready state: {}", e),
        Err(_) => warn!("Timeout waiting for page ready state"),
    }
}

/// Wait for a specific selector if configured.
#[cfg(feature = "browser")]
async fn wait_for_selector_if_configured(page: &Page, selector: Option<&str>, timeout_secs: u64) {
    if let Some(selector) = selector {
        debug!("Waiting for selector: {}", selector);
        let timeout = Duration::from_secs(timeout_secs);
        match tokio::time::timeout(timeout, page.find_element(selector)).await {
            Ok(Ok(_)) => debug!("Selector found"),
            Ok(Err(e)) => warn!("Selector not found: {}", e),
            Err(_) => warn!("Timeout waiting for selector"),
        }
    }
}

#[cfg(feature = "browser")]
impl BrowserFetcher {
    /// Load a URL and return the rendered HTML after lazy content settles.
    pub async fn fetch(&mut self, url: &str) -> Result<String, ScrapeError> {
        self.ensure_browser().await?;

        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ScrapeError::Browser("browser not initialized".to_string()))?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::Browser(format!("Failed to open page: {}", e)))?;

        // Page is always closed, whatever the outcome
        let result = self.fetch_inner(&page, url).await;
        let _ = page.close().await;
        result
    }

    async fn fetch_inner(&self, page: &Page, url: &str) -> Result<String, ScrapeError> {
        page.execute(SetUserAgentOverrideParams::new(
            BROWSER_USER_AGENT.to_string(),
        ))
        .await
        .map_err(|e| ScrapeError::Browser(format!("Failed to set user agent: {}", e)))?;

        self.navigate_to_url(page, url).await?;

        wait_for_page_ready(page, self.config.timeout).await;
        wait_for_selector_if_configured(
            page,
            self.config.wait_for_selector.as_deref(),
            self.config.timeout,
        )
        .await;

        self.scroll_to_bottom(page).await;

        page.content().await.map_err(|e| ScrapeError::Navigation {
            url: url.to_string(),
            message: format!("Failed to read page content: {}", e),
        })
    }

    /// Navigate to a URL with timeout handling.
    async fn navigate_to_url(&self, page: &Page, url: &str) -> Result<(), ScrapeError> {
        info!("Navigating to {}", url);
        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                message: format!("Invalid URL: {}", e),
            })?;

        let nav_timeout = Duration::from_secs(self.config.timeout);
        let response = tokio::time::timeout(nav_timeout, page.execute(nav_params))
            .await
            .map_err(|_| ScrapeError::Timeout {
                url: url.to_string(),
                secs: self.config.timeout,
            })?
            .map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        // A failed load (DNS, refused connection, proxy) still answers the
        // command; the failure is only in errorText.
        check_navigation(url, response.result.error_text.as_deref())
    }

    /// Scroll until the document stops growing, so lazy-loaded items render.
    async fn scroll_to_bottom(&self, page: &Page) {
        let delay = Duration::from_millis(self.scrape.scroll_delay_ms);
        let mut tracker =
            ScrollTracker::new(self.scrape.scroll_stall_rounds, self.scrape.scroll_max_rounds);

        loop {
            let height = match page.evaluate(SCROLL_SCRIPT.to_string()).await {
                Ok(result) => result.into_value::<f64>().unwrap_or(0.0).max(0.0) as u64,
                Err(e) => {
                    debug!("Scroll script failed: {}", e);
                    break;
                }
            };
            tokio::time::sleep(delay).await;
            if !tracker.observe(height) {
                break;
            }
        }

        debug!("Stopped scrolling after {} rounds", tracker.rounds());
    }
}
