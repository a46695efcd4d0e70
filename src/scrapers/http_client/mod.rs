//! HTTP client for image downloads.

mod user_agent;

pub use user_agent::{resolve_user_agent, USER_AGENT};

use std::time::Duration;

use reqwest::{Client, Proxy, Response};
use tracing::debug;

/// Thin wrapper over a configured reqwest client.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client with the default user agent and no proxy.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_options(timeout, None, None)
    }

    /// Create a client with a custom user agent and optional proxy.
    /// The proxy applies to every scheme.
    pub fn with_options(
        timeout: Duration,
        user_agent_config: Option<&str>,
        proxy: Option<&str>,
    ) -> Result<Self, reqwest::Error> {
        let user_agent = resolve_user_agent(user_agent_config);
        let mut builder = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true);

        if let Some(proxy) = proxy {
            debug!("Routing downloads through proxy {}", proxy);
            builder = builder.proxy(Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// GET a URL, sending `referer` when given.
    pub async fn get(&self, url: &str, referer: Option<&str>) -> Result<Response, reqwest::Error> {
        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            request = request.header(reqwest::header::REFERER, referer);
        }
        request.send().await
    }
}
