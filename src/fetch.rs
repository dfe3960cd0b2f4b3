//! Document fetching

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, error};

use crate::error::ScrapeError;

/// Source of raw markup for a URL.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Blocking HTTP fetcher (using ureq).
///
/// Non-2xx responses are failures. No retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            user_agent: user_agent.to_string(),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let failed = |reason: String| {
            error!(url, %reason, "failed to fetch URL");
            ScrapeError::FetchFailed {
                url: url.to_string(),
                reason,
            }
        };

        let response = self
            .agent
            .get(url)
            .header("User-Agent", self.user_agent.as_str())
            .call()
            .map_err(|e| failed(e.to_string()))?;

        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| failed(e.to_string()))?;

        debug!(url, bytes = body.len(), "fetched document");
        Ok(body)
    }
}

/// Serves fixed markup per URL; unknown URLs fail like an HTTP 404.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, markup: &str) -> Self {
        self.pages.insert(url.to_string(), markup.to_string());
        self
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::FetchFailed {
                url: url.to_string(),
                reason: "http status: 404".to_string(),
            })
    }
}
