//! Scraping provider client
//!
//! One HTTP client per collector: connection pool, bearer auth and the
//! retry policy live here so both collectors share them.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::{retry_with_backoff, CollectError};

/// Default scraping endpoint
pub const DEFAULT_SCRAPE_ENDPOINT: &str = "https://api.selanetwork.io/api/rpc/scrapeUrl";

const USER_AGENT: &str = concat!("research-agent/", env!("CARGO_PKG_VERSION"));

/// Scraping provider configuration
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Provider endpoint URL
    pub endpoint: String,
    /// Bearer token
    pub api_key: String,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Back-off base; doubles on every retry
    pub retry_base_delay: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SCRAPE_ENDPOINT.to_string(),
            api_key: String::new(),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(2),
        }
    }
}

impl ScrapeConfig {
    pub fn new(api_key: &str, endpoint: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            endpoint: endpoint.to_string(),
            ..Default::default()
        }
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }
}

/// One outbound scrape: JSON body plus a hard timeout
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub payload: Value,
    /// Ceiling for the HTTP round-trip, longer than the body's `timeoutMs` hint
    pub timeout: Duration,
}

/// Top-level provider response
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// HTTP session for the scraping provider
#[derive(Debug, Clone)]
pub struct ScrapeClient {
    http: Client,
    config: ScrapeConfig,
}

impl ScrapeClient {
    pub fn new(config: ScrapeConfig) -> Result<Self, CollectError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CollectError::ClientBuild(e.to_string()))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Send a scrape request, retrying transient failures
    pub async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeEnvelope, CollectError> {
        debug!("Request URL: {}", self.config.endpoint);
        debug!("Request payload: {}", request.payload);

        retry_with_backoff(self.config.max_retries, self.config.retry_base_delay, || {
            self.send_once(request)
        })
        .await
    }

    async fn send_once(&self, request: &ScrapeRequest) -> Result<ScrapeEnvelope, CollectError> {
        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request.payload)
            .timeout(request.timeout)
            .send()
            .await?;

        let status = response.status();
        info!("Response status: {}", status);

        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            error!("Error response: {}", body);
            return Err(CollectError::Status {
                status: status.as_u16(),
                body,
                retry_after,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// `Retry-After` in delta-seconds form; HTTP dates are ignored
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
