//! Web collector
//!
//! Runs one Google search scrape for the topic.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use research_core::{CollectedItem, SourceKind};

use crate::collector::collect_with;
use crate::{CollectError, Collector, ScrapeClient, ScrapeConfig, ScrapeRequest};

/// Provider-side scrape budget hint
const SEARCH_TIMEOUT_MS: u64 = 120_000;

/// HTTP ceiling, above the provider hint
const HTTP_TIMEOUT: Duration = Duration::from_secs(180);

/// Collector for web search results
pub struct WebCollector {
    client: ScrapeClient,
}

impl WebCollector {
    pub fn new(config: ScrapeConfig) -> Result<Self, CollectError> {
        Ok(Self {
            client: ScrapeClient::new(config)?,
        })
    }

    /// Search scrape request for a topic
    pub fn build_request(topic: &str, max_items: usize) -> ScrapeRequest {
        ScrapeRequest {
            payload: json!({
                "scrapeType": "GOOGLE_SEARCH",
                "search_parameters": {
                    "engine": "google",
                    "q": topic,
                    "location": "United States",
                    "location_requested": "United States",
                    "google_domain": "google.com",
                    "hl": "en",
                    "gl": "us",
                    "device": "desktop",
                },
                "postCount": max_items,
                "timeoutMs": SEARCH_TIMEOUT_MS,
            }),
            timeout: HTTP_TIMEOUT,
        }
    }
}

#[async_trait]
impl Collector for WebCollector {
    fn source(&self) -> SourceKind {
        SourceKind::Web
    }

    async fn collect(&self, topic: &str, max_items: usize) -> Vec<CollectedItem> {
        info!("Collecting web data for topic: '{}'", topic);

        let request = Self::build_request(topic, max_items);
        collect_with(&self.client, &request, self.source(), max_items).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request() {
        let request = WebCollector::build_request("AI agents 2024", 30);
        let params = &request.payload["search_parameters"];

        assert_eq!(request.payload["scrapeType"], "GOOGLE_SEARCH");
        assert_eq!(request.payload["postCount"], 30);
        assert_eq!(params["q"], "AI agents 2024");
        assert_eq!(params["engine"], "google");
        assert!(request.payload.get("url").is_none());
        assert!(request.timeout > Duration::from_millis(SEARCH_TIMEOUT_MS));
    }
}
