//! Social collector
//!
//! Scrapes the recent posts of one X (Twitter) profile chosen for the topic.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use tracing::info;

use research_core::{CollectedItem, SourceKind};

use crate::collector::collect_with;
use crate::{CollectError, Collector, ScrapeClient, ScrapeConfig, ScrapeRequest};

/// Topic keyword to profile handle, first match wins
pub const TOPIC_ACCOUNTS: &[(&str, &str)] = &[
    ("uniswap", "Uniswap"),
    ("ethereum", "ethereum"),
    ("bitcoin", "Bitcoin"),
    ("crypto", "CoinDesk"),
];

/// Provider-side scrape budget hint
const PROFILE_TIMEOUT_MS: u64 = 60_000;

/// Pause between profile scrolls
const SCROLL_PAUSE_MS: u64 = 2_000;

/// HTTP ceiling, above the provider hint
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

static HANDLE_NOISE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s#@]+").unwrap());

/// Pick the profile to scrape for a topic
pub fn resolve_account(topic: &str) -> String {
    let lowered = topic.to_lowercase();

    TOPIC_ACCOUNTS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, handle)| handle.to_string())
        .unwrap_or_else(|| HANDLE_NOISE.replace_all(topic, "").into_owned())
}

/// Collector for X (Twitter) profile posts
pub struct SocialCollector {
    client: ScrapeClient,
}

impl SocialCollector {
    pub fn new(config: ScrapeConfig) -> Result<Self, CollectError> {
        Ok(Self {
            client: ScrapeClient::new(config)?,
        })
    }

    /// Profile scrape request for a topic
    pub fn build_request(topic: &str, max_items: usize) -> ScrapeRequest {
        let account = resolve_account(topic);

        ScrapeRequest {
            payload: json!({
                "url": format!("https://twitter.com/{}", account),
                "scrapeType": "TWITTER_PROFILE",
                "timeoutMs": PROFILE_TIMEOUT_MS,
                "postCount": max_items,
                "scrollPauseTime": SCROLL_PAUSE_MS,
            }),
            timeout: HTTP_TIMEOUT,
        }
    }
}

#[async_trait]
impl Collector for SocialCollector {
    fn source(&self) -> SourceKind {
        SourceKind::Social
    }

    async fn collect(&self, topic: &str, max_items: usize) -> Vec<CollectedItem> {
        info!("Collecting X data for topic: '{}'", topic);

        let request = Self::build_request(topic, max_items);
        collect_with(&self.client, &request, self.source(), max_items).await
    }
}
