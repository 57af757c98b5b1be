//! Collector capability
//!
//! A collector turns a topic into normalized items from one provider.
//! Collection is best-effort: every failure is logged and degrades to an
//! empty sequence so the caller can carry on with the other sources.

use async_trait::async_trait;
use tracing::{error, info};

use research_core::{normalize, CollectedItem, ItemSchema, SourceKind};

use crate::{CollectError, ScrapeClient, ScrapeConfig, ScrapeRequest, SocialCollector, WebCollector};

/// Common interface for data collectors
#[async_trait]
pub trait Collector: Send + Sync {
    /// Source kind of every item this collector yields
    fn source(&self) -> SourceKind;

    /// Collect at most `max_items` items for a topic; never fails
    async fn collect(&self, topic: &str, max_items: usize) -> Vec<CollectedItem>;
}

/// Create the collector for a source kind
pub fn create_collector(
    source: SourceKind,
    config: ScrapeConfig,
) -> Result<Box<dyn Collector>, CollectError> {
    Ok(match source {
        SourceKind::Social => Box::new(SocialCollector::new(config)?),
        SourceKind::Web => Box::new(WebCollector::new(config)?),
    })
}

/// Run one scrape and normalize the response through the source's schema
pub(crate) async fn collect_with(
    client: &ScrapeClient,
    request: &ScrapeRequest,
    source: SourceKind,
    max_items: usize,
) -> Vec<CollectedItem> {
    let schema = ItemSchema::for_source(source);
    let envelope = match client.scrape(request).await {
        Ok(envelope) => envelope,
        Err(e) => {
            error!("Error collecting {} data: {}", schema.source, e);
            return Vec::new();
        }
    };

    if !envelope.success {
        error!(
            "API returned success=false: {}",
            envelope.message.as_deref().unwrap_or("no message")
        );
        return Vec::new();
    }

    let mut items = normalize(&envelope.data, schema, max_items);
    items.truncate(max_items);

    info!("Collected {} {} items", items.len(), schema.source);
    items
}
