//! Analysis client
//!
//! Sends the composed prompt to the configured backend and wraps the
//! outcome in an [`AnalysisResult`]. The model text is returned verbatim;
//! nothing here interprets it.

use std::collections::BTreeMap;

use tracing::{error, info};

use research_core::{
    build_prompt, AnalysisMetadata, AnalysisResult, CollectedItem, Depth, SourceKind,
};

use crate::SharedBackend;

/// Items grouped by source kind, in source order
pub type SourceGroups = BTreeMap<SourceKind, Vec<CollectedItem>>;

/// Analysis client over one LLM backend
pub struct Analyzer {
    backend: SharedBackend,
}

impl Analyzer {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Compose the prompt and run one completion; provider failures become a failed result
    pub async fn analyze(&self, topic: &str, items: &[CollectedItem], depth: Depth) -> AnalysisResult {
        let prompt = build_prompt(topic, items, depth);

        // Counts every merged item, including any the prompt caps left out
        let mut metadata = AnalysisMetadata {
            model: self.backend.model_name().to_string(),
            tokens_used: None,
            items_analyzed: items.len(),
        };

        info!(
            "Analyzing {} items with {} ({} depth, {} prompt chars)",
            items.len(),
            metadata.model,
            depth.as_str(),
            prompt.chars().count()
        );

        match self.backend.complete(&prompt).await {
            Ok(completion) => {
                metadata.tokens_used = completion.tokens_used;
                info!("Analysis completed, tokens used: {:?}", completion.tokens_used);
                AnalysisResult::completed(completion.text, metadata)
            }
            Err(e) => {
                error!("Analysis failed: {}", e);
                AnalysisResult::failed(e.to_string(), metadata)
            }
        }
    }

    /// Group items by source for report appendices
    pub fn summarize_sources(&self, items: &[CollectedItem]) -> SourceGroups {
        summarize_sources(items)
    }
}

/// Partition items by source kind, preserving order within each group
pub fn summarize_sources(items: &[CollectedItem]) -> SourceGroups {
    let mut groups = SourceGroups::new();
    for item in items {
        groups.entry(item.source).or_default().push(item.clone());
    }
    groups
}
