//! Research pipeline
//!
//! Drives one run end to end:
//! - Collectors run one after another and their items are merged
//! - The analyzer turns the merged items into one completion
//! - The report renderer writes the Markdown document

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Local;
use thiserror::Error;
use tracing::{info, warn};

use research_agents::Analyzer;
use research_collect::Collector;
use research_core::{AnalysisMetadata, AnalysisOutcome, CollectedItem, Depth, SourceKind, DEFAULT_MAX_ITEMS};

use crate::report::{generate_report, resolve_output_path, ReportError};

/// Pipeline failures that abort a run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No data collected from any source")]
    NoData,

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error(transparent)]
    ReportFailed(#[from] ReportError),
}

/// Pipeline configuration
pub struct PipelineConfig {
    /// One collector per selected source, run in order
    pub collectors: Vec<Box<dyn Collector>>,
    /// Analysis client
    pub analyzer: Analyzer,
    /// Directory reports are written to
    pub output_dir: PathBuf,
    /// Per-collector item cap
    pub max_items: usize,
    /// Analysis depth
    pub depth: Depth,
}

/// Stage boundaries reported while a run is in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent<'a> {
    /// One collector finished
    Collected { source: SourceKind, count: usize },
    /// Every collector finished with at least one item
    CollectionFinished { total: usize },
    /// The merged items are being sent to the model
    Analyzing { model: &'a str },
    /// The model answered
    Analyzed { tokens_used: Option<u64> },
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report_path: PathBuf,
    /// Items collected per source kind, zero for sources that came back empty
    pub per_source: BTreeMap<SourceKind, usize>,
    pub metadata: AnalysisMetadata,
}

impl RunSummary {
    pub fn items_collected(&self) -> usize {
        self.per_source.values().sum()
    }
}

/// Sequential research pipeline
pub struct Pipeline {
    collectors: Vec<Box<dyn Collector>>,
    analyzer: Analyzer,
    output_dir: PathBuf,
    max_items: usize,
    depth: Depth,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let max_items = if config.max_items == 0 {
            DEFAULT_MAX_ITEMS
        } else {
            config.max_items
        };

        Self {
            collectors: config.collectors,
            analyzer: config.analyzer,
            output_dir: config.output_dir,
            max_items,
            depth: config.depth,
        }
    }

    /// Run every collector in order and merge their items
    pub async fn collect(&self, topic: &str) -> (Vec<CollectedItem>, BTreeMap<SourceKind, usize>) {
        self.collect_reporting(topic, &mut |_| {}).await
    }

    async fn collect_reporting<F>(
        &self,
        topic: &str,
        on_event: &mut F,
    ) -> (Vec<CollectedItem>, BTreeMap<SourceKind, usize>)
    where
        F: FnMut(PipelineEvent<'_>),
    {
        let mut items = Vec::new();
        let mut per_source = BTreeMap::new();

        for collector in &self.collectors {
            let source = collector.source();
            info!("Collecting {} data for '{}'", source, topic);

            let batch = collector.collect(topic, self.max_items).await;
            if batch.is_empty() {
                warn!("No {} data collected", source);
            }
            on_event(PipelineEvent::Collected {
                source,
                count: batch.len(),
            });
            *per_source.entry(source).or_insert(0) += batch.len();
            items.extend(batch);
        }

        (items, per_source)
    }

    /// Collect, analyze and write the report
    pub async fn run(&self, topic: &str, output_name: Option<&str>) -> Result<RunSummary, PipelineError> {
        self.run_with_progress(topic, output_name, |_| {}).await
    }

    /// Same as [`Pipeline::run`], calling `on_event` as each stage finishes
    pub async fn run_with_progress<F>(
        &self,
        topic: &str,
        output_name: Option<&str>,
        mut on_event: F,
    ) -> Result<RunSummary, PipelineError>
    where
        F: FnMut(PipelineEvent<'_>),
    {
        info!("Starting research on '{}'", topic);

        let (items, per_source) = self.collect_reporting(topic, &mut on_event).await;
        if items.is_empty() {
            return Err(PipelineError::NoData);
        }
        info!("Total items collected: {}", items.len());
        on_event(PipelineEvent::CollectionFinished { total: items.len() });

        on_event(PipelineEvent::Analyzing {
            model: self.analyzer.model_name(),
        });
        let result = self.analyzer.analyze(topic, &items, self.depth).await;
        if let AnalysisOutcome::Failed(message) = &result.outcome {
            return Err(PipelineError::AnalysisFailed(message.clone()));
        }
        on_event(PipelineEvent::Analyzed {
            tokens_used: result.metadata.tokens_used,
        });

        let sources = self.analyzer.summarize_sources(&items);
        let path = resolve_output_path(&self.output_dir, output_name, topic, Local::now().naive_local());
        let report_path = generate_report(topic, &result, &sources, &path)?;

        Ok(RunSummary {
            report_path,
            per_source,
            metadata: result.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use research_agents::{Completion, LlmBackend, LlmError};
    use std::sync::{Arc, Mutex};

    struct MockCollector {
        source: SourceKind,
        items: Vec<CollectedItem>,
        calls: Arc<Mutex<Vec<(String, usize)>>>,
    }

    #[async_trait]
    impl Collector for MockCollector {
        fn source(&self) -> SourceKind {
            self.source
        }

        async fn collect(&self, topic: &str, max_items: usize) -> Vec<CollectedItem> {
            self.calls.lock().unwrap().push((topic.to_string(), max_items));
            self.items.iter().take(max_items).cloned().collect()
        }
    }

    struct MockBackend {
        reply: Result<String, String>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl LlmBackend for MockBackend {
        async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(Completion {
                    text: text.clone(),
                    tokens_used: Some(900),
                }),
                Err(e) => Err(LlmError::Api(e.clone())),
            }
        }

        fn model_name(&self) -> &str {
            "mock-model"
        }
    }

    fn social_items() -> Vec<CollectedItem> {
        vec![
            CollectedItem::new(SourceKind::Social, "Uniswap v4 is now live on mainnet! Hooks are here.")
                .with_author("Uniswap")
                .with_date("2024-02-10"),
            CollectedItem::new(SourceKind::Social, "v4 pools already hold $50M in liquidity.")
                .with_author("DefiLlama"),
            CollectedItem::new(SourceKind::Social, "Gas savings from singleton design are real.")
                .with_author("haydenzadams"),
        ]
    }

    fn web_items() -> Vec<CollectedItem> {
        vec![
            CollectedItem::new(SourceKind::Web, "Uniswap Labs has officially launched version 4.")
                .with_title("Uniswap v4 Launch: What You Need to Know")
                .with_author("TechCrunch")
                .with_url("https://techcrunch.com/uniswap-v4-launch"),
            CollectedItem::new(SourceKind::Web, "Largest decentralized exchange by volume.")
                .with_title("Uniswap Dominates DEX Market")
                .with_author("CoinDesk"),
            CollectedItem::new(SourceKind::Web, "Hooks let developers customize pools.")
                .with_title("Inside Uniswap Hooks")
                .with_author("The Block"),
        ]
    }

    struct Harness {
        pipeline: Pipeline,
        calls: Arc<Mutex<Vec<(String, usize)>>>,
        prompts: Arc<Mutex<Vec<String>>>,
        dir: tempfile::TempDir,
    }

    fn harness(social: Vec<CollectedItem>, web: Vec<CollectedItem>, reply: Result<String, String>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let prompts = Arc::new(Mutex::new(Vec::new()));

        let collectors: Vec<Box<dyn Collector>> = vec![
            Box::new(MockCollector {
                source: SourceKind::Social,
                items: social,
                calls: calls.clone(),
            }),
            Box::new(MockCollector {
                source: SourceKind::Web,
                items: web,
                calls: calls.clone(),
            }),
        ];
        let backend = Arc::new(MockBackend {
            reply,
            prompts: prompts.clone(),
        });

        let pipeline = Pipeline::new(PipelineConfig {
            collectors,
            analyzer: Analyzer::new(backend),
            output_dir: dir.path().join("reports"),
            max_items: 20,
            depth: Depth::Quick,
        });

        Harness {
            pipeline,
            calls,
            prompts,
            dir,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_run() {
        let analysis = "## Executive Summary\nUniswap v4 launched with hooks.";
        let h = harness(social_items(), web_items(), Ok(analysis.to_string()));

        let summary = h.pipeline.run("Uniswap", None).await.unwrap();

        assert_eq!(summary.items_collected(), 6);
        assert_eq!(summary.per_source[&SourceKind::Social], 3);
        assert_eq!(summary.per_source[&SourceKind::Web], 3);
        assert_eq!(summary.metadata.model, "mock-model");
        assert_eq!(summary.metadata.tokens_used, Some(900));
        assert_eq!(summary.metadata.items_analyzed, 6);

        let calls = h.calls.lock().unwrap();
        assert_eq!(*calls, vec![("Uniswap".to_string(), 20), ("Uniswap".to_string(), 20)]);

        let prompts = h.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains("\"Uniswap\""));
        assert!(prompt.contains("## X (Twitter) Posts (3 items)"));
        assert!(prompt.contains("## Web Results (3 items)"));
        for item in social_items().iter().chain(web_items().iter()) {
            assert!(prompt.contains(&item.content));
        }

        let name = summary.report_path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("research_uniswap_") && name.ends_with(".md"));

        let doc = std::fs::read_to_string(&summary.report_path).unwrap();
        assert!(doc.contains("# Research Report: Uniswap"));
        assert!(doc.contains(analysis));
        assert!(doc.contains("### X (Twitter) Posts (3)"));
        assert!(doc.contains("### Web Results (3)"));
        assert_eq!(doc.matches("   > ").count(), 6);
    }

    #[tokio::test]
    async fn test_explicit_output_name() {
        let h = harness(social_items(), Vec::new(), Ok("ok".to_string()));
        let summary = h.pipeline.run("Uniswap", Some("weekly")).await.unwrap();

        assert_eq!(summary.report_path.file_name().unwrap(), "weekly.md");
        assert_eq!(summary.per_source[&SourceKind::Web], 0);
        assert!(summary.report_path.exists());
    }

    #[tokio::test]
    async fn test_no_data_aborts_before_analysis() {
        let h = harness(Vec::new(), Vec::new(), Ok("unused".to_string()));

        let err = h.pipeline.run("Uniswap", None).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoData));
        assert!(h.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analysis_failure_aborts_without_report() {
        let h = harness(social_items(), web_items(), Err("quota exceeded".to_string()));

        match h.pipeline.run("Uniswap", None).await {
            Err(PipelineError::AnalysisFailed(msg)) => assert!(msg.contains("quota exceeded")),
            other => panic!("expected analysis failure, got {:?}", other.map(|s| s.report_path)),
        }
        assert!(!h.pipeline.output_dir.exists());
    }

    #[tokio::test]
    async fn test_report_failure_is_surfaced() {
        let mut h = harness(social_items(), Vec::new(), Ok("ok".to_string()));
        let blocker = h.dir.path().join("blocker");
        std::fs::write(&blocker, "file").unwrap();
        h.pipeline.output_dir = blocker.join("reports");

        let err = h.pipeline.run("Uniswap", None).await.unwrap_err();
        assert!(matches!(err, PipelineError::ReportFailed(_)));
    }

    #[tokio::test]
    async fn test_progress_events_follow_stages() {
        let h = harness(social_items(), Vec::new(), Ok("ok".to_string()));
        let mut events = Vec::new();

        h.pipeline
            .run_with_progress("Uniswap", None, |event| events.push(format!("{:?}", event)))
            .await
            .unwrap();

        assert_eq!(
            events,
            vec![
                "Collected { source: Social, count: 3 }",
                "Collected { source: Web, count: 0 }",
                "CollectionFinished { total: 3 }",
                "Analyzing { model: \"mock-model\" }",
                "Analyzed { tokens_used: Some(900) }",
            ]
        );
    }

    #[tokio::test]
    async fn test_collection_counts_reported_before_no_data() {
        let h = harness(Vec::new(), Vec::new(), Ok("unused".to_string()));
        let mut counts = Vec::new();

        let err = h
            .pipeline
            .run_with_progress("Uniswap", None, |event| {
                if let PipelineEvent::Collected { source, count } = event {
                    counts.push((source, count));
                }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::NoData));
        assert_eq!(counts, vec![(SourceKind::Social, 0), (SourceKind::Web, 0)]);
    }

    #[tokio::test]
    async fn test_collect_respects_max_items() {
        let many: Vec<_> = (0..40)
            .map(|i| CollectedItem::new(SourceKind::Social, format!("post {i}")))
            .collect();
        let h = harness(many, web_items(), Ok("ok".to_string()));

        let (items, per_source) = h.pipeline.collect("Uniswap").await;
        assert_eq!(per_source[&SourceKind::Social], 20);
        assert_eq!(items.len(), 23);
        assert_eq!(items[0].content, "post 0");
        assert_eq!(items[20].source, SourceKind::Web);
    }
}
