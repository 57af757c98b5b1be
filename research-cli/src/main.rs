//! Research Agent CLI
//!
//! Collects X posts and web search results on a topic, analyzes them with
//! Claude or Gemini and writes a Markdown report.

mod config;
mod validate;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use research_agents::{
    create_anthropic_backend, create_backend, Analyzer, AnthropicConfig, ModelProvider,
    OpenAIBackendConfig, SharedBackend, CLAUDE_MODEL,
};
use research_collect::create_collector;
use research_core::{Depth, DEFAULT_MAX_ITEMS};
use research_runtime::{Pipeline, PipelineConfig, PipelineError, PipelineEvent};

use config::{Config, ConfigError};
use validate::{
    parse_depth, parse_model, parse_sources, validate_max_items, validate_topic, SourceSelection,
};

#[derive(Parser)]
#[command(name = "research-agent")]
#[command(author, version, about = "Research Agent: AI-powered research automation", long_about = None)]
struct Cli {
    /// Research topic to investigate
    #[arg(short, long, value_parser = validate_topic)]
    topic: String,

    /// Data sources to use: x, web, or all (comma-separated)
    #[arg(short, long, default_value = "all", value_parser = parse_sources)]
    sources: SourceSelection,

    /// Maximum items to collect per source (1-100)
    #[arg(long, default_value_t = DEFAULT_MAX_ITEMS, value_parser = validate_max_items)]
    max_items: usize,

    /// Output filename inside OUTPUT_DIR (default: auto-generated)
    #[arg(short, long)]
    output: Option<String>,

    /// Analysis depth: quick or detailed
    #[arg(short, long, default_value = "detailed", value_parser = parse_depth)]
    depth: Depth,

    /// AI model to use: claude or gemini (default: DEFAULT_MODEL, then gemini)
    #[arg(short, long, value_parser = parse_model)]
    model: Option<ModelProvider>,

    /// Log filter (e.g. info, debug, research_collect=debug)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    tokio::select! {
        result = run(cli) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                report_failure(&e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            println!("\n\n⚠️  Operation cancelled by user");
            ExitCode::SUCCESS
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let model = cli.model.unwrap_or(config.default_model);

    println!("\n🔬 Research Agent");
    println!("   Topic: {}", cli.topic);
    println!("   Sources: {}", cli.sources.names().join(", "));
    println!("   Max items per source: {}", cli.max_items);
    println!("   Analysis depth: {}", cli.depth.as_str());
    println!("   AI Model: {}\n", model);

    let backend = create_analysis_backend(&config, model)?;
    let collectors = cli
        .sources
        .0
        .iter()
        .map(|source| create_collector(*source, config.scrape_config()))
        .collect::<Result<Vec<_>, _>>()?;

    let pipeline = Pipeline::new(PipelineConfig {
        collectors,
        analyzer: Analyzer::new(backend),
        output_dir: config.output_dir.clone(),
        max_items: cli.max_items,
        depth: cli.depth,
    });

    println!("🔍 Collecting data...");
    let display_name = model.display_name();
    let summary = pipeline
        .run_with_progress(&cli.topic, cli.output.as_deref(), |event| match event {
            PipelineEvent::Collected { source, count } => {
                println!("✓ Collected {} {} items", count, source);
            }
            PipelineEvent::CollectionFinished { total } => {
                println!("\nTotal items collected: {}\n", total);
            }
            PipelineEvent::Analyzing { model } => {
                println!("🤖 Analyzing with {} ({})...", display_name, model);
            }
            PipelineEvent::Analyzed { tokens_used } => {
                let tokens = tokens_used
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                println!("✓ Analysis completed");
                println!("  Tokens used: {}\n", tokens);
            }
        })
        .await?;

    println!("✓ Report generated successfully!\n");
    println!("📄 Report saved to: {}\n", summary.report_path.display());
    println!("You can open it with any Markdown viewer or editor.");

    Ok(())
}

fn create_analysis_backend(config: &Config, model: ModelProvider) -> Result<SharedBackend> {
    let key = config.require_model_key(model)?;

    let backend = match model {
        ModelProvider::Claude => create_anthropic_backend(
            AnthropicConfig::new(key, CLAUDE_MODEL).with_base_url(&config.anthropic_base_url),
        )?,
        ModelProvider::Gemini => create_backend(
            OpenAIBackendConfig::gemini(key).with_base_url(&config.gemini_base_url),
        )?,
    };

    Ok(backend)
}

fn report_failure(e: &anyhow::Error) {
    if let Some(config_error) = e.downcast_ref::<ConfigError>() {
        println!("❌ Configuration error: {}", config_error);
        println!("\n💡 Tip: Make sure to:");
        println!("  1. Copy .env.example to .env");
        println!("  2. Add your API keys to .env file");
        return;
    }

    match e.downcast_ref::<PipelineError>() {
        Some(PipelineError::NoData) => println!("❌ No data collected. Exiting."),
        Some(PipelineError::ReportFailed(report_error)) => {
            println!("❌ Failed to generate report: {}", report_error)
        }
        Some(pipeline_error) => println!("❌ {}", pipeline_error),
        None => {
            error!("Unexpected error: {:#}", e);
            println!("❌ Unexpected error: {}", e);
        }
    }
}
