//! Environment configuration

use std::env::VarError;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use research_agents::{ModelProvider, ANTHROPIC_BASE_URL, GEMINI_BASE_URL};
use research_collect::{ScrapeConfig, DEFAULT_SCRAPE_ENDPOINT};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required in .env file")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("Either ANTHROPIC_API_KEY or GEMINI_API_KEY is required in .env file")]
    NoModelKey,

    #[error("{var} is required for {model} model")]
    MissingModelKey { model: ModelProvider, var: &'static str },
}

/// Settings read from the process environment
#[derive(Debug, Clone)]
pub struct Config {
    pub sela_api_key: String,
    pub sela_endpoint: String,
    pub anthropic_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub gemini_base_url: String,
    /// Model used when `--model` is absent
    pub default_model: ModelProvider,
    pub output_dir: PathBuf,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Config {
    /// Read configuration from the environment; `.env` must already be loaded
    pub fn load() -> Result<Self, ConfigError> {
        build_config(|key| std::env::var(key))
    }

    /// Check that the key for `model` is present
    pub fn require_model_key(&self, model: ModelProvider) -> Result<&str, ConfigError> {
        let (key, var) = match model {
            ModelProvider::Claude => (&self.anthropic_api_key, "ANTHROPIC_API_KEY"),
            ModelProvider::Gemini => (&self.gemini_api_key, "GEMINI_API_KEY"),
        };
        key.as_deref()
            .ok_or(ConfigError::MissingModelKey { model, var })
    }

    pub fn scrape_config(&self) -> ScrapeConfig {
        ScrapeConfig::new(&self.sela_api_key, &self.sela_endpoint)
            .with_retries(self.max_retries, self.retry_delay)
    }
}

fn build_config<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    // Blank values count as unset
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let anthropic_api_key = optional("ANTHROPIC_API_KEY");
    let gemini_api_key = optional("GEMINI_API_KEY");
    if anthropic_api_key.is_none() && gemini_api_key.is_none() {
        return Err(ConfigError::NoModelKey);
    }

    let sela_api_key =
        optional("SELA_API_KEY").ok_or_else(|| ConfigError::MissingEnvVar("SELA_API_KEY".to_string()))?;

    let default_model = or_default("DEFAULT_MODEL", "gemini")
        .parse::<ModelProvider>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "DEFAULT_MODEL".to_string(),
            reason: e.to_string(),
        })?;

    Ok(Config {
        sela_api_key,
        sela_endpoint: or_default("SELA_API_ENDPOINT", DEFAULT_SCRAPE_ENDPOINT),
        anthropic_api_key,
        gemini_api_key,
        anthropic_base_url: or_default("ANTHROPIC_BASE_URL", ANTHROPIC_BASE_URL),
        gemini_base_url: or_default("GEMINI_BASE_URL", GEMINI_BASE_URL),
        default_model,
        output_dir: PathBuf::from(or_default("OUTPUT_DIR", "./reports")),
        max_retries: parse_u32("MAX_RETRIES", "3")?,
        retry_delay: Duration::from_secs(u64::from(parse_u32("RETRY_DELAY", "2")?)),
    })
}
