//! LLM backend abstraction
//!
//! Supports Anthropic Claude and Google Gemini (through its
//! OpenAI-compatible endpoint).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use thiserror::Error;

/// Default Anthropic API base
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Default Gemini OpenAI-compatible API base
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Claude model used for analysis
pub const CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";

/// Gemini model used for analysis
pub const GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Sampling temperature shared by both providers
pub const ANALYSIS_TEMPERATURE: f32 = 0.7;

/// LLM backend errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Empty response")]
    EmptyResponse,
}

/// Generated text plus usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub tokens_used: Option<u64>,
}

/// Generic LLM backend trait
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Single-turn completion of a prompt
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Supported analysis providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelProvider {
    Claude,
    Gemini,
}

impl ModelProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelProvider::Claude => "claude",
            ModelProvider::Gemini => "gemini",
        }
    }

    /// Human-readable provider name
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelProvider::Claude => "Claude AI",
            ModelProvider::Gemini => "Gemini AI",
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelProvider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" => Ok(ModelProvider::Claude),
            "gemini" => Ok(ModelProvider::Gemini),
            other => Err(LlmError::Config(format!(
                "unknown model '{}'. Valid options: claude, gemini",
                other
            ))),
        }
    }
}

/// OpenAI-compatible backend configuration
#[derive(Debug, Clone)]
pub struct OpenAIBackendConfig {
    /// API key
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API
    pub base_url: Option<String>,
    /// Model name
    pub model: String,
    /// Temperature (0.0 - 2.0)
    pub temperature: f32,
    /// Max output tokens
    pub max_tokens: u32,
}

impl Default for OpenAIBackendConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            model: GEMINI_MODEL.to_string(),
            temperature: ANALYSIS_TEMPERATURE,
            max_tokens: 8192,
        }
    }
}

impl OpenAIBackendConfig {
    /// Gemini through its OpenAI-compatible endpoint
    pub fn gemini(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: Some(GEMINI_BASE_URL.to_string()),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }
}

/// OpenAI-compatible LLM backend
pub struct OpenAIBackend {
    client: Client<OpenAIConfig>,
    config: OpenAIBackendConfig,
}

impl OpenAIBackend {
    pub fn new(config: OpenAIBackendConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Config("API key is empty".to_string()));
        }

        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);

        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url.trim_end_matches('/'));
        }

        // Faults surface on the first response; the caller decides what to do
        let no_retry = backoff::ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();
        let client = Client::with_config(openai_config).with_backoff(no_retry);

        Ok(Self { client, config })
    }
}

#[async_trait]
impl LlmBackend for OpenAIBackend {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        let messages = vec![ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| LlmError::Api(e.to_string()))?,
        )];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .messages(messages)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .build()
            .map_err(|e| LlmError::Api(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        Ok(Completion {
            text,
            tokens_used: response.usage.map(|u| u64::from(u.total_tokens)),
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Anthropic Claude backend configuration
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key
    pub api_key: String,
    /// Model name (e.g., claude-sonnet-4-20250514)
    pub model: String,
    /// Max tokens
    pub max_tokens: u32,
    /// Temperature (0.0 - 1.0)
    pub temperature: f32,
    /// API base URL
    pub base_url: String,
}

impl AnthropicConfig {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens: 4096,
            temperature: ANALYSIS_TEMPERATURE,
            base_url: ANTHROPIC_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }
}

/// Anthropic Claude backend
pub struct AnthropicBackend {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicBackend {
    pub fn new(config: AnthropicConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Config("API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        let request_body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [
                {"role": "user", "content": prompt}
            ]
        });

        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(LlmError::RateLimited(text));
            }
            return Err(LlmError::Api(format!("Anthropic API error {}: {}", status, text)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        let text = json["content"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|block| block["text"].as_str())
            .map(|s| s.to_string())
            .ok_or(LlmError::EmptyResponse)?;

        let usage = &json["usage"];
        let tokens_used = match (usage["input_tokens"].as_u64(), usage["output_tokens"].as_u64()) {
            (None, None) => None,
            (input, output) => Some(input.unwrap_or(0) + output.unwrap_or(0)),
        };

        Ok(Completion { text, tokens_used })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Thread-safe reference to an LLM backend
pub type SharedBackend = Arc<dyn LlmBackend>;

/// Create a shared OpenAI-compatible backend
pub fn create_backend(config: OpenAIBackendConfig) -> Result<SharedBackend, LlmError> {
    Ok(Arc::new(OpenAIBackend::new(config)?))
}

/// Create a shared Anthropic backend
pub fn create_anthropic_backend(config: AnthropicConfig) -> Result<SharedBackend, LlmError> {
    Ok(Arc::new(AnthropicBackend::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_provider_parse() {
        assert_eq!("Claude".parse::<ModelProvider>().unwrap(), ModelProvider::Claude);
        assert_eq!("GEMINI".parse::<ModelProvider>().unwrap(), ModelProvider::Gemini);
        assert!("gpt".parse::<ModelProvider>().is_err());
    }

    #[test]
    fn test_gemini_config() {
        let config = OpenAIBackendConfig::gemini("key");
        assert_eq!(config.model, GEMINI_MODEL);
        assert_eq!(config.max_tokens, 8192);
        assert_eq!(config.base_url.as_deref(), Some(GEMINI_BASE_URL));
    }

    #[test]
    fn test_anthropic_config() {
        let config = AnthropicConfig::new("key", CLAUDE_MODEL);
        assert_eq!(config.max_tokens, 4096);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.base_url, ANTHROPIC_BASE_URL);
    }

    #[test]
    fn test_empty_key_is_config_error() {
        assert!(matches!(
            AnthropicBackend::new(AnthropicConfig::new("", CLAUDE_MODEL)),
            Err(LlmError::Config(_))
        ));
        assert!(matches!(
            OpenAIBackend::new(OpenAIBackendConfig::default()),
            Err(LlmError::Config(_))
        ));
    }
}
