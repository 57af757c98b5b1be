//! Command-line argument validators
//!
//! Used as clap value parsers, so bad input is rejected before any
//! configuration is loaded.

use research_agents::{LlmError, ModelProvider};
use research_core::{Depth, SourceKind, UnknownDepth, MAX_ITEMS_LIMIT};
use thiserror::Error;

const MIN_TOPIC_CHARS: usize = 3;
const MAX_TOPIC_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Topic cannot be empty")]
    EmptyTopic,

    #[error("Topic must be at least {} characters long", MIN_TOPIC_CHARS)]
    TopicTooShort,

    #[error("Topic must be at most {} characters long", MAX_TOPIC_CHARS)]
    TopicTooLong,

    #[error(transparent)]
    Source(#[from] research_core::UnknownSource),

    #[error("max-items must be a number: {0}")]
    NotANumber(String),

    #[error("max-items must be between 1 and 100, got {0}")]
    MaxItemsOutOfRange(usize),
}

/// Selected sources in first-seen order, without duplicates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSelection(pub Vec<SourceKind>);

impl Default for SourceSelection {
    fn default() -> Self {
        Self(SourceKind::ALL.to_vec())
    }
}

impl SourceSelection {
    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(SourceKind::selector).collect()
    }
}

/// Trimmed topic of 3 to 200 characters
pub fn validate_topic(raw: &str) -> Result<String, ValidationError> {
    let topic = raw.trim();
    let len = topic.chars().count();

    if len == 0 {
        Err(ValidationError::EmptyTopic)
    } else if len < MIN_TOPIC_CHARS {
        Err(ValidationError::TopicTooShort)
    } else if len > MAX_TOPIC_CHARS {
        Err(ValidationError::TopicTooLong)
    } else {
        Ok(topic.to_string())
    }
}

/// Comma-separated source list; `all` anywhere selects every source
pub fn parse_sources(raw: &str) -> Result<SourceSelection, ValidationError> {
    let mut selected = Vec::new();
    let mut all = false;

    for name in raw.split(',').map(str::trim) {
        if name.eq_ignore_ascii_case("all") {
            all = true;
            continue;
        }
        let source: SourceKind = name.parse()?;
        if !selected.contains(&source) {
            selected.push(source);
        }
    }

    if all {
        return Ok(SourceSelection::default());
    }
    Ok(SourceSelection(selected))
}

pub fn validate_max_items(raw: &str) -> Result<usize, ValidationError> {
    let value: usize = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::NotANumber(raw.to_string()))?;

    if (1..=MAX_ITEMS_LIMIT).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::MaxItemsOutOfRange(value))
    }
}

pub fn parse_depth(raw: &str) -> Result<Depth, UnknownDepth> {
    raw.parse()
}

pub fn parse_model(raw: &str) -> Result<ModelProvider, LlmError> {
    raw.parse()
}
