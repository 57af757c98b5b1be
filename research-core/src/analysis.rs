//! Analysis result types

use serde::{Deserialize, Serialize};

/// Usage metadata attached to every analysis attempt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Model identifier the prompt was sent to
    pub model: String,
    /// Tokens reported by the provider, if any
    pub tokens_used: Option<u64>,
    /// Merged item count at composition time (before prompt truncation)
    pub items_analyzed: usize,
}

/// Completed analysis text or the provider failure message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Completed(String),
    Failed(String),
}

/// Output of the analysis client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub outcome: AnalysisOutcome,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    pub fn completed(analysis: impl Into<String>, metadata: AnalysisMetadata) -> Self {
        Self {
            outcome: AnalysisOutcome::Completed(analysis.into()),
            metadata,
        }
    }

    pub fn failed(error: impl Into<String>, metadata: AnalysisMetadata) -> Self {
        Self {
            outcome: AnalysisOutcome::Failed(error.into()),
            metadata,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, AnalysisOutcome::Completed(_))
    }

    /// Model text, present only on success
    pub fn analysis(&self) -> Option<&str> {
        match &self.outcome {
            AnalysisOutcome::Completed(text) => Some(text),
            AnalysisOutcome::Failed(_) => None,
        }
    }

    /// Failure message, present only on failure
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            AnalysisOutcome::Completed(_) => None,
            AnalysisOutcome::Failed(message) => Some(message),
        }
    }
}
