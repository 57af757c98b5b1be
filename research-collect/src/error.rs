//! Scraping errors

use std::time::Duration;

use thiserror::Error;

/// Statuses worth retrying after a back-off delay
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Errors from the scraping provider transport
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned HTTP {status}: {body}")]
    Status {
        status: u16,
        body: String,
        /// Delay requested by the provider through `Retry-After`
        retry_after: Option<Duration>,
    },

    #[error("Malformed provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CollectError {
    /// Whether the failure is transient and the request may be repeated
    pub fn is_retriable(&self) -> bool {
        match self {
            CollectError::Http(e) => e.is_timeout() || e.is_connect(),
            CollectError::Status { status, .. } => RETRYABLE_STATUSES.contains(status),
            CollectError::ClientBuild(_) | CollectError::Decode(_) => false,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CollectError::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
