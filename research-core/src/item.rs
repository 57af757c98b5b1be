//! Collected item model
//!
//! Every provider response, whatever its shape, is flattened into
//! [`CollectedItem`] values before anything downstream looks at it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Provenance category of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Posts scraped from a social profile (X / Twitter)
    Social,
    /// Organic web search results
    Web,
}

impl SourceKind {
    /// All source kinds, in report order
    pub const ALL: [SourceKind; 2] = [SourceKind::Social, SourceKind::Web];

    /// Name used on the command line
    pub fn selector(&self) -> &'static str {
        match self {
            SourceKind::Social => "x",
            SourceKind::Web => "web",
        }
    }

    /// Heading used in prompts and reports
    pub fn heading(&self) -> &'static str {
        match self {
            SourceKind::Social => "X (Twitter) Posts",
            SourceKind::Web => "Web Results",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid source '{0}'. Valid sources: x, web, all")]
pub struct UnknownSource(pub String);

impl FromStr for SourceKind {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "x" | "social" => Ok(SourceKind::Social),
            "web" => Ok(SourceKind::Web),
            other => Err(UnknownSource(other.to_string())),
        }
    }
}

/// Engagement counters on a social post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
}

/// One normalized unit of collected content (a post or a search result)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedItem {
    /// Origin provider class
    pub source: SourceKind,
    /// Primary body text, possibly empty
    pub content: String,
    /// Byline or account handle
    #[serde(default)]
    pub author: String,
    /// Display name of the account (social only)
    #[serde(default)]
    pub author_display_name: Option<String>,
    /// Provider-native date string, never parsed
    #[serde(default)]
    pub date: String,
    /// Canonical link to the source
    #[serde(default)]
    pub url: String,
    /// Result title (web only)
    #[serde(default)]
    pub title: Option<String>,
    /// Engagement counters (social only)
    #[serde(default)]
    pub engagement: Option<Engagement>,
    /// Provider-specific auxiliary fields, passed through untouched
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl CollectedItem {
    /// Create an item with only the mandatory fields set
    pub fn new(source: SourceKind, content: impl Into<String>) -> Self {
        Self {
            source,
            content: content.into(),
            author: String::new(),
            author_display_name: None,
            date: String::new(),
            url: String::new(),
            title: None,
            engagement: None,
            metadata: Map::new(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_engagement(mut self, engagement: Engagement) -> Self {
        self.engagement = Some(engagement);
        self
    }

    /// Like count, zero when the item carries no engagement
    pub fn likes(&self) -> u64 {
        self.engagement.map(|e| e.likes).unwrap_or(0)
    }
}
