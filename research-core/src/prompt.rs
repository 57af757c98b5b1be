//! Analysis prompt composition
//!
//! Merges collected items into one bounded prompt. Each source group is
//! capped at [`MAX_ITEMS_PER_GROUP`] entries and each entry's content at
//! [`MAX_CONTENT_CHARS`] characters, whatever the collectors returned.

use std::fmt::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CollectedItem, SourceKind};

/// Items rendered per source group
pub const MAX_ITEMS_PER_GROUP: usize = 50;

/// Characters of content kept per rendered item
pub const MAX_CONTENT_CHARS: usize = 300;

/// Data summary used when nothing was collected
pub const NO_DATA_PLACEHOLDER: &str = "No data collected.";

/// Full five-section analytical template
const DETAILED_ANALYSIS_PROMPT: &str = r#"You are a professional research analyst. Analyze the following collected data about "{topic}" and provide a comprehensive research analysis.

# Collected Data

{data_summary}

# Your Task

Analyze this data and provide:

1. **Executive Summary** (3-5 sentences)
   - Synthesize the most important findings
   - Highlight key trends and patterns

2. **Key Insights** (3-5 major insights)
   - For each insight, provide:
     - What was discovered
     - Supporting evidence from the data
     - Why it matters

3. **Detailed Analysis by Theme**
   - Identify 3-5 main themes/categories in the data
   - For each theme:
     - Summarize the main points
     - List key sources and their contributions
     - Analyze the significance

4. **Opinion Analysis**
   - Mainstream opinions: What do most sources agree on?
   - Contrasting opinions: What disagreements or alternative viewpoints exist?
   - Identify any notable gaps or missing perspectives

5. **Conclusion and Recommendations**
   - Overall conclusions based on the analysis
   - Suggested next steps or areas for further research

# Guidelines

- Be objective and evidence-based
- Cite specific sources when making claims
- Identify patterns and trends across multiple sources
- Note any contradictions or inconsistencies
- Focus on actionable insights
- Use clear, professional language
- Avoid speculation without evidence

Please provide your analysis in a structured format that can be easily converted to Markdown."#;

/// Condensed template
const QUICK_ANALYSIS_PROMPT: &str = r#"You are a research analyst. Provide a quick analysis of the following data about "{topic}".

# Collected Data

{data_summary}

# Your Task

Provide a concise analysis including:

1. **Executive Summary** (2-3 sentences)
   - Main takeaway from the data

2. **Top 3 Key Findings**
   - Brief bullet points with supporting evidence

3. **Main Trend**
   - What's the dominant pattern or theme?

4. **Notable Points**
   - Any surprising or important information

Keep your analysis focused and actionable. Cite specific sources when relevant."#;

/// Analysis depth selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    Quick,
    #[default]
    Detailed,
}

impl Depth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Depth::Quick => "quick",
            Depth::Detailed => "detailed",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            Depth::Detailed => DETAILED_ANALYSIS_PROMPT,
            Depth::Quick => QUICK_ANALYSIS_PROMPT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid depth '{0}'. Valid options: quick, detailed")]
pub struct UnknownDepth(pub String);

impl FromStr for Depth {
    type Err = UnknownDepth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" => Ok(Depth::Quick),
            "detailed" => Ok(Depth::Detailed),
            _ => Err(UnknownDepth(s.to_string())),
        }
    }
}

/// Build the analysis prompt for a topic
pub fn build_prompt(topic: &str, items: &[CollectedItem], depth: Depth) -> String {
    let data_summary = format_data_summary(items);
    depth
        .template()
        .replace("{topic}", topic)
        .replace("{data_summary}", &data_summary)
}

/// Render items as numbered lists grouped by source
pub fn format_data_summary(items: &[CollectedItem]) -> String {
    if items.is_empty() {
        return NO_DATA_PLACEHOLDER.to_string();
    }

    let mut parts: Vec<String> = Vec::new();

    for source in SourceKind::ALL {
        let group: Vec<&CollectedItem> = items.iter().filter(|i| i.source == source).collect();
        if group.is_empty() {
            continue;
        }

        let lead = if parts.is_empty() { "" } else { "\n" };
        parts.push(format!(
            "{}## {} ({} items)\n",
            lead,
            source.heading(),
            group.len()
        ));

        for (i, item) in group.iter().take(MAX_ITEMS_PER_GROUP).enumerate() {
            parts.push(format_entry(i + 1, item));
        }
    }

    parts.join("\n")
}

fn format_entry(index: usize, item: &CollectedItem) -> String {
    let content = truncate_chars(&item.content, MAX_CONTENT_CHARS);
    let author = or_placeholder(&item.author, "Unknown");
    let mut entry = String::new();

    // Writing into a String cannot fail
    let _ = match item.source {
        SourceKind::Social => write!(
            entry,
            "{}. **@{}** ({})\n   {}\n   [Likes: {}]\n",
            index,
            author,
            item.date,
            content,
            item.likes()
        ),
        SourceKind::Web => write!(
            entry,
            "{}. **{}**\n   Source: {}\n   {}\n   URL: {}\n",
            index,
            or_placeholder(item.title.as_deref().unwrap_or_default(), "Untitled"),
            author,
            content,
            item.url
        ),
    };

    entry
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() {
        placeholder
    } else {
        value
    }
}

/// Keep at most `max_chars` characters, never splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
