//! Markdown report rendering
//!
//! One document per run: header block, the model's analysis verbatim, then
//! a source appendix per kind.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{Local, NaiveDateTime};
use regex::Regex;
use thiserror::Error;
use tracing::info;

use research_agents::SourceGroups;
use research_core::{truncate_chars, AnalysisOutcome, AnalysisResult, CollectedItem, SourceKind};

/// Characters of content shown per appendix entry
pub const EXCERPT_CHARS: usize = 200;

const MAX_SLUG_CHARS: usize = 50;

static SLUG_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Report writing errors
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to write report {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Render the report and write it to `output_path`, creating parent directories
pub fn generate_report(
    topic: &str,
    result: &AnalysisResult,
    sources: &SourceGroups,
    output_path: &Path,
) -> Result<PathBuf, ReportError> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ReportError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let markdown = render_report(topic, result, sources, Local::now().naive_local());
    fs::write(output_path, markdown).map_err(|source| ReportError::Write {
        path: output_path.to_path_buf(),
        source,
    })?;

    info!("Report saved to {}", output_path.display());
    Ok(output_path.to_path_buf())
}

/// Render the full Markdown document
pub fn render_report(
    topic: &str,
    result: &AnalysisResult,
    sources: &SourceGroups,
    generated_at: NaiveDateTime,
) -> String {
    let meta = &result.metadata;
    let tokens = meta
        .tokens_used
        .map(|t| t.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    let mut doc = String::new();
    let _ = writeln!(doc, "# Research Report: {}\n", topic);
    let _ = writeln!(doc, "**Generated:** {}  ", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(doc, "**Model:** {}  ", meta.model);
    let _ = writeln!(doc, "**Tokens Used:** {}  ", tokens);
    let _ = writeln!(doc, "**Items Analyzed:** {}\n", meta.items_analyzed);
    doc.push_str("---\n\n");

    match &result.outcome {
        AnalysisOutcome::Completed(text) => doc.push_str(text.trim_end()),
        AnalysisOutcome::Failed(error) => {
            let _ = write!(doc, "_Analysis unavailable: {}_", error);
        }
    }
    doc.push_str("\n\n---\n\n## Sources\n");

    if sources.values().all(Vec::is_empty) {
        doc.push_str("\n_No sources collected._\n");
        return doc;
    }

    for (kind, items) in sources {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(doc, "\n### {} ({})\n", kind.heading(), items.len());
        for (i, item) in items.iter().enumerate() {
            doc.push_str(&render_entry(i + 1, *kind, item));
        }
    }

    doc
}

fn render_entry(index: usize, kind: SourceKind, item: &CollectedItem) -> String {
    let mut entry = String::new();

    match kind {
        SourceKind::Social => {
            let handle = if item.author.is_empty() { "unknown" } else { &item.author };
            let _ = write!(entry, "{}. **@{}**", index, handle);
            if let Some(name) = item.author_display_name.as_deref().filter(|n| !n.is_empty()) {
                let _ = write!(entry, " ({})", name);
            }
            if !item.date.is_empty() {
                let _ = write!(entry, " - {}", item.date);
            }
            entry.push('\n');
        }
        SourceKind::Web => {
            let title = item.title.as_deref().filter(|t| !t.is_empty()).unwrap_or("Untitled");
            if item.url.is_empty() {
                let _ = writeln!(entry, "{}. {}", index, title);
            } else {
                let _ = writeln!(entry, "{}. [{}]({})", index, title, item.url);
            }
            let source = if item.author.is_empty() { "Unknown" } else { &item.author };
            let _ = write!(entry, "   Source: {}", source);
            if !item.date.is_empty() {
                let _ = write!(entry, " | Date: {}", item.date);
            }
            entry.push('\n');
        }
    }

    if kind == SourceKind::Social && !item.url.is_empty() {
        let _ = writeln!(entry, "   URL: {}", item.url);
    }
    let excerpt = excerpt(&item.content);
    if !excerpt.is_empty() {
        let _ = writeln!(entry, "   > {}", excerpt);
    }
    entry.push('\n');
    entry
}

/// Single-line content preview of at most [`EXCERPT_CHARS`] characters
fn excerpt(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let cut = truncate_chars(&flat, EXCERPT_CHARS);
    if cut.len() < flat.len() {
        format!("{}...", cut.trim_end())
    } else {
        flat
    }
}

/// `research_{slug}_{YYYYMMDD_HHMMSS}.md` for the current local time
pub fn generate_filename(topic: &str) -> String {
    generate_filename_at(topic, Local::now().naive_local())
}

/// Deterministic report filename for a topic and timestamp
pub fn generate_filename_at(topic: &str, at: NaiveDateTime) -> String {
    format!("research_{}_{}.md", slugify(topic), at.format("%Y%m%d_%H%M%S"))
}

fn slugify(topic: &str) -> String {
    let lowered = topic.to_lowercase();
    let replaced = SLUG_SEPARATORS.replace_all(&lowered, "_");
    let slug = truncate_chars(replaced.trim_matches('_'), MAX_SLUG_CHARS).trim_end_matches('_');

    if slug.is_empty() {
        "report".to_string()
    } else {
        slug.to_string()
    }
}

/// Where the report for this run goes
///
/// An explicit name always lands directly inside `output_dir`: path
/// separators are flattened and `.md` is appended when there is no
/// extension. Without one a timestamped name is generated.
pub fn resolve_output_path(
    output_dir: &Path,
    explicit: Option<&str>,
    topic: &str,
    now: NaiveDateTime,
) -> PathBuf {
    let name = explicit
        .map(|n| n.trim().replace(['/', '\\'], "_"))
        .filter(|n| !n.trim_matches('.').is_empty())
        .map(|n| {
            if has_file_extension(&n) {
                n
            } else {
                format!("{}.md", n)
            }
        })
        .unwrap_or_else(|| generate_filename_at(topic, now));

    output_dir.join(name)
}

/// A real extension is short, alphanumeric and has a letter, so `v4.1` is not one
fn has_file_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ext.len() <= 8
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
                && ext.chars().any(|c| c.is_ascii_alphabetic())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use research_agents::summarize_sources;
    use research_core::{AnalysisMetadata, Engagement};

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 10)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap()
    }

    fn metadata() -> AnalysisMetadata {
        AnalysisMetadata {
            model: "gemini-2.5-flash".to_string(),
            tokens_used: Some(1234),
            items_analyzed: 6,
        }
    }

    fn mock_items() -> Vec<CollectedItem> {
        let social = [
            ("Uniswap v4 is now live on mainnet! Hooks unlock a new design space for AMMs.", "Uniswap"),
            ("Uniswap volume crossed $2B in the last 24 hours.", "DefiLlama"),
            ("Comparing gas costs between Uniswap v3 and v4 pools.", "haydenzadams"),
        ];
        let web = [
            ("Uniswap v4 Launch: What You Need to Know", "TechCrunch", "https://techcrunch.com/uniswap-v4-launch"),
            ("Uniswap Dominates DEX Market", "CoinDesk", "https://coindesk.com/uniswap-market-dominance"),
            ("Inside Uniswap Hooks", "The Block", "https://theblock.co/uniswap-hooks"),
        ];

        let mut items: Vec<CollectedItem> = social
            .iter()
            .enumerate()
            .map(|(i, (text, author))| {
                CollectedItem::new(SourceKind::Social, *text)
                    .with_author(*author)
                    .with_date("2024-02-10")
                    .with_url(format!("https://twitter.com/{}/status/{}", author, 100 + i))
                    .with_engagement(Engagement {
                        likes: 100,
                        retweets: 10,
                        replies: 1,
                    })
            })
            .collect();
        items.extend(web.iter().map(|(title, source, url)| {
            CollectedItem::new(SourceKind::Web, format!("{} snippet", title))
                .with_title(*title)
                .with_author(*source)
                .with_url(*url)
        }));
        items
    }

    #[test]
    fn test_render_full_report() {
        let analysis = "## Executive Summary\nUniswap v4 shipped.\n\n## Key Insights\n- Hooks";
        let result = AnalysisResult::completed(analysis, metadata());
        let doc = render_report("Uniswap", &result, &summarize_sources(&mock_items()), at());

        assert!(doc.starts_with("# Research Report: Uniswap\n"));
        assert!(doc.contains("**Generated:** 2024-02-10 14:30:05"));
        assert!(doc.contains("**Model:** gemini-2.5-flash"));
        assert!(doc.contains("**Tokens Used:** 1234"));
        assert!(doc.contains("**Items Analyzed:** 6"));
        assert!(doc.contains(analysis));
        assert!(doc.contains("### X (Twitter) Posts (3)"));
        assert!(doc.contains("### Web Results (3)"));
        assert!(doc.contains("1. **@Uniswap** - 2024-02-10"));
        assert!(doc.contains("   URL: https://twitter.com/Uniswap/status/100"));
        assert!(doc.contains("1. [Uniswap v4 Launch: What You Need to Know](https://techcrunch.com/uniswap-v4-launch)"));
        assert!(doc.contains("   Source: CoinDesk"));

        let social_at = doc.find("### X (Twitter) Posts").unwrap();
        let web_at = doc.find("### Web Results").unwrap();
        assert!(social_at < web_at);
        assert_eq!(doc.matches("   > ").count(), 6);
    }

    #[test]
    fn test_render_missing_tokens_and_sources() {
        let mut meta = metadata();
        meta.tokens_used = None;
        let result = AnalysisResult::completed("text", meta);
        let doc = render_report("t", &result, &SourceGroups::new(), at());

        assert!(doc.contains("**Tokens Used:** N/A"));
        assert!(doc.contains("_No sources collected._"));
    }

    #[test]
    fn test_excerpt_is_capped() {
        let long = "word ".repeat(100);
        let e = excerpt(&long);
        assert!(e.ends_with("..."));
        assert!(e.chars().count() <= EXCERPT_CHARS + 3);
        assert_eq!(excerpt("line one\nline two"), "line one line two");
    }

    #[test]
    fn test_generate_report_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.md");
        let result = AnalysisResult::completed("## Executive Summary\nDone.", metadata());

        let written = generate_report("Uniswap", &result, &summarize_sources(&mock_items()), &path).unwrap();

        assert_eq!(written, path);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("# Research Report: Uniswap"));
        assert!(content.contains("## Executive Summary\nDone."));
    }

    #[test]
    fn test_generate_report_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let result = AnalysisResult::completed("a", metadata());
        let err = generate_report("t", &result, &SourceGroups::new(), &blocker.join("r.md")).unwrap_err();
        assert!(matches!(err, ReportError::CreateDir { .. }));
    }

    #[test]
    fn test_generate_filename_at() {
        assert_eq!(
            generate_filename_at("Uniswap v4 / Hooks?", at()),
            "research_uniswap_v4_hooks_20240210_143005.md"
        );
        assert_eq!(generate_filename_at("!!!", at()), "research_report_20240210_143005.md");
        assert_eq!(generate_filename_at("Uniswap v4", at()), generate_filename_at("Uniswap v4", at()));
    }

    #[test]
    fn test_slug_is_capped() {
        let name = generate_filename_at(&"a".repeat(80), at());
        assert_eq!(name, format!("research_{}_20240210_143005.md", "a".repeat(50)));
        assert!(generate_filename("x y").ends_with(".md"));
    }

    #[test]
    fn test_resolve_output_path() {
        let dir = Path::new("reports");

        assert_eq!(
            resolve_output_path(dir, Some("summary"), "t", at()),
            dir.join("summary.md")
        );
        assert_eq!(
            resolve_output_path(dir, Some("notes.txt"), "t", at()),
            dir.join("notes.txt")
        );
        assert_eq!(
            resolve_output_path(dir, Some("Uniswap v4.1 notes"), "t", at()),
            dir.join("Uniswap v4.1 notes.md")
        );
        assert_eq!(
            resolve_output_path(dir, Some("release v4.1"), "t", at()),
            dir.join("release v4.1.md")
        );
        assert_eq!(
            resolve_output_path(dir, Some("digest.markdown"), "t", at()),
            dir.join("digest.markdown")
        );
        assert_eq!(
            resolve_output_path(dir, Some("drafts/summary"), "t", at()),
            dir.join("drafts_summary.md")
        );
        assert_eq!(
            resolve_output_path(dir, None, "Uniswap", at()),
            dir.join("research_uniswap_20240210_143005.md")
        );
        assert_eq!(
            resolve_output_path(dir, Some("  "), "Uniswap", at()),
            dir.join("research_uniswap_20240210_143005.md")
        );
    }
}
