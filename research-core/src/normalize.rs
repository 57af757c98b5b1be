//! Provider response normalization
//!
//! The scraping provider returns loosely structured JSON whose shape depends
//! on the scrape type and on the upstream site. Each source kind gets an
//! [`ItemSchema`]: an ordered table of synonymous keys per field. Extraction
//! walks the keys in order and takes the first truthy value.
//!
//! Normalization never fails outward. Items that cannot be read are logged
//! and skipped; the rest of the batch continues.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{CollectedItem, Engagement, SourceKind};

/// A key or nested key path inside one raw item (`&["user", "username"]`)
pub type KeyPath = &'static [&'static str];

/// Errors from reading a single raw item
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("item is not an object (found {0})")]
    NotAnObject(&'static str),

    #[error("unexpected {found} at '{path}' for field {field}")]
    UnexpectedShape {
        field: &'static str,
        path: String,
        found: &'static str,
    },
}

/// Default written to metadata when none of the keys holds a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaDefault {
    Text,
    Number,
    Flag,
}

impl MetaDefault {
    fn value(self) -> Value {
        match self {
            MetaDefault::Text => Value::String(String::new()),
            MetaDefault::Number => Value::from(0),
            MetaDefault::Flag => Value::Bool(false),
        }
    }
}

/// One metadata entry and the keys it may come from
#[derive(Debug)]
pub struct MetaRule {
    pub name: &'static str,
    pub keys: &'static [KeyPath],
    pub default: MetaDefault,
}

/// Keys for each engagement counter
#[derive(Debug)]
pub struct EngagementRules {
    pub likes: &'static [KeyPath],
    pub retweets: &'static [KeyPath],
    pub replies: &'static [KeyPath],
}

/// Extraction table for one source kind
pub struct ItemSchema {
    pub source: SourceKind,
    /// Keys under `result` that may hold the item list, highest priority first
    pub containers: &'static [&'static str],
    /// Keys whose presence marks `result` itself as a single item
    pub single_item_markers: &'static [&'static str],
    pub content: &'static [KeyPath],
    pub author: &'static [KeyPath],
    pub author_display_name: Option<&'static [KeyPath]>,
    pub date: &'static [KeyPath],
    pub url: &'static [KeyPath],
    /// Builds a URL when none of the `url` keys is present
    pub url_fallback: Option<fn(&Map<String, Value>) -> String>,
    pub title: Option<&'static [KeyPath]>,
    pub engagement: Option<EngagementRules>,
    pub metadata: &'static [MetaRule],
}

/// Profile scrape results (X / Twitter posts)
pub static SOCIAL_SCHEMA: ItemSchema = ItemSchema {
    source: SourceKind::Social,
    containers: &["tweets", "posts", "results", "items"],
    single_item_markers: &["username", "text", "content"],
    content: &[&["text"], &["content"], &["tweet_text"], &["full_text"]],
    author: &[&["username"], &["author"], &["user", "username"]],
    author_display_name: Some(&[&["displayName"], &["name"], &["user", "name"]]),
    date: &[&["created_at"], &["timestamp"], &["date"]],
    url: &[&["url"], &["link"]],
    url_fallback: Some(status_url),
    title: None,
    engagement: Some(EngagementRules {
        likes: &[&["likes"], &["favorite_count"], &["like_count"]],
        retweets: &[&["retweets"], &["retweet_count"]],
        replies: &[&["replies"], &["reply_count"]],
    }),
    metadata: &[
        MetaRule {
            name: "id",
            keys: &[&["id"], &["tweet_id"]],
            default: MetaDefault::Text,
        },
        MetaRule {
            name: "language",
            keys: &[&["lang"], &["language"]],
            default: MetaDefault::Text,
        },
        MetaRule {
            name: "verified",
            keys: &[&["verified"]],
            default: MetaDefault::Flag,
        },
    ],
};

/// Search scrape results
pub static WEB_SCHEMA: ItemSchema = ItemSchema {
    source: SourceKind::Web,
    containers: &["organic_results", "news_results", "results", "items", "articles"],
    single_item_markers: &["title", "link"],
    content: &[&["snippet"], &["description"], &["summary"]],
    author: &[&["source"], &["domain"], &["site_name"]],
    author_display_name: None,
    date: &[&["date"], &["published_date"], &["timestamp"]],
    url: &[&["link"], &["url"]],
    url_fallback: None,
    title: Some(&[&["title"], &["headline"]]),
    engagement: None,
    metadata: &[
        MetaRule {
            name: "domain",
            keys: &[&["domain"], &["displayed_link"]],
            default: MetaDefault::Text,
        },
        MetaRule {
            name: "position",
            keys: &[&["position"]],
            default: MetaDefault::Number,
        },
        MetaRule {
            name: "thumbnail",
            keys: &[&["thumbnail"], &["image"]],
            default: MetaDefault::Text,
        },
    ],
};

impl ItemSchema {
    /// Schema for a source kind
    pub fn for_source(source: SourceKind) -> &'static ItemSchema {
        match source {
            SourceKind::Social => &SOCIAL_SCHEMA,
            SourceKind::Web => &WEB_SCHEMA,
        }
    }
}

/// Status link for a post that carries no URL of its own
fn status_url(item: &Map<String, Value>) -> String {
    let username = item
        .get("username")
        .filter(|v| is_truthy(v))
        .map(display_scalar)
        .unwrap_or_else(|| "user".to_string());
    let id = item
        .get("id")
        .filter(|v| is_truthy(v))
        .map(display_scalar)
        .unwrap_or_default();
    format!("https://twitter.com/{}/status/{}", username, id)
}

/// Normalize the provider's `data` object into at most `max_items` items
pub fn normalize(data: &Value, schema: &ItemSchema, max_items: usize) -> Vec<CollectedItem> {
    let raw_items = resolve_items(data, schema);
    debug!(
        "Resolved {} raw {} items (cap {})",
        raw_items.len(),
        schema.source,
        max_items
    );

    raw_items
        .into_iter()
        .take(max_items)
        .enumerate()
        .filter_map(|(idx, raw)| match normalize_item(raw, schema) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping {} item #{}: {}", schema.source, idx, e);
                None
            }
        })
        .collect()
}

/// Locate the raw item list inside `data.result`
pub fn resolve_items<'a>(data: &'a Value, schema: &ItemSchema) -> Vec<&'a Value> {
    let Some(result) = data.get("result") else {
        return Vec::new();
    };

    match result {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            if schema
                .single_item_markers
                .iter()
                .any(|key| map.contains_key(*key))
            {
                return vec![result];
            }

            schema
                .containers
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(|value| match value {
                    Value::Array(items) if !items.is_empty() => Some(items.iter().collect()),
                    _ => None,
                })
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// Read one raw item through the schema's extraction table
pub fn normalize_item(raw: &Value, schema: &ItemSchema) -> Result<CollectedItem, NormalizeError> {
    let item = raw
        .as_object()
        .ok_or_else(|| NormalizeError::NotAnObject(kind_name(raw)))?;

    let url = match text_field(item, schema.url, "url")? {
        url if url.is_empty() => schema.url_fallback.map(|f| f(item)).unwrap_or_default(),
        url => url,
    };

    let author_display_name = schema
        .author_display_name
        .map(|keys| text_field(item, keys, "author_display_name"))
        .transpose()?;

    let title = schema
        .title
        .map(|keys| text_field(item, keys, "title"))
        .transpose()?;

    let engagement = schema.engagement.as_ref().map(|rules| -> Result<_, NormalizeError> {
        Ok(Engagement {
            likes: counter_field(item, rules.likes, "likes")?,
            retweets: counter_field(item, rules.retweets, "retweets")?,
            replies: counter_field(item, rules.replies, "replies")?,
        })
    });

    let mut metadata = Map::new();
    for rule in schema.metadata {
        let value = first_truthy(item, rule.keys, rule.name)?
            .cloned()
            .unwrap_or_else(|| rule.default.value());
        metadata.insert(rule.name.to_string(), value);
    }

    Ok(CollectedItem {
        source: schema.source,
        content: text_field(item, schema.content, "content")?,
        author: text_field(item, schema.author, "author")?,
        author_display_name,
        date: text_field(item, schema.date, "date")?,
        url,
        title,
        engagement: engagement.transpose()?,
        metadata,
    })
}

/// Python-style truthiness: null, false, 0, "" and empty containers are absent
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Follow a key path; a missing or null step means absent
fn lookup<'a>(
    item: &'a Map<String, Value>,
    path: KeyPath,
    field: &'static str,
) -> Result<Option<&'a Value>, NormalizeError> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(None);
    };

    let mut current = match item.get(*first) {
        Some(value) => value,
        None => return Ok(None),
    };

    for (depth, key) in rest.iter().enumerate() {
        current = match current {
            Value::Null => return Ok(None),
            Value::Object(map) => match map.get(*key) {
                Some(value) => value,
                None => return Ok(None),
            },
            other => {
                return Err(NormalizeError::UnexpectedShape {
                    field,
                    path: path[..=depth].join("."),
                    found: kind_name(other),
                })
            }
        };
    }

    Ok(Some(current))
}

/// First truthy value among `keys`, evaluated lazily in order
fn first_truthy<'a>(
    item: &'a Map<String, Value>,
    keys: &[KeyPath],
    field: &'static str,
) -> Result<Option<&'a Value>, NormalizeError> {
    for path in keys {
        if let Some(value) = lookup(item, path, field)? {
            if is_truthy(value) {
                return Ok(Some(value));
            }
        }
    }
    Ok(None)
}

fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text_field(
    item: &Map<String, Value>,
    keys: &[KeyPath],
    field: &'static str,
) -> Result<String, NormalizeError> {
    match first_truthy(item, keys, field)? {
        None => Ok(String::new()),
        Some(value @ (Value::Array(_) | Value::Object(_))) => {
            Err(NormalizeError::UnexpectedShape {
                field,
                path: field.to_string(),
                found: kind_name(value),
            })
        }
        Some(value) => Ok(display_scalar(value)),
    }
}

fn counter_field(
    item: &Map<String, Value>,
    keys: &[KeyPath],
    field: &'static str,
) -> Result<u64, NormalizeError> {
    let count = first_truthy(item, keys, field)?.map_or(0, |value| match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f.round() as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().replace(',', "").parse::<u64>().unwrap_or(0),
        _ => 0,
    });
    Ok(count)
}
