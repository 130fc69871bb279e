use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::feed::dates::resolve_timestamp;
use crate::feed::parser::RawEntry;
use crate::util::clean_text;

/// Title used when an entry has none.
pub const UNTITLED: &str = "No title";

/// An entry whose fields could not be extracted.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("Failed to extract entry data: {field}: {reason}")]
    Extract { field: &'static str, reason: String },
}

/// The stable output shape for one article.
///
/// Field order here is the column order of the CSV artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleRecord {
    pub feed_name: String,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published: Option<DateTime<Utc>>,
    pub author: String,
    pub categories: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Field names in serialization order.
pub const RECORD_FIELDS: [&str; 8] = [
    "feed_name",
    "title",
    "link",
    "summary",
    "published",
    "author",
    "categories",
    "fetched_at",
];

/// Builds an [`ArticleRecord`] stamped with the current time.
pub fn normalize(
    entry: &RawEntry,
    feed_name: &str,
    base: Option<&str>,
) -> Result<ArticleRecord, EntryError> {
    normalize_at(entry, feed_name, base, Utc::now())
}

/// Builds an [`ArticleRecord`] stamped with `fetched_at`.
///
/// `base` is the feed's site link. A relative entry link is joined to it
/// when the join succeeds; every other link is kept as the feed gave it.
pub fn normalize_at(
    entry: &RawEntry,
    feed_name: &str,
    base: Option<&str>,
    fetched_at: DateTime<Utc>,
) -> Result<ArticleRecord, EntryError> {
    let title = entry
        .title
        .as_deref()
        .map_or_else(|| UNTITLED.to_string(), clean_text);

    let link = entry
        .link
        .as_deref()
        .map(str::trim)
        .map(|raw| resolve_link(raw, base))
        .unwrap_or_default();

    let summary = entry
        .summary
        .as_deref()
        .or(entry.description.as_deref())
        .map(clean_text)
        .unwrap_or_default();

    let author = entry.author.as_deref().map(clean_text).unwrap_or_default();

    let categories = entry
        .tags
        .iter()
        .map(|tag| tag.term.as_deref().map(clean_text).unwrap_or_default())
        .collect();

    Ok(ArticleRecord {
        feed_name: feed_name.to_string(),
        title,
        link,
        summary,
        published: resolve_timestamp(entry),
        author,
        categories,
        fetched_at,
    })
}

fn resolve_link(raw: &str, base: Option<&str>) -> String {
    match Url::parse(raw) {
        Err(url::ParseError::RelativeUrlWithoutBase) if !raw.is_empty() => base
            .and_then(|b| Url::parse(b).ok())
            .and_then(|b| b.join(raw).ok())
            .map_or_else(|| raw.to_string(), String::from),
        Err(e) if !raw.is_empty() => {
            tracing::debug!(link = %raw, error = %e, "Keeping unparseable link as given");
            raw.to_string()
        }
        _ => raw.to_string(),
    }
}
