//! Writes the run's records to a timestamped artifact.

use chrono::{DateTime, Local, SecondsFormat, Utc};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::OutputFormat;
use crate::feed::{ArticleRecord, RECORD_FIELDS};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize articles: {0}")]
    Json(#[from] serde_json::Error),
}

/// `news_<YYYYmmdd_HHMMSS>.<ext>` for a run started at `at`.
pub fn artifact_name(at: DateTime<Local>, format: OutputFormat) -> String {
    format!("news_{}.{}", at.format("%Y%m%d_%H%M%S"), format.extension())
}

/// Renders records in the given format.
pub fn render(records: &[ArticleRecord], format: OutputFormat) -> Result<String, OutputError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::Csv => Ok(render_csv(records)),
        OutputFormat::Txt => Ok(render_txt(records)),
    }
}

/// Saves `records` under `dir`, creating it if needed, and returns the
/// written path. An empty slice writes nothing and returns `None`.
pub async fn save(
    records: &[ArticleRecord],
    dir: &Path,
    format: OutputFormat,
) -> Result<Option<PathBuf>, OutputError> {
    if records.is_empty() {
        tracing::warn!("No news articles to save");
        return Ok(None);
    }

    let body = render(records, format)?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| OutputError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    let path = dir.join(artifact_name(Local::now(), format));
    tokio::fs::write(&path, body)
        .await
        .map_err(|source| OutputError::Io {
            path: path.clone(),
            source,
        })?;

    tracing::info!(path = %path.display(), count = records.len(), "News articles saved");
    Ok(Some(path))
}

fn iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_csv(records: &[ArticleRecord]) -> String {
    let mut out = RECORD_FIELDS.join(",");
    out.push_str("\r\n");

    for r in records {
        let published = r.published.as_ref().map(iso).unwrap_or_default();
        let row = [
            csv_field(&r.feed_name),
            csv_field(&r.title),
            csv_field(&r.link),
            csv_field(&r.summary),
            published,
            csv_field(&r.author),
            csv_field(&r.categories.join(", ")),
            iso(&r.fetched_at),
        ];
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }

    out
}

fn render_txt(records: &[ArticleRecord]) -> String {
    let rule = "=".repeat(80);
    let mut out = String::new();

    for (i, r) in records.iter().enumerate() {
        let published = r
            .published
            .as_ref()
            .map(iso)
            .unwrap_or_else(|| "None".to_string());
        // Writing to a String cannot fail
        let _ = write!(
            out,
            "{rule}\nArticle {}\n{rule}\n\
             Feed: {}\nTitle: {}\nLink: {}\nPublished: {}\nAuthor: {}\nCategories: {}\n\
             \nSummary:\n{}\n\n",
            i + 1,
            r.feed_name,
            r.title,
            r.link,
            published,
            r.author,
            r.categories.join(", "),
            r.summary,
        );
    }

    out
}
