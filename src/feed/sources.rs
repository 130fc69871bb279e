//! Reader for the line-oriented feed list.
//!
//! Each useful line is `Name, URL`. Blank lines and `#` comments are
//! skipped; malformed lines are reported and skipped without failing the
//! whole read.

use std::path::{Path, PathBuf};
use thiserror::Error;

const COMMENT_MARKER: char = '#';

#[derive(Debug, Error)]
pub enum SourceListError {
    #[error("Feed file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read feed file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One named feed endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

/// How a single line of the feed list was interpreted.
#[derive(Debug, PartialEq, Eq)]
pub enum SourceLine {
    Blank,
    Comment,
    Source(FeedSource),
    Malformed,
}

/// Interprets one line. Only the first comma splits name from URL, so URLs
/// containing commas survive intact.
pub fn parse_line(line: &str) -> SourceLine {
    let line = line.trim();
    if line.is_empty() {
        return SourceLine::Blank;
    }
    if line.starts_with(COMMENT_MARKER) {
        return SourceLine::Comment;
    }

    match line.split_once(',') {
        Some((name, url)) => {
            let (name, url) = (name.trim(), url.trim());
            if name.is_empty() || url.is_empty() {
                SourceLine::Malformed
            } else {
                SourceLine::Source(FeedSource {
                    name: name.to_string(),
                    url: url.to_string(),
                })
            }
        }
        None => SourceLine::Malformed,
    }
}

/// Parses the full text of a feed list, preserving line order.
pub fn parse_sources(content: &str) -> Vec<FeedSource> {
    let mut sources = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        match parse_line(line) {
            SourceLine::Source(source) => {
                tracing::debug!(name = %source.name, url = %source.url, "Added feed");
                sources.push(source);
            }
            SourceLine::Malformed => {
                tracing::warn!(line = idx + 1, content = %line.trim(), "Invalid feed format");
            }
            SourceLine::Blank | SourceLine::Comment => {}
        }
    }

    sources
}

/// Reads the feed list at `path`.
///
/// # Errors
///
/// [`SourceListError::NotFound`] when the file does not exist, and
/// [`SourceListError::Read`] for any other I/O failure, including content
/// that is not valid UTF-8.
pub async fn read_sources(path: &Path) -> Result<Vec<FeedSource>, SourceListError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::error!(path = %path.display(), "Feed file not found");
            return Err(SourceListError::NotFound(path.to_path_buf()));
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Error reading feed file");
            return Err(SourceListError::Read {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let sources = parse_sources(&content);
    tracing::info!(count = sources.len(), path = %path.display(), "Loaded feeds");
    Ok(sources)
}
