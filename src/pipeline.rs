//! Drives one run: read the feed list, then fetch, filter and normalize
//! each source in order.
//!
//! Failures are contained at two levels. A source that cannot be fetched
//! or parsed is recorded and skipped; an entry that cannot be normalized is
//! logged and skipped. Only a missing or unreadable feed list ends the run.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::feed::{
    filter_by_window, normalize_at, read_sources, ArticleRecord, EntryError, FeedFetcher,
    FeedSource, FetchError, ParsedFeed, RawEntry, SourceListError,
};

/// A source that produced nothing because its fetch failed.
#[derive(Debug)]
pub struct SourceFailure {
    pub name: String,
    pub url: String,
    pub error: FetchError,
}

/// Everything one run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Normalized records, grouped by source in feed-list order, entries in
    /// feed order within each source.
    pub articles: Vec<ArticleRecord>,
    pub sources_total: usize,
    /// Failed sources in feed-list order.
    pub failures: Vec<SourceFailure>,
    /// Entries that survived the window but failed normalization.
    pub skipped_entries: usize,
}

impl RunReport {
    pub fn sources_ok(&self) -> usize {
        self.sources_total - self.failures.len()
    }
}

pub struct Pipeline {
    fetcher: FeedFetcher,
    feed_file: PathBuf,
    window_minutes: u64,
}

impl Pipeline {
    pub fn new(fetcher: FeedFetcher, feed_file: impl Into<PathBuf>, window_minutes: u64) -> Self {
        Self {
            fetcher,
            feed_file: feed_file.into(),
            window_minutes,
        }
    }

    /// Builds the pipeline and its HTTP client from configuration.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let fetcher = FeedFetcher::new(config.network.fetch_settings())?;
        Ok(Self::new(
            fetcher,
            config.feed_file.clone(),
            config.time_window_minutes,
        ))
    }

    pub fn feed_file(&self) -> &Path {
        &self.feed_file
    }

    pub fn window_minutes(&self) -> u64 {
        self.window_minutes
    }

    /// Processes every configured source.
    ///
    /// # Errors
    ///
    /// Only when the feed list itself cannot be read. Per-source failures
    /// land in [`RunReport::failures`].
    pub async fn run(&self) -> Result<RunReport, SourceListError> {
        let sources = read_sources(&self.feed_file).await?;
        let mut report = RunReport {
            sources_total: sources.len(),
            ..RunReport::default()
        };

        if sources.is_empty() {
            tracing::warn!(path = %self.feed_file.display(), "No feeds found in feed file");
            return Ok(report);
        }

        for source in &sources {
            tracing::info!(feed = %source.name, "Processing feed");

            match self.fetcher.fetch(&source.url).await {
                Ok(feed) => {
                    let (records, skipped) = self.process_feed(source, feed, Utc::now());
                    report.articles.extend(records);
                    report.skipped_entries += skipped;
                }
                Err(error) => {
                    if error.is_parse() {
                        tracing::error!(
                            feed = %source.name,
                            url = %source.url,
                            error = %error,
                            "Parse error for feed"
                        );
                    } else {
                        tracing::error!(
                            feed = %source.name,
                            url = %source.url,
                            attempts = error.attempts(),
                            error = %error,
                            "Network error fetching feed"
                        );
                    }
                    report.failures.push(SourceFailure {
                        name: source.name.clone(),
                        url: source.url.clone(),
                        error,
                    });
                }
            }
        }

        if report.failures.len() == report.sources_total {
            tracing::warn!(sources = report.sources_total, "Every feed failed");
        }
        tracing::info!(
            count = report.articles.len(),
            failed_sources = report.failures.len(),
            skipped_entries = report.skipped_entries,
            "Total articles fetched"
        );
        Ok(report)
    }

    /// Filters and normalizes one fetched feed as of `now`.
    ///
    /// Returns the records plus the number of entries that failed
    /// normalization.
    pub fn process_feed(
        &self,
        source: &FeedSource,
        feed: ParsedFeed,
        now: DateTime<Utc>,
    ) -> (Vec<ArticleRecord>, usize) {
        let total = feed.entries.len();
        tracing::info!(
            feed = %source.name,
            feed_title = feed.title.as_deref(),
            entries = total,
            "Found entries"
        );

        let recent = filter_by_window(feed.entries, self.window_minutes, now);
        tracing::info!(
            feed = %source.name,
            kept = recent.len(),
            window_minutes = self.window_minutes,
            "Filtered entries to time window"
        );

        let base = feed.site_link.as_deref();
        collect_records(&source.name, &recent, |entry| {
            normalize_at(entry, &source.name, base, Utc::now())
        })
    }
}

/// Runs `build` over `entries`, keeping the successes in order. Failures
/// are logged and counted, never propagated.
fn collect_records<F>(
    feed_name: &str,
    entries: &[RawEntry],
    mut build: F,
) -> (Vec<ArticleRecord>, usize)
where
    F: FnMut(&RawEntry) -> Result<ArticleRecord, EntryError>,
{
    let mut records = Vec::with_capacity(entries.len());
    let mut skipped = 0;

    for entry in entries {
        match build(entry) {
            Ok(record) => {
                tracing::debug!(feed = %feed_name, title = %record.title, "Extracted article");
                records.push(record);
            }
            Err(e) => {
                tracing::error!(
                    feed = %feed_name,
                    title = entry.display_title(),
                    error = %e,
                    "Error parsing entry"
                );
                skipped += 1;
            }
        }
    }

    (records, skipped)
}
