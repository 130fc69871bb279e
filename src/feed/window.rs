//! Recency filter over feed entries.
//!
//! Entries with no usable date are always kept: a missing timestamp is
//! never a reason to drop content.

use chrono::{DateTime, Duration, Utc};

use crate::feed::dates::resolve_timestamp;
use crate::feed::parser::RawEntry;

/// What the filter decided for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    /// Dated at or after the cutoff.
    Keep(DateTime<Utc>),
    /// Dated before the cutoff.
    Drop(DateTime<Utc>),
    /// No usable date; kept.
    Undated,
}

impl WindowDecision {
    pub fn is_kept(self) -> bool {
        !matches!(self, WindowDecision::Drop(_))
    }
}

/// Earliest timestamp still inside the window ending at `now`.
///
/// Returns `None` when the window reaches past the representable range,
/// in which case nothing is old enough to drop.
pub fn cutoff(now: DateTime<Utc>, window_minutes: u64) -> Option<DateTime<Utc>> {
    let minutes = i64::try_from(window_minutes).ok()?;
    let span = Duration::try_minutes(minutes)?;
    now.checked_sub_signed(span)
}

/// Classifies one entry against `cutoff`.
pub fn decide(entry: &RawEntry, cutoff: Option<DateTime<Utc>>) -> WindowDecision {
    match resolve_timestamp(entry) {
        None => WindowDecision::Undated,
        Some(ts) => match cutoff {
            Some(limit) if ts < limit => WindowDecision::Drop(ts),
            _ => WindowDecision::Keep(ts),
        },
    }
}

/// Keeps entries published within the `window_minutes` before `now`, in
/// input order.
pub fn filter_by_window(
    entries: Vec<RawEntry>,
    window_minutes: u64,
    now: DateTime<Utc>,
) -> Vec<RawEntry> {
    let limit = cutoff(now, window_minutes);
    if limit.is_none() {
        tracing::error!(
            window_minutes = window_minutes,
            "Time window out of range, keeping every entry"
        );
    }

    entries
        .into_iter()
        .filter(|entry| {
            let decision = decide(entry, limit);
            match decision {
                WindowDecision::Keep(ts) => {
                    tracing::debug!(title = entry.display_title(), published = %ts, "Entry included");
                }
                WindowDecision::Drop(ts) => {
                    tracing::debug!(
                        title = entry.display_title(),
                        published = %ts,
                        "Entry filtered out (too old)"
                    );
                }
                WindowDecision::Undated => {
                    tracing::warn!(
                        title = entry.display_title(),
                        "No date found for entry, including it anyway"
                    );
                }
            }
            decision.is_kept()
        })
        .collect()
}
