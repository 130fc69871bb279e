//! Best-effort publication timestamp for a feed entry.
//!
//! Feeds disagree on which date they fill in. The resolver walks a fixed
//! list of candidate fields and takes the first usable one.

use chrono::{DateTime, Timelike, Utc};

use crate::feed::parser::RawEntry;

type Extractor = fn(&RawEntry) -> Option<DateTime<Utc>>;

/// Candidate date fields, most authoritative first.
const CANDIDATES: [(&str, Extractor); 3] = [
    ("published", published),
    ("updated", updated),
    ("created", created),
];

fn published(entry: &RawEntry) -> Option<DateTime<Utc>> {
    entry.published
}

fn updated(entry: &RawEntry) -> Option<DateTime<Utc>> {
    entry.updated
}

fn created(entry: &RawEntry) -> Option<DateTime<Utc>> {
    entry.created
}

/// Returns the entry's publication time truncated to whole seconds, or
/// `None` when no candidate field holds a usable value.
pub fn resolve_timestamp(entry: &RawEntry) -> Option<DateTime<Utc>> {
    for (field, extract) in CANDIDATES {
        let Some(value) = extract(entry) else {
            continue;
        };
        match value.with_nanosecond(0) {
            Some(ts) => return Some(ts),
            None => {
                tracing::debug!(
                    field = field,
                    title = entry.display_title(),
                    "Unusable entry date, trying next field"
                );
            }
        }
    }
    None
}
