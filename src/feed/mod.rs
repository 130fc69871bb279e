//! Feed retrieval and the per-entry pipeline stages.
//!
//! - [`sources`] - reads the `Name, URL` feed list
//! - [`fetcher`] - HTTP retrieval with bounded retries
//! - [`parser`] - RSS/Atom parsing via `feed-rs` into [`RawEntry`] values
//! - [`dates`] - picks one publication timestamp per entry
//! - [`window`] - drops entries older than the time window (undated ones stay)
//! - [`normalize`] - maps an entry onto the [`ArticleRecord`] output shape
//!
//! # Example
//!
//! ```ignore
//! let fetcher = FeedFetcher::new(FetchSettings::default())?;
//! let feed = fetcher.fetch("https://example.com/rss.xml").await?;
//! let recent = filter_by_window(feed.entries, 30, Utc::now());
//! ```

pub mod dates;
pub mod fetcher;
pub mod normalize;
pub mod parser;
pub mod sources;
pub mod window;

pub use dates::resolve_timestamp;
pub use fetcher::{FeedFetcher, FetchError, FetchSettings, USER_AGENT};
pub use normalize::{normalize, normalize_at, ArticleRecord, EntryError, RECORD_FIELDS};
pub use parser::{parse_feed, ParsedFeed, RawEntry, Tag};
pub use sources::{read_sources, FeedSource, SourceListError};
pub use window::{filter_by_window, WindowDecision};
