//! Fetches RSS/Atom feeds listed in a plain-text file, keeps the entries
//! published within a recent time window, and normalizes them into
//! [`ArticleRecord`]s ready to be saved as JSON, CSV or text.

pub mod config;
pub mod feed;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod util;

pub use config::{Config, ConfigError, OutputFormat};
pub use feed::ArticleRecord;
pub use pipeline::{Pipeline, RunReport, SourceFailure};
