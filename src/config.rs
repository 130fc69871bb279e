//! Configuration file parser (`config.yaml` by default).
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! YAML is the primary format; a path ending in `.toml` is read as TOML.
//! Unknown top-level keys are accepted and reported back to the caller so
//! they can be logged once logging is up.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::feed::FetchSettings;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML in config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML in config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// Every section uses `#[serde(default)]`, so any subset of keys can be
/// given and the rest fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the `Name, URL` feed list.
    pub feed_file: PathBuf,

    /// Entries older than this many minutes are dropped.
    pub time_window_minutes: u64,

    pub network: NetworkConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_file: PathBuf::from("news_feeds.txt"),
            time_window_minutes: 30,
            network: NetworkConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub timeout_seconds: u64,
    /// Total attempts per feed, including the first.
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 5,
        }
    }
}

impl NetworkConfig {
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            timeout: Duration::from_secs(self.timeout_seconds),
            max_retries: self.max_retries,
            retry_delay: Duration::from_secs(self.retry_delay_seconds),
            ..FetchSettings::default()
        }
    }
}

/// Serialization format of the saved artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Txt,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Txt => "txt",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub save_to_file: bool,
    pub output_directory: PathBuf,
    pub output_format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_to_file: true,
            output_directory: PathBuf::from("downloaded_news"),
            output_format: OutputFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_file: PathBuf,
    /// TRACE, DEBUG, INFO, WARN/WARNING, ERROR or CRITICAL.
    pub level: String,
    pub max_log_size_mb: u64,
    pub backup_count: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("news_fetcher.log"),
            level: "INFO".to_string(),
            max_log_size_mb: 10,
            backup_count: 5,
        }
    }
}

impl LoggingConfig {
    /// The `tracing` level name for `level`, or `None` if unrecognized.
    pub fn level_directive(&self) -> Option<&'static str> {
        match self.level.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Some("trace"),
            "DEBUG" => Some("debug"),
            "INFO" => Some("info"),
            "WARN" | "WARNING" => Some("warn"),
            "ERROR" | "CRITICAL" => Some("error"),
            _ => None,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_log_size_mb.saturating_mul(1024 * 1024)
    }
}

/// A parsed configuration plus what was noticed while loading it.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    /// False when the file did not exist and defaults were used.
    pub from_file: bool,
    pub unknown_keys: Vec<String>,
}

const KNOWN_KEYS: [&str; 5] = [
    "feed_file",
    "time_window_minutes",
    "network",
    "output",
    "logging",
];

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a YAML (or `.toml`) file.
    ///
    /// - Missing file → defaults, `from_file == false`
    /// - Empty file → defaults
    /// - Malformed document or failed validation → `Err`
    pub fn load(path: &Path) -> Result<LoadedConfig, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LoadedConfig {
                    config: Self::default(),
                    from_file: false,
                    unknown_keys: Vec::new(),
                });
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let (config, unknown_keys) = if is_toml {
            Self::from_toml_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };
        config.validate()?;

        Ok(LoadedConfig {
            config,
            from_file: true,
            unknown_keys,
        })
    }

    fn from_yaml_str(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        if content.trim().is_empty() {
            return Ok((Self::default(), Vec::new()));
        }

        let raw: serde_yaml::Value = serde_yaml::from_str(content)?;
        // A document that is only comments parses as null
        if raw.is_null() {
            return Ok((Self::default(), Vec::new()));
        }

        let unknown = match raw.as_mapping() {
            Some(map) => map
                .keys()
                .filter_map(|k| k.as_str())
                .filter(|k| !KNOWN_KEYS.contains(k))
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };

        let config: Config = serde_yaml::from_value(raw)?;
        Ok((config, unknown))
    }

    fn from_toml_str(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        if content.trim().is_empty() {
            return Ok((Self::default(), Vec::new()));
        }

        let raw: toml::Table = content.parse()?;
        let unknown = raw
            .keys()
            .filter(|k| !KNOWN_KEYS.contains(&k.as_str()))
            .cloned()
            .collect();

        let config: Config = toml::from_str(content)?;
        Ok((config, unknown))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.network.max_retries == 0 {
            return Err(ConfigError::Invalid(
                "network.max_retries must be at least 1".into(),
            ));
        }
        if self.network.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "network.timeout_seconds must be at least 1".into(),
            ));
        }
        if self.logging.level_directive().is_none() {
            return Err(ConfigError::Invalid(format!(
                "unknown logging.level '{}'",
                self.logging.level
            )));
        }
        if self.logging.max_log_size_mb == 0 {
            return Err(ConfigError::Invalid(
                "logging.max_log_size_mb must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.feed_file, PathBuf::from("news_feeds.txt"));
        assert_eq!(config.time_window_minutes, 30);
        assert_eq!(config.network.timeout_seconds, 30);
        assert_eq!(config.network.max_retries, 3);
        assert_eq!(config.network.retry_delay_seconds, 5);
        assert!(config.output.save_to_file);
        assert_eq!(config.output.output_directory, PathBuf::from("downloaded_news"));
        assert_eq!(config.output.output_format, OutputFormat::Json);
        assert_eq!(config.logging.level, "INFO");
    }

    #[test]
    fn test_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load(&dir.path().join("config.yaml")).unwrap();
        assert!(!loaded.from_file);
        assert_eq!(loaded.config.time_window_minutes, 30);
    }

    #[test]
    fn test_empty_and_comment_only_files_return_default() {
        let (_dir, path) = write_config("config.yaml", "   \n  \n");
        assert_eq!(Config::load(&path).unwrap().config.time_window_minutes, 30);

        let (_dir, path) = write_config("config.yaml", "# nothing here\n");
        let loaded = Config::load(&path).unwrap();
        assert!(loaded.from_file);
        assert_eq!(loaded.config.network.max_retries, 3);
    }

    #[test]
    fn test_partial_yaml_uses_defaults_for_missing() {
        let (_dir, path) = write_config(
            "config.yaml",
            "time_window_minutes: 120\nnetwork:\n  max_retries: 5\n",
        );
        let config = Config::load(&path).unwrap().config;
        assert_eq!(config.time_window_minutes, 120);
        assert_eq!(config.network.max_retries, 5);
        assert_eq!(config.network.timeout_seconds, 30); // default
        assert_eq!(config.output.output_format, OutputFormat::Json); // default
    }

    #[test]
    fn test_full_yaml() {
        let content = r#"
feed_file: feeds/list.txt
time_window_minutes: 60
network:
  timeout_seconds: 10
  max_retries: 2
  retry_delay_seconds: 1
output:
  save_to_file: false
  output_directory: out
  output_format: csv
logging:
  log_file: logs/run.log
  level: WARNING
  max_log_size_mb: 2
  backup_count: 1
"#;
        let (_dir, path) = write_config("config.yaml", content);
        let config = Config::load(&path).unwrap().config;
        assert_eq!(config.feed_file, PathBuf::from("feeds/list.txt"));
        assert_eq!(config.time_window_minutes, 60);
        assert!(!config.output.save_to_file);
        assert_eq!(config.output.output_format, OutputFormat::Csv);
        assert_eq!(config.logging.level_directive(), Some("warn"));
        assert_eq!(config.logging.max_bytes(), 2 * 1024 * 1024);

        let settings = config.network.fetch_settings();
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings.max_retries, 2);
        assert_eq!(settings.retry_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_toml_by_extension() {
        let content = "time_window_minutes = 15\n\n[output]\noutput_format = \"txt\"\n";
        let (_dir, path) = write_config("config.toml", content);
        let config = Config::load(&path).unwrap().config;
        assert_eq!(config.time_window_minutes, 15);
        assert_eq!(config.output.output_format, OutputFormat::Txt);
    }

    #[test]
    fn test_invalid_yaml_returns_error() {
        let (_dir, path) = write_config("config.yaml", "network: [unclosed\n");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
        assert!(err.to_string().contains("Invalid YAML"));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let (_dir, path) = write_config("config.yaml", "output:\n  output_format: xml\n");
        assert!(matches!(Config::load(&path), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_negative_window_rejected() {
        let (_dir, path) = write_config("config.yaml", "time_window_minutes: -5\n");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_unknown_keys_reported() {
        let (_dir, path) = write_config("config.yaml", "time_window_minutes: 5\nfeeds_file: typo.txt\n");
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.unknown_keys, vec!["feeds_file".to_string()]);
    }

    #[test]
    fn test_validation_failures() {
        let (_dir, path) = write_config("config.yaml", "network:\n  max_retries: 0\n");
        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));

        let (_dir, path) = write_config("config.yaml", "logging:\n  level: LOUD\n");
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("LOUD"));
    }

    #[test]
    fn test_level_names() {
        let mut logging = LoggingConfig::default();
        for (name, expected) in [
            ("debug", "debug"),
            ("Info", "info"),
            ("WARN", "warn"),
            ("critical", "error"),
        ] {
            logging.level = name.to_string();
            assert_eq!(logging.level_directive(), Some(expected));
        }
    }

    #[test]
    fn test_too_large_file_rejected() {
        let (_dir, path) = write_config("config.yaml", &"#".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
    }
}
