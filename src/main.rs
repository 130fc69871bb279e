use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use news_fetcher::config::{Config, OutputFormat};
use news_fetcher::{logging, output, Pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "news-fetcher",
    version,
    about = "Fetch recent articles from RSS/Atom feeds"
)]
struct Args {
    /// Configuration file (YAML, or TOML when it ends in .toml)
    #[arg(value_name = "CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Feed list to read instead of `feed_file` from the config
    #[arg(long, value_name = "PATH")]
    feed_file: Option<PathBuf>,

    /// Time window in minutes, overriding `time_window_minutes`
    #[arg(long, value_name = "MINUTES")]
    window: Option<u64>,

    /// Output format, overriding `output.output_format`
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Fetch and report only; do not write the output file
    #[arg(long)]
    no_save: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.feed_file {
            config.feed_file = path.clone();
        }
        if let Some(window) = self.window {
            config.time_window_minutes = window;
        }
        if let Some(format) = self.format {
            config.output.output_format = format;
        }
        if self.no_save {
            config.output.save_to_file = false;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    tokio::select! {
        result = run(args) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Fatal error: {e:#}");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nOperation cancelled by user");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let loaded = Config::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    if !loaded.from_file {
        eprintln!("Configuration file not found: {}", args.config.display());
        eprintln!("Using default configuration");
    }

    let mut config = loaded.config;
    args.apply(&mut config);

    // Held until the run ends; dropping it closes the log file
    let _log = logging::init(&config.logging).context("Failed to initialize logging")?;

    for key in &loaded.unknown_keys {
        tracing::warn!(key = %key, "Unknown key in config file, ignoring");
    }

    let result = execute(&config).await;
    if let Err(e) = &result {
        let cause = format!("{e:#}");
        tracing::error!(error = %cause, "Fatal error in news fetcher");
    }
    result
}

async fn execute(config: &Config) -> Result<()> {
    tracing::info!("News fetcher started");

    let pipeline = Pipeline::from_config(config).context("Failed to build HTTP client")?;
    tracing::info!(
        feed_file = %pipeline.feed_file().display(),
        window_minutes = pipeline.window_minutes(),
        "Run settings"
    );
    let report = pipeline.run().await?;

    for failure in &report.failures {
        tracing::warn!(feed = %failure.name, error = %failure.error, "Feed skipped this run");
    }

    let saved = if config.output.save_to_file {
        output::save(
            &report.articles,
            &config.output.output_directory,
            config.output.output_format,
        )
        .await
        .context("Failed to save articles")?
    } else {
        None
    };

    match saved {
        Some(path) => println!(
            "Fetched {} articles from {}/{} feeds, saved to {}",
            report.articles.len(),
            report.sources_ok(),
            report.sources_total,
            path.display()
        ),
        None => println!(
            "Fetched {} articles from {}/{} feeds",
            report.articles.len(),
            report.sources_ok(),
            report.sources_total
        ),
    }

    tracing::info!("News fetcher completed successfully");
    Ok(())
}
