use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use twittrend_common::observability::{LogConfig, LogFormat, init_logging};
use twittrend_config::{DEFAULT_CONFIG_FILE, LoggingConfig, TrendConfig, TrendConfigLoader};
mod pipeline;
use pipeline::{RunOptions, build_from_config};

/// Scrape the current Japanese trends and push them to a LINE group.
#[derive(Parser, Debug)]
#[command(name = "twittrend", version)]
struct Cli {
    /// YAML config file. Defaults to ./twittrend.yaml when present.
    #[arg(long, env = "TWITTREND_CONFIG")]
    config: Option<PathBuf>,

    /// Print the message instead of pushing it. No LINE credentials needed.
    #[arg(long)]
    dry_run: bool,

    /// Fall back to the heading-landmark search when the longest-list
    /// heuristic finds nothing.
    #[arg(long)]
    landmark_fallback: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Config (env wins over file)
    let cfg = load_config(&cli)?;

    // 2) Logging as configured
    init_logging(log_config(&cfg.logging)?)?;

    // 3) Everything that can fail without the network, then one run
    let opts = RunOptions {
        dry_run: cli.dry_run,
        landmark_fallback: cli.landmark_fallback || cfg.extract.landmark_fallback,
    };
    let outcome = match build_from_config(&cfg, opts) {
        Ok(pipeline) => pipeline.run().await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(report) => {
            tracing::info!(
                entries = report.entries,
                chars = report.chars,
                notifier = %report.notifier,
                "run.ok"
            );
            Ok(())
        }
        Err(err) => {
            tracing::error!(kind = ?err.kind(), status = ?err.status(), error = %err, "run.failed");
            Err(err.into())
        }
    }
}

fn load_config(cli: &Cli) -> Result<TrendConfig> {
    let loader = match &cli.config {
        Some(path) => TrendConfigLoader::new().with_file(path),
        None => TrendConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    loader.load().context("loading configuration")
}

fn log_config(logging: &LoggingConfig) -> Result<LogConfig> {
    let format: LogFormat = logging.format.parse().map_err(anyhow::Error::msg)?;
    Ok(LogConfig {
        log_dir: logging.dir.clone(),
        format,
        default_filter: logging.filter.clone(),
        ..LogConfig::default()
    })
}
