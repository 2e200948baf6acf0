//! Sluice - RFC5424 syslog receiver
//!
//! # Usage
//!
//! ```bash
//! # Run the receiver (default)
//! sluice
//! sluice --config configs/sluice.toml
//! sluice --server udp://:514 --log-level debug
//!
//! # Print a commented configuration file
//! sluice sample-config
//! ```

mod cmd;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sluice_config::{Config, LogConfig, LogFormat};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Paths tried when no `--config` is given
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/sluice.toml", "sluice.toml"];

/// Sluice - RFC5424 syslog receiver
#[derive(Parser, Debug)]
#[command(name = "sluice")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Listen address, e.g. `udp://:514`. Overrides config file.
    #[arg(short, long, global = true)]
    server: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the receiver
    Serve,

    /// Print a commented sample configuration
    SampleConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::SampleConfig) => {
            // Plain stdout, no logging
            cmd::sample_config::run();
            Ok(())
        }
        // No subcommand = run receiver (default behavior)
        Some(Command::Serve) | None => {
            let (mut config, source) = load_config(cli.config.as_deref())?;
            if let Some(server) = cli.server {
                config.syslog.server = server;
                config.validate().context("invalid --server")?;
            }

            let log_level = resolve_log_level(cli.log_level.as_deref(), &config.log);
            init_logging(&log_level, &config.log)?;

            cmd::serve::run(config, source).await
        }
    }
}

/// Load the configuration file
///
/// An explicit path must exist; otherwise the default paths are tried and
/// built-in defaults used when none exists. Returns the path that was used.
fn load_config(path: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!(
                "config file not found: {}\n\nTo create one, run: sluice sample-config > {}",
                path.display(),
                path.display()
            );
        }
        let config = Config::from_file(path).context("failed to load configuration")?;
        return Ok((config, Some(path.to_path_buf())));
    }

    for candidate in DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from) {
        if candidate.exists() {
            let config = Config::from_file(&candidate).context("failed to load configuration")?;
            return Ok((config, Some(candidate)));
        }
    }

    Ok((Config::default(), None))
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<&str>, log: &LogConfig) -> String {
    match cli_level {
        Some(level) => level.to_string(),
        None => log.level.as_str().to_string(),
    }
}

/// Initialize the tracing subscriber for logging
///
/// Logs go to stderr; stdout carries the metrics.
fn init_logging(level: &str, log: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match log.format {
        LogFormat::Console => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(log.ansi)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}
