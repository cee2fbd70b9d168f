//! Command-line interface parsing for the news fetcher
//!
//! This module handles parsing of CLI arguments using clap, merging them over
//! the environment-derived [`NewsConfig`], and rendering a fetch outcome for
//! the terminal.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::config::NewsConfig;
use crate::data::{item_title, FetchOutcome, NewsOrigin};
use crate::logging::LogFormat;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// `--max-retries` must be at least one
    #[error("Invalid --max-retries: must be at least 1")]
    InvalidRetries,

    /// `--pause` must be a positive, finite number of seconds
    #[error("Invalid --pause: '{0}' must be a positive number of seconds")]
    InvalidPause(f64),

    /// `--limit` must be at least one
    #[error("Invalid --limit: must be at least 1")]
    InvalidLimit,
}

/// FenixAI news fetcher - crypto news with token rotation and cache fallback
#[derive(Parser, Debug)]
#[command(name = "fenix-news")]
#[command(about = "Fetch crypto news from CryptoPanic with retry, backoff, and cache fallback")]
#[command(version)]
pub struct Cli {
    /// Attempts per token before moving to the next one
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Base backoff delay in seconds (doubles on each retry)
    #[arg(long, value_name = "SECS")]
    pub pause: Option<f64>,

    /// Number of news items to request
    #[arg(long, value_name = "N")]
    pub limit: Option<u32>,

    /// Cache file location (overrides NEWS_CACHE_PATH)
    #[arg(long, value_name = "PATH")]
    pub cache_path: Option<PathBuf>,

    /// Print items as a JSON array instead of titles
    #[arg(long)]
    pub json: bool,

    /// Skip the network and print the cached news
    #[arg(long)]
    pub offline: bool,

    /// Log level or filter directive (overrides LOG_LEVEL; RUST_LOG wins over both)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Settings for one run, after merging CLI arguments over configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Attempts per token
    pub max_retries: u32,
    /// Base backoff delay
    pub initial_pause: Duration,
    /// Requested page size
    pub limit: u32,
    /// Print JSON instead of titles
    pub json: bool,
    /// Read the cache only
    pub offline: bool,
}

impl RunOptions {
    /// Creates RunOptions from parsed CLI arguments and the loaded config.
    ///
    /// A `--cache-path` argument is written back into `config`.
    ///
    /// # Returns
    /// * `Ok(RunOptions)` with CLI values taking precedence over config values
    /// * `Err(CliError)` if a CLI value is out of range
    pub fn from_cli(cli: &Cli, config: &mut NewsConfig) -> Result<Self, CliError> {
        let max_retries = match cli.max_retries {
            Some(0) => return Err(CliError::InvalidRetries),
            Some(n) => n,
            None => config.max_retries_per_token,
        };

        let initial_pause = match cli.pause {
            Some(secs) => Duration::try_from_secs_f64(secs)
                .ok()
                .filter(|d| !d.is_zero())
                .ok_or(CliError::InvalidPause(secs))?,
            None => config.initial_pause,
        };

        let limit = match cli.limit {
            Some(0) => return Err(CliError::InvalidLimit),
            Some(n) => n,
            None => config.limit,
        };

        if let Some(path) = &cli.cache_path {
            config.cache_path = path.clone();
        }

        Ok(RunOptions {
            max_retries,
            initial_pause,
            limit,
            json: cli.json,
            offline: cli.offline,
        })
    }
}

/// Renders a fetch outcome for stdout
///
/// JSON mode prints only the items array so the output can be piped; text mode
/// prints one title per line followed by a summary line.
pub fn render_outcome(outcome: &FetchOutcome, json: bool) -> Result<String, serde_json::Error> {
    if json {
        return serde_json::to_string_pretty(&outcome.items);
    }

    let mut lines: Vec<String> = outcome
        .items
        .iter()
        .map(|item| item_title(item).unwrap_or("(untitled)").to_string())
        .collect();

    let source = match outcome.origin {
        NewsOrigin::Live { token_index } => format!("live, token #{}", token_index + 1),
        NewsOrigin::Cache => "cache".to_string(),
        NewsOrigin::Empty => "none".to_string(),
    };
    lines.push(format!("{} item(s) from {}", outcome.items.len(), source));

    Ok(lines.join("\n"))
}
