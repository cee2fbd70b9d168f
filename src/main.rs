//! FenixAI news fetcher - command-line entry point
//!
//! Loads configuration from the environment (and `.env`), fetches the latest
//! crypto news with token rotation and cache fallback, and prints the result.

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};

use fenix_news::cli::{render_outcome, Cli, RunOptions};
use fenix_news::config::{self, NewsConfig};
use fenix_news::logging;
use fenix_news::NewsFetcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // .env may set LOG_LEVEL
    let dotenv = config::load_dotenv();

    let level = cli
        .log_level
        .clone()
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .unwrap_or_else(|| "info".to_string());
    logging::init(&level, cli.log_format);

    match dotenv {
        Ok(Some(path)) => info!(path = %path.display(), "Loaded environment variables"),
        Ok(None) => debug!("No .env file found, using process environment only"),
        Err(e) => warn!(error = %e, "Failed to parse .env file"),
    }

    let mut config = NewsConfig::from_env().context("invalid configuration")?;
    let options = RunOptions::from_cli(&cli, &mut config)?;

    let fetcher = NewsFetcher::from_config(&config).context("failed to build HTTP client")?;

    let outcome = if options.offline {
        fetcher.cached_outcome()
    } else {
        fetcher
            .fetch_news_detailed(options.max_retries, options.initial_pause, options.limit)
            .await
    };

    println!("{}", render_outcome(&outcome, options.json)?);

    Ok(())
}
