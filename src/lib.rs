//! FenixAI news fetcher library
//!
//! Fetches crypto news from CryptoPanic, rotating through credential tokens
//! with exponential backoff and falling back to the last cached payload.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;

pub use config::NewsConfig;
pub use data::{FetchOutcome, NewsFetcher, NewsItem, NewsOrigin};
pub use error::FetchError;
