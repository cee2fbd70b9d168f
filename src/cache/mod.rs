//! Cache module for the last successful news payload
//!
//! This module persists the raw upstream payload of every successful fetch to a
//! single JSON file, and reads it back when every credential has failed. There
//! is no expiry: a snapshot of any age is returned as-is.

mod store;

pub use store::{CacheError, CacheStore};
