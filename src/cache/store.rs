//! Cache store for persisting the news payload to disk
//!
//! Provides a `CacheStore` that writes the full upstream payload to a JSON file
//! and reads its `results` list back for graceful degradation when the API is
//! unavailable.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::data::{parse_results, CacheSnapshot};

/// Errors that can occur when reading or writing the cache file
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem failure
    #[error("Cache I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not valid JSON, or the payload could not be serialized
    #[error("Cache JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON without a `results` list of objects
    #[error("Cache payload has no valid `results` list")]
    MissingResults,
}

/// Reads and writes the cached payload at a fixed path
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Location of the cache file
    path: PathBuf,
}

impl CacheStore {
    /// Creates a CacheStore for the given file path
    ///
    /// Relative paths resolve against the working directory of the process.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the scratch file used for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Overwrites the cache with a full API payload
    ///
    /// Parent directories are created as needed. The payload is written to a
    /// sibling temp file and renamed into place, so a crash mid-write never
    /// leaves a truncated cache behind.
    ///
    /// # Arguments
    /// * `payload` - The complete JSON body of a successful response
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(CacheError)` if directory creation, serialization, or writing fails
    pub fn write_payload(&self, payload: &Value) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(payload)?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Reads the cached snapshot
    ///
    /// # Returns
    /// * `Ok(Some(CacheSnapshot))` if the file holds a payload with a `results` list
    /// * `Ok(None)` if no cache file exists yet
    /// * `Err(CacheError)` if the file is unreadable or malformed
    pub fn read_snapshot(&self) -> Result<Option<CacheSnapshot>, CacheError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let payload: Value = serde_json::from_str(&content)?;
        let results = parse_results(&payload).ok_or(CacheError::MissingResults)?;

        Ok(Some(CacheSnapshot {
            results,
            written_at: self.modified_at(),
        }))
    }

    /// Returns when the cache file was last written, if known
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        let modified = fs::metadata(&self.path).ok()?.modified().ok()?;
        Some(DateTime::<Utc>::from(modified))
    }
}
