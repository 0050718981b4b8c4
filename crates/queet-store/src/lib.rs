//! Persistence layer for queet
//!
//! Provides:
//! - A string-keyed storage medium (SQLite file or in-memory)
//! - The progress adapter: validating reads, invariant-enforcing writes, backup on failure
//! - User, settings and language records
//! - Export/import, repair and integrity checks across all namespaces

mod coerce;
mod manager;
mod memory;
mod progress;
mod records;
mod sqlite;
mod traits;

pub use coerce::*;
pub use manager::*;
pub use memory::*;
pub use progress::*;
pub use records::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;

/// Storage keys of each logical namespace
pub mod keys {
    /// Prefix shared by every key this application writes
    pub const PREFIX: &str = "queet-weed";
    pub const PROGRESS: &str = "queet-weed-progress";
    pub const PROGRESS_BACKUP: &str = "queet-weed-progress_backup";
    pub const USER: &str = "queet-weed-user";
    pub const LANGUAGE: &str = "queet-weed-language";
    pub const SETTINGS: &str = "queet-weed-settings";
    pub const LAST_BACKUP: &str = "queet-weed-last-backup";
}

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage quota exceeded writing '{key}': {needed} bytes needed, {limit} allowed")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    #[error("Unsupported export version: {0}")]
    UnsupportedVersion(String),

    #[error("Corrupt data: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
