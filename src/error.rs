//! Error types for versebase
//!
//! This module provides comprehensive error handling for all versebase operations,
//! including storage, import, auxiliary pack loading, and search.

use thiserror::Error;

/// Main error type for versebase operations
#[derive(Error, Debug)]
pub enum VersebaseError {
    /// Persistent storage could not be opened at all (environment denies access).
    /// Fatal to all data features; callers should degrade rather than crash.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A bulk write was attempted and rolled back; nothing was persisted.
    /// Retryable - imports and upserts are idempotent by key.
    #[error("Transaction aborted: {0}")]
    TransactionAborted(String),

    /// Database/storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Source document is not well-formed markup
    #[error("Malformed source document: {0}")]
    MalformedSource(String),

    /// Source document parsed but produced zero text units
    #[error("Source document yielded no text units")]
    EmptySource,

    /// Fetching a source document failed (network or filesystem)
    #[error("Source fetch error: {0}")]
    SourceFetch(String),

    /// Auxiliary reference pack errors
    #[error("Reference pack error: {0}")]
    Pack(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(String),
}

/// Result type alias for versebase operations
pub type Result<T> = std::result::Result<T, VersebaseError>;

// Implement From traits for external error types
impl From<roxmltree::Error> for VersebaseError {
    fn from(err: roxmltree::Error) -> Self {
        VersebaseError::MalformedSource(err.to_string())
    }
}

impl From<reqwest::Error> for VersebaseError {
    fn from(err: reqwest::Error) -> Self {
        VersebaseError::SourceFetch(err.to_string())
    }
}

impl From<anyhow::Error> for VersebaseError {
    fn from(err: anyhow::Error) -> Self {
        VersebaseError::Generic(err.to_string())
    }
}
