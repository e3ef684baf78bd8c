//! Error types for the SQLite backend.
//!
//! Covers opening and configuring the database, loading configuration
//! files, and record-level failures surfaced while managing tables.

use recordlite_core::RecordError;
use thiserror::Error;

/// Errors that can occur while opening or managing a SQLite store.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Record mapping failure (schema derivation, conversion, lookups).
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Configuration is inconsistent with itself or with the stored database.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
