//! Error types for record mapping operations.
//!
//! Provides a single error type covering definition-time failures (a record
//! type that cannot be mapped), caller mistakes, lookups that found nothing,
//! drift between a table and its record type, and failures reported by the
//! storage collaborator.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur while mapping records to and from storage.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A declared field has a type with no column mapping.
    #[error("unsupported type '{type_name}' for field '{field}'")]
    UnsupportedType {
        /// Name of the offending field.
        field: String,
        /// Declared type of the field.
        type_name: String,
    },

    /// The caller passed an argument outside the operation's contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A table or column name is not a plain SQL identifier, is a SQLite
    /// keyword, or collides with another column.
    #[error(
        "invalid identifier '{0}': must be unique, not a SQL keyword, and contain only \
         alphanumeric characters and underscores"
    )]
    InvalidIdentifier(String),

    /// A single-record lookup matched no row.
    #[error("no row in '{table}' with _id = {id}")]
    NotFound {
        /// Table that was searched.
        table: String,
        /// Identity that was looked up.
        id: i64,
    },

    /// A result row and the record type disagree about the column set.
    #[error("schema mismatch in '{table}' at column '{column}'")]
    SchemaMismatch {
        /// Table the row came from.
        table: String,
        /// Column that could not be matched.
        column: String,
    },

    /// A stored cell could not be converted into the field's declared type.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// The storage collaborator failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Convenience alias for results with [`RecordError`].
pub type Result<T> = std::result::Result<T, RecordError>;
