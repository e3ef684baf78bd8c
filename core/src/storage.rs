//! Capability interface to the storage collaborator.
//!
//! The engine never talks to a database directly. Every statement it builds
//! is handed to a [`Storage`] implementation, which executes it and reports
//! rows, identities and affected-row counts back. Failures travel as
//! [`StorageError`] with the collaborator's own error attached as `source`.

use std::error::Error as StdError;

use thiserror::Error;

use crate::types::{Row, Statement};

/// A failure reported by the storage collaborator.
#[derive(Debug, Error)]
#[error("storage error: {message}")]
pub struct StorageError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl StorageError {
    /// Creates an error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping the collaborator's own error.
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the message describing the failed operation.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Convenience alias for results with [`StorageError`].
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// The narrow set of primitives the engine needs from a database.
///
/// Implementations are expected to be synchronous; whatever locking the
/// underlying connection requires is their own business.
pub trait Storage {
    /// Executes a statement that returns no rows and reports how many rows
    /// it changed (zero for DDL).
    fn execute(&self, statement: &Statement) -> StorageResult<usize>;

    /// Runs a statement yielding a single integer, such as `COUNT(*)`.
    fn query_scalar(&self, statement: &Statement) -> StorageResult<i64>;

    /// Runs a query and materializes every result row in order.
    fn query(&self, statement: &Statement) -> StorageResult<Vec<Row>>;

    /// Runs an insert and returns the identity assigned to the new row.
    fn insert(&self, statement: &Statement) -> StorageResult<i64>;
}
