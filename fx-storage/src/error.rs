//! Storage error types.
//!
//! Used by configuration repositories and their callers.

use thiserror::Error;

/// Errors that can occur when reading or writing persisted configuration.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Lock poisoned: {0}")]
    Poisoned(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Database(e.to_string())
    }
}
