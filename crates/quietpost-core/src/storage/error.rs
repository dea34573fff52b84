//! Storage error types.
//!
//! Defines errors that can occur while reading or writing the local
//! key-value store:
//! - `Io`: Underlying storage system errors (file system, database)
//! - `Unavailable`: Store refused the operation (locked, injected fault)

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// I/O error (file system, database, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Store could not serve the operation right now
    #[error("storage unavailable during {operation}")]
    Unavailable {
        /// Operation that was refused
        operation: &'static str,
    },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}
