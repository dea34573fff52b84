//! Key store error types

use thiserror::Error;

use crate::storage::StorageError;

/// Errors from loading or creating the local key pair
///
/// Corrupt or mismatched stored keys are not errors: the key store repairs
/// them by regenerating. Only failures it cannot repair surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyStoreError {
    /// Backing store failed to read, write or remove a slot
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Environment never produced a valid P-256 scalar
    #[error("key generation failed after {attempts} attempts")]
    KeyGeneration {
        /// Scalars drawn before giving up
        attempts: u32,
    },
}
