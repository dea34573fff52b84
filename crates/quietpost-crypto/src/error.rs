//! Error types for quietpost cryptographic operations

use thiserror::Error;

/// Errors from key handling and message encryption
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Stored or imported key text does not decode to a P-256 key
    #[error("malformed key data: {reason}")]
    MalformedKeyData {
        /// Why the key was rejected
        reason: String,
    },

    /// Envelope could not be decoded or authenticated
    ///
    /// Covers base64 failures, truncated input, tag mismatch (tampering or
    /// wrong key) and scheme mismatch between envelope and key.
    #[error("decryption failed: {reason}")]
    DecryptionFailed {
        /// Reason for decryption failure
        reason: String,
    },
}

impl CryptoError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedKeyData { reason: reason.into() }
    }

    pub(crate) fn decryption(reason: impl Into<String>) -> Self {
        Self::DecryptionFailed { reason: reason.into() }
    }
}
