//! Long-lived P-256 key material
//!
//! One [`KeyPair`] exists per local identity. The private half only ever
//! leaves this module as an opaque handle or as zeroizing JWK text for local
//! storage (see [`crate::codec`]).

use std::fmt;

use p256::{FieldBytes, SecretKey};

use crate::error::CryptoError;

/// Size of a P-256 private scalar in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Private half of a P-256 key pair.
///
/// Never transmitted and never logged: the `Debug` output is redacted. The
/// underlying scalar is zeroized on drop.
#[derive(Clone)]
pub struct PrivateKey(SecretKey);

impl PrivateKey {
    /// Build a private key from a big-endian scalar.
    ///
    /// # Errors
    ///
    /// - `MalformedKeyData` if the bytes are zero or not below the curve order
    pub fn from_scalar_bytes(bytes: &[u8; PRIVATE_KEY_SIZE]) -> Result<Self, CryptoError> {
        SecretKey::from_bytes(&FieldBytes::from(*bytes))
            .map(Self)
            .map_err(|_| CryptoError::malformed("scalar is zero or out of range"))
    }

    /// Public key belonging to this private key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.public_key())
    }

    pub(crate) fn from_inner(inner: SecretKey) -> Self {
        Self(inner)
    }

    pub(crate) fn inner(&self) -> &SecretKey {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

/// Public half of a P-256 key pair. Safe to share and publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(p256::PublicKey);

impl PublicKey {
    pub(crate) fn from_inner(inner: p256::PublicKey) -> Self {
        Self(inner)
    }

    pub(crate) fn inner(&self) -> &p256::PublicKey {
        &self.0
    }
}

/// A private key together with its public key.
#[derive(Debug, Clone)]
pub struct KeyPair {
    private: PrivateKey,
    public: PublicKey,
}

impl KeyPair {
    /// Build a key pair from a random 32-byte scalar.
    ///
    /// Callers supply the randomness so generation stays deterministic under
    /// test. A uniformly random input is rejected with probability below
    /// 2^-32; callers retry with fresh bytes.
    ///
    /// # Errors
    ///
    /// - `MalformedKeyData` if the bytes are not a valid P-256 scalar
    pub fn from_random_bytes(bytes: &[u8; PRIVATE_KEY_SIZE]) -> Result<Self, CryptoError> {
        let private = PrivateKey::from_scalar_bytes(bytes)?;
        Ok(Self::from_private(private))
    }

    /// Complete a key pair from its private half.
    pub fn from_private(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { private, public }
    }

    /// Pair stored halves, checking they belong together.
    ///
    /// # Errors
    ///
    /// - `MalformedKeyData` if `public` is not the public key of `private`
    pub fn from_parts(private: PrivateKey, public: PublicKey) -> Result<Self, CryptoError> {
        if private.public_key() != public {
            return Err(CryptoError::malformed("public key does not match private key"));
        }
        Ok(Self { private, public })
    }

    /// Private half.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// Public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_random_bytes_produces_consistent_pair() {
        let pair = KeyPair::from_random_bytes(&[0x11; 32]).unwrap();
        assert_eq!(pair.private_key().public_key(), *pair.public_key());
    }

    #[test]
    fn zero_scalar_is_rejected() {
        let result = KeyPair::from_random_bytes(&[0u8; 32]);
        assert!(matches!(result, Err(CryptoError::MalformedKeyData { .. })));
    }

    #[test]
    fn scalar_above_order_is_rejected() {
        let result = KeyPair::from_random_bytes(&[0xFF; 32]);
        assert!(matches!(result, Err(CryptoError::MalformedKeyData { .. })));
    }

    #[test]
    fn mismatched_parts_are_rejected() {
        let a = KeyPair::from_random_bytes(&[0x11; 32]).unwrap();
        let b = KeyPair::from_random_bytes(&[0x22; 32]).unwrap();

        let result = KeyPair::from_parts(a.private_key().clone(), *b.public_key());
        assert!(matches!(result, Err(CryptoError::MalformedKeyData { .. })));

        let ok = KeyPair::from_parts(a.private_key().clone(), *a.public_key());
        assert!(ok.is_ok());
    }

    #[test]
    fn private_key_debug_is_redacted() {
        let pair = KeyPair::from_random_bytes(&[0x11; 32]).unwrap();
        let rendered = format!("{:?}", pair.private_key());
        assert_eq!(rendered, "PrivateKey([REDACTED])");
    }
}
