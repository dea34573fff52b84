//! Message encryption using AES-256-GCM
//!
//! All functions are pure - the IV must be provided by the caller, freshly
//! random for every message. No associated data is used.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};

use crate::{
    derivation::ConversationKey,
    envelope::{Envelope, IV_SIZE, SealedPayload},
    error::CryptoError,
};

/// Encrypt a message body under a conversation key.
///
/// The envelope's scheme follows the key's scheme.
///
/// # Security
///
/// - `iv` MUST be fresh random bytes; reusing an IV under one key breaks
///   GCM confidentiality and authenticity
/// - Authenticated encryption prevents undetected tampering
pub fn encrypt_message(plaintext: &[u8], key: &ConversationKey, iv: [u8; IV_SIZE]) -> Envelope {
    let cipher = Aes256Gcm::new(key.key().into());

    let Ok(ciphertext) = cipher.encrypt(Nonce::from_slice(&iv), plaintext) else {
        unreachable!("AES-256-GCM encryption cannot fail below the 64 GiB message limit");
    };

    Envelope::new(key.scheme(), SealedPayload { iv, ciphertext })
}

/// Decrypt an envelope with a conversation key.
///
/// # Errors
///
/// - `DecryptionFailed` if the key belongs to the other scheme, or the
///   authentication tag does not verify (tampering or wrong key)
pub fn decrypt_message(envelope: &Envelope, key: &ConversationKey) -> Result<Vec<u8>, CryptoError> {
    if envelope.scheme() != key.scheme() {
        return Err(CryptoError::decryption(format!(
            "scheme mismatch: envelope is {:?}, key is {:?}",
            envelope.scheme(),
            key.scheme()
        )));
    }

    let payload = envelope.payload();
    let cipher = Aes256Gcm::new(key.key().into());

    cipher
        .decrypt(Nonce::from_slice(&payload.iv), payload.ciphertext.as_slice())
        .map_err(|_| CryptoError::decryption("authentication failed"))
}
