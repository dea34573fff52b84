//! Message encryption and decryption with scheme dispatch
//!
//! Encryption picks the v2 scheme whenever both the local private key and the
//! peer's public key are known, and falls back to the legacy scheme
//! otherwise. Decryption follows the envelope's tag. Failures are per message
//! and reported as [`DecryptOutcome`] values so one bad message never hides
//! the rest of a conversation. Plaintext that is not valid UTF-8 is decoded
//! lossily, with U+FFFD in place of bad sequences, as browser clients do.

use quietpost_crypto::{
    ConversationKey, PrivateKey, PublicKey, Scheme, TaggedEnvelope, decrypt_message,
    encrypt_message,
};
use tracing::{debug, warn};

use crate::{conversation::ConversationId, deriver::SharedKeyDeriver, env::Environment};

/// Placeholder shown for v2 messages when key material is unavailable
pub const MISSING_KEYS_TEXT: &str = "[Missing encryption keys]";

/// Placeholder shown for messages that fail to decrypt
pub const DECRYPTION_FAILED_TEXT: &str = "[Unable to decrypt message]";

/// Result of decrypting one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptOutcome {
    /// Message opened; the plaintext
    Decrypted(String),
    /// v2 message but the local private key or the peer public key is absent
    MissingKeys,
    /// Malformed, truncated, tampered, or encrypted under another key
    DecryptionFailed,
}

impl DecryptOutcome {
    /// Text to display for this message.
    pub fn display_text(&self) -> &str {
        match self {
            Self::Decrypted(text) => text,
            Self::MissingKeys => MISSING_KEYS_TEXT,
            Self::DecryptionFailed => DECRYPTION_FAILED_TEXT,
        }
    }

    /// Plaintext if the message opened.
    pub fn plaintext(&self) -> Option<&str> {
        match self {
            Self::Decrypted(text) => Some(text),
            Self::MissingKeys | Self::DecryptionFailed => None,
        }
    }

    /// Whether the message opened.
    pub fn is_decrypted(&self) -> bool {
        matches!(self, Self::Decrypted(_))
    }
}

/// Encrypts and decrypts message bodies for any conversation.
///
/// Owns the key cache, so one cipher should serve a whole session.
pub struct MessageCipher<E: Environment> {
    env: E,
    deriver: SharedKeyDeriver,
}

impl<E: Environment> MessageCipher<E> {
    /// Cipher drawing IVs from `env`.
    pub fn new(env: E) -> Self {
        Self { env, deriver: SharedKeyDeriver::new() }
    }

    /// Encrypt `plaintext` into envelope text.
    ///
    /// Uses the v2 scheme when both keys are given, otherwise the legacy
    /// scheme. Every call draws a fresh IV, so equal inputs give different
    /// envelopes.
    pub fn encrypt(
        &self,
        plaintext: &str,
        conversation: &ConversationId,
        my_private: Option<&PrivateKey>,
        peer_public: Option<&PublicKey>,
    ) -> String {
        let key = match (my_private, peer_public) {
            (Some(private), Some(public)) => {
                self.deriver.derive_for_peer(private, public, conversation)
            },
            _ => self.deriver.derive_legacy(conversation),
        };

        let envelope = encrypt_message(plaintext.as_bytes(), &key, self.env.random_array());
        envelope.encode()
    }

    /// Decrypt one envelope.
    ///
    /// A v2 envelope without both keys is `MissingKeys` even if its body is
    /// malformed. The tag is read once and the same split is decoded. Never
    /// logs plaintext or key material.
    pub fn decrypt(
        &self,
        text: &str,
        conversation: &ConversationId,
        my_private: Option<&PrivateKey>,
        peer_public: Option<&PublicKey>,
    ) -> DecryptOutcome {
        let tagged = TaggedEnvelope::split(text);
        let key = match tagged.scheme() {
            Scheme::Agreement => {
                let (Some(private), Some(public)) = (my_private, peer_public) else {
                    debug!(%conversation, "v2 message without key material");
                    return DecryptOutcome::MissingKeys;
                };
                self.deriver.derive_for_peer(private, public, conversation)
            },
            Scheme::Legacy => self.deriver.derive_legacy(conversation),
        };

        self.open(tagged, conversation, &key)
    }

    /// Decrypt a batch of envelopes from one conversation, in order.
    pub fn decrypt_all<'a>(
        &self,
        texts: impl IntoIterator<Item = &'a str>,
        conversation: &ConversationId,
        my_private: Option<&PrivateKey>,
        peer_public: Option<&PublicKey>,
    ) -> Vec<DecryptOutcome> {
        texts
            .into_iter()
            .map(|text| self.decrypt(text, conversation, my_private, peer_public))
            .collect()
    }

    /// Heuristic check whether `text` looks like an envelope.
    pub fn is_likely_encrypted(&self, text: &str) -> bool {
        quietpost_crypto::is_likely_encrypted(text)
    }

    /// Forget all cached conversation keys.
    pub fn clear_cache(&self) {
        self.deriver.clear();
    }

    /// Key deriver, for cache diagnostics.
    pub fn deriver(&self) -> &SharedKeyDeriver {
        &self.deriver
    }

    fn open(
        &self,
        tagged: TaggedEnvelope<'_>,
        conversation: &ConversationId,
        key: &ConversationKey,
    ) -> DecryptOutcome {
        let plaintext = tagged.decode().and_then(|envelope| decrypt_message(&envelope, key));

        match plaintext {
            Ok(bytes) => DecryptOutcome::Decrypted(into_text(bytes, conversation)),
            Err(e) => {
                warn!(
                    %conversation,
                    scheme = ?key.scheme(),
                    error = %e,
                    "failed to decrypt message"
                );
                DecryptOutcome::DecryptionFailed
            },
        }
    }
}

fn into_text(bytes: Vec<u8>, conversation: &ConversationId) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| {
        debug!(%conversation, "decrypted message is not valid UTF-8, replacing bad sequences");
        String::from_utf8_lossy(e.as_bytes()).into_owned()
    })
}
