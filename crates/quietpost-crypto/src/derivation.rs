//! Conversation key derivation
//!
//! Two schemes produce the 32-byte AES-256-GCM key for a conversation:
//!
//! ```text
//! Agreement (v2)                      Legacy
//!
//! my private ─┐                       conversation id ‖ LEGACY_PASSWORD_SUFFIX
//!             ├─ ECDH (P-256)                 │
//! peer public ┘      │                        ▼ PBKDF2-HMAC-SHA256
//!                    ▼ x-coordinate             (LEGACY_SALT, LEGACY_ITERATIONS)
//!              ConversationKey                ConversationKey
//! ```
//!
//! The agreement key is the raw 32-byte ECDH x-coordinate used directly as
//! the AES-256 key. This is what WebCrypto `deriveKey` with ECDH and
//! `{name: "AES-GCM", length: 256}` produces, so v2 messages written by
//! browser clients open here and the other way round.
//!
//! The legacy derivation uses only public inputs. Anyone who knows the
//! conversation id can compute it, so it exists solely to read messages
//! written before key pairs were introduced.

use std::fmt;

use p256::ecdh::diffie_hellman;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::{
    envelope::Scheme,
    keys::{PrivateKey, PublicKey},
};

/// Size of a conversation key in bytes (AES-256)
pub const CONVERSATION_KEY_SIZE: usize = 32;

/// Suffix appended to the conversation id to form the legacy password
pub const LEGACY_PASSWORD_SUFFIX: &str = "_lovable_chat_key_v1";

/// Fixed salt of the legacy derivation
pub const LEGACY_SALT: &[u8] = b"lovable_secure_chat_salt_v1";

/// PBKDF2 iteration count of the legacy derivation
pub const LEGACY_ITERATIONS: u32 = 100_000;

/// Symmetric key protecting one conversation's messages.
///
/// Tagged with the scheme that produced it so an envelope is never opened
/// with a key from the other scheme. Zeroized on drop.
#[derive(Clone)]
pub struct ConversationKey {
    key: [u8; CONVERSATION_KEY_SIZE],
    scheme: Scheme,
}

impl ConversationKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(key: [u8; CONVERSATION_KEY_SIZE], scheme: Scheme) -> Self {
        Self { key, scheme }
    }

    /// 32-byte AES-256-GCM key.
    pub fn key(&self) -> &[u8; CONVERSATION_KEY_SIZE] {
        &self.key
    }

    /// Scheme this key belongs to.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }
}

impl Drop for ConversationKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl fmt::Debug for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationKey")
            .field("key", &"[REDACTED]")
            .field("scheme", &self.scheme)
            .finish()
    }
}

/// Derive the agreement (v2) key between two parties.
///
/// Symmetric: `derive_agreement_key(a, B) == derive_agreement_key(b, A)`.
/// The shared x-coordinate is the AES-256 key, matching WebCrypto clients.
pub fn derive_agreement_key(my_private: &PrivateKey, peer_public: &PublicKey) -> ConversationKey {
    let shared =
        diffie_hellman(my_private.inner().to_nonzero_scalar(), peer_public.inner().as_affine());

    let mut key = [0u8; CONVERSATION_KEY_SIZE];
    key.copy_from_slice(shared.raw_secret_bytes());

    ConversationKey { key, scheme: Scheme::Agreement }
}

/// Derive the legacy key for a conversation.
///
/// Deterministic in the conversation id alone; the parameters are fixed by
/// messages already in circulation and must not change.
pub fn derive_legacy_key(conversation_id: &str) -> ConversationKey {
    let mut password = String::with_capacity(conversation_id.len() + LEGACY_PASSWORD_SUFFIX.len());
    password.push_str(conversation_id);
    password.push_str(LEGACY_PASSWORD_SUFFIX);

    let mut key = [0u8; CONVERSATION_KEY_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), LEGACY_SALT, LEGACY_ITERATIONS, &mut key);

    ConversationKey { key, scheme: Scheme::Legacy }
}
