//! quietpost Cryptographic Primitives
//!
//! Building blocks for end-to-end encrypted direct messages. Pure functions
//! with no I/O and no logging. Callers provide random bytes (key scalars,
//! IVs) so every operation is reproducible under test.
//!
//! # Key Lifecycle
//!
//! ```text
//! random scalar ──► KeyPair (P-256) ──► JWK text (local storage / published)
//!                       │
//!                       ▼ ECDH (x-coordinate)           conversation id
//!                ConversationKey (v2)                          │
//!                       │                                      ▼ PBKDF2
//!                       │                           ConversationKey (legacy)
//!                       ▼                                      │
//!                 AES-256-GCM ◄────────────────────────────────┘
//!                       │
//!                       ▼
//!             Envelope ("v2:" ‖ base64(iv ‖ ct ‖ tag))
//! ```
//!
//! # Security
//!
//! Confidentiality:
//! - v2 keys depend on a private key that never leaves the device
//! - Legacy keys depend only on the conversation id; they exist to read old
//!   messages and provide no secrecy against anyone who knows that id
//!
//! Authenticity:
//! - AES-GCM tag covers IV and ciphertext; any modification is rejected
//! - Keys carry their scheme; an envelope is never opened with the other
//!   scheme's key
//!
//! Hygiene:
//! - Derived keys and encoded private keys are zeroized on drop
//! - `Debug` output of private and derived keys is redacted

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod derivation;
pub mod encryption;
pub mod envelope;
pub mod error;
pub mod keys;

pub use codec::{decode_private_key, decode_public_key, encode_private_key, encode_public_key};
pub use derivation::{
    CONVERSATION_KEY_SIZE, ConversationKey, derive_agreement_key, derive_legacy_key,
};
pub use encryption::{decrypt_message, encrypt_message};
pub use envelope::{
    Envelope, IV_SIZE, Scheme, SealedPayload, TAG_SIZE, TaggedEnvelope, V2_PREFIX,
    is_likely_encrypted,
};
pub use error::CryptoError;
pub use keys::{KeyPair, PRIVATE_KEY_SIZE, PrivateKey, PublicKey};
