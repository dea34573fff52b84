//! quietpost Client Core
//!
//! Key management and message encryption for end-to-end encrypted direct
//! messages, built on the pure primitives in `quietpost-crypto`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  E2eClient                   │
//! │  ┌──────────────┐       ┌──────────────────┐ │
//! │  │   KeyStore   │       │  MessageCipher   │ │
//! │  │  (identity)  │       │ (envelope text)  │ │
//! │  └──────┬───────┘       └────────┬─────────┘ │
//! │         │               ┌────────▼─────────┐ │
//! │         │               │ SharedKeyDeriver │ │
//! │         │               │   (key cache)    │ │
//! │         │               └──────────────────┘ │
//! └─────────┼────────────────────────────────────┘
//!           ▼
//!    KeyValueStore (Memory / Redb / Chaotic)
//! ```
//!
//! # Failure Model
//!
//! - Corrupt stored keys are repaired by regeneration, never surfaced
//! - Storage faults surface as [`KeyStoreError::Storage`]
//! - Per-message decryption failures are [`DecryptOutcome`] values

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cipher;
pub mod client;
pub mod conversation;
pub mod deriver;
pub mod env;
pub mod error;
mod key_cache;
pub mod key_store;
pub mod storage;

pub use cipher::{DECRYPTION_FAILED_TEXT, DecryptOutcome, MISSING_KEYS_TEXT, MessageCipher};
pub use client::E2eClient;
pub use conversation::ConversationId;
pub use deriver::SharedKeyDeriver;
pub use env::{Environment, SystemEnv};
pub use error::KeyStoreError;
pub use key_store::{KeyStore, KeyStoreConfig};
pub use storage::{ChaoticStore, KeyValueStore, MemoryStore, RedbStore, StorageError};
