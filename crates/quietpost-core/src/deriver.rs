//! Conversation key derivation with caching
//!
//! PBKDF2 at 100 000 iterations and a P-256 agreement are both too slow to
//! repeat per message, so every derived key is cached per conversation until
//! [`SharedKeyDeriver::clear`] (logout).

use std::sync::atomic::{AtomicU64, Ordering};

use quietpost_crypto::{
    ConversationKey, PrivateKey, PublicKey, Scheme, derive_agreement_key, derive_legacy_key,
};
use tracing::debug;

use crate::{conversation::ConversationId, key_cache::ConversationKeyCache};

/// Derives and caches conversation keys for both schemes.
///
/// `Send + Sync`; share one deriver between all conversations of a session.
pub struct SharedKeyDeriver {
    cache: ConversationKeyCache,
    derivations: AtomicU64,
}

impl SharedKeyDeriver {
    /// Deriver with an empty cache.
    pub fn new() -> Self {
        Self { cache: ConversationKeyCache::new(), derivations: AtomicU64::new(0) }
    }

    /// v2 key for the conversation between `my_private` and `peer_public`.
    ///
    /// Symmetric: both participants derive the same key. Cached per
    /// conversation; a different peer key for the same conversation derives
    /// again and replaces the cached key.
    pub fn derive_for_peer(
        &self,
        my_private: &PrivateKey,
        peer_public: &PublicKey,
        conversation: &ConversationId,
    ) -> ConversationKey {
        self.cache.get_or_derive(Scheme::Agreement, conversation, Some(peer_public), || {
            self.derivations.fetch_add(1, Ordering::Relaxed);
            debug!(%conversation, "deriving agreement key");
            derive_agreement_key(my_private, peer_public)
        })
    }

    /// Legacy key for the conversation. Needs no key pair.
    pub fn derive_legacy(&self, conversation: &ConversationId) -> ConversationKey {
        self.cache.get_or_derive(Scheme::Legacy, conversation, None, || {
            self.derivations.fetch_add(1, Ordering::Relaxed);
            debug!(%conversation, "deriving legacy key");
            derive_legacy_key(conversation.as_str())
        })
    }

    /// Forget every cached key.
    pub fn clear(&self) {
        self.cache.clear();
        debug!("conversation key cache cleared");
    }

    /// Number of cached keys across both schemes.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Derivations actually performed (cache misses) since creation.
    pub fn derivations(&self) -> u64 {
        self.derivations.load(Ordering::Relaxed)
    }
}

impl Default for SharedKeyDeriver {
    fn default() -> Self {
        Self::new()
    }
}
