//! Conversation key cache
//!
//! Two-level locking: a short global lock maps (scheme, conversation) to a
//! per-entry slot, and derivation runs under the slot lock only. Two threads
//! asking for the same conversation share one derivation; threads working on
//! different conversations never wait for each other's PBKDF2 or ECDH.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use quietpost_crypto::{ConversationKey, PublicKey, Scheme};

use crate::conversation::ConversationId;

/// Cache entries are namespaced by scheme so a legacy key never answers an
/// agreement lookup for the same conversation.
type EntryKey = (Scheme, ConversationId);

type Slot = Arc<Mutex<Option<CachedKey>>>;

struct CachedKey {
    /// Peer public key the entry was derived for. `None` for legacy keys.
    peer: Option<PublicKey>,
    key: ConversationKey,
}

/// Derived conversation keys, keyed by scheme and conversation id.
#[derive(Default)]
pub(crate) struct ConversationKeyCache {
    entries: Mutex<HashMap<EntryKey, Slot>>,
}

impl ConversationKeyCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Cached key for the entry, or the result of `derive` stored in it.
    ///
    /// An agreement entry derived for a different peer key is replaced.
    pub(crate) fn get_or_derive(
        &self,
        scheme: Scheme,
        conversation: &ConversationId,
        peer: Option<&PublicKey>,
        derive: impl FnOnce() -> ConversationKey,
    ) -> ConversationKey {
        let slot = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.entry((scheme, conversation.clone())).or_default())
        };

        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = entry.as_ref().filter(|cached| cached.peer.as_ref() == peer) {
            return cached.key.clone();
        }

        let key = derive();
        *entry = Some(CachedKey { peer: peer.copied(), key: key.clone() });
        key
    }

    /// Drop every entry.
    ///
    /// A derivation already in flight finishes into a detached slot and is
    /// not visible afterwards.
    pub(crate) fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Number of entries holding a derived key.
    pub(crate) fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .values()
            .filter(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).is_some())
            .count()
    }
}
