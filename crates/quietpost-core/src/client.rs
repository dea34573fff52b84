//! Single-identity facade over key storage and message encryption
//!
//! Loads the identity key pair once at construction and supplies the local
//! private key to every encrypt and decrypt call, so callers only handle the
//! peer's public key.

use quietpost_crypto::{KeyPair, PublicKey, encode_public_key};

use crate::{
    cipher::{DecryptOutcome, MessageCipher},
    conversation::ConversationId,
    env::Environment,
    error::KeyStoreError,
    key_store::{KeyStore, KeyStoreConfig},
    storage::KeyValueStore,
};

/// End-to-end encryption client for one local identity.
pub struct E2eClient<S: KeyValueStore, E: Environment> {
    key_store: KeyStore<S, E>,
    key_pair: KeyPair,
    cipher: MessageCipher<E>,
}

impl<S: KeyValueStore, E: Environment> E2eClient<S, E> {
    /// Open the identity stored in `store`, creating it on first use.
    ///
    /// # Errors
    ///
    /// - `KeyStoreError` if the key pair can neither be loaded nor created
    pub fn open(store: S, env: E) -> Result<Self, KeyStoreError> {
        Self::with_config(store, env, KeyStoreConfig::default())
    }

    /// Open with custom storage slots.
    ///
    /// # Errors
    ///
    /// - `KeyStoreError` if the key pair can neither be loaded nor created
    pub fn with_config(store: S, env: E, config: KeyStoreConfig) -> Result<Self, KeyStoreError> {
        let key_store = KeyStore::with_config(store, env.clone(), config);
        let key_pair = key_store.get_or_create_key_pair()?;

        Ok(Self { key_store, key_pair, cipher: MessageCipher::new(env) })
    }

    /// The identity key pair.
    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// Public key as JWK text, ready to publish.
    pub fn public_key_jwk(&self) -> String {
        encode_public_key(self.key_pair.public_key())
    }

    /// Underlying key store.
    pub fn key_store(&self) -> &KeyStore<S, E> {
        &self.key_store
    }

    /// Underlying cipher.
    pub fn cipher(&self) -> &MessageCipher<E> {
        &self.cipher
    }

    /// Encrypt for a conversation. v2 when `peer_public` is known, legacy
    /// otherwise.
    pub fn encrypt(
        &self,
        plaintext: &str,
        conversation: &ConversationId,
        peer_public: Option<&PublicKey>,
    ) -> String {
        self.cipher.encrypt(
            plaintext,
            conversation,
            Some(self.key_pair.private_key()),
            peer_public,
        )
    }

    /// Decrypt a message from a conversation.
    pub fn decrypt(
        &self,
        text: &str,
        conversation: &ConversationId,
        peer_public: Option<&PublicKey>,
    ) -> DecryptOutcome {
        self.cipher.decrypt(text, conversation, Some(self.key_pair.private_key()), peer_public)
    }

    /// Heuristic check whether `text` looks like an envelope.
    pub fn is_likely_encrypted(&self, text: &str) -> bool {
        self.cipher.is_likely_encrypted(text)
    }

    /// Forget all cached conversation keys (logout).
    pub fn clear_cache(&self) {
        self.cipher.clear_cache();
    }
}
