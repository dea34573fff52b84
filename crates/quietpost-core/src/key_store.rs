//! Local key pair persistence
//!
//! The identity key pair is stored as two JWK texts in a [`KeyValueStore`].
//! Loading never fails on bad data: a missing half, an undecodable half, or
//! halves that do not belong together are all repaired by minting a fresh
//! pair. Messages encrypted to the old public key become unreadable on this
//! device when that happens.

use std::sync::{Mutex, PoisonError};

use quietpost_crypto::{
    KeyPair, PRIVATE_KEY_SIZE, decode_private_key, decode_public_key, encode_private_key,
    encode_public_key,
};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::{env::Environment, error::KeyStoreError, storage::KeyValueStore};

/// Storage slots and generation limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStoreConfig {
    /// Slot holding the private JWK
    pub private_key_slot: String,
    /// Slot holding the public JWK
    pub public_key_slot: String,
    /// Random scalars drawn before key generation gives up
    pub max_generation_attempts: u32,
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        Self {
            private_key_slot: "chat_private_key".to_owned(),
            public_key_slot: "chat_public_key".to_owned(),
            max_generation_attempts: 8,
        }
    }
}

/// Result of reading both slots
enum Stored {
    Valid(KeyPair),
    Empty,
    Unusable(String),
}

/// Loads the identity key pair, creating or repairing it as needed.
pub struct KeyStore<S: KeyValueStore, E: Environment> {
    store: S,
    env: E,
    config: KeyStoreConfig,
    /// Serializes load-or-create so one process never mints two pairs
    guard: Mutex<()>,
}

impl<S: KeyValueStore, E: Environment> KeyStore<S, E> {
    /// Key store over `store` with the default slot names.
    pub fn new(store: S, env: E) -> Self {
        Self::with_config(store, env, KeyStoreConfig::default())
    }

    /// Key store with custom slots and limits.
    pub fn with_config(store: S, env: E, config: KeyStoreConfig) -> Self {
        Self { store, env, config, guard: Mutex::new(()) }
    }

    /// Active configuration.
    pub fn config(&self) -> &KeyStoreConfig {
        &self.config
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stored key pair, or a freshly generated and persisted one.
    ///
    /// A fresh pair replaces the stored one when either half is absent, fails
    /// to decode, or the public half does not match the private half. Both
    /// slots are cleared before the new pair is written.
    ///
    /// # Errors
    ///
    /// - `Storage` if the backing store fails
    /// - `KeyGeneration` if the environment keeps producing invalid scalars
    pub fn get_or_create_key_pair(&self) -> Result<KeyPair, KeyStoreError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);

        match self.load()? {
            Stored::Valid(pair) => return Ok(pair),
            Stored::Empty => debug!("no stored key pair"),
            Stored::Unusable(reason) => {
                warn!(%reason, "stored key pair unusable, regenerating");
            },
        }

        self.store.remove(&self.config.private_key_slot)?;
        self.store.remove(&self.config.public_key_slot)?;

        let pair = self.generate()?;
        self.persist(&pair)?;

        info!("generated new identity key pair");
        Ok(pair)
    }

    fn load(&self) -> Result<Stored, KeyStoreError> {
        let private_text = self.store.get(&self.config.private_key_slot)?.map(Zeroizing::new);
        let public_text = self.store.get(&self.config.public_key_slot)?;

        let (private_text, public_text) = match (private_text, public_text) {
            (Some(private), Some(public)) => (private, public),
            (None, None) => return Ok(Stored::Empty),
            (None, Some(_)) => return Ok(Stored::Unusable("private key missing".to_owned())),
            (Some(_), None) => return Ok(Stored::Unusable("public key missing".to_owned())),
        };

        let private = match decode_private_key(&private_text) {
            Ok(key) => key,
            Err(e) => return Ok(Stored::Unusable(format!("private key: {e}"))),
        };
        let public = match decode_public_key(&public_text) {
            Ok(key) => key,
            Err(e) => return Ok(Stored::Unusable(format!("public key: {e}"))),
        };

        Ok(match KeyPair::from_parts(private, public) {
            Ok(pair) => Stored::Valid(pair),
            Err(e) => Stored::Unusable(e.to_string()),
        })
    }

    fn generate(&self) -> Result<KeyPair, KeyStoreError> {
        let attempts = self.config.max_generation_attempts;

        for attempt in 1..=attempts {
            let scalar = Zeroizing::new(self.env.random_array::<PRIVATE_KEY_SIZE>());
            match KeyPair::from_random_bytes(&scalar) {
                Ok(pair) => return Ok(pair),
                Err(e) => debug!(attempt, error = %e, "rejected random scalar"),
            }
        }

        Err(KeyStoreError::KeyGeneration { attempts })
    }

    /// Both halves go to the store in one batch.
    fn persist(&self, pair: &KeyPair) -> Result<(), KeyStoreError> {
        let private_text = encode_private_key(pair.private_key());
        let public_text = encode_public_key(pair.public_key());

        self.store.set_many(&[
            (self.config.private_key_slot.as_str(), private_text.as_str()),
            (self.config.public_key_slot.as_str(), public_text.as_str()),
        ])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{env::SystemEnv, storage::MemoryStore};

    /// Environment whose randomness is never a valid P-256 scalar
    #[derive(Clone)]
    struct ZeroEnv;

    impl Environment for ZeroEnv {
        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(0);
        }
    }

    #[test]
    fn first_call_generates_and_persists() {
        let store = MemoryStore::new();
        let keys = KeyStore::new(store.clone(), SystemEnv::new());

        let pair = keys.get_or_create_key_pair().unwrap();

        assert_eq!(store.len(), 2);
        let stored_public = store.get("chat_public_key").unwrap().unwrap();
        assert_eq!(decode_public_key(&stored_public).unwrap(), *pair.public_key());
    }

    #[test]
    fn second_call_returns_stored_pair() {
        let keys = KeyStore::new(MemoryStore::new(), SystemEnv::new());

        let first = keys.get_or_create_key_pair().unwrap();
        let second = keys.get_or_create_key_pair().unwrap();

        assert_eq!(first.public_key(), second.public_key());
    }

    #[test]
    fn custom_slots_are_used() {
        let store = MemoryStore::new();
        let config = KeyStoreConfig {
            private_key_slot: "alice/private".to_owned(),
            public_key_slot: "alice/public".to_owned(),
            ..KeyStoreConfig::default()
        };
        let keys = KeyStore::with_config(store.clone(), SystemEnv::new(), config);

        keys.get_or_create_key_pair().unwrap();

        assert!(store.get("alice/private").unwrap().is_some());
        assert!(store.get("alice/public").unwrap().is_some());
        assert!(store.get("chat_private_key").unwrap().is_none());
    }

    #[test]
    fn generation_gives_up_on_invalid_scalars() {
        let keys = KeyStore::new(MemoryStore::new(), ZeroEnv);

        let result = keys.get_or_create_key_pair();

        assert_eq!(result.unwrap_err(), KeyStoreError::KeyGeneration { attempts: 8 });
    }
}
