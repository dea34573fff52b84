//! Key store loading, repair and persistence
//!
//! Covers the paths where stored key material is absent, corrupt or
//! mismatched, plus durability across a redb reopen and storage faults
//! injected through `ChaoticStore`.

use proptest::prelude::*;
use quietpost_core::{
    ChaoticStore, KeyStore, KeyStoreError, KeyValueStore, MemoryStore, RedbStore, StorageError,
    SystemEnv,
};
use quietpost_crypto::{
    KeyPair, decode_private_key, decode_public_key, encode_private_key, encode_public_key,
};
use tempfile::tempdir;

const PRIVATE_SLOT: &str = "chat_private_key";
const PUBLIC_SLOT: &str = "chat_public_key";

/// Private JWK as exported by a browser for scalar 0x11..11
const BROWSER_PRIVATE_JWK: &str = r#"{"crv":"P-256","d":"ERERERERERERERERERERERERERERERERERERERERERE","ext":true,"key_ops":["deriveKey"],"kty":"EC","x":"AhfmF_C2RDkoJ4-WmZ5pojpPLBUr321s32bluAKC1O0","y":"GUp968uXcS0t2jyoWqh2Wlb0X8dYWZZS8ol8ZTBuV5Q"}"#;

/// Matching public JWK as exported by a browser
const BROWSER_PUBLIC_JWK: &str = r#"{"crv":"P-256","ext":true,"key_ops":[],"kty":"EC","x":"AhfmF_C2RDkoJ4-WmZ5pojpPLBUr321s32bluAKC1O0","y":"GUp968uXcS0t2jyoWqh2Wlb0X8dYWZZS8ol8ZTBuV5Q"}"#;

fn pair(byte: u8) -> KeyPair {
    KeyPair::from_random_bytes(&[byte; 32]).unwrap()
}

fn store_pair(store: &impl KeyValueStore, private_of: &KeyPair, public_of: &KeyPair) {
    store.set(PRIVATE_SLOT, &encode_private_key(private_of.private_key())).unwrap();
    store.set(PUBLIC_SLOT, &encode_public_key(public_of.public_key())).unwrap();
}

/// Stored slots decode to exactly `expected`.
fn assert_stored(store: &impl KeyValueStore, expected: &KeyPair) {
    let private = decode_private_key(&store.get(PRIVATE_SLOT).unwrap().unwrap()).unwrap();
    let public = decode_public_key(&store.get(PUBLIC_SLOT).unwrap().unwrap()).unwrap();

    assert_eq!(private.public_key(), *expected.public_key());
    assert_eq!(public, *expected.public_key());
}

#[test]
fn valid_stored_pair_is_returned() {
    let store = MemoryStore::new();
    let stored = pair(0x42);
    store_pair(&store, &stored, &stored);

    let loaded = KeyStore::new(store, SystemEnv::new()).get_or_create_key_pair().unwrap();

    assert_eq!(loaded.public_key(), stored.public_key());
}

#[test]
fn browser_exported_jwks_load_unchanged() {
    let store = MemoryStore::new();
    store.set(PRIVATE_SLOT, BROWSER_PRIVATE_JWK).unwrap();
    store.set(PUBLIC_SLOT, BROWSER_PUBLIC_JWK).unwrap();

    let loaded = KeyStore::new(store.clone(), SystemEnv::new()).get_or_create_key_pair().unwrap();

    assert_eq!(loaded.public_key(), pair(0x11).public_key());
    assert_eq!(store.get(PUBLIC_SLOT).unwrap().as_deref(), Some(BROWSER_PUBLIC_JWK));
}

#[test]
fn invalid_public_key_is_regenerated() {
    let store = MemoryStore::new();
    let old = pair(0x42);
    store.set(PRIVATE_SLOT, &encode_private_key(old.private_key())).unwrap();
    store.set(PUBLIC_SLOT, "not a jwk").unwrap();

    let fresh = KeyStore::new(store.clone(), SystemEnv::new()).get_or_create_key_pair().unwrap();

    assert_ne!(fresh.public_key(), old.public_key());
    assert_stored(&store, &fresh);
}

#[test]
fn invalid_private_key_is_regenerated() {
    let store = MemoryStore::new();
    let old = pair(0x42);
    store.set(PRIVATE_SLOT, r#"{"kty":"EC","crv":"P-256"}"#).unwrap();
    store.set(PUBLIC_SLOT, &encode_public_key(old.public_key())).unwrap();

    let fresh = KeyStore::new(store.clone(), SystemEnv::new()).get_or_create_key_pair().unwrap();

    assert_ne!(fresh.public_key(), old.public_key());
    assert_stored(&store, &fresh);
}

#[test]
fn mismatched_halves_are_regenerated() {
    let store = MemoryStore::new();
    let alice = pair(0x11);
    let bob = pair(0x22);
    store_pair(&store, &alice, &bob);

    let fresh = KeyStore::new(store.clone(), SystemEnv::new()).get_or_create_key_pair().unwrap();

    assert_ne!(fresh.public_key(), alice.public_key());
    assert_ne!(fresh.public_key(), bob.public_key());
    assert_stored(&store, &fresh);
}

#[test]
fn missing_half_is_regenerated() {
    let store = MemoryStore::new();
    let old = pair(0x42);
    store.set(PRIVATE_SLOT, &encode_private_key(old.private_key())).unwrap();

    let fresh = KeyStore::new(store.clone(), SystemEnv::new()).get_or_create_key_pair().unwrap();

    assert_ne!(fresh.public_key(), old.public_key());
    assert_stored(&store, &fresh);
    assert_eq!(store.len(), 2);
}

#[test]
fn key_pair_survives_redb_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keys.redb");

    let first = {
        let store = RedbStore::open(&path).unwrap();
        KeyStore::new(store, SystemEnv::new()).get_or_create_key_pair().unwrap()
    };

    let store = RedbStore::open(&path).unwrap();
    let second = KeyStore::new(store, SystemEnv::new()).get_or_create_key_pair().unwrap();

    assert_eq!(first.public_key(), second.public_key());
}

#[test]
fn concurrent_first_calls_mint_one_pair() {
    let keys = KeyStore::new(MemoryStore::new(), SystemEnv::new());

    let publics: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| *keys.get_or_create_key_pair().unwrap().public_key()))
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert!(publics.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn unavailable_storage_is_an_error() {
    let store = ChaoticStore::new(MemoryStore::new(), 1.0);

    let result = KeyStore::new(store, SystemEnv::new()).get_or_create_key_pair();

    assert_eq!(
        result.unwrap_err(),
        KeyStoreError::Storage(StorageError::Unavailable { operation: "get" })
    );
}

#[test]
fn failed_persist_never_leaves_half_a_pair() {
    for seed in 0..64 {
        let store = ChaoticStore::with_seed(MemoryStore::new(), 0.5, seed);

        let result = KeyStore::new(store.clone(), SystemEnv::new()).get_or_create_key_pair();

        match result {
            Ok(pair) => assert_stored(store.inner(), &pair),
            Err(_) => assert!(store.inner().is_empty(), "seed {seed} left a partial pair"),
        }
    }
}

#[test]
fn key_pair_persists_in_one_redb_transaction() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keys.redb");

    let pair = {
        let store = ChaoticStore::with_seed(RedbStore::open(&path).unwrap(), 0.0, 7);
        let pair =
            KeyStore::new(store.clone(), SystemEnv::new()).get_or_create_key_pair().unwrap();

        // get, get, remove, remove, set_many
        assert_eq!(store.operation_count(), 5);
        pair
    };

    assert_stored(&RedbStore::open(&path).unwrap(), &pair);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_chaotic_storage_never_returns_unpersisted_pair(
        failure_rate in 0.0..0.6,
        seed in any::<u64>(),
    ) {
        let store = ChaoticStore::with_seed(MemoryStore::new(), failure_rate, seed);
        let keys = KeyStore::new(store.clone(), SystemEnv::new());

        match keys.get_or_create_key_pair() {
            // ORACLE: a returned pair is exactly what the reliable store holds
            Ok(pair) => assert_stored(store.inner(), &pair),
            Err(KeyStoreError::Storage(StorageError::Unavailable { .. })) => {},
            Err(e) => prop_assert!(false, "unexpected error: {}", e),
        }

        // A reliable retry always converges on a consistent pair
        let recovered = KeyStore::new(store.inner().clone(), SystemEnv::new())
            .get_or_create_key_pair()
            .unwrap();
        assert_stored(store.inner(), &recovered);
    }
}
