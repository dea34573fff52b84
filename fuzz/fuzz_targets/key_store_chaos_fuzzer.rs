//! Fuzz target for key store loading under corrupt data and storage faults
//!
//! # Strategy
//!
//! - Arbitrary text pre-seeded into the private and public key slots
//! - `ChaoticStore` failure rates from 0% to 90%
//! - Repeated load attempts against the same store
//!
//! # Invariants
//!
//! - Loading never panics, whatever the slots contain
//! - Storage faults surface as `KeyStoreError::Storage`
//! - A returned key pair is exactly the pair left in storage
//! - Once a load succeeds, later loads return the same pair

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use quietpost_core::{
    ChaoticStore, KeyStore, KeyStoreError, KeyValueStore, MemoryStore, SystemEnv,
};
use quietpost_crypto::{PublicKey, decode_public_key};

#[derive(Debug, Clone, Arbitrary)]
struct ChaosScenario {
    private_slot: Option<String>,
    public_slot: Option<String>,
    /// Seed for ChaoticStore RNG (deterministic failures)
    chaos_seed: u64,
    /// Failure rate 0-9 maps to 0%-90%
    failure_rate_tenth: u8,
    /// Load attempts (1-8)
    attempts: u8,
}

fuzz_target!(|scenario: ChaosScenario| {
    let inner = MemoryStore::new();
    if let Some(text) = &scenario.private_slot {
        let _ = inner.set("chat_private_key", text);
    }
    if let Some(text) = &scenario.public_slot {
        let _ = inner.set("chat_public_key", text);
    }

    let failure_rate = f64::from(scenario.failure_rate_tenth % 10) / 10.0;
    let store = ChaoticStore::with_seed(inner.clone(), failure_rate, scenario.chaos_seed);
    let keys = KeyStore::new(store, SystemEnv::new());

    let mut loaded: Option<PublicKey> = None;
    for _ in 0..(scenario.attempts % 8).max(1) {
        match keys.get_or_create_key_pair() {
            Ok(pair) => {
                let stored = inner
                    .get("chat_public_key")
                    .ok()
                    .flatten()
                    .and_then(|text| decode_public_key(&text).ok());
                assert_eq!(stored.as_ref(), Some(pair.public_key()));

                if let Some(previous) = &loaded {
                    assert_eq!(previous, pair.public_key(), "identity changed between loads");
                }
                loaded = Some(*pair.public_key());
            },
            Err(KeyStoreError::Storage(_)) => {},
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
});
