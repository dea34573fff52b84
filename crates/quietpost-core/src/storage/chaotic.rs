//! Chaotic storage wrapper for fault injection testing
//!
//! Wraps another store and randomly refuses operations, so tests can check
//! that storage faults surface as errors instead of lost or half-written key
//! pairs.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use super::{KeyValueStore, StorageError};

/// Chaotic store wrapper that randomly injects failures
///
/// Delegates to an underlying store but fails operations based on a
/// configured failure rate. The RNG is seeded so chaos runs are
/// reproducible.
#[derive(Clone)]
pub struct ChaoticStore<S: KeyValueStore> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    /// RNG state for deterministic chaos
    rng: Arc<Mutex<ChaoticRng>>,
    /// Operations attempted, including refused ones
    operation_count: Arc<AtomicUsize>,
}

/// Simple deterministic RNG for chaos injection
///
/// Linear congruential generator: fast, deterministic, not for crypto.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate next random value [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // LCG constants from Numerical Recipes
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }
}

impl<S: KeyValueStore> ChaoticStore<S> {
    /// Create a chaotic wrapper with the default seed.
    ///
    /// `failure_rate` is clamped to [0.0, 1.0].
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Create with explicit seed for reproducible chaos
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        Self {
            inner,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            operation_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of operations attempted so far.
    pub fn operation_count(&self) -> usize {
        self.operation_count.load(Ordering::Relaxed)
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check(&self, operation: &'static str) -> Result<(), StorageError> {
        self.operation_count.fetch_add(1, Ordering::Relaxed);

        let roll = self.rng.lock().unwrap_or_else(PoisonError::into_inner).next();
        if roll < self.failure_rate {
            return Err(StorageError::Unavailable { operation });
        }
        Ok(())
    }
}

impl<S: KeyValueStore> KeyValueStore for ChaoticStore<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check("get")?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check("set")?;
        self.inner.set(key, value)
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        self.check("set_many")?;
        self.inner.set_many(entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check("remove")?;
        self.inner.remove(key)
    }
}
