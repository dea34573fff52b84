//! Local persistent key-value storage
//!
//! The key pair lives in a small string-keyed store supplied by the host
//! (browser local storage, a config directory, an embedded database). The
//! trait is synchronous; callers on an async runtime should run key loading
//! on a blocking thread.

mod chaotic;
mod error;
mod memory;
mod redb;

pub use chaotic::ChaoticStore;
pub use error::StorageError;
pub use memory::MemoryStore;

pub use self::redb::RedbStore;

/// String key-value store for local key material
///
/// Must be Clone (shared between the key store and the host), Send + Sync
/// (thread-safe), and synchronous. Implementations typically share internal
/// state via Arc, so clones access the same underlying storage.
pub trait KeyValueStore: Clone + Send + Sync + 'static {
    /// Value stored under `key`. `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Store several entries together.
    ///
    /// Transactional stores commit all entries or none. The default writes
    /// them one by one and may stop part way on error.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        entries.iter().try_for_each(|(key, value)| self.set(key, value))
    }

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
