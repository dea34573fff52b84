use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use super::{KeyValueStore, StorageError};

/// In-memory store for tests and ephemeral sessions
///
/// All state is wrapped in `Arc<Mutex<>>` so clones share one map. A poisoned
/// lock is recovered: the map holds plain strings and has no invariant a
/// panicking writer could break.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create a new empty `MemoryStore`
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    ///
    /// Useful for debugging and testing.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in entries {
            inner.insert((*key).to_owned(), (*value).to_owned());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_is_empty() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn set_many_writes_all_entries() {
        let store = MemoryStore::new();
        store.set_many(&[("a", "1"), ("b", "2")]).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn set_get_remove() {
        let store = MemoryStore::new();

        store.set("slot", "value").unwrap();
        assert_eq!(store.get("slot").unwrap().as_deref(), Some("value"));

        store.set("slot", "replaced").unwrap();
        assert_eq!(store.get("slot").unwrap().as_deref(), Some("replaced"));
        assert_eq!(store.len(), 1);

        store.remove("slot").unwrap();
        assert_eq!(store.get("slot").unwrap(), None);
    }

    #[test]
    fn remove_absent_key_is_ok() {
        let store = MemoryStore::new();
        assert!(store.remove("never-set").is_ok());
    }

    #[test]
    fn clones_share_state() {
        let store = MemoryStore::new();
        let clone = store.clone();

        store.set("shared", "yes").unwrap();
        assert_eq!(clone.get("shared").unwrap().as_deref(), Some("yes"));
    }
}
