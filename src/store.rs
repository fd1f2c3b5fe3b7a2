//! Record storage seam.
//!
//! The persistence layer is an external collaborator: envelopes only need a
//! keyed get/insert/update/delete. `MemoryStore` is the in-process
//! implementation used by tests and the demo.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::EnvelopeError;

/// A keyed store of already-encrypted records.
pub trait RecordStore<R>: Send + Sync {
    /// Fetch a copy of the record under `key`.
    fn get(&self, key: &str) -> Option<R>;

    /// Add a new record. Fails with `RecordExists` if `key` is taken.
    fn insert(&self, key: &str, record: R) -> Result<(), EnvelopeError>;

    /// Replace an existing record. Fails with `RecordNotFound` if absent.
    fn update(&self, key: &str, record: R) -> Result<(), EnvelopeError>;

    /// Remove a record and return it. Fails with `RecordNotFound` if absent.
    fn delete(&self, key: &str) -> Result<R, EnvelopeError>;

    /// All keys currently stored, sorted.
    fn keys(&self) -> Vec<String>;
}

/// In-memory `RecordStore` behind a read-write lock.
#[derive(Debug)]
pub struct MemoryStore<R> {
    records: RwLock<HashMap<String, R>>,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl<R> MemoryStore<R> {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// True if no records are held.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl<R: Clone + Send + Sync> RecordStore<R> for MemoryStore<R> {
    fn get(&self, key: &str) -> Option<R> {
        self.records.read().get(key).cloned()
    }

    fn insert(&self, key: &str, record: R) -> Result<(), EnvelopeError> {
        let mut records = self.records.write();
        if records.contains_key(key) {
            return Err(EnvelopeError::RecordExists(key.to_string()));
        }
        records.insert(key.to_string(), record);
        Ok(())
    }

    fn update(&self, key: &str, record: R) -> Result<(), EnvelopeError> {
        let mut records = self.records.write();
        let slot = records
            .get_mut(key)
            .ok_or_else(|| EnvelopeError::RecordNotFound(key.to_string()))?;
        *slot = record;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<R, EnvelopeError> {
        self.records
            .write()
            .remove(key)
            .ok_or_else(|| EnvelopeError::RecordNotFound(key.to_string()))
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.records.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_update_delete() {
        let store: MemoryStore<String> = MemoryStore::new();
        assert!(store.is_empty());

        store.insert("a", "one".into()).unwrap();
        assert_eq!(store.get("a").as_deref(), Some("one"));

        store.update("a", "two".into()).unwrap();
        assert_eq!(store.get("a").as_deref(), Some("two"));

        assert_eq!(store.delete("a").unwrap(), "two");
        assert!(store.get("a").is_none());
    }

    #[test]
    fn duplicate_insert_and_missing_update() {
        let store: MemoryStore<u8> = MemoryStore::new();
        store.insert("k", 1).unwrap();
        assert_eq!(
            store.insert("k", 2),
            Err(EnvelopeError::RecordExists("k".into()))
        );
        assert_eq!(
            store.update("missing", 2),
            Err(EnvelopeError::RecordNotFound("missing".into()))
        );
        assert_eq!(
            store.delete("missing"),
            Err(EnvelopeError::RecordNotFound("missing".into()))
        );
    }

    #[test]
    fn keys_are_sorted() {
        let store: MemoryStore<u8> = MemoryStore::new();
        for k in ["c", "a", "b"] {
            store.insert(k, 0).unwrap();
        }
        assert_eq!(store.keys(), vec!["a", "b", "c"]);
        assert_eq!(store.len(), 3);
    }
}
