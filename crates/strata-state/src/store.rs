//! Committed key/value store abstraction.
//!
//! The chain layer mutates committed state only through [`KvStore::apply`],
//! which must be atomic: either every operation in the batch lands or none
//! do. Reads may happen concurrently with nothing in flight; write
//! serialization is the host's responsibility.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;

/// An ordered list of put/delete operations committed as one unit.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    ops: Vec<(Vec<u8>, Option<Vec<u8>>)>,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a put of `value` under `key`.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push((key, Some(value)));
    }

    /// Queue a delete of `key`.
    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.push((key, None));
    }

    /// The queued operations in application order. `None` values are deletes.
    pub fn ops(&self) -> &[(Vec<u8>, Option<Vec<u8>>)] {
        &self.ops
    }

    /// Number of queued operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the batch holds no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// A committed key/value store.
pub trait KvStore {
    /// Read the committed value for `key`.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Apply a batch atomically. On error, committed state is unchanged.
    fn apply(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

impl<S: KvStore> KvStore for Arc<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        (**self).apply(batch)
    }
}

/// In-memory store used by tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemStore {
    inner: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy out the full committed contents, for inspection and
    /// byte-for-byte comparison in tests.
    pub fn snapshot(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| StoreError::Backend("lock poisoned".into()))?;
        Ok(guard.get(key).cloned())
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| StoreError::Backend("lock poisoned".into()))?;
        for (key, value) in batch.ops() {
            match value {
                Some(v) => {
                    guard.insert(key.clone(), v.clone());
                }
                None => {
                    guard.remove(key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete_round_trip() {
        let store = MemStore::new();
        let mut batch = WriteBatch::new();
        batch.put(b"alpha".to_vec(), b"1".to_vec());
        batch.put(b"beta".to_vec(), b"2".to_vec());
        store.apply(batch).unwrap();

        assert_eq!(store.get(b"alpha").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"beta").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.get(b"gamma").unwrap(), None);

        let mut batch = WriteBatch::new();
        batch.delete(b"alpha".to_vec());
        store.apply(batch).unwrap();
        assert_eq!(store.get(b"alpha").unwrap(), None);
    }

    #[test]
    fn later_ops_win_within_a_batch() {
        let store = MemStore::new();
        let mut batch = WriteBatch::new();
        batch.put(b"k".to_vec(), b"old".to_vec());
        batch.put(b"k".to_vec(), b"new".to_vec());
        store.apply(batch).unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn snapshot_reflects_contents() {
        let store = MemStore::new();
        assert!(store.snapshot().is_empty());

        let mut batch = WriteBatch::new();
        batch.put(b"k".to_vec(), b"v".to_vec());
        store.apply(batch).unwrap();

        let snap = store.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.get(&b"k".to_vec()), Some(&b"v".to_vec()));
    }
}
