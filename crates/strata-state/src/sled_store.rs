//! Persistent key/value store backed by sled.

use std::path::Path;

use sled::transaction::TransactionResult;
use sled::Error as SledError;

use crate::error::StoreError;
use crate::store::{KvStore, WriteBatch};

const TREE_STATE: &str = "state";

/// Committed state persisted in a sled tree.
///
/// Batches are applied inside a sled transaction so a crash mid-commit
/// never leaves a partial batch behind.
pub struct SledStore {
    _db: sled::Db,
    state: sled::Tree,
}

impl SledStore {
    /// Open (or create) a store at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::Backend(e.to_string()))?;
        let state = db
            .open_tree(TREE_STATE)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self { _db: db, state })
    }
}

impl KvStore for SledStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let value = self
            .state
            .get(key)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(value.map(|ivec| ivec.to_vec()))
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let res: TransactionResult<(), SledError> = self.state.transaction(|tree| {
            for (key, value) in batch.ops() {
                match value {
                    Some(v) => {
                        tree.insert(key.as_slice(), v.as_slice())?;
                    }
                    None => {
                        tree.remove(key.as_slice())?;
                    }
                }
            }
            Ok(())
        });
        res.map_err(|e| StoreError::Backend(e.to_string()))
    }
}
