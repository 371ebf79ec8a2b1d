// Consensus-critical. Changes require spec update + tests.
//! Copy-on-write state overlays.
//!
//! An overlay is the isolated, mutable snapshot attached to one in-flight
//! block. It records puts and tombstoned deletes on top of a base, where
//! the base is either committed storage or the identity of another block
//! whose overlay is still live. Chaining bases by identity is what lets
//! competing forks be verified concurrently: every fork mutates only its
//! own layer while committed storage stays untouched until a single
//! serialized commit.

use std::collections::BTreeMap;

use strata_core::BlockId;

use crate::store::WriteBatch;

/// What an overlay reads through to when a key is not in its own layer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OverlayBase {
    /// The committed persistent store.
    Committed,
    /// The live overlay of the block with this identity.
    Block(BlockId),
}

/// An isolated write layer owned by exactly one in-flight block.
///
/// Created when the block is verified, then either committed into
/// persistent storage (block accepted) or dropped (block rejected).
#[derive(Clone, Debug)]
pub struct Overlay {
    base: OverlayBase,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl Overlay {
    /// Create an empty overlay rooted at `base`.
    pub fn new(base: OverlayBase) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    /// The current base.
    pub fn base(&self) -> OverlayBase {
        self.base
    }

    /// Repoint the base.
    ///
    /// Exercised only at commit time: when a parent block is accepted its
    /// overlay becomes committed state, so children chained onto it are
    /// rebased onto [`OverlayBase::Committed`] without re-verification.
    pub fn rebase(&mut self, base: OverlayBase) {
        self.base = base;
    }

    /// Record a put of `value` under `key` in this layer.
    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    /// Record a delete of `key` in this layer (tombstone).
    pub fn remove(&mut self, key: &[u8]) {
        self.writes.insert(key.to_vec(), None);
    }

    /// Look up `key` in this layer only.
    ///
    /// `None` means the layer has no opinion; `Some(None)` means the key
    /// was deleted here; `Some(Some(v))` is a value written here.
    pub fn get_local(&self, key: &[u8]) -> Option<Option<&[u8]>> {
        self.writes.get(key).map(|v| v.as_deref())
    }

    /// Number of keys touched by this layer.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether this layer touches no keys.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Render the layer as an atomic batch, in key order.
    pub fn to_batch(&self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for (key, value) in &self.writes {
            match value {
                Some(v) => batch.put(key.clone(), v.clone()),
                None => batch.delete(key.clone()),
            }
        }
        batch
    }
}
