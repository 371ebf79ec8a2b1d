// Consensus-critical. Changes require spec update + tests.
//! Layered read/write view over an overlay chain.

use crate::error::StoreError;
use crate::overlay::Overlay;
use crate::store::KvStore;

/// The state handle given to transaction verification.
///
/// Reads resolve through the owned overlay, then each ancestor overlay
/// nearest-first, then the committed store. Writes land only in the owned
/// overlay; ancestor layers and committed state are never mutated here.
pub struct StateView<'a, S: KvStore> {
    top: &'a mut Overlay,
    ancestors: Vec<&'a Overlay>,
    store: &'a S,
}

impl<'a, S: KvStore> StateView<'a, S> {
    /// Build a view over `top`, with `ancestors` ordered nearest-first.
    pub fn new(top: &'a mut Overlay, ancestors: Vec<&'a Overlay>, store: &'a S) -> Self {
        Self {
            top,
            ancestors,
            store,
        }
    }

    /// Read `key` through the layer chain.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(hit) = self.top.get_local(key) {
            return Ok(hit.map(|v| v.to_vec()));
        }
        for layer in &self.ancestors {
            if let Some(hit) = layer.get_local(key) {
                return Ok(hit.map(|v| v.to_vec()));
            }
        }
        self.store.get(key)
    }

    /// Write `value` under `key` into the owned overlay.
    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.top.insert(key, value);
    }

    /// Delete `key` in the owned overlay (tombstone).
    pub fn remove(&mut self, key: &[u8]) {
        self.top.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::OverlayBase;
    use crate::store::{MemStore, WriteBatch};

    fn seeded_store() -> MemStore {
        let store = MemStore::new();
        let mut batch = WriteBatch::new();
        batch.put(b"committed".to_vec(), b"base".to_vec());
        batch.put(b"shadowed".to_vec(), b"base".to_vec());
        store.apply(batch).unwrap();
        store
    }

    #[test]
    fn read_through_precedence() {
        let store = seeded_store();

        let mut parent = Overlay::new(OverlayBase::Committed);
        parent.insert(b"shadowed".to_vec(), b"parent".to_vec());
        parent.insert(b"parent-only".to_vec(), b"p".to_vec());

        let mut top = Overlay::new(OverlayBase::Committed);
        top.insert(b"top-only".to_vec(), b"t".to_vec());

        let view = StateView::new(&mut top, vec![&parent], &store);
        assert_eq!(view.get(b"top-only").unwrap(), Some(b"t".to_vec()));
        assert_eq!(view.get(b"parent-only").unwrap(), Some(b"p".to_vec()));
        assert_eq!(view.get(b"shadowed").unwrap(), Some(b"parent".to_vec()));
        assert_eq!(view.get(b"committed").unwrap(), Some(b"base".to_vec()));
        assert_eq!(view.get(b"missing").unwrap(), None);
    }

    #[test]
    fn tombstone_hides_lower_layers() {
        let store = seeded_store();

        let mut parent = Overlay::new(OverlayBase::Committed);
        parent.remove(b"committed");

        let mut top = Overlay::new(OverlayBase::Committed);
        {
            let view = StateView::new(&mut top, vec![&parent], &store);
            assert_eq!(view.get(b"committed").unwrap(), None);
        }

        // A tombstone in the owned layer hides an ancestor write.
        let mut parent2 = Overlay::new(OverlayBase::Committed);
        parent2.insert(b"k".to_vec(), b"v".to_vec());
        let mut top2 = Overlay::new(OverlayBase::Committed);
        let mut view = StateView::new(&mut top2, vec![&parent2], &store);
        assert_eq!(view.get(b"k").unwrap(), Some(b"v".to_vec()));
        view.remove(b"k");
        assert_eq!(view.get(b"k").unwrap(), None);
    }

    #[test]
    fn writes_stay_in_owned_layer() {
        let store = seeded_store();
        let parent = Overlay::new(OverlayBase::Committed);
        let mut top = Overlay::new(OverlayBase::Committed);
        {
            let mut view = StateView::new(&mut top, vec![&parent], &store);
            view.insert(b"new".to_vec(), b"val".to_vec());
        }
        assert_eq!(top.get_local(b"new"), Some(Some(b"val".as_slice())));
        assert!(parent.is_empty());
        assert_eq!(store.get(b"new").unwrap(), None);
    }
}
