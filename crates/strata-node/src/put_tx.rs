//! Devnet transaction type.
//!
//! Stores one key/value pair. Real transaction semantics (fees, claims,
//! tiered pricing) belong to a full host; this type exists so the devnet
//! driver exercises the whole verify/accept pipeline.

use borsh::{BorshDeserialize, BorshSerialize};
use strata_chain::{BlockTx, ChainError, TxContext};
use strata_core::{content_id, CoreError, TxId, DS_TX};
use strata_state::KvStore;

/// Write `value` under `key`, carrying a declared work contribution.
#[derive(Clone, PartialEq, Eq, Debug, BorshSerialize, BorshDeserialize)]
pub struct PutTx {
    /// State key to write.
    pub key: Vec<u8>,
    /// Value to store.
    pub value: Vec<u8>,
    /// Declared proof-of-work contribution.
    pub difficulty: u64,
}

impl BlockTx for PutTx {
    fn id(&self) -> Result<TxId, CoreError> {
        content_id(DS_TX, self)
    }

    fn difficulty(&self) -> u64 {
        self.difficulty
    }

    fn verify<S: KvStore>(&self, ctx: &mut TxContext<'_, S>) -> Result<(), ChainError> {
        if self.key.is_empty() {
            return Err(ChainError::InvalidTransaction("empty key"));
        }
        if ctx.recent_tx_ids.contains(&self.id()?) {
            return Err(ChainError::InvalidTransaction("recently seen"));
        }
        ctx.view.insert(self.key.clone(), self.value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_tracks_content() {
        let a = PutTx {
            key: b"k".to_vec(),
            value: b"v".to_vec(),
            difficulty: 150,
        };
        let mut b = a.clone();
        assert_eq!(a.id().unwrap(), b.id().unwrap());
        b.value = b"w".to_vec();
        assert_ne!(a.id().unwrap(), b.id().unwrap());
    }
}
