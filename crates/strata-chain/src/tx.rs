//! Transaction boundary.
//!
//! Transaction business semantics (fees, claims, value storage) are not
//! defined here. A block's transactions only have to satisfy this
//! contract: verify themselves against the block's state view and declare
//! their own proof-of-work contribution.

use borsh::{BorshDeserialize, BorshSerialize};
use core::fmt;
use hashbrown::HashSet;
use strata_core::{BlockId, CoreError, TxId};
use strata_state::{KvStore, StateView};

use crate::error::ChainError;

/// Everything a transaction may consult while verifying itself as part of
/// a block.
pub struct TxContext<'a, S: KvStore> {
    /// Layered state view; writes land in the block's own overlay.
    pub view: StateView<'a, S>,
    /// The containing block's timestamp (Unix seconds).
    pub timestamp: u64,
    /// Block identities seen within the lookback window.
    pub recent_block_ids: &'a HashSet<BlockId>,
    /// Transaction identities seen within the lookback window.
    pub recent_tx_ids: &'a HashSet<TxId>,
    /// The floor difficulty required of every transaction in the block.
    pub difficulty: u64,
}

/// The contract a transaction type must satisfy to be carried in a block.
///
/// A transaction's declared difficulty must be at least the block's floor
/// difficulty; declaring less is a contract violation by the transaction
/// implementation, not a condition handled at this layer.
pub trait BlockTx: Clone + fmt::Debug + BorshSerialize + BorshDeserialize {
    /// Canonical content identity of this transaction.
    fn id(&self) -> Result<TxId, CoreError>;

    /// Declared proof-of-work contribution.
    fn difficulty(&self) -> u64;

    /// Verify this transaction against the block's state view, mutating
    /// the view as a side effect. Failures propagate verbatim and
    /// invalidate the whole block.
    fn verify<S: KvStore>(&self, ctx: &mut TxContext<'_, S>) -> Result<(), ChainError>;
}
