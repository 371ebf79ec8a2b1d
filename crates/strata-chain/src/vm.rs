//! Host (VM) boundary.
//!
//! The chain core never reaches for ambient authority: block lookup,
//! recent history, expected difficulty and cost, committed storage, and
//! lifecycle notifications all arrive through this trait, bound at
//! construction.

use hashbrown::HashSet;
use strata_core::{BlockId, TxId};
use strata_state::KvStore;

use crate::block::Block;
use crate::error::ChainError;
use crate::tx::BlockTx;

/// Recent chain history around a candidate block's position, plus the
/// expected cost and difficulty at that position.
///
/// A deterministic function of chain history up to the parent within the
/// configured lookback window; how cost and difficulty are derived from
/// that history is owned by the host.
#[derive(Clone, Debug, Default)]
pub struct RecentWindow {
    /// Identities of blocks seen within the window.
    pub block_ids: HashSet<BlockId>,
    /// Identities of transactions seen within the window.
    pub tx_ids: HashSet<TxId>,
    /// Expected cost for a block at this position.
    pub cost: u64,
    /// Expected difficulty floor for a block at this position.
    pub difficulty: u64,
}

/// Capabilities the surrounding virtual machine supplies to the chain.
pub trait Vm {
    /// Transaction type carried by this chain's blocks.
    type Tx: BlockTx;
    /// Committed key/value store implementation.
    type Store: KvStore;

    /// Resolve a committed block by identity.
    ///
    /// Consulted only for blocks absent from the chain's own arena, so
    /// hosts serve this from persistent storage.
    fn get_block(&self, id: BlockId) -> Result<Option<Block<Self::Tx>>, ChainError>;

    /// Recent identities and the expected cost/difficulty for a block at
    /// `timestamp` whose parent is `parent`.
    fn recents(
        &self,
        timestamp: u64,
        parent_id: BlockId,
        parent: &Block<Self::Tx>,
    ) -> Result<RecentWindow, ChainError>;

    /// The committed key/value store.
    fn state(&self) -> &Self::Store;

    /// A block passed verification. Failure propagates to the `verify`
    /// caller.
    fn on_verified(&mut self, id: BlockId, block: &Block<Self::Tx>) -> Result<(), ChainError>;

    /// A block was accepted and its overlay committed. Failure propagates
    /// to the `accept` caller.
    fn on_accepted(&mut self, id: BlockId, block: &Block<Self::Tx>) -> Result<(), ChainError>;

    /// A block was rejected. Failure propagates to the `reject` caller.
    fn on_rejected(&mut self, id: BlockId, block: &Block<Self::Tx>) -> Result<(), ChainError>;
}
