// Consensus-critical. Changes require spec update + tests.
//! The chain arena: block registration, verification, and decision.
//!
//! Blocks live in an identity-keyed arena; parent/child relationships are
//! identity lookups into that arena, never live object references. Each
//! verified-but-undecided block exclusively owns a state overlay whose
//! base is either committed storage or the parent's identity, so any
//! number of competing forks verify concurrently against their own
//! private layers while committed storage changes only inside the single
//! serialized `accept` step.

use hashbrown::HashMap;
use strata_core::BlockId;
use strata_state::{KvStore, Overlay, OverlayBase, StateView, WriteBatch};

use crate::block::{Block, Status, FUTURE_BLOCK_DRIFT_SECS};
use crate::clock::Clock;
use crate::error::ChainError;
use crate::genesis::verify_genesis;
use crate::tx::{BlockTx, TxContext};
use crate::vm::Vm;

/// Committed-store key of the last-accepted block pointer.
///
/// Written transactionally together with every overlay commit.
pub const KEY_LAST_ACCEPTED: &[u8] = b"last_accepted";

/// Read the last-accepted pointer from a committed store.
pub fn read_last_accepted<S: KvStore>(store: &S) -> Result<Option<BlockId>, ChainError> {
    match store.get(KEY_LAST_ACCEPTED)? {
        Some(bytes) => Ok(Some(BlockId::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

struct BlockEntry<T> {
    block: Block<T>,
    status: Status,
    overlay: Option<Overlay>,
    children: Vec<BlockId>,
}

impl<T> BlockEntry<T> {
    fn new(block: Block<T>, status: Status) -> Self {
        Self {
            block,
            status,
            overlay: None,
            children: Vec::new(),
        }
    }
}

/// The block-validation and state-commitment core.
///
/// Operations take `&mut self`: the chain is a single-writer value, and
/// hosts that share one across threads serialize access themselves.
pub struct Chain<V: Vm, C: Clock> {
    vm: V,
    clock: C,
    entries: HashMap<BlockId, BlockEntry<V::Tx>>,
    genesis_id: BlockId,
}

impl<V: Vm, C: Clock> std::fmt::Debug for Chain<V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("genesis_id", &self.genesis_id)
            .finish_non_exhaustive()
    }
}

impl<V: Vm, C: Clock> Chain<V, C> {
    /// Boot the chain from its genesis block.
    ///
    /// The genesis block must satisfy [`verify_genesis`]; it is registered
    /// already accepted and bypasses the validation state machine. On
    /// first boot the committed last-accepted pointer is seeded to it.
    pub fn initialize(vm: V, clock: C, genesis: Block<V::Tx>) -> Result<Self, ChainError> {
        verify_genesis(&genesis, clock.now_unix())?;
        let genesis_id = genesis.id()?;

        if read_last_accepted(vm.state())?.is_none() {
            let mut batch = WriteBatch::new();
            batch.put(KEY_LAST_ACCEPTED.to_vec(), genesis_id.as_bytes().to_vec());
            vm.state().apply(batch)?;
        }

        let mut entries = HashMap::new();
        entries.insert(genesis_id, BlockEntry::new(genesis, Status::Accepted));
        Ok(Self {
            vm,
            clock,
            entries,
            genesis_id,
        })
    }

    /// Identity of the genesis block.
    pub fn genesis_id(&self) -> BlockId {
        self.genesis_id
    }

    /// The bound host.
    pub fn vm(&self) -> &V {
        &self.vm
    }

    /// Register a candidate block, computing its identity exactly once.
    ///
    /// Re-inserting a known identity is a no-op returning the same id.
    pub fn insert(&mut self, block: Block<V::Tx>) -> Result<BlockId, ChainError> {
        let id = block.id()?;
        self.entries
            .entry(id)
            .or_insert_with(|| BlockEntry::new(block, Status::Unverified));
        Ok(id)
    }

    /// Validation status of a known block.
    pub fn status(&self, id: BlockId) -> Result<Status, ChainError> {
        self.entries
            .get(&id)
            .map(|e| e.status)
            .ok_or(ChainError::UnknownBlock(id))
    }

    /// Declared fields of a known block.
    pub fn block(&self, id: BlockId) -> Result<&Block<V::Tx>, ChainError> {
        self.entries
            .get(&id)
            .map(|e| &e.block)
            .ok_or(ChainError::UnknownBlock(id))
    }

    /// Children registered against a known block.
    pub fn children(&self, id: BlockId) -> Result<&[BlockId], ChainError> {
        self.entries
            .get(&id)
            .map(|e| e.children.as_slice())
            .ok_or(ChainError::UnknownBlock(id))
    }

    /// The committed last-accepted pointer.
    pub fn last_accepted(&self) -> Result<Option<BlockId>, ChainError> {
        read_last_accepted(self.vm.state())
    }

    /// Base of a verified block's live overlay, if any.
    pub fn overlay_base(&self, id: BlockId) -> Result<Option<OverlayBase>, ChainError> {
        self.entries
            .get(&id)
            .map(|e| e.overlay.as_ref().map(Overlay::base))
            .ok_or(ChainError::UnknownBlock(id))
    }

    /// Decide whether a candidate block is admissible, attaching its
    /// isolated state overlay on success.
    ///
    /// Idempotent success: a block that already verified (or was already
    /// accepted) returns `Ok` without re-running. Every structural
    /// rejection is a permanent judgment; infrastructure failures pass
    /// through unchanged.
    pub fn verify(&mut self, id: BlockId) -> Result<(), ChainError> {
        match self.status(id)? {
            Status::Accepted | Status::Verified => return Ok(()),
            Status::Rejected => return Err(ChainError::AlreadyDecided),
            Status::Unverified => {}
        }

        let parent_id = self
            .entries
            .get(&id)
            .ok_or(ChainError::UnknownBlock(id))?
            .block
            .parent;
        if !self.entries.contains_key(&parent_id) {
            let fetched = self
                .vm
                .get_block(parent_id)?
                .ok_or(ChainError::UnknownBlock(parent_id))?;
            // Host lookups serve committed blocks only.
            self.entries
                .insert(parent_id, BlockEntry::new(fetched, Status::Accepted));
        }

        let mut overlay;
        {
            let entry = self
                .entries
                .get(&id)
                .ok_or(ChainError::UnknownBlock(id))?;
            let parent = self
                .entries
                .get(&parent_id)
                .ok_or(ChainError::UnknownBlock(parent_id))?;
            let block = &entry.block;

            if block.height != parent.block.height.saturating_add(1) {
                return Err(ChainError::InvalidHeight);
            }
            if block.txs.is_empty() {
                return Err(ChainError::NoTransactions);
            }
            if block.timestamp < parent.block.timestamp {
                return Err(ChainError::TimestampTooEarly);
            }
            let now = self.clock.now_unix();
            if block.timestamp >= now.saturating_add(FUTURE_BLOCK_DRIFT_SECS) {
                return Err(ChainError::TimestampTooLate);
            }

            let window = self.vm.recents(block.timestamp, parent_id, &parent.block)?;
            if block.cost != window.cost {
                return Err(ChainError::InvalidCost);
            }
            if block.difficulty != window.difficulty {
                return Err(ChainError::InvalidDifficulty);
            }

            let base = match parent.status {
                Status::Accepted => OverlayBase::Committed,
                Status::Verified => OverlayBase::Block(parent_id),
                Status::Unverified | Status::Rejected => {
                    return Err(ChainError::AncestorUnresolved)
                }
            };
            overlay = Overlay::new(base);

            let ancestors = self.ancestor_overlays(parent_id)?;
            let mut surplus: u64 = 0;
            {
                let mut ctx = TxContext {
                    view: StateView::new(&mut overlay, ancestors, self.vm.state()),
                    timestamp: block.timestamp,
                    recent_block_ids: &window.block_ids,
                    recent_tx_ids: &window.tx_ids,
                    difficulty: window.difficulty,
                };
                for tx in &block.txs {
                    tx.verify(&mut ctx)?;
                    surplus = surplus.saturating_add(tx.difficulty().saturating_sub(window.difficulty));
                }
            }

            // Excess work across the block's transactions must scale with
            // the cost charged for block production.
            if surplus < window.difficulty.saturating_mul(block.cost) {
                return Err(ChainError::InsufficientSurplus);
            }
        }

        // The block provisionally records itself as latest inside its own
        // overlay, so overlay readers observe a consistent "last accepted"
        // before the real decision lands.
        overlay.insert(KEY_LAST_ACCEPTED.to_vec(), id.as_bytes().to_vec());

        if let Some(parent_entry) = self.entries.get_mut(&parent_id) {
            parent_entry.children.push(id);
        }
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.overlay = Some(overlay);
            entry.status = Status::Verified;
        }

        match self.entries.get(&id) {
            Some(entry) => self.vm.on_verified(id, &entry.block),
            None => Err(ChainError::UnknownBlock(id)),
        }
    }

    /// Commit a verified block's overlay into persistent storage and make
    /// it the new committed ground truth.
    ///
    /// Children already holding live overlays rooted at this block are
    /// rebased onto committed storage, chaining speculative verification
    /// across unconfirmed generations without re-verification. A second
    /// accept is a no-op. On commit failure the block stays verified with
    /// its overlay intact so the host may retry.
    pub fn accept(&mut self, id: BlockId) -> Result<(), ChainError> {
        let batch = {
            let entry = self.entries.get(&id).ok_or(ChainError::UnknownBlock(id))?;
            match entry.status {
                Status::Accepted => return Ok(()),
                Status::Rejected => return Err(ChainError::AlreadyDecided),
                Status::Unverified => return Err(ChainError::NotVerified),
                Status::Verified => {}
            }
            match &entry.overlay {
                Some(overlay) => overlay.to_batch(),
                None => return Err(ChainError::NotVerified),
            }
        };

        self.vm.state().apply(batch)?;

        let children = {
            let entry = self.entries.get_mut(&id).ok_or(ChainError::UnknownBlock(id))?;
            entry.status = Status::Accepted;
            entry.overlay = None;
            entry.children.clone()
        };
        for child in children {
            if let Some(child_entry) = self.entries.get_mut(&child) {
                if let Some(overlay) = child_entry.overlay.as_mut() {
                    overlay.rebase(OverlayBase::Committed);
                }
            }
        }

        match self.entries.get(&id) {
            Some(entry) => self.vm.on_accepted(id, &entry.block),
            None => Err(ChainError::UnknownBlock(id)),
        }
    }

    /// Discard a block and its overlay. No persistent state is touched.
    ///
    /// Descendants of a rejected block are left referencing a dead
    /// branch; pruning them is a host responsibility.
    pub fn reject(&mut self, id: BlockId) -> Result<(), ChainError> {
        {
            let entry = self.entries.get_mut(&id).ok_or(ChainError::UnknownBlock(id))?;
            match entry.status {
                Status::Rejected => return Ok(()),
                Status::Accepted => return Err(ChainError::AlreadyDecided),
                Status::Verified | Status::Unverified => {}
            }
            entry.status = Status::Rejected;
            entry.overlay = None;
        }

        match self.entries.get(&id) {
            Some(entry) => self.vm.on_rejected(id, &entry.block),
            None => Err(ChainError::UnknownBlock(id)),
        }
    }

    /// Read a key as observed from a block's tentative state.
    ///
    /// For an accepted block this is committed storage; for a verified
    /// block reads resolve through its overlay chain down to committed
    /// storage.
    pub fn read_state(&self, id: BlockId, key: &[u8]) -> Result<Option<Vec<u8>>, ChainError> {
        let entry = self.entries.get(&id).ok_or(ChainError::UnknownBlock(id))?;
        match entry.status {
            Status::Accepted => Ok(self.vm.state().get(key)?),
            Status::Verified => {
                for layer in self.ancestor_overlays(id)? {
                    if let Some(hit) = layer.get_local(key) {
                        return Ok(hit.map(|v| v.to_vec()));
                    }
                }
                Ok(self.vm.state().get(key)?)
            }
            Status::Unverified => Err(ChainError::NotVerified),
            Status::Rejected => Err(ChainError::AlreadyDecided),
        }
    }

    /// Collect the live overlays reachable from `from`, nearest first,
    /// stopping at the first layer based on committed storage.
    ///
    /// `from` itself is included when it holds an overlay; an accepted
    /// block resolves to no layers (committed storage is its state).
    fn ancestor_overlays(&self, from: BlockId) -> Result<Vec<&Overlay>, ChainError> {
        let mut layers = Vec::new();
        let mut cursor = from;
        loop {
            let entry = self
                .entries
                .get(&cursor)
                .ok_or(ChainError::AncestorUnresolved)?;
            match (&entry.overlay, entry.status) {
                (Some(overlay), Status::Verified) => {
                    layers.push(overlay);
                    match overlay.base() {
                        OverlayBase::Committed => break,
                        OverlayBase::Block(next) => cursor = next,
                    }
                }
                (None, Status::Accepted) => break,
                _ => return Err(ChainError::AncestorUnresolved),
            }
        }
        Ok(layers)
    }
}
