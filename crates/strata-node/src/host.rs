//! Devnet host behind the chain's VM boundary.
//!
//! Serves committed-block lookups from an in-memory index, tracks recent
//! block/transaction identities over the genesis lookback window, and
//! pins expected difficulty and cost to the genesis minimums (a
//! constant-rate devnet; a production host derives both from history).

use hashbrown::{HashMap, HashSet};
use strata_chain::{Block, BlockTx, ChainError, Genesis, RecentWindow, Vm};
use strata_core::{BlockId, TxId};
use strata_state::SledStore;

use crate::put_tx::PutTx;

/// One accepted block in the host's recency index.
struct AcceptedRecord {
    timestamp: u64,
    tx_ids: Vec<TxId>,
}

/// In-process host for a single-node devnet.
pub struct DevHost {
    store: SledStore,
    params: Genesis,
    blocks: HashMap<BlockId, Block<PutTx>>,
    accepted: Vec<(BlockId, AcceptedRecord)>,
}

impl DevHost {
    /// Build a host over `store`, seeded with the genesis block.
    pub fn new(store: SledStore, genesis: Block<PutTx>) -> Result<Self, ChainError> {
        let genesis_id = genesis.id()?;
        let params = genesis.genesis.clone().ok_or(ChainError::MissingGenesis)?;
        let record = AcceptedRecord {
            timestamp: genesis.timestamp,
            tx_ids: Vec::new(),
        };
        let mut blocks = HashMap::new();
        blocks.insert(genesis_id, genesis);
        Ok(Self {
            store,
            params,
            blocks,
            accepted: vec![(genesis_id, record)],
        })
    }

    /// The embedded protocol parameters.
    pub fn params(&self) -> &Genesis {
        &self.params
    }
}

impl Vm for DevHost {
    type Tx = PutTx;
    type Store = SledStore;

    fn get_block(&self, id: BlockId) -> Result<Option<Block<PutTx>>, ChainError> {
        Ok(self.blocks.get(&id).cloned())
    }

    fn recents(
        &self,
        timestamp: u64,
        _parent_id: BlockId,
        _parent: &Block<PutTx>,
    ) -> Result<RecentWindow, ChainError> {
        let floor = timestamp.saturating_sub(self.params.lookback_window_secs);
        let mut block_ids = HashSet::new();
        let mut tx_ids = HashSet::new();
        for (id, record) in &self.accepted {
            if record.timestamp < floor {
                continue;
            }
            block_ids.insert(*id);
            tx_ids.extend(record.tx_ids.iter().copied());
        }
        Ok(RecentWindow {
            block_ids,
            tx_ids,
            cost: self.params.min_block_cost,
            difficulty: self.params.min_difficulty,
        })
    }

    fn state(&self) -> &SledStore {
        &self.store
    }

    fn on_verified(&mut self, id: BlockId, block: &Block<PutTx>) -> Result<(), ChainError> {
        println!("verified  | id={id} | height={}", block.height);
        Ok(())
    }

    fn on_accepted(&mut self, id: BlockId, block: &Block<PutTx>) -> Result<(), ChainError> {
        let tx_ids = block
            .txs
            .iter()
            .map(|tx| tx.id())
            .collect::<Result<Vec<_>, _>>()?;
        self.accepted.push((
            id,
            AcceptedRecord {
                timestamp: block.timestamp,
                tx_ids,
            },
        ));
        self.blocks.insert(id, block.clone());
        println!("accepted  | id={id} | height={}", block.height);
        Ok(())
    }

    fn on_rejected(&mut self, id: BlockId, block: &Block<PutTx>) -> Result<(), ChainError> {
        println!("rejected  | id={id} | height={}", block.height);
        Ok(())
    }
}
