// Consensus-critical. Changes require spec update + tests.
//! The block entity.
//!
//! A block's identity is the BLAKE3 hash of its canonical Borsh encoding:
//! identical declared fields always yield the identical identity, and the
//! field order below is fixed forever.

use borsh::{BorshDeserialize, BorshSerialize};
use strata_core::{content_id, to_bytes, BlockId, CoreError, Hash32, DS_BLOCK};

use crate::genesis::Genesis;
use crate::tx::BlockTx;

/// How far into the future a block timestamp may reach, in seconds.
pub const FUTURE_BLOCK_DRIFT_SECS: u64 = 10;

/// Validation status of a block.
///
/// Transitions are monotone: `Unverified -> Verified -> Accepted` or
/// `Rejected`, and the two decided states are terminal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    /// Not yet validated.
    Unverified,
    /// Validated, holding a live overlay, awaiting a decision.
    Verified,
    /// Committed into persistent state. Terminal.
    Accepted,
    /// Discarded. Terminal.
    Rejected,
}

impl Status {
    /// Whether this status is terminal.
    pub fn is_decided(self) -> bool {
        matches!(self, Status::Accepted | Status::Rejected)
    }
}

/// The declared, content-addressed fields of a block.
///
/// Only the genesis block embeds [`Genesis`] parameters; the beneficiary
/// field must be absent there.
#[derive(Clone, PartialEq, Eq, Debug, BorshSerialize, BorshDeserialize)]
pub struct Block<T> {
    /// Identity of the parent block; zero for genesis.
    pub parent: BlockId,
    /// Block timestamp, Unix seconds.
    pub timestamp: u64,
    /// Distance from genesis; parent height plus one.
    pub height: u64,
    /// Declared difficulty floor for this block's transactions.
    pub difficulty: u64,
    /// Declared cost of producing this block.
    pub cost: u64,
    /// Ordered transactions.
    pub txs: Vec<T>,
    /// Embedded protocol parameters; genesis only.
    pub genesis: Option<Genesis>,
    /// Reserved beneficiary field; must be absent on genesis.
    pub beneficiary: Option<Vec<u8>>,
}

impl<T: BlockTx> Block<T> {
    /// Build the height-0 block for the given parameters.
    pub fn genesis(params: Genesis, timestamp: u64) -> Self {
        Self {
            parent: Hash32::zero(),
            timestamp,
            height: 0,
            difficulty: params.min_difficulty,
            cost: params.min_block_cost,
            txs: Vec::new(),
            genesis: Some(params),
            beneficiary: None,
        }
    }

    /// Canonical content identity of this block.
    pub fn id(&self) -> Result<BlockId, CoreError> {
        content_id(DS_BLOCK, self)
    }

    /// Canonical wire encoding.
    pub fn encode(&self) -> Result<Vec<u8>, CoreError> {
        to_bytes(self)
    }

    /// Decode a block from its canonical wire encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        Self::try_from_slice(bytes).map_err(|_| CoreError::Codec("borsh deserialization failed"))
    }
}
