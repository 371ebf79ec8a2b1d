// Consensus-critical. Changes require spec update + tests.
//! Genesis parameters and height-0 validation.

use borsh::{BorshDeserialize, BorshSerialize};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::error::ChainError;
use crate::tx::BlockTx;

/// Immutable protocol configuration embedded in the genesis block.
///
/// These values never change after genesis acceptance; every later
/// block's expected difficulty and cost are derived from them plus recent
/// history (computed by the host, outside this crate).
#[derive(Clone, PartialEq, Eq, Debug, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Genesis {
    /// Base cost, in units, charged for any transaction.
    pub base_tx_units: u64,

    /// Size, in bytes, of one stored-value unit.
    pub value_unit_size: u64,
    /// Maximum size, in bytes, of a stored value.
    pub max_value_size: u64,

    /// Fee multiplier applied to every claim.
    pub claim_fee_multiplier: u64,
    /// Lifetime, in seconds, of a claim before it must be renewed.
    pub claim_expiry_secs: u64,
    /// Fee multiplier for tier-3 (longest) claims.
    pub claim_tier3_multiplier: u64,
    /// Maximum length, in bytes, of a tier-2 claim.
    pub claim_tier2_size: u64,
    /// Fee multiplier for tier-2 claims.
    pub claim_tier2_multiplier: u64,
    /// Maximum length, in bytes, of a tier-1 (shortest) claim.
    pub claim_tier1_size: u64,
    /// Fee multiplier for tier-1 claims.
    pub claim_tier1_multiplier: u64,

    /// Divisor discounting the fee of a claim renewal.
    pub renewal_discount: u64,

    /// Historical span, in seconds, over which recent block and
    /// transaction identities are tracked.
    pub lookback_window_secs: u64,
    /// Target block interval, in seconds.
    pub block_target_secs: u64,
    /// Target units of work per block.
    pub target_units: u64,
    /// Minimum difficulty any block may declare.
    pub min_difficulty: u64,
    /// Minimum cost any block may declare.
    pub min_block_cost: u64,
}

impl Default for Genesis {
    fn default() -> Self {
        Self {
            base_tx_units: 10,

            value_unit_size: 256,
            max_value_size: 128 * 1024,

            claim_fee_multiplier: 5,
            claim_expiry_secs: 60 * 60 * 24 * 30,
            claim_tier3_multiplier: 1,
            claim_tier2_size: 36,
            claim_tier2_multiplier: 5,
            claim_tier1_size: 12,
            claim_tier1_multiplier: 25,

            renewal_discount: 5,

            lookback_window_secs: 60,
            block_target_secs: 1,
            target_units: 10 * 512 * 60,
            min_difficulty: 100,
            min_block_cost: 1,
        }
    }
}

/// Check that a candidate height-0 block satisfies the bootstrapping
/// invariants, returning the first violation.
///
/// Pure over its inputs; `now` is the injected wall-clock reading.
pub fn verify_genesis<T: BlockTx>(block: &Block<T>, now: u64) -> Result<(), ChainError> {
    if !block.parent.is_zero() {
        return Err(ChainError::InvalidGenesisParent);
    }
    if block.height != 0 {
        return Err(ChainError::InvalidGenesisHeight);
    }
    if block.timestamp == 0 || block.timestamp > now {
        return Err(ChainError::InvalidGenesisTimestamp);
    }
    let params = block.genesis.as_ref().ok_or(ChainError::MissingGenesis)?;
    if block.difficulty != params.min_difficulty {
        return Err(ChainError::InvalidGenesisDifficulty);
    }
    if block.cost != params.min_block_cost {
        return Err(ChainError::InvalidGenesisCost);
    }
    if !block.txs.is_empty() {
        return Err(ChainError::InvalidGenesisTxs);
    }
    if block.beneficiary.is_some() {
        return Err(ChainError::InvalidGenesisBeneficiary);
    }
    Ok(())
}
