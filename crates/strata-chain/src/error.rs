//! Chain validation errors.
//!
//! Two classes share this enum. Structural and economic invalidity
//! (timestamps, cost, difficulty, surplus, genesis shape) are
//! deterministic, non-retryable judgments: the block must never be
//! accepted. Infrastructure failures (missing blocks, unresolved ancestor
//! state, storage) are surfaced unchanged and may be retried by the host.

use strata_core::{BlockId, CoreError};
use strata_state::StoreError;
use thiserror::Error;

/// Errors returned by block validation, acceptance, and genesis checks.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The block carries no transactions.
    #[error("no transactions")]
    NoTransactions,

    /// Block timestamp is before its parent's timestamp.
    #[error("block timestamp too early")]
    TimestampTooEarly,

    /// Block timestamp is at or beyond the future clock-skew bound.
    #[error("block timestamp too late")]
    TimestampTooLate,

    /// Block height is not parent height plus one.
    #[error("invalid block height")]
    InvalidHeight,

    /// Declared block cost does not match the expected cost.
    #[error("invalid block cost")]
    InvalidCost,

    /// Declared difficulty does not match the expected difficulty.
    #[error("invalid difficulty")]
    InvalidDifficulty,

    /// Total excess transaction work does not cover the block cost.
    #[error("insufficient surplus difficulty")]
    InsufficientSurplus,

    /// A transaction failed verification.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(&'static str),

    /// Genesis block parent identity is not the zero identity.
    #[error("invalid genesis parent")]
    InvalidGenesisParent,

    /// Genesis block height is not zero.
    #[error("invalid genesis height")]
    InvalidGenesisHeight,

    /// Genesis block timestamp is zero or in the future.
    #[error("invalid genesis timestamp")]
    InvalidGenesisTimestamp,

    /// Genesis block carries no embedded parameters.
    #[error("missing genesis parameters")]
    MissingGenesis,

    /// Genesis difficulty does not equal the parameters' minimum.
    #[error("invalid genesis difficulty")]
    InvalidGenesisDifficulty,

    /// Genesis cost does not equal the parameters' minimum block cost.
    #[error("invalid genesis cost")]
    InvalidGenesisCost,

    /// Genesis block carries transactions.
    #[error("invalid genesis transactions")]
    InvalidGenesisTxs,

    /// Genesis block carries a beneficiary.
    #[error("invalid genesis beneficiary")]
    InvalidGenesisBeneficiary,

    /// No block with this identity is known to the chain or the host.
    #[error("block not found: {0}")]
    UnknownBlock(BlockId),

    /// An ancestor's state is not resolvable (never verified, or already
    /// discarded).
    #[error("ancestor state unresolved")]
    AncestorUnresolved,

    /// The operation requires a verified block.
    #[error("block has not been verified")]
    NotVerified,

    /// The block already reached a conflicting terminal decision.
    #[error("block already decided")]
    AlreadyDecided,

    /// Committed storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Canonical encoding or identity hashing failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}
