// Consensus-critical. Changes require spec update + tests.
//! Canonical identity types for Strata v0.
//!
//! Every consensus-visible object is addressed by a 32-byte content hash.
//! These types must remain backward-compatible once released.

use crate::constants::HASH32_LEN;
use borsh::{BorshDeserialize, BorshSerialize};
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors related to parsing, validation, or construction of core types.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Hex string or byte slice had an unexpected length.
    #[error("invalid length: expected {expected} bytes, got {got} bytes")]
    InvalidLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes provided.
        got: usize,
    },

    /// Hex decoding failed.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Canonical encoding or decoding failed.
    #[error("codec failure: {0}")]
    Codec(&'static str),

    /// A value violated protocol constraints.
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
}

/// Fixed-size 32-byte content hash used as an identity throughout the protocol.
#[derive(Clone, Copy, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hash32(pub [u8; HASH32_LEN]);

impl Hash32 {
    /// Returns the all-zero hash.
    ///
    /// The zero hash is reserved: it is the parent identity of the genesis
    /// block and never the identity of a real object.
    pub const fn zero() -> Self {
        Self([0u8; HASH32_LEN])
    }

    /// Returns `true` if every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH32_LEN]
    }

    /// Returns the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; HASH32_LEN] {
        &self.0
    }

    /// Constructs a hash from a byte slice of exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        if bytes.len() != HASH32_LEN {
            return Err(CoreError::InvalidLength {
                expected: HASH32_LEN,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; HASH32_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", hex::encode(self.0))
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<[u8; HASH32_LEN]> for Hash32 {
    fn from(value: [u8; HASH32_LEN]) -> Self {
        Self(value)
    }
}

impl From<Hash32> for [u8; HASH32_LEN] {
    fn from(value: Hash32) -> Self {
        value.0
    }
}

impl FromStr for Hash32 {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

/// Block identity type.
pub type BlockId = Hash32;

/// Transaction identity type.
pub type TxId = Hash32;
