//! Protocol-wide constants for Strata v0.

/// Length in bytes of a 32-byte identity hash.
pub const HASH32_LEN: usize = 32;

/// Domain separator used when hashing blocks into their identity.
///
/// Prevents cross-domain hash collisions.
pub const DS_BLOCK: &[u8] = b"STRATA::BLOCK::V0";

/// Domain separator used when hashing transactions into their identity.
///
/// Prevents cross-domain hash collisions.
pub const DS_TX: &[u8] = b"STRATA::TX::V0";
