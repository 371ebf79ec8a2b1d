// Consensus-critical. Changes require spec update + tests.
//! Canonical serialization and identity hashing.
//!
//! Rule: all consensus-critical objects are encoded with Borsh. The field
//! order of an encoded type is fixed forever; identities are hashes of
//! these exact bytes. Do not use JSON or non-canonical formats for
//! hashing or consensus.

use crate::constants::HASH32_LEN;
use crate::types::{CoreError, Hash32};
use borsh::to_vec;

/// Encode a value with canonical Borsh encoding.
pub fn to_bytes<T: borsh::BorshSerialize>(v: &T) -> Result<Vec<u8>, CoreError> {
    to_vec(v).map_err(|_| CoreError::Codec("borsh serialization failed"))
}

/// Hash bytes with blake3 under a domain separator and return 32 bytes.
pub fn hash32(domain_sep: &[u8], bytes: &[u8]) -> Hash32 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain_sep);
    hasher.update(bytes);
    let out = hasher.finalize();
    let mut arr = [0u8; HASH32_LEN];
    arr.copy_from_slice(out.as_bytes());
    Hash32(arr)
}

/// Canonical content identity: `BLAKE3(domain_sep || borsh(value))`.
///
/// Identical values always yield identical identities; any declared-field
/// change yields a different identity.
pub fn content_id<T: borsh::BorshSerialize>(
    domain_sep: &[u8],
    value: &T,
) -> Result<Hash32, CoreError> {
    let bytes = to_bytes(value)?;
    Ok(hash32(domain_sep, &bytes))
}
