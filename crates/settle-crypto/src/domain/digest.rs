//! Legacy Keccak-256 digest.

use sha3::{Digest as _, Keccak256};

/// Length of every digest in bytes.
pub const DIGEST_LENGTH: usize = 32;

/// A 32-byte Keccak-256 digest.
pub type Digest = [u8; DIGEST_LENGTH];

/// Keccak256 hash function.
///
/// This is the pre-standardization Keccak padding used by Ethereum, which the
/// counterparty implementation also uses. Swapping in `Sha3_256` breaks every
/// signature on the wire.
pub fn keccak256(data: &[u8]) -> Digest {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; DIGEST_LENGTH];
    hash.copy_from_slice(&result);
    hash
}
