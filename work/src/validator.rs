//! PoW validation.

use blake2::digest::consts::U8;
use blake2::{Blake2b, Digest};
use lattice_types::Hash;

type Blake2b64 = Blake2b<U8>;

/// Validate that a work nonce meets the threshold for the given root.
///
/// The digest input is the little-endian nonce followed by the 32-byte
/// root; the digest itself is an 8-byte Blake2b output read little-endian.
pub fn validate_work(root: &Hash, work: u64, threshold: u64) -> bool {
    let mut hasher = Blake2b64::new();
    hasher.update(work.to_le_bytes());
    hasher.update(root.as_bytes());

    let digest = hasher.finalize();
    let mut value = [0u8; 8];
    value.copy_from_slice(&digest);
    u64::from_le_bytes(value) >= threshold
}
