//! Brute-force work generation.
//!
//! The node itself only validates work; generation exists for tests and
//! embedding wallets, and is only practical against relaxed thresholds.

use lattice_types::Hash;

use crate::validator::validate_work;

/// Find the first nonce that satisfies the threshold for the given root.
pub fn generate_work(root: &Hash, threshold: u64) -> u64 {
    let mut work = 0u64;
    loop {
        if validate_work(root, work, threshold) {
            return work;
        }
        work = work.wrapping_add(1);
    }
}
