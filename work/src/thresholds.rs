//! Per-network work thresholds.

use lattice_types::Network;

/// Threshold for the live and beta networks.
pub const LIVE_THRESHOLD: u64 = 0xffff_ffc0_0000_0000;

/// Relaxed threshold for the test network so fixtures can generate work in
/// a few hundred hash attempts.
pub const TEST_THRESHOLD: u64 = 0xff00_0000_0000_0000;

/// The work threshold a network enforces.
pub fn threshold(network: Network) -> u64 {
    match network {
        Network::Live | Network::Beta => LIVE_THRESHOLD,
        Network::Test => TEST_THRESHOLD,
    }
}
