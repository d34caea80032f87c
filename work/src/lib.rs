//! Proof-of-work validation for block roots.
//!
//! A 64-bit nonce is valid for a root hash when the little-endian value of
//! an 8-byte Blake2b digest of `LE64(nonce) ‖ root` meets the network
//! threshold. Producing work is not part of the node's duties; the
//! brute-force generator exists for wallets and tests.

pub mod generator;
pub mod thresholds;
pub mod validator;

pub use generator::generate_work;
pub use thresholds::{threshold, LIVE_THRESHOLD, TEST_THRESHOLD};
pub use validator::validate_work;
