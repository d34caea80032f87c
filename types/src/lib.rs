//! Fundamental types for the lattice protocol.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: block hashes, addresses, balances, signatures, network
//! identifiers, and the hex helpers used to parse protocol constants.

pub mod address;
pub mod balance;
pub mod error;
pub mod hash;
pub mod hex;
pub mod network;
pub mod signature;

pub use address::Address;
pub use balance::Balance;
pub use error::{AddressError, BalanceError};
pub use hash::Hash;
pub use network::Network;
pub use signature::Signature;
