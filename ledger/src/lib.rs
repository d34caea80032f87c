//! The transactional ledger: validates blocks, maintains per-account
//! chains, balances, representative weights, pending transfers, frontiers,
//! and the unchecked quarantine for out-of-order arrivals.

pub mod error;
pub mod genesis;
pub mod ledger;

pub use error::LedgerError;
pub use genesis::Genesis;
pub use ledger::Ledger;
