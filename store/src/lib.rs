//! LMDB-backed ordered key-value store for the ledger.
//!
//! Every logical collection lives under a distinct 1-byte key prefix
//! inside a single database, so range scans by prefix enumerate one
//! collection. Values are the canonical binary encodings; block values
//! carry their variant tag inline ahead of the payload.

pub mod error;
pub mod records;
pub mod store;
pub mod txn;

pub use error::StoreError;
pub use records::{AddressInfo, Pending, UncheckedKind};
pub use store::Store;
pub use txn::{StoreReader, StoreWriter};

/// Key prefixes, one per collection.
pub(crate) mod prefix {
    pub const BLOCK: u8 = 0;
    pub const UNCHECKED_PREVIOUS: u8 = 1;
    pub const UNCHECKED_SOURCE: u8 = 2;
    pub const ADDRESS: u8 = 3;
    pub const FRONTIER: u8 = 4;
    pub const PENDING: u8 = 5;
    pub const REPRESENTATION: u8 = 6;
}
