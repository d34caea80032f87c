//! Ledger error taxonomy.

use lattice_blocks::BlockError;
use lattice_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The block's work nonce does not meet the network threshold.
    #[error("bad work")]
    BadWork,

    /// The block's signature does not verify against its account.
    #[error("bad block signature")]
    BadSignature,

    /// The genesis block in the store does not match the configured one.
    #[error("genesis block in store doesn't match the given block")]
    BadGenesis,

    /// The block is already committed. Idempotent for batch ingestion.
    #[error("block already exists")]
    BlockExists,

    /// The previous block does not exist yet.
    #[error("previous block does not exist")]
    MissingPrevious,

    /// The source block does not exist, or no matching pending entry.
    #[error("source block does not exist")]
    MissingSource,

    /// The block's root is not a current frontier — a competing chain
    /// already claimed it.
    #[error("a fork was detected")]
    Fork,

    /// The block was quarantined until its parent arrives. Not fatal.
    #[error("block was added to the unchecked list")]
    Unchecked,

    /// A send claimed a balance above the account's current balance.
    #[error("negative spend")]
    NegativeSpend,

    /// Stored account head disagrees with the frontier index.
    #[error("unexpected head block for account")]
    HeadMismatch,

    /// The account's rep block is of a variant that names no
    /// representative.
    #[error("bad representative block type")]
    BadRepresentativeBlockType,

    /// A state block's claimed balance disagrees with the credited or
    /// debited amount.
    #[error("state block balance does not match the linked amount")]
    BalanceMismatch,

    #[error(transparent)]
    Block(#[from] BlockError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
