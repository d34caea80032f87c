//! Node errors.

use lattice_ledger::LedgerError;
use lattice_network::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("bad peer address: {0}")]
    BadPeerAddress(String),

    #[error("tried to use ipv6 while it's disabled")]
    Ipv6Disabled,

    #[error("peer list is full")]
    PeerListFull,

    #[error("no peers available")]
    NoPeers,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
