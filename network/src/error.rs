//! Synchronization errors.

use lattice_blocks::BlockError;
use lattice_protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// A read or write step exceeded its deadline.
    #[error("network timeout")]
    Timeout,
    /// The peer closed the connection mid-stream.
    #[error("connection closed")]
    ConnectionClosed,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Block(#[from] BlockError),
}
