//! Wire protocol errors.

use lattice_blocks::BlockError;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The packet's magic does not match this network.
    #[error("bad magic")]
    BadMagic,
    /// Unknown message type byte.
    #[error("bad packet type: {0}")]
    BadType(u8),
    /// Payload length does not match the message type.
    #[error("bad packet length")]
    BadLength,
    #[error(transparent)]
    Block(#[from] BlockError),
}
