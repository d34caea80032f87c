//! Wire protocol framing: the 8-byte packet header and the typed payloads
//! exchanged over UDP and the bootstrap TCP streams.

pub mod error;
pub mod header;
pub mod packet;

pub use error::ProtocolError;
pub use header::{Header, HEADER_SIZE, VERSION_MAX, VERSION_MIN, VERSION_USING};
pub use packet::{BulkPullMode, MessageType, Packet, Vote};
