//! Block variants of the block-lattice, their binary codec, and content
//! hashing.
//!
//! Five variants exist: open, send, receive, change, and the unified state
//! format. All carry a common `(signature, work)` trailer. Hashes are pure
//! functions of the canonical field order, never of the encoded bytes.

pub mod block;
pub mod codec;
pub mod error;
pub mod frontier;

pub use block::{
    Block, BlockCommon, ChangeBlock, OpenBlock, ReceiveBlock, SendBlock, StateBlock,
};
pub use codec::{BlockKind, TAG_INVALID, TAG_NOT_A_BLOCK};
pub use error::BlockError;
pub use frontier::Frontier;
