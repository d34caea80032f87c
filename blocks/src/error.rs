//! Block codec errors.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("bad block type: {0}")]
    BadBlockType(u8),
    #[error("block type is not_a_block")]
    NotABlock,
    #[error("bad block length: expected {expected}, got {got}")]
    BadLength { expected: usize, got: usize },
}
