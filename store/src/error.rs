//! Store error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A point read targeted an absent key.
    #[error("key not found in the store")]
    KeyNotFound,

    /// An insert targeted a key that already holds a value; the store
    /// never overwrites implicitly.
    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    /// A stored value failed to decode.
    #[error("corrupt store value: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Env(#[from] heed::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
