//! Cryptographic primitives: Blake2b hashing, Ed25519 signatures, key pairs.

pub mod hash;
pub mod keys;
pub mod sign;

pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::KeyPair;
pub use sign::verify_signature;
