//! Ed25519 key pairs for signing blocks.

use ed25519_dalek::{Signer, SigningKey};
use lattice_types::{Address, Signature};
use rand::rngs::OsRng;

/// An Ed25519 signing key together with its derived account address.
pub struct KeyPair {
    signing: SigningKey,
}

impl KeyPair {
    /// Generate a new key pair from the system's secure random source.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Derive a key pair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(seed),
        }
    }

    /// The account address (public key) of this key pair.
    pub fn address(&self) -> Address {
        Address::new(self.signing.verifying_key().to_bytes())
    }

    /// Sign a message (conventionally a 32-byte block hash).
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::new(self.signing.sign(message).to_bytes())
    }
}
