//! Frontier records: the head block of an account's chain.

use lattice_types::{Address, Hash};

use crate::error::BlockError;

/// An (address, head hash) pair as exchanged during frontier
/// synchronization and stored in the frontier index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frontier {
    pub address: Address,
    pub hash: Hash,
}

impl Frontier {
    /// Encoded size on the wire.
    pub const SIZE: usize = Address::SIZE + Hash::SIZE;

    /// A zero hash marks the end of a frontier stream.
    pub fn is_zero(&self) -> bool {
        self.hash.is_zero()
    }

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[..32].copy_from_slice(self.address.as_bytes());
        buf[32..].copy_from_slice(self.hash.as_bytes());
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self, BlockError> {
        if data.len() != Self::SIZE {
            return Err(BlockError::BadLength {
                expected: Self::SIZE,
                got: data.len(),
            });
        }
        let mut address = [0u8; 32];
        address.copy_from_slice(&data[..32]);
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&data[32..]);
        Ok(Self {
            address: Address::new(address),
            hash: Hash::new(hash),
        })
    }
}
