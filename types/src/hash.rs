//! Block hash type for the block-lattice.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HexError;

/// A 32-byte Blake2b-256 content address — identifies a block in an
/// account's chain.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash([u8; 32]);

impl Hash {
    pub const SIZE: usize = 32;
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Parse a hash from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, HexError> {
        crate::hex::decode_fixed::<32>(s).map(Self)
    }
}

impl FromStr for Hash {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash(")?;
        for b in &self.0[..4] {
            write!(f, "{:02x}", b)?;
        }
        write!(f, "\u{2026})")
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_zero() {
        assert!(Hash::ZERO.is_zero());
        assert!(!Hash::new([1u8; 32]).is_zero());
    }

    #[test]
    fn hex_round_trip() {
        let s = "e89208dd038fbb269987689621d52292ae9c35941a7484756ecced92a65093ba";
        let h = Hash::from_hex(s).unwrap();
        assert_eq!(h.to_string(), s);
    }

    #[test]
    fn hex_accepts_uppercase() {
        let h = Hash::from_hex("6529C605D4016F486B60861C49DDAD128D77642E748B3FE13BE411F00BA0918B")
            .unwrap();
        assert_eq!(h.as_bytes()[0], 0x65);
        assert_eq!(h.as_bytes()[31], 0x8b);
    }

    #[test]
    fn bad_hex_rejected() {
        assert!(Hash::from_hex("abcd").is_err());
        assert!(Hash::from_hex(&"zz".repeat(32)).is_err());
    }
}
