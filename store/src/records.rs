//! Typed records persisted by the ledger and their binary encodings.

use lattice_types::{Address, Balance, Hash};

use crate::error::StoreError;
use crate::prefix;

/// Per-account metadata: chain head, the block naming the current
/// representative, the open block, and the confirmed balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressInfo {
    pub head_block: Hash,
    pub rep_block: Hash,
    pub open_block: Hash,
    pub balance: Balance,
}

impl AddressInfo {
    pub const SIZE: usize = Hash::SIZE * 3 + Balance::SIZE;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[..32].copy_from_slice(self.head_block.as_bytes());
        buf[32..64].copy_from_slice(self.rep_block.as_bytes());
        buf[64..96].copy_from_slice(self.open_block.as_bytes());
        buf[96..].copy_from_slice(&self.balance.to_be_bytes());
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self, StoreError> {
        if data.len() != Self::SIZE {
            return Err(StoreError::Corrupt(format!(
                "address info is {} bytes, expected {}",
                data.len(),
                Self::SIZE
            )));
        }
        Ok(Self {
            head_block: Hash::new(slice32(&data[..32])),
            rep_block: Hash::new(slice32(&data[32..64])),
            open_block: Hash::new(slice32(&data[64..96])),
            balance: Balance::from_be_bytes(slice16(&data[96..])),
        })
    }
}

/// An incoming transfer that has been sent but not yet received.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pending {
    /// The account that sent the funds.
    pub source: Address,
    /// The amount deducted from the source chain.
    pub amount: Balance,
}

impl Pending {
    pub const SIZE: usize = Address::SIZE + Balance::SIZE;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[..32].copy_from_slice(self.source.as_bytes());
        buf[32..].copy_from_slice(&self.amount.to_be_bytes());
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self, StoreError> {
        if data.len() != Self::SIZE {
            return Err(StoreError::Corrupt(format!(
                "pending entry is {} bytes, expected {}",
                data.len(),
                Self::SIZE
            )));
        }
        Ok(Self {
            source: Address::new(slice32(&data[..32])),
            amount: Balance::from_be_bytes(slice16(&data[32..])),
        })
    }
}

/// Which missing parent a quarantined block is waiting on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UncheckedKind {
    /// The previous block in the same account chain.
    Previous,
    /// The source send block on another chain.
    Source,
}

impl UncheckedKind {
    pub(crate) fn prefix(self) -> u8 {
        match self {
            Self::Previous => prefix::UNCHECKED_PREVIOUS,
            Self::Source => prefix::UNCHECKED_SOURCE,
        }
    }
}

fn slice32(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(data);
    out
}

fn slice16(data: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out.copy_from_slice(data);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_info_round_trip() {
        let info = AddressInfo {
            head_block: Hash::new([1u8; 32]),
            rep_block: Hash::new([2u8; 32]),
            open_block: Hash::new([3u8; 32]),
            balance: Balance::new(0xfeed_beef),
        };
        assert_eq!(AddressInfo::decode(&info.encode()).unwrap(), info);
    }

    #[test]
    fn pending_round_trip() {
        let pending = Pending {
            source: Address::new([9u8; 32]),
            amount: Balance::MAX,
        };
        assert_eq!(Pending::decode(&pending.encode()).unwrap(), pending);
    }

    #[test]
    fn short_values_are_corrupt() {
        assert!(matches!(
            AddressInfo::decode(&[0u8; 10]),
            Err(StoreError::Corrupt(_))
        ));
        assert!(matches!(
            Pending::decode(&[0u8; 10]),
            Err(StoreError::Corrupt(_))
        ));
    }
}
