//! Block variant definitions, content hashing, roots, and work validity.

use lattice_crypto::blake2b_256_multi;
use lattice_types::{Address, Balance, Hash, Signature};
use lattice_work::validate_work;

use crate::codec::BlockKind;

/// The preamble hashed ahead of a state block's fields; the final byte is
/// the state block tag.
pub(crate) const STATE_PREAMBLE: [u8; 32] = {
    let mut p = [0u8; 32];
    p[31] = BlockKind::State as u8;
    p
};

/// Fields every block variant carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockCommon {
    pub signature: Signature,
    pub work: u64,
}

/// Opens an account chain by receiving a send block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenBlock {
    pub source: Hash,
    pub representative: Address,
    pub address: Address,
    pub common: BlockCommon,
}

/// Moves funds to a destination account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendBlock {
    pub previous: Hash,
    pub destination: Address,
    pub balance: Balance,
    pub common: BlockCommon,
}

/// Claims a pending send on the receiving chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiveBlock {
    pub previous: Hash,
    pub source: Hash,
    pub common: BlockCommon,
}

/// Re-points an account's representative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChangeBlock {
    pub previous: Hash,
    pub representative: Address,
    pub common: BlockCommon,
}

/// The unified format carrying the full account state after the operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateBlock {
    pub address: Address,
    pub previous: Hash,
    pub representative: Address,
    pub balance: Balance,
    /// Context-dependent: source hash for receives, destination key for
    /// sends, zero for representative changes.
    pub link: Hash,
    pub common: BlockCommon,
}

/// A block of any variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Block {
    Open(OpenBlock),
    Send(SendBlock),
    Receive(ReceiveBlock),
    Change(ChangeBlock),
    State(StateBlock),
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Open(_) => BlockKind::Open,
            Block::Send(_) => BlockKind::Send,
            Block::Receive(_) => BlockKind::Receive,
            Block::Change(_) => BlockKind::Change,
            Block::State(_) => BlockKind::State,
        }
    }

    /// The content hash: Blake2b-256 over the canonical field order.
    pub fn hash(&self) -> Hash {
        let digest = match self {
            Block::Open(b) => blake2b_256_multi(&[
                b.source.as_bytes(),
                b.representative.as_bytes(),
                b.address.as_bytes(),
            ]),
            Block::Send(b) => blake2b_256_multi(&[
                b.previous.as_bytes(),
                b.destination.as_bytes(),
                &b.balance.to_be_bytes(),
            ]),
            Block::Receive(b) => {
                blake2b_256_multi(&[b.previous.as_bytes(), b.source.as_bytes()])
            }
            Block::Change(b) => {
                blake2b_256_multi(&[b.previous.as_bytes(), b.representative.as_bytes()])
            }
            Block::State(b) => blake2b_256_multi(&[
                &STATE_PREAMBLE,
                b.address.as_bytes(),
                b.previous.as_bytes(),
                b.representative.as_bytes(),
                &b.balance.to_be_bytes(),
                b.link.as_bytes(),
            ]),
        };
        Hash::new(digest)
    }

    /// The value work is validated against, and the key under which forks
    /// contend: the previous hash for chained blocks, the source for opens.
    pub fn root(&self) -> Hash {
        match self {
            Block::Open(b) => b.source,
            Block::Send(b) => b.previous,
            Block::Receive(b) => b.previous,
            Block::Change(b) => b.previous,
            Block::State(b) => {
                if !b.previous.is_zero() {
                    b.previous
                } else {
                    b.link
                }
            }
        }
    }

    pub fn common(&self) -> &BlockCommon {
        match self {
            Block::Open(b) => &b.common,
            Block::Send(b) => &b.common,
            Block::Receive(b) => &b.common,
            Block::Change(b) => &b.common,
            Block::State(b) => &b.common,
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.common().signature
    }

    pub fn work(&self) -> u64 {
        self.common().work
    }

    /// Whether this block's work satisfies the threshold against its root.
    pub fn valid(&self, threshold: u64) -> bool {
        validate_work(&self.root(), self.work(), threshold)
    }
}
