//! Binary marshalling of blocks.
//!
//! Each variant encodes as the fixed concatenation of its fields followed
//! by the common `signature ‖ work` trailer. Work is little-endian in the
//! legacy encodings and big-endian in the state encoding.

use lattice_types::{Address, Balance, Hash, Signature};

use crate::block::{
    Block, BlockCommon, ChangeBlock, OpenBlock, ReceiveBlock, SendBlock, StateBlock,
};
use crate::error::BlockError;

/// Tag byte for a value that is not a valid block.
pub const TAG_INVALID: u8 = 0;
/// Tag byte terminating a block stream.
pub const TAG_NOT_A_BLOCK: u8 = 1;

const COMMON_SIZE: usize = Signature::SIZE + 8;

/// The block variant tag as it appears on the wire and in the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlockKind {
    Send = 2,
    Receive = 3,
    Open = 4,
    Change = 5,
    State = 6,
}

impl BlockKind {
    /// Interpret a tag byte. `TAG_NOT_A_BLOCK` is the stream terminator
    /// and reported separately from garbage tags.
    pub fn from_tag(tag: u8) -> Result<Self, BlockError> {
        match tag {
            2 => Ok(Self::Send),
            3 => Ok(Self::Receive),
            4 => Ok(Self::Open),
            5 => Ok(Self::Change),
            6 => Ok(Self::State),
            TAG_NOT_A_BLOCK => Err(BlockError::NotABlock),
            other => Err(BlockError::BadBlockType(other)),
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Receive => "receive",
            Self::Open => "open",
            Self::Change => "change",
            Self::State => "state",
        }
    }

    /// Encoded payload size for this variant, common trailer included.
    pub fn size(self) -> usize {
        match self {
            Self::Open => Hash::SIZE + Address::SIZE * 2 + COMMON_SIZE,
            Self::Send => Hash::SIZE + Address::SIZE + Balance::SIZE + COMMON_SIZE,
            Self::Receive => Hash::SIZE * 2 + COMMON_SIZE,
            Self::Change => Hash::SIZE + Address::SIZE + COMMON_SIZE,
            Self::State => Hash::SIZE * 2 + Address::SIZE * 2 + Balance::SIZE + COMMON_SIZE,
        }
    }
}

impl Block {
    /// Marshal this block to its canonical byte encoding (without tag).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.kind().size());
        match self {
            Block::Open(b) => {
                buf.extend_from_slice(b.source.as_bytes());
                buf.extend_from_slice(b.representative.as_bytes());
                buf.extend_from_slice(b.address.as_bytes());
                encode_common(&b.common, false, &mut buf);
            }
            Block::Send(b) => {
                buf.extend_from_slice(b.previous.as_bytes());
                buf.extend_from_slice(b.destination.as_bytes());
                buf.extend_from_slice(&b.balance.to_be_bytes());
                encode_common(&b.common, false, &mut buf);
            }
            Block::Receive(b) => {
                buf.extend_from_slice(b.previous.as_bytes());
                buf.extend_from_slice(b.source.as_bytes());
                encode_common(&b.common, false, &mut buf);
            }
            Block::Change(b) => {
                buf.extend_from_slice(b.previous.as_bytes());
                buf.extend_from_slice(b.representative.as_bytes());
                encode_common(&b.common, false, &mut buf);
            }
            Block::State(b) => {
                buf.extend_from_slice(b.address.as_bytes());
                buf.extend_from_slice(b.previous.as_bytes());
                buf.extend_from_slice(b.representative.as_bytes());
                buf.extend_from_slice(&b.balance.to_be_bytes());
                buf.extend_from_slice(b.link.as_bytes());
                encode_common(&b.common, true, &mut buf);
            }
        }
        buf
    }

    /// Unmarshal a block of the given kind. The input must be exactly
    /// `kind.size()` bytes; trailing bytes are a `BadLength` error.
    pub fn decode(kind: BlockKind, data: &[u8]) -> Result<Block, BlockError> {
        if data.len() != kind.size() {
            return Err(BlockError::BadLength {
                expected: kind.size(),
                got: data.len(),
            });
        }

        let mut r = Reader { data, pos: 0 };
        let block = match kind {
            BlockKind::Open => Block::Open(OpenBlock {
                source: r.hash(),
                representative: r.address(),
                address: r.address(),
                common: r.common(false),
            }),
            BlockKind::Send => Block::Send(SendBlock {
                previous: r.hash(),
                destination: r.address(),
                balance: r.balance(),
                common: r.common(false),
            }),
            BlockKind::Receive => Block::Receive(ReceiveBlock {
                previous: r.hash(),
                source: r.hash(),
                common: r.common(false),
            }),
            BlockKind::Change => Block::Change(ChangeBlock {
                previous: r.hash(),
                representative: r.address(),
                common: r.common(false),
            }),
            BlockKind::State => Block::State(StateBlock {
                address: r.address(),
                previous: r.hash(),
                representative: r.address(),
                balance: r.balance(),
                link: r.hash(),
                common: r.common(true),
            }),
        };
        Ok(block)
    }

    /// Unmarshal from a tag byte followed by the payload.
    pub fn decode_tagged(data: &[u8]) -> Result<Block, BlockError> {
        let (&tag, payload) = data.split_first().ok_or(BlockError::BadLength {
            expected: 1,
            got: 0,
        })?;
        Self::decode(BlockKind::from_tag(tag)?, payload)
    }

    /// Marshal to a tag byte followed by the payload.
    pub fn encode_tagged(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + self.kind().size());
        buf.push(self.kind().tag());
        buf.extend_from_slice(&self.encode());
        buf
    }
}

fn encode_common(common: &BlockCommon, big_endian_work: bool, buf: &mut Vec<u8>) {
    buf.extend_from_slice(common.signature.as_bytes());
    if big_endian_work {
        buf.extend_from_slice(&common.work.to_be_bytes());
    } else {
        buf.extend_from_slice(&common.work.to_le_bytes());
    }
}

/// Cursor over an exactly-sized payload. Lengths are checked up front in
/// `decode`, so the field readers index unconditionally.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn hash(&mut self) -> Hash {
        Hash::new(self.take::<32>())
    }

    fn address(&mut self) -> Address {
        Address::new(self.take::<32>())
    }

    fn balance(&mut self) -> Balance {
        Balance::from_be_bytes(self.take::<16>())
    }

    fn common(&mut self, big_endian_work: bool) -> BlockCommon {
        let signature = Signature::new(self.take::<64>());
        let work_bytes = self.take::<8>();
        let work = if big_endian_work {
            u64::from_be_bytes(work_bytes)
        } else {
            u64::from_le_bytes(work_bytes)
        };
        BlockCommon { signature, work }
    }
}
