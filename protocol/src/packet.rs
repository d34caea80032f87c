//! Typed packets and their fixed-width payload encodings.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use lattice_blocks::{Block, BlockKind};
use lattice_types::{Address, Hash, Network, Signature};

use crate::error::ProtocolError;
use crate::header::{Header, HEADER_SIZE};

/// Message type bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Invalid = 0,
    NotAType = 1,
    KeepAlive = 2,
    Publish = 3,
    ConfirmReq = 4,
    ConfirmAck = 5,
    BulkPull = 6,
    BulkPush = 7,
    FrontierReq = 8,
    BulkPullBlocks = 9,
    NodeIdHandshake = 10,
}

impl MessageType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Invalid => "INVALID",
            Self::NotAType => "NOT_A_TYPE",
            Self::KeepAlive => "KEEP_ALIVE",
            Self::Publish => "PUBLISH",
            Self::ConfirmReq => "CONFIRM_REQ",
            Self::ConfirmAck => "CONFIRM_ACK",
            Self::BulkPull => "BULK_PULL",
            Self::BulkPush => "BULK_PUSH",
            Self::FrontierReq => "FRONTIER_REQ",
            Self::BulkPullBlocks => "BULK_PULL_BLOCKS",
            Self::NodeIdHandshake => "NODE_ID_HANDSHAKE",
        }
    }
}

/// Range mode for `BulkPullBlocks`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BulkPullMode {
    List = 0,
    Checksum = 1,
}

/// A vote on a block, gossiped via `ConfirmAck`. Parsed and re-encodable;
/// quorum is out of scope here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vote {
    pub address: Address,
    pub signature: Signature,
    pub sequence: u64,
    pub block: Block,
}

/// A parsed packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Packet {
    /// Peer gossip. The wire form is always padded to 8 peer slots with
    /// the unspecified address; receivers filter those out.
    KeepAlive(Vec<SocketAddr>),
    Publish(Block),
    ConfirmReq(Block),
    ConfirmAck(Vote),
    /// Request one account chain, back from `hash` (zero = whole chain).
    BulkPull { address: Address, hash: Hash },
    BulkPush,
    FrontierReq {
        start: Address,
        age: u32,
        count: u32,
    },
    BulkPullBlocks {
        min: Hash,
        max: Hash,
        mode: BulkPullMode,
        count: u32,
    },
    NodeIdHandshake,
}

const PEER_SLOT_SIZE: usize = 18;
const KEEPALIVE_SLOTS: usize = 8;

impl Packet {
    pub fn message_type(&self) -> MessageType {
        match self {
            Packet::KeepAlive(_) => MessageType::KeepAlive,
            Packet::Publish(_) => MessageType::Publish,
            Packet::ConfirmReq(_) => MessageType::ConfirmReq,
            Packet::ConfirmAck(_) => MessageType::ConfirmAck,
            Packet::BulkPull { .. } => MessageType::BulkPull,
            Packet::BulkPush => MessageType::BulkPush,
            Packet::FrontierReq { .. } => MessageType::FrontierReq,
            Packet::BulkPullBlocks { .. } => MessageType::BulkPullBlocks,
            Packet::NodeIdHandshake => MessageType::NodeIdHandshake,
        }
    }

    /// Marshal header and payload for the given network.
    pub fn marshal(&self, network: Network) -> Vec<u8> {
        let mut header = Header::new(network, self.message_type() as u8);
        if let Some(block) = self.block() {
            header.set_block_type(block.kind().tag());
        }

        let mut buf = Vec::with_capacity(HEADER_SIZE + 64);
        buf.extend_from_slice(&header.encode());
        self.marshal_payload(&mut buf);
        buf
    }

    fn block(&self) -> Option<&Block> {
        match self {
            Packet::Publish(block) | Packet::ConfirmReq(block) => Some(block),
            Packet::ConfirmAck(vote) => Some(&vote.block),
            _ => None,
        }
    }

    fn marshal_payload(&self, buf: &mut Vec<u8>) {
        match self {
            Packet::KeepAlive(peers) => {
                for slot in 0..KEEPALIVE_SLOTS {
                    match peers.get(slot) {
                        Some(addr) => {
                            let ip = match addr.ip() {
                                IpAddr::V4(v4) => v4.to_ipv6_mapped(),
                                IpAddr::V6(v6) => v6,
                            };
                            buf.extend_from_slice(&ip.octets());
                            buf.extend_from_slice(&addr.port().to_le_bytes());
                        }
                        // pad with the unspecified address; a quirk the
                        // reference C++ node requires
                        None => buf.extend_from_slice(&[0u8; PEER_SLOT_SIZE]),
                    }
                }
            }
            Packet::Publish(block) | Packet::ConfirmReq(block) => {
                buf.extend_from_slice(&block.encode());
            }
            Packet::ConfirmAck(vote) => {
                buf.extend_from_slice(vote.address.as_bytes());
                buf.extend_from_slice(vote.signature.as_bytes());
                buf.extend_from_slice(&vote.sequence.to_le_bytes());
                buf.extend_from_slice(&vote.block.encode());
            }
            Packet::BulkPull { address, hash } => {
                buf.extend_from_slice(address.as_bytes());
                buf.extend_from_slice(hash.as_bytes());
            }
            Packet::BulkPush | Packet::NodeIdHandshake => {}
            Packet::FrontierReq { start, age, count } => {
                buf.extend_from_slice(start.as_bytes());
                buf.extend_from_slice(&age.to_le_bytes());
                buf.extend_from_slice(&count.to_le_bytes());
            }
            Packet::BulkPullBlocks {
                min,
                max,
                mode,
                count,
            } => {
                buf.extend_from_slice(min.as_bytes());
                buf.extend_from_slice(max.as_bytes());
                buf.push(*mode as u8);
                buf.extend_from_slice(&count.to_le_bytes());
            }
        }
    }

    /// Parse a packet for the given network, rejecting foreign magic and
    /// unknown types.
    pub fn parse(network: Network, data: &[u8]) -> Result<Packet, ProtocolError> {
        let header = Header::decode(data)?;
        if !header.matches(network) {
            return Err(ProtocolError::BadMagic);
        }

        let payload = &data[HEADER_SIZE..];
        match header.message_type {
            t if t == MessageType::KeepAlive as u8 => parse_keepalive(payload),
            t if t == MessageType::Publish as u8 => {
                Ok(Packet::Publish(parse_block(&header, payload)?))
            }
            t if t == MessageType::ConfirmReq as u8 => {
                Ok(Packet::ConfirmReq(parse_block(&header, payload)?))
            }
            t if t == MessageType::ConfirmAck as u8 => parse_confirm_ack(&header, payload),
            t if t == MessageType::BulkPull as u8 => parse_bulk_pull(payload),
            t if t == MessageType::BulkPush as u8 => Ok(Packet::BulkPush),
            t if t == MessageType::FrontierReq as u8 => parse_frontier_req(payload),
            t if t == MessageType::BulkPullBlocks as u8 => parse_bulk_pull_blocks(payload),
            t if t == MessageType::NodeIdHandshake as u8 => Ok(Packet::NodeIdHandshake),
            other => Err(ProtocolError::BadType(other)),
        }
    }
}

fn parse_keepalive(payload: &[u8]) -> Result<Packet, ProtocolError> {
    if payload.len() % PEER_SLOT_SIZE != 0 {
        return Err(ProtocolError::BadLength);
    }

    let mut peers = Vec::new();
    for slot in payload.chunks_exact(PEER_SLOT_SIZE) {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&slot[..16]);
        let ip = Ipv6Addr::from(octets);
        if ip.is_unspecified() {
            continue;
        }
        let port = u16::from_le_bytes([slot[16], slot[17]]);
        let ip = match ip.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(ip),
        };
        peers.push(SocketAddr::new(ip, port));
    }
    Ok(Packet::KeepAlive(peers))
}

fn parse_block(header: &Header, payload: &[u8]) -> Result<Block, ProtocolError> {
    let kind = BlockKind::from_tag(header.block_type())?;
    Ok(Block::decode(kind, payload)?)
}

fn parse_confirm_ack(header: &Header, payload: &[u8]) -> Result<Packet, ProtocolError> {
    const VOTE_PREFIX: usize = Address::SIZE + Signature::SIZE + 8;
    if payload.len() < VOTE_PREFIX {
        return Err(ProtocolError::BadLength);
    }

    let mut address = [0u8; 32];
    address.copy_from_slice(&payload[..32]);
    let mut signature = [0u8; 64];
    signature.copy_from_slice(&payload[32..96]);
    let mut sequence = [0u8; 8];
    sequence.copy_from_slice(&payload[96..104]);

    let kind = BlockKind::from_tag(header.block_type())?;
    let block = Block::decode(kind, &payload[VOTE_PREFIX..])?;

    Ok(Packet::ConfirmAck(Vote {
        address: Address::new(address),
        signature: Signature::new(signature),
        sequence: u64::from_le_bytes(sequence),
        block,
    }))
}

fn parse_bulk_pull(payload: &[u8]) -> Result<Packet, ProtocolError> {
    if payload.len() != Address::SIZE + Hash::SIZE {
        return Err(ProtocolError::BadLength);
    }
    let mut address = [0u8; 32];
    address.copy_from_slice(&payload[..32]);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&payload[32..]);
    Ok(Packet::BulkPull {
        address: Address::new(address),
        hash: Hash::new(hash),
    })
}

fn parse_frontier_req(payload: &[u8]) -> Result<Packet, ProtocolError> {
    if payload.len() != Address::SIZE + 8 {
        return Err(ProtocolError::BadLength);
    }
    let mut start = [0u8; 32];
    start.copy_from_slice(&payload[..32]);
    Ok(Packet::FrontierReq {
        start: Address::new(start),
        age: u32::from_le_bytes([payload[32], payload[33], payload[34], payload[35]]),
        count: u32::from_le_bytes([payload[36], payload[37], payload[38], payload[39]]),
    })
}

fn parse_bulk_pull_blocks(payload: &[u8]) -> Result<Packet, ProtocolError> {
    if payload.len() != Hash::SIZE * 2 + 1 + 4 {
        return Err(ProtocolError::BadLength);
    }
    let mut min = [0u8; 32];
    min.copy_from_slice(&payload[..32]);
    let mut max = [0u8; 32];
    max.copy_from_slice(&payload[32..64]);
    let mode = match payload[64] {
        0 => BulkPullMode::List,
        1 => BulkPullMode::Checksum,
        _ => return Err(ProtocolError::BadLength),
    };
    Ok(Packet::BulkPullBlocks {
        min: Hash::new(min),
        max: Hash::new(max),
        mode,
        count: u32::from_le_bytes([payload[65], payload[66], payload[67], payload[68]]),
    })
}
