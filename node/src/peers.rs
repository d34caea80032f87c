//! Bounded peer list with random selection.

use std::net::{IpAddr, SocketAddr};
use std::time::Instant;

use rand::seq::SliceRandom;

use crate::error::NodeError;

/// Number of peers shared in an outgoing keep-alive.
pub const KEEPALIVE_SHARE: usize = 8;

#[derive(Clone, Copy, Debug)]
pub struct Peer {
    pub addr: SocketAddr,
    pub last_seen: Instant,
}

/// Tracks up to `max` known peers.
pub struct PeerList {
    max: usize,
    enable_ipv6: bool,
    peers: Vec<Peer>,
}

impl PeerList {
    pub fn new(max: usize, enable_ipv6: bool) -> Self {
        Self {
            max,
            enable_ipv6,
            peers: Vec::with_capacity(max),
        }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.peers.len() >= self.max
    }

    pub fn contains(&self, addr: &SocketAddr) -> bool {
        self.peers.iter().any(|p| p.addr == *addr)
    }

    /// Add a peer, rejecting loopback/multicast addresses, IPv6 when
    /// disabled, duplicates, and overflow beyond `max`.
    pub fn add(&mut self, addr: SocketAddr) -> Result<(), NodeError> {
        if !is_global_unicast(&addr.ip()) {
            return Err(NodeError::BadPeerAddress(addr.to_string()));
        }
        if addr.is_ipv6() && !self.enable_ipv6 {
            return Err(NodeError::Ipv6Disabled);
        }
        if self.contains(&addr) {
            self.touch(&addr);
            return Ok(());
        }
        if self.is_full() {
            return Err(NodeError::PeerListFull);
        }
        self.peers.push(Peer {
            addr,
            last_seen: Instant::now(),
        });
        Ok(())
    }

    pub fn remove(&mut self, addr: &SocketAddr) {
        self.peers.retain(|p| p.addr != *addr);
    }

    /// Record that a peer spoke to us.
    pub fn touch(&mut self, addr: &SocketAddr) {
        if let Some(peer) = self.peers.iter_mut().find(|p| p.addr == *addr) {
            peer.last_seen = Instant::now();
        }
    }

    /// Pick one random peer.
    pub fn random(&self) -> Result<Peer, NodeError> {
        self.peers
            .choose(&mut rand::thread_rng())
            .copied()
            .ok_or(NodeError::NoPeers)
    }

    /// Pick up to [`KEEPALIVE_SHARE`] random peers to gossip, excluding
    /// the target itself.
    pub fn pick_for_keepalive(&self, target: &SocketAddr) -> Vec<SocketAddr> {
        let mut candidates: Vec<SocketAddr> = self
            .peers
            .iter()
            .map(|p| p.addr)
            .filter(|a| a != target)
            .collect();
        candidates.shuffle(&mut rand::thread_rng());
        candidates.truncate(KEEPALIVE_SHARE);
        candidates
    }
}

fn is_global_unicast(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !v4.is_loopback()
                && !v4.is_multicast()
                && !v4.is_broadcast()
                && !v4.is_unspecified()
        }
        IpAddr::V6(v6) => !v6.is_loopback() && !v6.is_multicast() && !v6.is_unspecified(),
    }
}
