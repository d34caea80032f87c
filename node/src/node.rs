//! The node main loops: UDP keep-alive handling and the supervisory
//! bootstrap loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use lattice_ledger::Ledger;
use lattice_protocol::Packet;
use lattice_types::Network;

use crate::bootstrap;
use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::peers::PeerList;

/// How often to reconcile frontiers with a random peer.
const SYNC_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Retry delay after a failed sync round.
const SYNC_RETRY: Duration = Duration::from_secs(2);

const UDP_BUFFER_SIZE: usize = 1024;

pub struct Node {
    config: NodeConfig,
    network: Network,
    ledger: Arc<Ledger>,
    peers: Arc<Mutex<PeerList>>,
    socket: Arc<UdpSocket>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Node {
    /// Bind the listen socket and seed the peer list from configuration.
    pub async fn new(config: NodeConfig, ledger: Arc<Ledger>) -> Result<Self, NodeError> {
        let socket = UdpSocket::bind(&config.addr).await?;
        info!(addr = %config.addr, network = config.network.as_str(), "node listening");

        let mut peers = PeerList::new(config.max_peers, config.enable_ipv6);
        for entry in &config.peers {
            let addr: SocketAddr = entry
                .parse()
                .map_err(|_| NodeError::BadPeerAddress(entry.clone()))?;
            if let Err(e) = peers.add(addr) {
                warn!(peer = %addr, error = %e, "skipping configured peer");
            }
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            network: config.network,
            config,
            ledger,
            peers: Arc::new(Mutex::new(peers)),
            socket: Arc::new(socket),
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// The bound UDP address (useful when configured with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, NodeError> {
        Ok(self.socket.local_addr()?)
    }

    /// Signal all loops to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Run the UDP listener and the bootstrap loop until shutdown.
    pub async fn run(&self) -> Result<(), NodeError> {
        // announce ourselves to the configured peers
        let initial: Vec<SocketAddr> = {
            let peers = self.peers.lock().await;
            self.config
                .peers
                .iter()
                .filter_map(|s| s.parse().ok())
                .filter(|a| peers.contains(a))
                .collect()
        };
        for addr in initial {
            self.send_keepalive(addr).await;
        }

        let mut shutdown = self.shutdown_rx.clone();
        tokio::select! {
            r = self.listen_udp() => r,
            r = self.bootstrap_loop() => r,
            _ = shutdown.wait_for(|stop| *stop) => Ok(()),
        }
    }

    async fn listen_udp(&self) -> Result<(), NodeError> {
        let mut buf = [0u8; UDP_BUFFER_SIZE];
        loop {
            let (len, from) = self.socket.recv_from(&mut buf).await?;
            let packet = match Packet::parse(self.network, &buf[..len]) {
                Ok(p) => p,
                Err(e) => {
                    debug!(%from, error = %e, "dropping packet");
                    continue;
                }
            };

            match packet {
                Packet::KeepAlive(gossiped) => self.handle_keepalive(from, gossiped).await,
                // votes and published blocks are parsed but consensus is
                // not our concern; the bootstrap path carries the ledger
                Packet::Publish(block) | Packet::ConfirmReq(block) => {
                    debug!(%from, hash = %block.hash(), "ignoring live block gossip");
                }
                Packet::ConfirmAck(vote) => {
                    debug!(%from, hash = %vote.block.hash(), "ignoring vote");
                }
                other => {
                    debug!(%from, kind = other.message_type().name(), "unexpected packet");
                }
            }
        }
    }

    async fn handle_keepalive(&self, from: SocketAddr, gossiped: Vec<SocketAddr>) {
        let known = {
            let mut peers = self.peers.lock().await;
            let known = peers.contains(&from);
            if known {
                peers.touch(&from);
            } else if let Err(e) = peers.add(from) {
                debug!(peer = %from, error = %e, "not adding sender");
            }

            for addr in gossiped {
                if peers.is_full() {
                    break;
                }
                if let Err(e) = peers.add(addr) {
                    debug!(peer = %addr, error = %e, "not adding gossiped peer");
                }
            }
            known
        };

        if !known {
            self.send_keepalive(from).await;
        }
    }

    async fn send_keepalive(&self, target: SocketAddr) {
        let share = self.peers.lock().await.pick_for_keepalive(&target);
        let bytes = Packet::KeepAlive(share).marshal(self.network);
        if let Err(e) = self.socket.send_to(&bytes, target).await {
            warn!(peer = %target, error = %e, "keepalive send failed");
            self.peers.lock().await.remove(&target);
        }
    }

    /// Once per interval (or shortly after an error), reconcile frontiers
    /// with one random peer and pull whatever is out of sync.
    async fn bootstrap_loop(&self) -> Result<(), NodeError> {
        loop {
            let peer = { self.peers.lock().await.random() };
            let delay = match peer {
                Err(_) => {
                    debug!("no peers to sync with yet");
                    SYNC_RETRY
                }
                Ok(peer) => {
                    match bootstrap::sync_round(self.network, &self.ledger, peer.addr).await {
                        Ok(pulled) => {
                            if pulled > 0 {
                                info!(
                                    pulled,
                                    blocks = self.ledger.count_blocks()?,
                                    "bootstrap round complete"
                                );
                            }
                            SYNC_INTERVAL
                        }
                        Err(e) => {
                            warn!(peer = %peer.addr, error = %e, "sync round failed");
                            SYNC_RETRY
                        }
                    }
                }
            };
            tokio::time::sleep(delay).await;
        }
    }
}
