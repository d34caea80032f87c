//! Streaming state machines for the two bootstrap exchanges.
//!
//! Each syncer drives one TCP connection: a writer side emitting request
//! packets and a reader side consuming the peer's stream, with a fresh
//! deadline armed before every step. The bulk-pull syncer runs both sides
//! concurrently over the split connection; an error on either side
//! cancels the other and drops the socket.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, warn};

use lattice_blocks::{Block, BlockKind, Frontier, TAG_NOT_A_BLOCK};
use lattice_protocol::Packet;
use lattice_types::{Address, Hash, Network};

use crate::error::SyncError;

/// Deadline for each individual read or write step.
pub const SYNC_TIMEOUT: Duration = Duration::from_secs(2);

/// Blocks buffered before a delivery to the callback.
pub const SYNC_CACHE_SIZE: usize = 10_000;

async fn write_step<W>(w: &mut W, bytes: &[u8]) -> Result<(), SyncError>
where
    W: AsyncWrite + Unpin,
{
    timeout(SYNC_TIMEOUT, w.write_all(bytes))
        .await
        .map_err(|_| SyncError::Timeout)??;
    Ok(())
}

async fn read_step<R>(r: &mut R, buf: &mut [u8]) -> Result<(), SyncError>
where
    R: AsyncRead + Unpin,
{
    match timeout(SYNC_TIMEOUT, r.read_exact(buf)).await {
        Err(_) => Err(SyncError::Timeout),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(SyncError::ConnectionClosed)
        }
        Ok(Err(e)) => Err(e.into()),
        Ok(Ok(_)) => Ok(()),
    }
}

/// Requests a peer's full frontier list and reports each record.
///
/// Writes one `FrontierReq{start=0, age=MAX, count=MAX}`, then reads
/// fixed 64-byte records until the all-zero terminator.
pub struct FrontierSyncer {
    network: Network,
}

impl FrontierSyncer {
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    pub async fn run<S>(
        &self,
        mut stream: S,
        mut on_frontier: impl FnMut(Frontier),
    ) -> Result<(), SyncError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let request = Packet::FrontierReq {
            start: Address::ZERO,
            age: u32::MAX,
            count: u32::MAX,
        }
        .marshal(self.network);
        write_step(&mut stream, &request).await?;

        let mut record = [0u8; Frontier::SIZE];
        loop {
            read_step(&mut stream, &mut record).await?;
            let frontier = Frontier::decode(&record)?;
            if frontier.is_zero() {
                return Ok(());
            }
            on_frontier(frontier);
        }
    }
}

/// Pulls the full chain of every given account and delivers blocks in
/// batches.
///
/// The writer streams one `BulkPull{address, hash=0}` per account while
/// the reader concurrently consumes `(tag ‖ payload)` records; a
/// `not_a_block` tag ends one chain. Blocks failing the work threshold
/// are skipped but do not abort the stream. Batches of up to
/// [`SYNC_CACHE_SIZE`] blocks are flushed to the callback, with a final
/// flush when the last chain completes.
pub struct BulkPullSyncer {
    network: Network,
    work_threshold: u64,
    accounts: Vec<Address>,
}

impl BulkPullSyncer {
    pub fn new(network: Network, work_threshold: u64, accounts: Vec<Address>) -> Self {
        Self {
            network,
            work_threshold,
            accounts,
        }
    }

    /// Returns the number of blocks delivered.
    pub async fn run<S>(
        &self,
        stream: S,
        mut on_blocks: impl FnMut(Vec<Block>),
    ) -> Result<u64, SyncError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if self.accounts.is_empty() {
            return Ok(0);
        }

        let (mut rd, mut wr) = tokio::io::split(stream);

        let writer = async {
            for address in &self.accounts {
                let request = Packet::BulkPull {
                    address: *address,
                    hash: Hash::ZERO,
                }
                .marshal(self.network);
                write_step(&mut wr, &request).await?;
            }
            Ok::<_, SyncError>(())
        };

        let mut chains_left = self.accounts.len();
        let threshold = self.work_threshold;
        let reader = async {
            let mut delivered = 0u64;
            let mut cache: Vec<Block> = Vec::with_capacity(SYNC_CACHE_SIZE);
            let mut payload = [0u8; 256];

            loop {
                let mut tag = [0u8; 1];
                read_step(&mut rd, &mut tag).await?;

                if tag[0] == TAG_NOT_A_BLOCK {
                    chains_left -= 1;
                    if chains_left == 0 {
                        break;
                    }
                    continue;
                }

                let kind = BlockKind::from_tag(tag[0])?;
                let body = &mut payload[..kind.size()];
                read_step(&mut rd, body).await?;
                let block = Block::decode(kind, body)?;

                // tolerate bad work in the stream; just don't keep it
                if !block.valid(threshold) {
                    warn!(hash = %block.hash(), "skipping block with bad work");
                    continue;
                }

                cache.push(block);
                if cache.len() >= SYNC_CACHE_SIZE {
                    delivered += cache.len() as u64;
                    on_blocks(std::mem::take(&mut cache));
                }
            }

            if !cache.is_empty() {
                delivered += cache.len() as u64;
                on_blocks(cache);
            }
            Ok::<_, SyncError>(delivered)
        };

        let ((), delivered) = tokio::try_join!(writer, reader)?;
        debug!(accounts = self.accounts.len(), delivered, "bulk pull complete");
        Ok(delivered)
    }
}
