//! One bootstrap round: fetch a peer's frontiers, reconcile against the
//! local ledger, and bulk-pull the chains that differ.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use lattice_blocks::Frontier;
use lattice_ledger::Ledger;
use lattice_network::{BulkPullSyncer, FrontierSyncer, SyncError, SYNC_TIMEOUT};
use lattice_types::{Address, Hash, Network};

use crate::error::NodeError;

/// Accounts whose remote head differs from (or is absent in) the local
/// ledger. Up-to-date accounts are not pulled again.
pub fn accounts_to_pull(remote: &[Frontier], local: &[Frontier]) -> Vec<Address> {
    let local_heads: HashMap<Address, Hash> =
        local.iter().map(|f| (f.address, f.hash)).collect();

    remote
        .iter()
        .filter(|f| local_heads.get(&f.address) != Some(&f.hash))
        .map(|f| f.address)
        .collect()
}

async fn connect(peer: SocketAddr) -> Result<TcpStream, NodeError> {
    let stream = timeout(SYNC_TIMEOUT, TcpStream::connect(peer))
        .await
        .map_err(|_| NodeError::Sync(SyncError::Timeout))??;
    Ok(stream)
}

/// Run a full frontier-then-bulk-pull exchange against one peer, feeding
/// every delivered batch into the ledger. Returns the number of blocks
/// pulled.
pub async fn sync_round(
    network: Network,
    ledger: &Arc<Ledger>,
    peer: SocketAddr,
) -> Result<u64, NodeError> {
    debug!(%peer, "requesting frontiers");

    let stream = connect(peer).await?;
    let mut remote = Vec::new();
    FrontierSyncer::new(network)
        .run(stream, |frontier| remote.push(frontier))
        .await?;

    let local = ledger.frontiers()?;
    let pulls = accounts_to_pull(&remote, &local);
    info!(
        %peer,
        remote = remote.len(),
        out_of_sync = pulls.len(),
        "frontier sync complete"
    );
    if pulls.is_empty() {
        return Ok(0);
    }

    let stream = connect(peer).await?;
    let ledger_sink = Arc::clone(ledger);
    let pulled = BulkPullSyncer::new(network, ledger.work_threshold(), pulls)
        .run(stream, move |blocks| {
            if let Err(e) = ledger_sink.add_blocks(&blocks) {
                warn!(error = %e, "failed to ingest pulled batch");
            }
        })
        .await?;

    Ok(pulled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frontier(addr: u8, hash: u8) -> Frontier {
        Frontier {
            address: Address::new([addr; 32]),
            hash: Hash::new([hash; 32]),
        }
    }

    #[test]
    fn pulls_missing_and_stale_accounts_only() {
        let remote = vec![frontier(1, 0x10), frontier(2, 0x20), frontier(3, 0x30)];
        let local = vec![
            frontier(1, 0x10), // up to date
            frontier(2, 0x21), // behind
        ];

        let pulls = accounts_to_pull(&remote, &local);
        assert_eq!(
            pulls,
            vec![Address::new([2u8; 32]), Address::new([3u8; 32])]
        );
    }

    #[test]
    fn nothing_to_pull_when_in_sync() {
        let remote = vec![frontier(1, 0x10)];
        let local = vec![frontier(1, 0x10), frontier(9, 0x90)];
        assert!(accounts_to_pull(&remote, &local).is_empty());
    }

    #[test]
    fn everything_pulled_on_empty_ledger() {
        let remote = vec![frontier(1, 0x10), frontier(2, 0x20)];
        assert_eq!(accounts_to_pull(&remote, &[]).len(), 2);
    }
}
