//! End-to-end bootstrap: a scripted peer serves frontiers and chains over
//! real TCP sockets, and the node's sync round feeds them to the ledger.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};

use lattice_blocks::{Block, BlockCommon, Frontier, OpenBlock, SendBlock, TAG_NOT_A_BLOCK};
use lattice_crypto::KeyPair;
use lattice_ledger::{Genesis, Ledger};
use lattice_node::{bootstrap, Node, NodeConfig};
use lattice_protocol::Packet;
use lattice_store::Store;
use lattice_types::{Balance, Network};
use lattice_work::{generate_work, TEST_THRESHOLD};

const GENESIS_SUPPLY: u128 = 1_000_000;

fn genesis_keypair() -> KeyPair {
    KeyPair::from_seed(&[0xAB; 32])
}

fn test_genesis() -> Genesis {
    let kp = genesis_keypair();
    let address = kp.address();
    let mut open = OpenBlock {
        source: address.into_hash(),
        representative: address,
        address,
        common: BlockCommon::default(),
    };
    let hash = Block::Open(open).hash();
    open.common.signature = kp.sign(hash.as_bytes());
    open.common.work = generate_work(&open.source, TEST_THRESHOLD);

    Genesis {
        block: open,
        balance: Balance::new(GENESIS_SUPPLY),
        work_threshold: TEST_THRESHOLD,
    }
}

fn open_test_ledger() -> (tempfile::TempDir, Arc<Ledger>) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let ledger = Ledger::new(store, test_genesis()).unwrap();
    (dir, Arc::new(ledger))
}

fn signed_send(
    kp: &KeyPair,
    previous: lattice_types::Hash,
    destination: lattice_types::Address,
    new_balance: u128,
) -> Block {
    let mut b = SendBlock {
        previous,
        destination,
        balance: Balance::new(new_balance),
        common: BlockCommon::default(),
    };
    let hash = Block::Send(b).hash();
    b.common.signature = kp.sign(hash.as_bytes());
    b.common.work = generate_work(&previous, TEST_THRESHOLD);
    Block::Send(b)
}

fn signed_open(kp: &KeyPair, source: lattice_types::Hash) -> Block {
    let mut b = OpenBlock {
        source,
        representative: kp.address(),
        address: kp.address(),
        common: BlockCommon::default(),
    };
    let hash = Block::Open(b).hash();
    b.common.signature = kp.sign(hash.as_bytes());
    b.common.work = generate_work(&source, TEST_THRESHOLD);
    Block::Open(b)
}

#[tokio::test]
async fn sync_round_pulls_missing_chains() {
    let (_dir, ledger) = open_test_ledger();
    let genesis_kp = genesis_keypair();
    let genesis = test_genesis();
    let receiver = KeyPair::from_seed(&[0x11; 32]);

    // the peer is ahead of us by one send and one open
    let genesis_block = Block::Open(genesis.block);
    let send1 = signed_send(
        &genesis_kp,
        genesis.hash(),
        receiver.address(),
        GENESIS_SUPPLY - 100,
    );
    let open_b = signed_open(&receiver, send1.hash());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let peer_addr = listener.local_addr().unwrap();

    let remote_frontiers = vec![
        Frontier {
            address: genesis.address(),
            hash: send1.hash(),
        },
        Frontier {
            address: receiver.address(),
            hash: open_b.hash(),
        },
    ];

    let server = tokio::spawn(async move {
        // connection 1: frontier exchange
        let (mut conn, _) = listener.accept().await.unwrap();
        let mut req = [0u8; 48];
        conn.read_exact(&mut req).await.unwrap();
        for f in &remote_frontiers {
            conn.write_all(&f.encode()).await.unwrap();
        }
        conn.write_all(&[0u8; Frontier::SIZE]).await.unwrap();
        drop(conn);

        // connection 2: bulk pull of both out-of-sync accounts
        let (mut conn, _) = listener.accept().await.unwrap();
        let mut reqs = [0u8; 144];
        conn.read_exact(&mut reqs).await.unwrap();

        // genesis account chain (the node already has the open block)
        conn.write_all(&genesis_block.encode_tagged()).await.unwrap();
        conn.write_all(&send1.encode_tagged()).await.unwrap();
        conn.write_all(&[TAG_NOT_A_BLOCK]).await.unwrap();

        // receiver account chain
        conn.write_all(&open_b.encode_tagged()).await.unwrap();
        conn.write_all(&[TAG_NOT_A_BLOCK]).await.unwrap();
    });

    let pulled = bootstrap::sync_round(Network::Test, &ledger, peer_addr)
        .await
        .unwrap();
    server.await.unwrap();

    assert_eq!(pulled, 3);
    assert_eq!(ledger.count_blocks().unwrap(), 3);
    assert_eq!(
        ledger.balance(&receiver.address()).unwrap(),
        Balance::new(100)
    );
    assert_eq!(ledger.count_unchecked_blocks().unwrap(), 0);
}

#[tokio::test]
async fn sync_round_skips_in_sync_peers() {
    let (_dir, ledger) = open_test_ledger();
    let genesis = test_genesis();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let peer_addr = listener.local_addr().unwrap();

    let frontier = Frontier {
        address: genesis.address(),
        hash: genesis.hash(),
    };
    let server = tokio::spawn(async move {
        let (mut conn, _) = listener.accept().await.unwrap();
        let mut req = [0u8; 48];
        conn.read_exact(&mut req).await.unwrap();
        conn.write_all(&frontier.encode()).await.unwrap();
        conn.write_all(&[0u8; Frontier::SIZE]).await.unwrap();
        // no second connection: nothing to pull
    });

    let pulled = bootstrap::sync_round(Network::Test, &ledger, peer_addr)
        .await
        .unwrap();
    server.await.unwrap();

    assert_eq!(pulled, 0);
    assert_eq!(ledger.count_blocks().unwrap(), 1);
}

#[tokio::test]
async fn node_answers_keepalive_and_shuts_down() {
    let (_dir, ledger) = open_test_ledger();

    let config = NodeConfig {
        addr: "127.0.0.1:0".to_string(),
        network: Network::Test,
        ..NodeConfig::default()
    };
    let node = Arc::new(Node::new(config, ledger).await.unwrap());
    let node_addr = node.local_addr().unwrap();

    let runner = {
        let node = Arc::clone(&node);
        tokio::spawn(async move { node.run().await })
    };

    // greet the node; it should answer with a keepalive of its own
    let probe = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let hello = Packet::KeepAlive(Vec::new()).marshal(Network::Test);
    probe.send_to(&hello, node_addr).await.unwrap();

    let mut buf = [0u8; 1024];
    let (len, from) = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        probe.recv_from(&mut buf),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(from, node_addr);
    let reply = Packet::parse(Network::Test, &buf[..len]).unwrap();
    assert!(matches!(reply, Packet::KeepAlive(_)));

    node.shutdown();
    runner.await.unwrap().unwrap();
}
