//! End-to-end ledger scenarios: genesis bootstrap, quarantine and drain,
//! forks, and conservation invariants.

use lattice_blocks::{
    Block, BlockCommon, ChangeBlock, OpenBlock, ReceiveBlock, SendBlock, StateBlock,
};
use lattice_crypto::KeyPair;
use lattice_ledger::{Genesis, Ledger, LedgerError};
use lattice_store::{Store, StoreError};
use lattice_types::{Address, Balance, Hash};
use lattice_work::{generate_work, validate_work, TEST_THRESHOLD};

const GENESIS_SUPPLY: u128 = 1_000_000;

fn genesis_keypair() -> KeyPair {
    KeyPair::from_seed(&[0xAB; 32])
}

/// A genesis signed by a key we control, with work generatable against the
/// relaxed test threshold.
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

fn open_ledger() -> (tempfile::TempDir, Ledger) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open(dir.path()).expect("open store");
    let ledger = Ledger::new(store, test_genesis()).expect("open ledger");
    (dir, ledger)
}

// ── Signed block builders ──────────────────────────────────────────────

fn send(kp: &KeyPair, previous: Hash, destination: Address, new_balance: u128) -> Block {
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

fn open(kp: &KeyPair, source: Hash, representative: Address) -> Block {
    let mut b = OpenBlock {
        source,
        representative,
        address: kp.address(),
        common: BlockCommon::default(),
    };
    let hash = Block::Open(b).hash();
    b.common.signature = kp.sign(hash.as_bytes());
    b.common.work = generate_work(&source, TEST_THRESHOLD);
    Block::Open(b)
}

fn receive(kp: &KeyPair, previous: Hash, source: Hash) -> Block {
    let mut b = ReceiveBlock {
        previous,
        source,
        common: BlockCommon::default(),
    };
    let hash = Block::Receive(b).hash();
    b.common.signature = kp.sign(hash.as_bytes());
    b.common.work = generate_work(&previous, TEST_THRESHOLD);
    Block::Receive(b)
}

fn change(kp: &KeyPair, previous: Hash, representative: Address) -> Block {
    let mut b = ChangeBlock {
        previous,
        representative,
        common: BlockCommon::default(),
    };
    let hash = Block::Change(b).hash();
    b.common.signature = kp.sign(hash.as_bytes());
    b.common.work = generate_work(&previous, TEST_THRESHOLD);
    Block::Change(b)
}

fn state(
    kp: &KeyPair,
    previous: Hash,
    representative: Address,
    balance: u128,
    link: Hash,
) -> Block {
    let mut b = StateBlock {
        address: kp.address(),
        previous,
        representative,
        balance: Balance::new(balance),
        link,
        common: BlockCommon::default(),
    };
    let hash = Block::State(b).hash();
    b.common.signature = kp.sign(hash.as_bytes());
    b.common.work = generate_work(&Block::State(b).root(), TEST_THRESHOLD);
    Block::State(b)
}

// ── Genesis bootstrap ──────────────────────────────────────────────────

#[test]
fn genesis_bootstrap_seeds_the_store() {
    let (_dir, ledger) = open_ledger();
    let genesis = ledger.genesis().clone();

    assert_eq!(ledger.count_blocks().unwrap(), 1);
    assert_eq!(
        ledger.balance(&genesis.address()).unwrap(),
        Balance::new(GENESIS_SUPPLY)
    );
    assert_eq!(ledger.frontier(&genesis.address()).unwrap(), genesis.hash());
    // representation is only moved by subsequent blocks
    assert_eq!(
        ledger.representation(&genesis.address()).unwrap(),
        Balance::ZERO
    );
}

#[test]
fn live_genesis_bootstrap() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let ledger = Ledger::new(store, Genesis::live()).unwrap();
    let genesis = Genesis::live();

    assert_eq!(ledger.count_blocks().unwrap(), 1);
    assert_eq!(ledger.balance(&genesis.address()).unwrap(), Balance::MAX);
    assert_eq!(ledger.frontier(&genesis.address()).unwrap(), genesis.hash());
}

#[test]
fn genesis_replay_into_existing_store() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = Store::open(dir.path()).unwrap();
        Ledger::new(store, test_genesis()).unwrap();
    }
    // same genesis: succeeds
    let store = Store::open(dir.path()).unwrap();
    let ledger = Ledger::new(store, test_genesis()).unwrap();
    assert_eq!(ledger.count_blocks().unwrap(), 1);
    drop(ledger);

    // a different genesis into the same store: BadGenesis
    let other_kp = KeyPair::from_seed(&[0xCD; 32]);
    let address = other_kp.address();
    let mut other = OpenBlock {
        source: address.into_hash(),
        representative: address,
        address,
        common: BlockCommon::default(),
    };
    let hash = Block::Open(other).hash();
    other.common.signature = other_kp.sign(hash.as_bytes());
    other.common.work = generate_work(&other.source, TEST_THRESHOLD);

    let store = Store::open(dir.path()).unwrap();
    let err = Ledger::new(
        store,
        Genesis {
            block: other,
            balance: Balance::new(1),
            work_threshold: TEST_THRESHOLD,
        },
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::BadGenesis));
}

// ── Work validation ────────────────────────────────────────────────────

#[test]
fn bad_work_is_rejected() {
    let (_dir, ledger) = open_ledger();
    let genesis = ledger.genesis().clone();

    // same block as genesis but with work that misses the threshold
    let mut bad = genesis.block;
    bad.common.work = (0..)
        .find(|&w| !validate_work(&bad.source, w, TEST_THRESHOLD))
        .unwrap();

    let err = ledger.add_block(&Block::Open(bad)).unwrap_err();
    assert!(matches!(err, LedgerError::BadWork));
    assert_eq!(ledger.count_blocks().unwrap(), 1);
    assert_eq!(ledger.count_unchecked_blocks().unwrap(), 0);
}

// ── Quarantine and drain ───────────────────────────────────────────────

#[test]
fn missing_previous_is_quarantined() {
    let (_dir, ledger) = open_ledger();
    let kp = genesis_keypair();

    let blk = receive(&kp, Hash::new([0x77; 32]), Hash::new([0x88; 32]));
    let err = ledger.add_block(&blk).unwrap_err();
    assert!(matches!(err, LedgerError::Unchecked));

    assert!(!ledger.contains(&blk.hash()).unwrap());
    assert_eq!(ledger.count_unchecked_blocks().unwrap(), 1);
    assert_eq!(ledger.count_blocks().unwrap(), 1);
}

#[test]
fn unchecked_block_drains_when_parent_arrives() {
    let (_dir, ledger) = open_ledger();
    let genesis_kp = genesis_keypair();
    let genesis = ledger.genesis().clone();
    let receiver = KeyPair::from_seed(&[0x11; 32]);

    let send1 = send(
        &genesis_kp,
        genesis.hash(),
        receiver.address(),
        GENESIS_SUPPLY - 100,
    );
    let open_b = open(&receiver, send1.hash(), receiver.address());

    // child first: source missing, so it is parked
    assert!(matches!(
        ledger.add_block(&open_b),
        Err(LedgerError::Unchecked)
    ));
    assert_eq!(ledger.count_unchecked_blocks().unwrap(), 1);

    // the parent arrives and the child drains in the same transaction
    ledger.add_block(&send1).unwrap();
    assert!(ledger.contains(&send1.hash()).unwrap());
    assert!(ledger.contains(&open_b.hash()).unwrap());
    assert_eq!(ledger.count_unchecked_blocks().unwrap(), 0);
    assert_eq!(ledger.balance(&receiver.address()).unwrap(), Balance::new(100));
}

#[test]
fn receive_waiting_on_source_drains() {
    let (_dir, ledger) = open_ledger();
    let genesis_kp = genesis_keypair();
    let genesis = ledger.genesis().clone();
    let receiver = KeyPair::from_seed(&[0x11; 32]);

    let send1 = send(
        &genesis_kp,
        genesis.hash(),
        receiver.address(),
        GENESIS_SUPPLY - 100,
    );
    let open_b = open(&receiver, send1.hash(), receiver.address());
    ledger.add_block(&send1).unwrap();
    ledger.add_block(&open_b).unwrap();

    let send2 = send(
        &genesis_kp,
        send1.hash(),
        receiver.address(),
        GENESIS_SUPPLY - 250,
    );
    let receive_b = receive(&receiver, open_b.hash(), send2.hash());

    // previous exists but the source send hasn't arrived yet
    assert!(matches!(
        ledger.add_block(&receive_b),
        Err(LedgerError::Unchecked)
    ));
    assert_eq!(ledger.count_unchecked_blocks().unwrap(), 1);

    ledger.add_block(&send2).unwrap();
    assert!(ledger.contains(&receive_b.hash()).unwrap());
    assert_eq!(ledger.count_unchecked_blocks().unwrap(), 0);
    assert_eq!(ledger.balance(&receiver.address()).unwrap(), Balance::new(250));
}

// ── Forks and spend limits ─────────────────────────────────────────────

#[test]
fn double_spend_from_one_head_is_a_fork() {
    let (_dir, ledger) = open_ledger();
    let genesis_kp = genesis_keypair();
    let genesis = ledger.genesis().clone();

    let a = KeyPair::from_seed(&[0x21; 32]);
    let b = KeyPair::from_seed(&[0x22; 32]);

    let first = send(&genesis_kp, genesis.hash(), a.address(), GENESIS_SUPPLY - 10);
    let second = send(&genesis_kp, genesis.hash(), b.address(), GENESIS_SUPPLY - 20);
    assert_ne!(first.hash(), second.hash());

    ledger.add_block(&first).unwrap();
    let err = ledger.add_block(&second).unwrap_err();
    assert!(matches!(err, LedgerError::Fork));
    assert!(!ledger.contains(&second.hash()).unwrap());
}

#[test]
fn zero_value_send_is_accepted() {
    let (_dir, ledger) = open_ledger();
    let genesis_kp = genesis_keypair();
    let genesis = ledger.genesis().clone();
    let dest = KeyPair::from_seed(&[0x31; 32]);

    // a send that keeps the full balance moves zero raw
    let blk = send(&genesis_kp, genesis.hash(), dest.address(), GENESIS_SUPPLY);
    ledger.add_block(&blk).unwrap();
    assert_eq!(
        ledger.balance(&genesis.address()).unwrap(),
        Balance::new(GENESIS_SUPPLY)
    );
}

#[test]
fn over_spend_is_rejected() {
    let (_dir, ledger) = open_ledger();
    let genesis_kp = genesis_keypair();
    let genesis = ledger.genesis().clone();
    let dest = KeyPair::from_seed(&[0x31; 32]);

    let blk = send(&genesis_kp, genesis.hash(), dest.address(), GENESIS_SUPPLY + 1);
    let err = ledger.add_block(&blk).unwrap_err();
    assert!(matches!(err, LedgerError::NegativeSpend));
}

#[test]
fn forged_signature_is_rejected() {
    let (_dir, ledger) = open_ledger();
    let genesis = ledger.genesis().clone();
    let imposter = KeyPair::from_seed(&[0x66; 32]);

    let blk = send(&imposter, genesis.hash(), imposter.address(), 0);
    let err = ledger.add_block(&blk).unwrap_err();
    assert!(matches!(err, LedgerError::BadSignature));
}

// ── Representatives ────────────────────────────────────────────────────

#[test]
fn weight_follows_sends_receives_and_changes() {
    let (_dir, ledger) = open_ledger();
    let genesis_kp = genesis_keypair();
    let genesis = ledger.genesis().clone();

    let account = KeyPair::from_seed(&[0x41; 32]);
    let rep1 = Address::new([0xE1; 32]);
    let rep2 = Address::new([0xE2; 32]);

    let send1 = send(
        &genesis_kp,
        genesis.hash(),
        account.address(),
        GENESIS_SUPPLY - 400,
    );
    ledger.add_block(&send1).unwrap();

    let open_b = open(&account, send1.hash(), rep1);
    ledger.add_block(&open_b).unwrap();
    assert_eq!(ledger.representation(&rep1).unwrap(), Balance::new(400));

    // moving funds out debits the delta from the representative
    let spend = send(&account, open_b.hash(), genesis.address(), 250);
    ledger.add_block(&spend).unwrap();
    assert_eq!(ledger.representation(&rep1).unwrap(), Balance::new(250));

    // re-pointing the representative moves the remaining weight wholesale
    let change_b = change(&account, spend.hash(), rep2);
    ledger.add_block(&change_b).unwrap();
    assert_eq!(ledger.representation(&rep1).unwrap(), Balance::ZERO);
    assert_eq!(ledger.representation(&rep2).unwrap(), Balance::new(250));
}

// ── State blocks ───────────────────────────────────────────────────────

#[test]
fn state_blocks_route_open_send_receive_change() {
    let (_dir, ledger) = open_ledger();
    let genesis_kp = genesis_keypair();
    let genesis = ledger.genesis().clone();

    let account = KeyPair::from_seed(&[0x51; 32]);
    let rep = Address::new([0xE5; 32]);

    let send1 = send(
        &genesis_kp,
        genesis.hash(),
        account.address(),
        GENESIS_SUPPLY - 500,
    );
    ledger.add_block(&send1).unwrap();

    // state open: previous is zero, link names the source send
    let open_s = state(&account, Hash::ZERO, rep, 500, send1.hash());
    ledger.add_block(&open_s).unwrap();
    assert_eq!(ledger.balance(&account.address()).unwrap(), Balance::new(500));
    assert_eq!(ledger.representation(&rep).unwrap(), Balance::new(500));

    // state send: balance decreases, link is the destination key
    let dest = KeyPair::from_seed(&[0x52; 32]);
    let send_s = state(
        &account,
        open_s.hash(),
        rep,
        300,
        dest.address().into_hash(),
    );
    ledger.add_block(&send_s).unwrap();
    assert_eq!(ledger.balance(&account.address()).unwrap(), Balance::new(300));
    assert_eq!(ledger.representation(&rep).unwrap(), Balance::new(300));

    // state open on the destination chain receives it
    let open_d = state(&dest, Hash::ZERO, rep, 200, send_s.hash());
    ledger.add_block(&open_d).unwrap();
    assert_eq!(ledger.balance(&dest.address()).unwrap(), Balance::new(200));
    assert_eq!(ledger.representation(&rep).unwrap(), Balance::new(500));

    // state change: same balance, zero link, new representative
    let rep2 = Address::new([0xE6; 32]);
    let change_s = state(&account, send_s.hash(), rep2, 300, Hash::ZERO);
    ledger.add_block(&change_s).unwrap();
    assert_eq!(ledger.representation(&rep).unwrap(), Balance::new(200));
    assert_eq!(ledger.representation(&rep2).unwrap(), Balance::new(300));

    // state receive back on the account chain
    let send2 = state(&dest, open_d.hash(), rep, 50, account.address().into_hash());
    ledger.add_block(&send2).unwrap();
    let recv_s = state(&account, change_s.hash(), rep2, 450, send2.hash());
    ledger.add_block(&recv_s).unwrap();
    assert_eq!(ledger.balance(&account.address()).unwrap(), Balance::new(450));
    assert_eq!(ledger.representation(&rep2).unwrap(), Balance::new(450));
}

#[test]
fn state_block_with_wrong_balance_is_rejected() {
    let (_dir, ledger) = open_ledger();
    let genesis_kp = genesis_keypair();
    let genesis = ledger.genesis().clone();
    let account = KeyPair::from_seed(&[0x53; 32]);

    let send1 = send(
        &genesis_kp,
        genesis.hash(),
        account.address(),
        GENESIS_SUPPLY - 500,
    );
    ledger.add_block(&send1).unwrap();

    // claims more than the pending amount credits
    let open_s = state(&account, Hash::ZERO, account.address(), 501, send1.hash());
    let err = ledger.add_block(&open_s).unwrap_err();
    assert!(matches!(err, LedgerError::BalanceMismatch));
}

// ── Invariants ─────────────────────────────────────────────────────────

/// After an arbitrary ingest sequence, credited balances plus pending
/// amounts conserve the genesis supply, every account's head matches a
/// frontier, no block is stored twice, and all stored work meets the
/// threshold.
#[test]
fn conservation_invariants_hold() {
    let (_dir, ledger) = open_ledger();
    let genesis_kp = genesis_keypair();
    let genesis = ledger.genesis().clone();

    let rep = Address::new([0xEE; 32]);
    let a = KeyPair::from_seed(&[0x61; 32]);
    let b = KeyPair::from_seed(&[0x62; 32]);

    let send_a = send(&genesis_kp, genesis.hash(), a.address(), GENESIS_SUPPLY - 300);
    let open_a = open(&a, send_a.hash(), rep);
    let send_b = send(&genesis_kp, send_a.hash(), b.address(), GENESIS_SUPPLY - 500);
    let open_b = open(&b, send_b.hash(), rep);
    let send_ab = send(&a, open_a.hash(), b.address(), 120);
    // deliberately out of order, one left pending forever
    let blocks = [&send_a, &send_b, &open_b, &open_a, &send_ab];
    for blk in blocks {
        let _ = ledger.add_block(blk);
    }

    let store = ledger.store().clone();
    store
        .view::<_, StoreError>(|r| {
            let balances: u128 = r
                .addresses()?
                .iter()
                .map(|(_, info)| info.balance.raw())
                .sum();
            let pending: u128 = r.pendings()?.iter().map(|(_, _, p)| p.amount.raw()).sum();
            assert_eq!(balances + pending, GENESIS_SUPPLY);

            // every account's head is a frontier naming it
            for (address, info) in r.addresses()? {
                let frontier = r.get_frontier(&info.head_block)?;
                assert_eq!(frontier.address, address);
            }
            assert_eq!(r.count_frontiers()?, r.addresses()?.len() as u64);

            // the shared representative carries exactly the credited
            // balances that delegate to it
            let delegated: u128 = [a.address(), b.address()]
                .iter()
                .filter_map(|addr| r.get_address_info(addr).ok())
                .map(|info| info.balance.raw())
                .sum();
            assert_eq!(r.representation(&rep)?.raw(), delegated);

            // all stored work is valid
            for frontier in r.frontiers()? {
                let mut hash = frontier.hash;
                loop {
                    let blk = r.get_block(&hash)?;
                    assert!(blk.valid(TEST_THRESHOLD), "work below threshold");
                    let root = blk.root();
                    if r.has_block(&root)? && root != hash {
                        hash = root;
                    } else {
                        break;
                    }
                }
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn duplicate_ingest_is_idempotent() {
    let (_dir, ledger) = open_ledger();
    let genesis_kp = genesis_keypair();
    let genesis = ledger.genesis().clone();
    let dest = KeyPair::from_seed(&[0x71; 32]);

    let blk = send(&genesis_kp, genesis.hash(), dest.address(), GENESIS_SUPPLY - 1);
    ledger.add_block(&blk).unwrap();
    // resubmission is a silent success and changes nothing
    ledger.add_block(&blk).unwrap();
    assert_eq!(ledger.count_blocks().unwrap(), 2);
}

#[test]
fn batch_ingest_skips_bad_blocks_and_commits_good_ones() {
    let (_dir, ledger) = open_ledger();
    let genesis_kp = genesis_keypair();
    let genesis = ledger.genesis().clone();
    let dest = KeyPair::from_seed(&[0x81; 32]);

    let good = send(&genesis_kp, genesis.hash(), dest.address(), GENESIS_SUPPLY - 50);
    let overspend = send(&genesis_kp, good.hash(), dest.address(), GENESIS_SUPPLY);
    let open_d = open(&dest, good.hash(), dest.address());

    ledger
        .add_blocks(&[good, overspend, open_d])
        .unwrap();

    assert!(ledger.contains(&good.hash()).unwrap());
    assert!(!ledger.contains(&overspend.hash()).unwrap());
    assert!(ledger.contains(&open_d.hash()).unwrap());
    assert_eq!(ledger.balance(&dest.address()).unwrap(), Balance::new(50));
}
