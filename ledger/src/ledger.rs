//! Block ingestion state machine and ledger queries.

use tracing::{debug, warn};

use lattice_blocks::{Block, ChangeBlock, Frontier, OpenBlock, ReceiveBlock, SendBlock, StateBlock};
use lattice_crypto::verify_signature;
use lattice_store::{AddressInfo, Pending, Store, StoreError, StoreWriter, UncheckedKind};
use lattice_types::{Address, Balance, Hash};

use crate::error::LedgerError;
use crate::genesis::Genesis;

/// Outcome of ingesting one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Ingest {
    /// Validated and committed.
    Committed,
    /// Already in the store; nothing to do.
    Existing,
    /// Parent unknown; parked in the unchecked quarantine.
    Quarantined,
}

/// How a state block's balance transition routes onto the legacy
/// semantics.
enum StateRoute {
    Send { destination: Address, delta: Balance },
    Receive,
    Change,
}

/// The ledger: a transactional state machine over the block store.
///
/// All ingestion for one call runs inside a single store write
/// transaction; concurrent readers use independent read transactions.
#[derive(Debug)]
pub struct Ledger {
    store: Store,
    genesis: Genesis,
}

impl Ledger {
    /// Open a ledger over a store, seeding the genesis block if the store
    /// is empty and verifying it matches if not.
    pub fn new(store: Store, genesis: Genesis) -> Result<Self, LedgerError> {
        let ledger = Self { store, genesis };
        ledger.set_genesis()?;
        Ok(ledger)
    }

    pub fn genesis(&self) -> &Genesis {
        &self.genesis
    }

    pub fn work_threshold(&self) -> u64 {
        self.genesis.work_threshold
    }

    fn set_genesis(&self) -> Result<(), LedgerError> {
        let block = Block::Open(self.genesis.block);
        let hash = block.hash();

        if !block.valid(self.genesis.work_threshold) {
            return Err(LedgerError::BadWork);
        }
        if !verify_signature(
            &self.genesis.block.address,
            hash.as_bytes(),
            block.signature(),
        ) {
            return Err(LedgerError::BadSignature);
        }

        self.store.update(|w| {
            if !w.is_empty()? {
                // an existing store must already hold this exact genesis
                if !w.has_block(&hash)? {
                    return Err(LedgerError::BadGenesis);
                }
                return Ok(());
            }

            w.add_block(&block)?;
            w.add_address_info(
                &self.genesis.block.address,
                &AddressInfo {
                    head_block: hash,
                    rep_block: hash,
                    open_block: hash,
                    balance: self.genesis.balance,
                },
            )?;
            // representation stays empty: only subsequent blocks move weight
            w.add_frontier(&Frontier {
                address: self.genesis.block.address,
                hash,
            })?;
            Ok(())
        })
    }

    // ── Ingestion ──────────────────────────────────────────────────────

    /// Ingest a single block in its own transaction.
    ///
    /// `Err(Unchecked)` means the block was quarantined (and persisted as
    /// such) until its parent arrives; every other error leaves the store
    /// untouched.
    pub fn add_block(&self, block: &Block) -> Result<(), LedgerError> {
        let status = self.store.update(|w| self.process_block(w, block))?;
        match status {
            Ingest::Quarantined => Err(LedgerError::Unchecked),
            Ingest::Committed | Ingest::Existing => Ok(()),
        }
    }

    /// Ingest a batch inside one transaction, in the order supplied.
    /// Per-block failures are logged and skipped; store failures abort the
    /// whole batch.
    pub fn add_blocks(&self, blocks: &[Block]) -> Result<(), LedgerError> {
        self.store.update(|w| {
            for block in blocks {
                match self.process_block(w, block) {
                    Ok(_) => {}
                    Err(LedgerError::Store(e)) => return Err(LedgerError::Store(e)),
                    Err(e) => warn!(hash = %block.hash(), error = %e, "rejected block"),
                }
            }
            Ok(())
        })
    }

    fn process_block(&self, w: &mut StoreWriter<'_>, block: &Block) -> Result<Ingest, LedgerError> {
        let hash = block.hash();

        match self.add_block_inner(w, block, &hash) {
            Ok(()) => {
                debug!(hash = %hash, kind = block.kind().name(), "added block");
                self.drain_unchecked(w, &hash)?;
                Ok(Ingest::Committed)
            }
            Err(LedgerError::BlockExists) => Ok(Ingest::Existing),
            Err(LedgerError::MissingPrevious) => {
                self.quarantine(w, block.root(), UncheckedKind::Previous, block)?;
                Ok(Ingest::Quarantined)
            }
            Err(LedgerError::MissingSource) => {
                let source = match block {
                    Block::Open(b) => b.source,
                    Block::Receive(b) => b.source,
                    Block::State(b) => b.link,
                    // sends and changes have no source to wait on
                    _ => return Err(LedgerError::MissingSource),
                };
                self.quarantine(w, source, UncheckedKind::Source, block)?;
                Ok(Ingest::Quarantined)
            }
            Err(e) => Err(e),
        }
    }

    /// The contractual check order: work, duplicate, root presence, then
    /// the per-variant transition.
    fn add_block_inner(
        &self,
        w: &mut StoreWriter<'_>,
        block: &Block,
        hash: &Hash,
    ) -> Result<(), LedgerError> {
        if !block.valid(self.genesis.work_threshold) {
            return Err(LedgerError::BadWork);
        }

        if w.has_block(hash)? {
            return Err(LedgerError::BlockExists);
        }

        if !w.has_block(&block.root())? {
            return Err(match block {
                Block::Open(_) => LedgerError::MissingSource,
                Block::State(b) if b.previous.is_zero() => LedgerError::MissingSource,
                _ => LedgerError::MissingPrevious,
            });
        }

        match block {
            Block::Open(b) => self.add_open_block(w, block, b, hash),
            Block::Send(b) => self.add_send_block(w, block, b, hash),
            Block::Receive(b) => self.add_receive_block(w, block, b, hash),
            Block::Change(b) => self.add_change_block(w, block, b, hash),
            Block::State(b) => self.add_state_block(w, block, b, hash),
        }
    }

    fn quarantine(
        &self,
        w: &mut StoreWriter<'_>,
        parent: Hash,
        kind: UncheckedKind,
        block: &Block,
    ) -> Result<(), LedgerError> {
        if w.has_unchecked(&parent, kind)? {
            return Ok(());
        }
        debug!(hash = %block.hash(), parent = %parent, "quarantined block");
        w.add_unchecked(&parent, kind, block)?;
        Ok(())
    }

    /// After a commit, retry any quarantined children waiting on the new
    /// block, deleting each entry only once its block ingests cleanly.
    /// Termination is guaranteed: every success strictly shrinks the
    /// unchecked set.
    fn drain_unchecked(&self, w: &mut StoreWriter<'_>, hash: &Hash) -> Result<(), LedgerError> {
        for kind in [UncheckedKind::Previous, UncheckedKind::Source] {
            if !w.has_unchecked(hash, kind)? {
                continue;
            }
            let child = w.get_unchecked(hash, kind)?;
            match self.process_block(w, &child) {
                Ok(Ingest::Committed) | Ok(Ingest::Existing) => {
                    w.delete_unchecked(hash, kind)?;
                }
                Ok(Ingest::Quarantined) => {}
                Err(LedgerError::Store(e)) => return Err(LedgerError::Store(e)),
                Err(e) => warn!(hash = %child.hash(), error = %e, "unchecked block rejected"),
            }
        }
        Ok(())
    }

    // ── Per-variant transitions ────────────────────────────────────────

    fn add_open_block(
        &self,
        w: &mut StoreWriter<'_>,
        block: &Block,
        b: &OpenBlock,
        hash: &Hash,
    ) -> Result<(), LedgerError> {
        if !verify_signature(&b.address, hash.as_bytes(), block.signature()) {
            return Err(LedgerError::BadSignature);
        }

        // one open block per account
        if w.has_address(&b.address)? {
            return Err(LedgerError::Fork);
        }

        let pending = match w.get_pending(&b.address, &b.source) {
            Ok(p) => p,
            Err(StoreError::KeyNotFound) => return Err(LedgerError::MissingSource),
            Err(e) => return Err(e.into()),
        };

        w.add_address_info(
            &b.address,
            &AddressInfo {
                head_block: *hash,
                rep_block: *hash,
                open_block: *hash,
                balance: pending.amount,
            },
        )?;
        w.delete_pending(&b.address, &b.source)?;
        w.add_representation(&b.representative, pending.amount)?;
        w.add_frontier(&Frontier {
            address: b.address,
            hash: *hash,
        })?;
        w.add_block(block)?;
        Ok(())
    }

    fn add_send_block(
        &self,
        w: &mut StoreWriter<'_>,
        block: &Block,
        b: &SendBlock,
        hash: &Hash,
    ) -> Result<(), LedgerError> {
        let frontier = match w.get_frontier(&b.previous) {
            Ok(f) => f,
            // the previous block exists but is no longer a head: a
            // competing block already extended it
            Err(StoreError::KeyNotFound) => return Err(LedgerError::Fork),
            Err(e) => return Err(e.into()),
        };

        if !verify_signature(&frontier.address, hash.as_bytes(), block.signature()) {
            return Err(LedgerError::BadSignature);
        }

        let mut info = w.get_address_info(&frontier.address)?;
        if info.head_block != frontier.hash {
            return Err(LedgerError::HeadMismatch);
        }

        // zero spends are allowed; claiming more than the balance is not
        let delta = info
            .balance
            .checked_sub(b.balance)
            .ok_or(LedgerError::NegativeSpend)?;

        let rep = self.representative(w, &frontier.address)?;

        w.add_pending(
            &b.destination,
            hash,
            &Pending {
                source: frontier.address,
                amount: delta,
            },
        )?;

        info.head_block = *hash;
        info.balance = b.balance;
        w.update_address_info(&frontier.address, &info)?;

        w.sub_representation(&rep, delta)?;

        w.delete_frontier(&frontier.hash)?;
        w.add_frontier(&Frontier {
            address: frontier.address,
            hash: *hash,
        })?;
        w.add_block(block)?;
        Ok(())
    }

    fn add_receive_block(
        &self,
        w: &mut StoreWriter<'_>,
        block: &Block,
        b: &ReceiveBlock,
        hash: &Hash,
    ) -> Result<(), LedgerError> {
        let frontier = match w.get_frontier(&b.previous) {
            Ok(f) => f,
            Err(StoreError::KeyNotFound) => return Err(LedgerError::Fork),
            Err(e) => return Err(e.into()),
        };

        if !verify_signature(&frontier.address, hash.as_bytes(), block.signature()) {
            return Err(LedgerError::BadSignature);
        }

        let mut info = w.get_address_info(&frontier.address)?;
        if info.head_block != frontier.hash {
            return Err(LedgerError::HeadMismatch);
        }

        let pending = match w.get_pending(&frontier.address, &b.source) {
            Ok(p) => p,
            Err(StoreError::KeyNotFound) => return Err(LedgerError::MissingSource),
            Err(e) => return Err(e.into()),
        };

        let new_balance = info
            .balance
            .checked_add(pending.amount)
            .ok_or(LedgerError::BalanceMismatch)?;

        let rep = self.representative(w, &frontier.address)?;

        w.delete_pending(&frontier.address, &b.source)?;

        info.head_block = *hash;
        info.balance = new_balance;
        w.update_address_info(&frontier.address, &info)?;

        w.add_representation(&rep, pending.amount)?;

        w.delete_frontier(&frontier.hash)?;
        w.add_frontier(&Frontier {
            address: frontier.address,
            hash: *hash,
        })?;
        w.add_block(block)?;
        Ok(())
    }

    fn add_change_block(
        &self,
        w: &mut StoreWriter<'_>,
        block: &Block,
        b: &ChangeBlock,
        hash: &Hash,
    ) -> Result<(), LedgerError> {
        let frontier = match w.get_frontier(&b.previous) {
            Ok(f) => f,
            Err(StoreError::KeyNotFound) => return Err(LedgerError::Fork),
            Err(e) => return Err(e.into()),
        };

        if !verify_signature(&frontier.address, hash.as_bytes(), block.signature()) {
            return Err(LedgerError::BadSignature);
        }

        let mut info = w.get_address_info(&frontier.address)?;
        if info.head_block != frontier.hash {
            return Err(LedgerError::HeadMismatch);
        }

        let old_rep = self.representative(w, &frontier.address)?;

        info.head_block = *hash;
        info.rep_block = *hash;
        w.update_address_info(&frontier.address, &info)?;

        w.sub_representation(&old_rep, info.balance)?;
        w.add_representation(&b.representative, info.balance)?;

        w.delete_frontier(&frontier.hash)?;
        w.add_frontier(&Frontier {
            address: frontier.address,
            hash: *hash,
        })?;
        w.add_block(block)?;
        Ok(())
    }

    /// State blocks carry the full account state; the transition is
    /// inferred from the balance change and the link field, then mapped
    /// onto the legacy semantics. Every state block also re-points the
    /// account's representative.
    fn add_state_block(
        &self,
        w: &mut StoreWriter<'_>,
        block: &Block,
        b: &StateBlock,
        hash: &Hash,
    ) -> Result<(), LedgerError> {
        if b.previous.is_zero() {
            return self.add_state_open_block(w, block, b, hash);
        }

        let frontier = match w.get_frontier(&b.previous) {
            Ok(f) => f,
            Err(StoreError::KeyNotFound) => return Err(LedgerError::Fork),
            Err(e) => return Err(e.into()),
        };
        if b.address != frontier.address {
            return Err(LedgerError::Fork);
        }

        if !verify_signature(&frontier.address, hash.as_bytes(), block.signature()) {
            return Err(LedgerError::BadSignature);
        }

        let mut info = w.get_address_info(&frontier.address)?;
        if info.head_block != frontier.hash {
            return Err(LedgerError::HeadMismatch);
        }

        let route = if b.balance < info.balance {
            let delta = info
                .balance
                .checked_sub(b.balance)
                .ok_or(LedgerError::NegativeSpend)?;
            StateRoute::Send {
                destination: Address::new(*b.link.as_bytes()),
                delta,
            }
        } else if !b.link.is_zero() {
            let pending = match w.get_pending(&frontier.address, &b.link) {
                Ok(p) => p,
                Err(StoreError::KeyNotFound) => return Err(LedgerError::MissingSource),
                Err(e) => return Err(e.into()),
            };
            let expected = info
                .balance
                .checked_add(pending.amount)
                .ok_or(LedgerError::BalanceMismatch)?;
            if b.balance != expected {
                return Err(LedgerError::BalanceMismatch);
            }
            StateRoute::Receive
        } else {
            if b.balance != info.balance {
                return Err(LedgerError::BalanceMismatch);
            }
            StateRoute::Change
        };

        let old_rep = self.representative(w, &frontier.address)?;
        let old_balance = info.balance;

        match route {
            StateRoute::Send { destination, delta } => {
                w.add_pending(
                    &destination,
                    hash,
                    &Pending {
                        source: frontier.address,
                        amount: delta,
                    },
                )?;
            }
            StateRoute::Receive => {
                w.delete_pending(&frontier.address, &b.link)?;
            }
            StateRoute::Change => {}
        }

        // weight moves wholesale: the old rep loses the old balance, the
        // named rep gains the new one
        w.sub_representation(&old_rep, old_balance)?;
        w.add_representation(&b.representative, b.balance)?;

        info.head_block = *hash;
        info.rep_block = *hash;
        info.balance = b.balance;
        w.update_address_info(&frontier.address, &info)?;

        w.delete_frontier(&frontier.hash)?;
        w.add_frontier(&Frontier {
            address: frontier.address,
            hash: *hash,
        })?;
        w.add_block(block)?;
        Ok(())
    }

    fn add_state_open_block(
        &self,
        w: &mut StoreWriter<'_>,
        block: &Block,
        b: &StateBlock,
        hash: &Hash,
    ) -> Result<(), LedgerError> {
        if !verify_signature(&b.address, hash.as_bytes(), block.signature()) {
            return Err(LedgerError::BadSignature);
        }

        if w.has_address(&b.address)? {
            return Err(LedgerError::Fork);
        }

        let pending = match w.get_pending(&b.address, &b.link) {
            Ok(p) => p,
            Err(StoreError::KeyNotFound) => return Err(LedgerError::MissingSource),
            Err(e) => return Err(e.into()),
        };
        if b.balance != pending.amount {
            return Err(LedgerError::BalanceMismatch);
        }

        w.add_address_info(
            &b.address,
            &AddressInfo {
                head_block: *hash,
                rep_block: *hash,
                open_block: *hash,
                balance: b.balance,
            },
        )?;
        w.delete_pending(&b.address, &b.link)?;
        w.add_representation(&b.representative, b.balance)?;
        w.add_frontier(&Frontier {
            address: b.address,
            hash: *hash,
        })?;
        w.add_block(block)?;
        Ok(())
    }

    /// Resolve the representative an account currently delegates to: the
    /// representative field of its rep block.
    fn representative(
        &self,
        w: &StoreWriter<'_>,
        address: &Address,
    ) -> Result<Address, LedgerError> {
        let info = w.get_address_info(address)?;
        match w.get_block(&info.rep_block)? {
            Block::Open(b) => Ok(b.representative),
            Block::Change(b) => Ok(b.representative),
            Block::State(b) => Ok(b.representative),
            _ => Err(LedgerError::BadRepresentativeBlockType),
        }
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn count_blocks(&self) -> Result<u64, LedgerError> {
        self.store.view(|r| Ok(r.count_blocks()?))
    }

    pub fn count_unchecked_blocks(&self) -> Result<u64, LedgerError> {
        self.store.view(|r| Ok(r.count_unchecked_blocks()?))
    }

    pub fn contains(&self, hash: &Hash) -> Result<bool, LedgerError> {
        self.store.view(|r| Ok(r.has_block(hash)?))
    }

    /// The confirmed balance of an account.
    pub fn balance(&self, address: &Address) -> Result<Balance, LedgerError> {
        self.store
            .view(|r| Ok(r.get_address_info(address)?.balance))
    }

    /// The head block of an account's chain.
    pub fn frontier(&self, address: &Address) -> Result<Hash, LedgerError> {
        self.store
            .view(|r| Ok(r.get_address_info(address)?.head_block))
    }

    /// All current frontiers.
    pub fn frontiers(&self) -> Result<Vec<Frontier>, LedgerError> {
        self.store.view(|r| Ok(r.frontiers()?))
    }

    /// The voting weight delegated to a representative.
    pub fn representation(&self, address: &Address) -> Result<Balance, LedgerError> {
        self.store.view(|r| Ok(r.representation(address)?))
    }

    /// Expose the underlying store for integration tests and tooling.
    pub fn store(&self) -> &Store {
        &self.store
    }
}
