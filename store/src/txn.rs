//! Read and write transaction wrappers with typed accessors.
//!
//! All keys are `prefix byte ‖ body`. Reads of absent keys yield
//! `KeyNotFound`; inserts into occupied keys yield `AlreadyExists` — the
//! ledger never overwrites implicitly.

use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};

use lattice_blocks::{Block, Frontier};
use lattice_types::{Address, Balance, Hash};

use crate::error::StoreError;
use crate::prefix;
use crate::records::{AddressInfo, Pending, UncheckedKind};

type Db = Database<Bytes, Bytes>;

fn hash_key(prefix: u8, hash: &Hash) -> [u8; 33] {
    let mut key = [0u8; 33];
    key[0] = prefix;
    key[1..].copy_from_slice(hash.as_bytes());
    key
}

fn address_key(prefix: u8, address: &Address) -> [u8; 33] {
    let mut key = [0u8; 33];
    key[0] = prefix;
    key[1..].copy_from_slice(address.as_bytes());
    key
}

fn pending_key(destination: &Address, hash: &Hash) -> [u8; 65] {
    let mut key = [0u8; 65];
    key[0] = prefix::PENDING;
    key[1..33].copy_from_slice(destination.as_bytes());
    key[33..].copy_from_slice(hash.as_bytes());
    key
}

fn decode_block(value: &[u8]) -> Result<Block, StoreError> {
    Block::decode_tagged(value).map_err(|e| StoreError::Corrupt(e.to_string()))
}

// ── Shared read paths ──────────────────────────────────────────────────

fn get_raw<'t>(db: Db, txn: &'t RoTxn, key: &[u8]) -> Result<&'t [u8], StoreError> {
    db.get(txn, key)?.ok_or(StoreError::KeyNotFound)
}

fn has_raw(db: Db, txn: &RoTxn, key: &[u8]) -> Result<bool, StoreError> {
    Ok(db.get(txn, key)?.is_some())
}

fn count_prefix(db: Db, txn: &RoTxn, prefix: u8) -> Result<u64, StoreError> {
    let mut count = 0u64;
    for item in db.prefix_iter(txn, &[prefix])? {
        item?;
        count += 1;
    }
    Ok(count)
}

fn is_empty(db: Db, txn: &RoTxn) -> Result<bool, StoreError> {
    let mut iter = db.prefix_iter(txn, &[prefix::BLOCK])?;
    Ok(iter.next().transpose()?.is_none())
}

fn get_block(db: Db, txn: &RoTxn, hash: &Hash) -> Result<Block, StoreError> {
    decode_block(get_raw(db, txn, &hash_key(prefix::BLOCK, hash))?)
}

fn get_unchecked(
    db: Db,
    txn: &RoTxn,
    parent: &Hash,
    kind: UncheckedKind,
) -> Result<Block, StoreError> {
    decode_block(get_raw(db, txn, &hash_key(kind.prefix(), parent))?)
}

fn get_address_info(db: Db, txn: &RoTxn, address: &Address) -> Result<AddressInfo, StoreError> {
    AddressInfo::decode(get_raw(db, txn, &address_key(prefix::ADDRESS, address))?)
}

fn get_frontier(db: Db, txn: &RoTxn, hash: &Hash) -> Result<Frontier, StoreError> {
    let value = get_raw(db, txn, &hash_key(prefix::FRONTIER, hash))?;
    let address: [u8; 32] = value
        .try_into()
        .map_err(|_| StoreError::Corrupt("frontier value is not an address".into()))?;
    Ok(Frontier {
        address: Address::new(address),
        hash: *hash,
    })
}

fn frontiers(db: Db, txn: &RoTxn) -> Result<Vec<Frontier>, StoreError> {
    let mut out = Vec::new();
    for item in db.prefix_iter(txn, &[prefix::FRONTIER])? {
        let (key, value) = item?;
        let hash: [u8; 32] = key[1..]
            .try_into()
            .map_err(|_| StoreError::Corrupt("frontier key is not a hash".into()))?;
        let address: [u8; 32] = value
            .try_into()
            .map_err(|_| StoreError::Corrupt("frontier value is not an address".into()))?;
        out.push(Frontier {
            address: Address::new(address),
            hash: Hash::new(hash),
        });
    }
    Ok(out)
}

fn get_pending(
    db: Db,
    txn: &RoTxn,
    destination: &Address,
    hash: &Hash,
) -> Result<Pending, StoreError> {
    Pending::decode(get_raw(db, txn, &pending_key(destination, hash))?)
}

fn pendings(db: Db, txn: &RoTxn) -> Result<Vec<(Address, Hash, Pending)>, StoreError> {
    let mut out = Vec::new();
    for item in db.prefix_iter(txn, &[prefix::PENDING])? {
        let (key, value) = item?;
        if key.len() != 65 {
            return Err(StoreError::Corrupt("pending key has wrong length".into()));
        }
        let mut destination = [0u8; 32];
        destination.copy_from_slice(&key[1..33]);
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&key[33..]);
        out.push((
            Address::new(destination),
            Hash::new(hash),
            Pending::decode(value)?,
        ));
    }
    Ok(out)
}

fn representation(db: Db, txn: &RoTxn, address: &Address) -> Result<Balance, StoreError> {
    match db.get(txn, &address_key(prefix::REPRESENTATION, address))? {
        None => Ok(Balance::ZERO),
        Some(value) => {
            let bytes: [u8; 16] = value
                .try_into()
                .map_err(|_| StoreError::Corrupt("representation value is not a balance".into()))?;
            Ok(Balance::from_be_bytes(bytes))
        }
    }
}

fn representations(db: Db, txn: &RoTxn) -> Result<Vec<(Address, Balance)>, StoreError> {
    let mut out = Vec::new();
    for item in db.prefix_iter(txn, &[prefix::REPRESENTATION])? {
        let (key, value) = item?;
        let address: [u8; 32] = key[1..]
            .try_into()
            .map_err(|_| StoreError::Corrupt("representation key is not an address".into()))?;
        let bytes: [u8; 16] = value
            .try_into()
            .map_err(|_| StoreError::Corrupt("representation value is not a balance".into()))?;
        out.push((Address::new(address), Balance::from_be_bytes(bytes)));
    }
    Ok(out)
}

fn addresses(db: Db, txn: &RoTxn) -> Result<Vec<(Address, AddressInfo)>, StoreError> {
    let mut out = Vec::new();
    for item in db.prefix_iter(txn, &[prefix::ADDRESS])? {
        let (key, value) = item?;
        let address: [u8; 32] = key[1..]
            .try_into()
            .map_err(|_| StoreError::Corrupt("address key has wrong length".into()))?;
        out.push((Address::new(address), AddressInfo::decode(value)?));
    }
    Ok(out)
}

// ── Read-only transaction ──────────────────────────────────────────────

pub struct StoreReader<'env> {
    txn: RoTxn<'env>,
    db: Db,
}

impl<'env> StoreReader<'env> {
    pub(crate) fn new(txn: RoTxn<'env>, db: Db) -> Self {
        Self { txn, db }
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        is_empty(self.db, &self.txn)
    }

    pub fn has_block(&self, hash: &Hash) -> Result<bool, StoreError> {
        has_raw(self.db, &self.txn, &hash_key(prefix::BLOCK, hash))
    }

    pub fn get_block(&self, hash: &Hash) -> Result<Block, StoreError> {
        get_block(self.db, &self.txn, hash)
    }

    pub fn count_blocks(&self) -> Result<u64, StoreError> {
        count_prefix(self.db, &self.txn, prefix::BLOCK)
    }

    pub fn has_unchecked(&self, parent: &Hash, kind: UncheckedKind) -> Result<bool, StoreError> {
        has_raw(self.db, &self.txn, &hash_key(kind.prefix(), parent))
    }

    pub fn get_unchecked(&self, parent: &Hash, kind: UncheckedKind) -> Result<Block, StoreError> {
        get_unchecked(self.db, &self.txn, parent, kind)
    }

    pub fn count_unchecked_blocks(&self) -> Result<u64, StoreError> {
        Ok(count_prefix(self.db, &self.txn, prefix::UNCHECKED_PREVIOUS)?
            + count_prefix(self.db, &self.txn, prefix::UNCHECKED_SOURCE)?)
    }

    pub fn has_address(&self, address: &Address) -> Result<bool, StoreError> {
        has_raw(self.db, &self.txn, &address_key(prefix::ADDRESS, address))
    }

    pub fn get_address_info(&self, address: &Address) -> Result<AddressInfo, StoreError> {
        get_address_info(self.db, &self.txn, address)
    }

    pub fn addresses(&self) -> Result<Vec<(Address, AddressInfo)>, StoreError> {
        addresses(self.db, &self.txn)
    }

    pub fn get_frontier(&self, hash: &Hash) -> Result<Frontier, StoreError> {
        get_frontier(self.db, &self.txn, hash)
    }

    pub fn frontiers(&self) -> Result<Vec<Frontier>, StoreError> {
        frontiers(self.db, &self.txn)
    }

    pub fn count_frontiers(&self) -> Result<u64, StoreError> {
        count_prefix(self.db, &self.txn, prefix::FRONTIER)
    }

    pub fn get_pending(&self, destination: &Address, hash: &Hash) -> Result<Pending, StoreError> {
        get_pending(self.db, &self.txn, destination, hash)
    }

    pub fn pendings(&self) -> Result<Vec<(Address, Hash, Pending)>, StoreError> {
        pendings(self.db, &self.txn)
    }

    pub fn representation(&self, address: &Address) -> Result<Balance, StoreError> {
        representation(self.db, &self.txn, address)
    }

    pub fn representations(&self) -> Result<Vec<(Address, Balance)>, StoreError> {
        representations(self.db, &self.txn)
    }
}

// ── Read-write transaction ─────────────────────────────────────────────

pub struct StoreWriter<'env> {
    txn: RwTxn<'env>,
    db: Db,
}

impl<'env> StoreWriter<'env> {
    pub(crate) fn new(txn: RwTxn<'env>, db: Db) -> Self {
        Self { txn, db }
    }

    pub(crate) fn commit(self) -> Result<(), StoreError> {
        self.txn.commit()?;
        Ok(())
    }

    fn insert(&mut self, key: &[u8], value: &[u8], what: &'static str) -> Result<(), StoreError> {
        if self.db.get(&self.txn, key)?.is_some() {
            return Err(StoreError::AlreadyExists(what));
        }
        self.db.put(&mut self.txn, key, value)?;
        Ok(())
    }

    // reads, mirrored from `StoreReader`

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        is_empty(self.db, &self.txn)
    }

    pub fn has_block(&self, hash: &Hash) -> Result<bool, StoreError> {
        has_raw(self.db, &self.txn, &hash_key(prefix::BLOCK, hash))
    }

    pub fn get_block(&self, hash: &Hash) -> Result<Block, StoreError> {
        get_block(self.db, &self.txn, hash)
    }

    pub fn count_blocks(&self) -> Result<u64, StoreError> {
        count_prefix(self.db, &self.txn, prefix::BLOCK)
    }

    pub fn has_unchecked(&self, parent: &Hash, kind: UncheckedKind) -> Result<bool, StoreError> {
        has_raw(self.db, &self.txn, &hash_key(kind.prefix(), parent))
    }

    pub fn get_unchecked(&self, parent: &Hash, kind: UncheckedKind) -> Result<Block, StoreError> {
        get_unchecked(self.db, &self.txn, parent, kind)
    }

    pub fn count_unchecked_blocks(&self) -> Result<u64, StoreError> {
        Ok(count_prefix(self.db, &self.txn, prefix::UNCHECKED_PREVIOUS)?
            + count_prefix(self.db, &self.txn, prefix::UNCHECKED_SOURCE)?)
    }

    pub fn has_address(&self, address: &Address) -> Result<bool, StoreError> {
        has_raw(self.db, &self.txn, &address_key(prefix::ADDRESS, address))
    }

    pub fn get_address_info(&self, address: &Address) -> Result<AddressInfo, StoreError> {
        get_address_info(self.db, &self.txn, address)
    }

    pub fn get_frontier(&self, hash: &Hash) -> Result<Frontier, StoreError> {
        get_frontier(self.db, &self.txn, hash)
    }

    pub fn get_pending(&self, destination: &Address, hash: &Hash) -> Result<Pending, StoreError> {
        get_pending(self.db, &self.txn, destination, hash)
    }

    pub fn representation(&self, address: &Address) -> Result<Balance, StoreError> {
        representation(self.db, &self.txn, address)
    }

    // writes

    /// Insert a block keyed by its hash; the variant tag is stored inline
    /// ahead of the payload.
    pub fn add_block(&mut self, block: &Block) -> Result<(), StoreError> {
        let key = hash_key(prefix::BLOCK, &block.hash());
        self.insert(&key, &block.encode_tagged(), "block")
    }

    pub fn add_unchecked(
        &mut self,
        parent: &Hash,
        kind: UncheckedKind,
        block: &Block,
    ) -> Result<(), StoreError> {
        let key = hash_key(kind.prefix(), parent);
        self.insert(&key, &block.encode_tagged(), "unchecked block")
    }

    pub fn delete_unchecked(&mut self, parent: &Hash, kind: UncheckedKind) -> Result<(), StoreError> {
        self.db.delete(&mut self.txn, &hash_key(kind.prefix(), parent))?;
        Ok(())
    }

    pub fn add_address_info(
        &mut self,
        address: &Address,
        info: &AddressInfo,
    ) -> Result<(), StoreError> {
        let key = address_key(prefix::ADDRESS, address);
        self.insert(&key, &info.encode(), "address")
    }

    pub fn update_address_info(
        &mut self,
        address: &Address,
        info: &AddressInfo,
    ) -> Result<(), StoreError> {
        let key = address_key(prefix::ADDRESS, address);
        self.db.put(&mut self.txn, &key, &info.encode())?;
        Ok(())
    }

    pub fn add_frontier(&mut self, frontier: &Frontier) -> Result<(), StoreError> {
        let key = hash_key(prefix::FRONTIER, &frontier.hash);
        self.insert(&key, frontier.address.as_bytes(), "frontier")
    }

    pub fn delete_frontier(&mut self, hash: &Hash) -> Result<(), StoreError> {
        self.db.delete(&mut self.txn, &hash_key(prefix::FRONTIER, hash))?;
        Ok(())
    }

    pub fn add_pending(
        &mut self,
        destination: &Address,
        hash: &Hash,
        pending: &Pending,
    ) -> Result<(), StoreError> {
        let key = pending_key(destination, hash);
        self.insert(&key, &pending.encode(), "pending transaction")
    }

    pub fn delete_pending(&mut self, destination: &Address, hash: &Hash) -> Result<(), StoreError> {
        self.db.delete(&mut self.txn, &pending_key(destination, hash))?;
        Ok(())
    }

    /// Credit voting weight to a representative.
    pub fn add_representation(
        &mut self,
        address: &Address,
        amount: Balance,
    ) -> Result<(), StoreError> {
        let current = representation(self.db, &self.txn, address)?;
        let updated = current
            .checked_add(amount)
            .ok_or_else(|| StoreError::Corrupt("representation overflow".into()))?;
        self.set_representation(address, updated)
    }

    /// Debit voting weight from a representative. Saturates at zero: the
    /// genesis account never receives an initial representation entry, so
    /// its first outgoing spends debit an empty balance.
    pub fn sub_representation(
        &mut self,
        address: &Address,
        amount: Balance,
    ) -> Result<(), StoreError> {
        let current = representation(self.db, &self.txn, address)?;
        self.set_representation(address, current.saturating_sub(amount))
    }

    fn set_representation(&mut self, address: &Address, amount: Balance) -> Result<(), StoreError> {
        let key = address_key(prefix::REPRESENTATION, address);
        self.db.put(&mut self.txn, &key, &amount.to_be_bytes())?;
        Ok(())
    }
}
