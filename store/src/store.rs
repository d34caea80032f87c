//! LMDB environment setup and transaction entry points.

use std::fs;
use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::error::StoreError;
use crate::txn::{StoreReader, StoreWriter};

/// Default LMDB map size (1 GiB). LMDB maps lazily, so this only reserves
/// address space.
const DEFAULT_MAP_SIZE: usize = 1 << 30;

const MAX_DBS: u32 = 1;
const DB_NAME: &str = "ledger";

/// Handle to the ledger database. Cheap to clone; LMDB enforces
/// many-readers / single-writer itself.
#[derive(Clone, Debug)]
pub struct Store {
    env: Env,
    db: Database<Bytes, Bytes>,
}

impl Store {
    /// Open or create the store in the given directory. The directory is
    /// created mode 0700 if absent.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::open_with_map_size(path, DEFAULT_MAP_SIZE)
    }

    pub fn open_with_map_size(path: &Path, map_size: usize) -> Result<Self, StoreError> {
        create_data_dir(path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .max_dbs(MAX_DBS)
                .map_size(map_size)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let db = env.create_database(&mut wtxn, Some(DB_NAME))?;
        wtxn.commit()?;

        Ok(Self { env, db })
    }

    /// Run a read-only transaction.
    pub fn view<T, E>(&self, f: impl FnOnce(&StoreReader<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let txn = self.env.read_txn().map_err(StoreError::from)?;
        let reader = StoreReader::new(txn, self.db);
        f(&reader)
    }

    /// Run a read-write transaction. Commits when the closure returns
    /// `Ok`; any error aborts the whole batch.
    pub fn update<T, E>(&self, f: impl FnOnce(&mut StoreWriter<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let txn = self.env.write_txn().map_err(StoreError::from)?;
        let mut writer = StoreWriter::new(txn, self.db);
        let out = f(&mut writer)?;
        writer.commit().map_err(E::from)?;
        Ok(out)
    }

    /// Flush dirty pages before shutdown. Commits are already durable;
    /// this is belt and braces for the final exit path.
    pub fn force_sync(&self) -> Result<(), StoreError> {
        self.env.force_sync()?;
        Ok(())
    }
}

#[cfg(unix)]
fn create_data_dir(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::DirBuilderExt;
    if !path.exists() {
        fs::DirBuilder::new().recursive(true).mode(0o700).create(path)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn create_data_dir(path: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        let _store = Store::open(&path).unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn update_commits_and_view_reads() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let addr = lattice_types::Address::new([7u8; 32]);
        store
            .update::<_, StoreError>(|w| {
                w.add_representation(&addr, lattice_types::Balance::new(42))
            })
            .unwrap();

        let weight = store
            .view::<_, StoreError>(|r| r.representation(&addr))
            .unwrap();
        assert_eq!(weight, lattice_types::Balance::new(42));
    }

    #[test]
    fn failed_update_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let addr = lattice_types::Address::new([7u8; 32]);
        let result = store.update::<(), StoreError>(|w| {
            w.add_representation(&addr, lattice_types::Balance::new(42))?;
            Err(StoreError::KeyNotFound)
        });
        assert!(result.is_err());

        let weight = store
            .view::<_, StoreError>(|r| r.representation(&addr))
            .unwrap();
        assert_eq!(weight, lattice_types::Balance::ZERO);
    }
}
