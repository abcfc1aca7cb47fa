//! RocksDB-backed database for durable nodes.

use crate::storage::{Database, DatabaseError};
use rocksdb::{Options, WriteBatch, DB};
use std::collections::BTreeMap;
use std::path::Path;

/// Persistent key/value store over RocksDB.
///
/// Writes are staged in an overlay and flushed through a single
/// [`WriteBatch`] on commit, so a commit is atomic with respect to process
/// crashes: either every staged write lands or none does.
pub struct RocksDb {
    db: DB,
    staged: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    closed: bool,
}

impl RocksDb {
    /// Opens (or creates) a database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<RocksDb, DatabaseError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path).map_err(|err| DatabaseError::Backend(err.to_string()))?;
        Ok(RocksDb {
            db,
            staged: BTreeMap::new(),
            closed: false,
        })
    }

    fn check_open(&self) -> Result<(), DatabaseError> {
        if self.closed {
            return Err(DatabaseError::Closed);
        }
        Ok(())
    }
}

impl Database for RocksDb {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, DatabaseError> {
        self.check_open()?;
        if let Some(staged) = self.staged.get(key) {
            return Ok(staged.clone());
        }
        self.db
            .get(key)
            .map_err(|err| DatabaseError::Backend(err.to_string()))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), DatabaseError> {
        self.check_open()?;
        self.staged.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), DatabaseError> {
        self.check_open()?;
        self.staged.insert(key.to_vec(), None);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DatabaseError> {
        self.check_open()?;
        if self.staged.is_empty() {
            return Ok(());
        }
        let mut batch = WriteBatch::default();
        for (key, value) in std::mem::take(&mut self.staged) {
            match value {
                Some(value) => batch.put(&key, &value),
                None => batch.delete(&key),
            }
        }
        self.db
            .write(batch)
            .map_err(|err| DatabaseError::Backend(err.to_string()))
    }

    fn close(&mut self) -> Result<(), DatabaseError> {
        self.check_open()?;
        self.commit()?;
        self.db
            .flush()
            .map_err(|err| DatabaseError::Backend(err.to_string()))?;
        self.closed = true;
        Ok(())
    }
}
