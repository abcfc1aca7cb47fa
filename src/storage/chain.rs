//! Typed chain store layered on the database collaborator.

use crate::core::block::{Block, Status};
use crate::storage::{Database, DatabaseError};
use crate::types::id::Id;

/// Key layout within the backing database.
///
/// Block bytes and lifecycle status are separate records: the canonical
/// bytes are written once and never rewritten, while the status record
/// follows the block through its lifecycle.
mod keys {
    /// Prefix for canonical block bytes, keyed by block id.
    pub const BLOCK_PREFIX: &[u8] = b"block/";
    /// Prefix for block lifecycle status, keyed by block id.
    pub const STATUS_PREFIX: &[u8] = b"status/";
    /// Id of the deepest accepted block.
    pub const LAST_ACCEPTED: &[u8] = b"last_accepted";
    /// Id of the block the VM would currently extend.
    pub const PREFERRED: &[u8] = b"preferred";
    /// Sentinel marking a bootstrapped database.
    pub const INITIALIZED: &[u8] = b"initialized";
}

fn block_key(id: Id) -> Vec<u8> {
    let mut key = Vec::with_capacity(keys::BLOCK_PREFIX.len() + id.as_slice().len());
    key.extend_from_slice(keys::BLOCK_PREFIX);
    key.extend_from_slice(id.as_slice());
    key
}

fn status_key(id: Id) -> Vec<u8> {
    let mut key = Vec::with_capacity(keys::STATUS_PREFIX.len() + id.as_slice().len());
    key.extend_from_slice(keys::STATUS_PREFIX);
    key.extend_from_slice(id.as_slice());
    key
}

/// Durable chain state: blocks, statuses, and chain tips.
///
/// A thin typed façade over the [`Database`] collaborator; all writes are
/// staged in the database and reach disk on [`ChainStore::commit`].
pub struct ChainStore<D: Database> {
    db: D,
}

impl<D: Database> ChainStore<D> {
    /// Wraps a database handle.
    pub fn new(db: D) -> ChainStore<D> {
        ChainStore { db }
    }

    /// Returns `true` once the database has been bootstrapped with genesis.
    pub fn is_initialized(&self) -> Result<bool, DatabaseError> {
        Ok(self.db.get(keys::INITIALIZED)?.is_some())
    }

    /// Marks the database as bootstrapped.
    pub fn set_initialized(&mut self) -> Result<(), DatabaseError> {
        self.db.put(keys::INITIALIZED, &[1])
    }

    /// Stages a block's canonical bytes and its lifecycle status.
    pub fn put_block(&mut self, block: &Block, status: Status) -> Result<(), DatabaseError> {
        self.db.put(&block_key(block.id()), block.bytes())?;
        self.db
            .put(&status_key(block.id()), &status.as_u32().to_be_bytes())
    }

    /// Returns the stored block with its durable status attached.
    pub fn get_block(&self, id: Id) -> Result<Option<Block>, DatabaseError> {
        let Some(bytes) = self.db.get(&block_key(id))? else {
            return Ok(None);
        };
        let mut block = Block::parse(&bytes).map_err(|err| DatabaseError::Corrupt {
            key: format!("block/{}", id),
            reason: err.to_string(),
        })?;
        let status = self.get_status(id)?.unwrap_or(Status::Unknown);
        block.set_status(status);
        Ok(Some(block))
    }

    /// Returns `true` if a block with the given id is stored.
    pub fn has_block(&self, id: Id) -> Result<bool, DatabaseError> {
        Ok(self.db.get(&block_key(id))?.is_some())
    }

    /// Returns the stored lifecycle status of a block.
    pub fn get_status(&self, id: Id) -> Result<Option<Status>, DatabaseError> {
        let Some(raw) = self.db.get(&status_key(id))? else {
            return Ok(None);
        };
        let word = raw
            .as_slice()
            .try_into()
            .map(u32::from_be_bytes)
            .map_err(|_| DatabaseError::Corrupt {
                key: format!("status/{}", id),
                reason: format!("expected 4 bytes, got {}", raw.len()),
            })?;
        let status = Status::from_u32(word).ok_or_else(|| DatabaseError::Corrupt {
            key: format!("status/{}", id),
            reason: format!("unknown status word {}", word),
        })?;
        Ok(Some(status))
    }

    /// Returns the id of the deepest accepted block.
    pub fn last_accepted(&self) -> Result<Option<Id>, DatabaseError> {
        self.get_id(keys::LAST_ACCEPTED)
    }

    /// Stages an update of the deepest accepted block.
    pub fn set_last_accepted(&mut self, id: Id) -> Result<(), DatabaseError> {
        self.db.put(keys::LAST_ACCEPTED, id.as_slice())
    }

    /// Returns the id of the preferred tip.
    pub fn preferred(&self) -> Result<Option<Id>, DatabaseError> {
        self.get_id(keys::PREFERRED)
    }

    /// Stages an update of the preferred tip.
    pub fn set_preferred(&mut self, id: Id) -> Result<(), DatabaseError> {
        self.db.put(keys::PREFERRED, id.as_slice())
    }

    /// Flushes all staged writes atomically.
    pub fn commit(&mut self) -> Result<(), DatabaseError> {
        self.db.commit()
    }

    /// Flushes and closes the backing database.
    pub fn close(&mut self) -> Result<(), DatabaseError> {
        self.db.close()
    }

    fn get_id(&self, key: &[u8]) -> Result<Option<Id>, DatabaseError> {
        let Some(raw) = self.db.get(key)? else {
            return Ok(None);
        };
        let id = Id::from_slice(&raw).ok_or_else(|| DatabaseError::Corrupt {
            key: String::from_utf8_lossy(key).into_owned(),
            reason: format!("expected 32 bytes, got {}", raw.len()),
        })?;
        Ok(Some(id))
    }
}
