//! In-memory database for tests and ephemeral nodes.

use crate::storage::{Database, DatabaseError};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Staged in-memory key/value store.
///
/// Staged writes live in a per-handle overlay (`None` marks a staged
/// deletion) over a committed map shared between handles. [`MemDb::reopen`]
/// returns a fresh handle over the same committed state, discarding this
/// handle's stage, the equivalent of a process restart against the same
/// durable store.
#[derive(Debug, Default)]
pub struct MemDb {
    committed: Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>>,
    staged: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    closed: bool,
}

impl MemDb {
    /// Creates an empty database.
    pub fn new() -> MemDb {
        MemDb::default()
    }

    /// Returns a fresh handle over the same committed state.
    ///
    /// Staged, uncommitted writes on `self` are not visible to the new
    /// handle.
    pub fn reopen(&self) -> MemDb {
        MemDb {
            committed: Arc::clone(&self.committed),
            staged: BTreeMap::new(),
            closed: false,
        }
    }

    fn check_open(&self) -> Result<(), DatabaseError> {
        if self.closed {
            return Err(DatabaseError::Closed);
        }
        Ok(())
    }
}

impl Database for MemDb {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, DatabaseError> {
        self.check_open()?;
        if let Some(staged) = self.staged.get(key) {
            return Ok(staged.clone());
        }
        Ok(self.committed.lock().unwrap().get(key).cloned())
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
        let mut committed = self.committed.lock().unwrap();
        for (key, value) in std::mem::take(&mut self.staged) {
            match value {
                Some(value) => {
                    committed.insert(key, value);
                }
                None => {
                    committed.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), DatabaseError> {
        self.check_open()?;
        self.commit()?;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_writes_are_visible_to_same_handle() {
        let mut db = MemDb::new();
        db.put(b"k", b"v").unwrap();
        assert_eq!(db.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn uncommitted_writes_do_not_survive_reopen() {
        let mut db = MemDb::new();
        db.put(b"k", b"v").unwrap();

        let reopened = db.reopen();
        assert_eq!(reopened.get(b"k").unwrap(), None);
    }

    #[test]
    fn committed_writes_survive_reopen() {
        let mut db = MemDb::new();
        db.put(b"k", b"v").unwrap();
        db.commit().unwrap();

        let reopened = db.reopen();
        assert_eq!(reopened.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn staged_delete_shadows_committed_value() {
        let mut db = MemDb::new();
        db.put(b"k", b"v").unwrap();
        db.commit().unwrap();

        db.delete(b"k").unwrap();
        assert_eq!(db.get(b"k").unwrap(), None);

        // Not yet committed, so a reopen still sees the value.
        assert_eq!(db.reopen().get(b"k").unwrap(), Some(b"v".to_vec()));

        db.commit().unwrap();
        assert_eq!(db.reopen().get(b"k").unwrap(), None);
    }

    #[test]
    fn close_commits_pending_writes() {
        let mut db = MemDb::new();
        db.put(b"k", b"v").unwrap();
        let reopened = db.reopen();
        db.close().unwrap();

        assert_eq!(reopened.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert!(matches!(db.get(b"k"), Err(DatabaseError::Closed)));
        assert!(matches!(db.put(b"k", b"v"), Err(DatabaseError::Closed)));
    }

    #[test]
    fn last_staged_write_wins() {
        let mut db = MemDb::new();
        db.put(b"k", b"first").unwrap();
        db.put(b"k", b"second").unwrap();
        db.commit().unwrap();
        assert_eq!(db.get(b"k").unwrap(), Some(b"second".to_vec()));
    }
}
