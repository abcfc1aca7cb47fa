//! The timestamp chain VM.
//!
//! Implements the pluggable chain contract driven by an external consensus
//! engine: genesis bootstrap, mempool, block building and parsing, and the
//! Processing → Accepted/Rejected block lifecycle. Every block carries a
//! Unix timestamp and a 32-byte payload and chains on the preferred tip.
//!
//! Engine-driven operations (`build_block`, `parse_block`, `set_preference`,
//! `accept`, `reject`) come from one logical caller and take `&mut self`;
//! `propose_block` may run concurrently from the RPC side and touches only
//! the shared mempool and the engine doorbell.

use crate::core::block::{Block, Status, DATA_LEN};
use crate::core::mempool::Mempool;
use crate::storage::chain::ChainStore;
use crate::storage::{Database, DatabaseError};
use crate::types::id::Id;
use crate::vm::context::Context;
use crate::vm::engine::EngineNotifier;
use crate::vm::errors::VmError;
use crate::vm::service::Service;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Chain VM over a database collaborator `D`.
///
/// The VM is authoritative for block status while running: blocks handed to
/// the engine are value snapshots, and the engine refers back to them by id.
pub struct TimestampVm<D: Database> {
    ctx: Context,
    store: ChainStore<D>,
    mempool: Arc<Mempool>,
    engine: EngineNotifier,
    /// Undecided blocks, by id. Entries leave on accept or reject.
    processing: HashMap<Id, Block>,
    preferred: Id,
    last_accepted: Id,
}

impl<D: Database> TimestampVm<D> {
    /// Initializes the VM over `db`.
    ///
    /// On an empty database this bootstraps the chain: `genesis_data` (at
    /// most 32 bytes) is left-aligned into a zero-padded 32-byte payload and
    /// becomes the genesis block with the all-zero parent id and timestamp 0,
    /// persisted, marked accepted, and committed. On an already-initialized
    /// database the accepted and preferred tips are reloaded instead; a
    /// preferred tip that is missing or was rejected falls back to the
    /// accepted tip.
    pub fn initialize(
        ctx: Context,
        db: D,
        genesis_data: &[u8],
        engine: EngineNotifier,
    ) -> Result<TimestampVm<D>, VmError> {
        let mut store = ChainStore::new(db);

        let (last_accepted, preferred) = if !store.is_initialized()? {
            if genesis_data.len() > DATA_LEN {
                return Err(VmError::BadGenesisBytes(genesis_data.len()));
            }
            let mut data = [0u8; DATA_LEN];
            data[..genesis_data.len()].copy_from_slice(genesis_data);

            let genesis = Block::new(Id::zero(), data, 0)?;
            store.put_block(&genesis, Status::Accepted)?;
            store.set_last_accepted(genesis.id())?;
            store.set_preferred(genesis.id())?;
            store.set_initialized()?;
            store.commit()?;

            info!(
                network = ctx.network_id,
                chain = %ctx.chain_id,
                genesis = %genesis.id(),
                "initialized chain from genesis"
            );
            (genesis.id(), genesis.id())
        } else {
            let last_accepted =
                store
                    .last_accepted()?
                    .ok_or_else(|| DatabaseError::Corrupt {
                        key: "last_accepted".to_string(),
                        reason: "missing on initialized database".to_string(),
                    })?;
            let stored = store.preferred()?.unwrap_or(last_accepted);
            let preferred = match store.get_status(stored)? {
                Some(Status::Processing) | Some(Status::Accepted) => stored,
                _ => last_accepted,
            };

            info!(
                network = ctx.network_id,
                chain = %ctx.chain_id,
                last_accepted = %last_accepted,
                preferred = %preferred,
                "resumed chain from store"
            );
            (last_accepted, preferred)
        };

        Ok(TimestampVm {
            ctx,
            store,
            mempool: Arc::new(Mempool::new()),
            engine,
            processing: HashMap::new(),
            preferred,
            last_accepted,
        })
    }

    /// Queues a 32-byte payload for inclusion in a future block and rings
    /// the engine doorbell.
    ///
    /// Safe to call concurrently with the engine-driven operations.
    pub fn propose_block(&self, data: [u8; DATA_LEN]) {
        self.mempool.push(data);
        self.engine.notify();
    }

    /// Builds a block carrying the oldest pending payload on the preferred
    /// tip, persisting it as processing.
    ///
    /// Fails with [`VmError::NoPendingBlocks`] when the mempool is empty.
    /// When a backlog remains, the engine doorbell is rung again so the
    /// engine returns for the rest; the built block is registered before
    /// that signal fires.
    pub fn build_block(&mut self) -> Result<Block, VmError> {
        let Some(data) = self.mempool.pop() else {
            return Err(VmError::NoPendingBlocks);
        };

        let mut block = Block::new(self.preferred, data, unix_now())?;
        self.store.put_block(&block, Status::Processing)?;
        block.set_status(Status::Processing);
        self.processing.insert(block.id(), block.clone());

        debug!(block = %block.id(), parent = %block.parent_id(), "built block");

        if !self.mempool.is_empty() {
            self.engine.notify();
        }
        Ok(block)
    }

    /// Parses a block from its canonical bytes.
    ///
    /// A block already known, whether undecided or stored, is returned with its
    /// existing status so lifecycle identity is preserved; otherwise the
    /// block joins the processing set.
    pub fn parse_block(&mut self, bytes: &[u8]) -> Result<Block, VmError> {
        let mut block = Block::parse(bytes)?;
        if let Some(known) = self.processing.get(&block.id()) {
            return Ok(known.clone());
        }
        if let Some(stored) = self.store.get_block(block.id())? {
            return Ok(stored);
        }

        block.set_status(Status::Processing);
        self.processing.insert(block.id(), block.clone());
        debug!(block = %block.id(), "parsed new block");
        Ok(block)
    }

    /// Returns the block with the given id.
    pub fn get_block(&self, id: Id) -> Result<Block, VmError> {
        if let Some(block) = self.processing.get(&id) {
            return Ok(block.clone());
        }
        self.store.get_block(id)?.ok_or(VmError::NotFound(id))
    }

    /// Checks that a block may enter consensus: its parent must be known and
    /// undefeated, and its timestamp must lie between the parent's and one
    /// hour past wallclock.
    pub fn verify_block(&self, block: &Block) -> Result<(), VmError> {
        let parent = self
            .get_block(block.parent_id())
            .map_err(|_| VmError::NotFound(block.parent_id()))?;
        if parent.status() == Status::Rejected {
            return Err(VmError::RejectedAncestor {
                block: block.id(),
                parent: parent.id(),
            });
        }
        block.verify_timestamp(&parent, unix_now())?;
        Ok(())
    }

    /// Updates the tip the VM extends when asked to build.
    ///
    /// The id must name a known block that is processing or accepted.
    /// Preference never changes any block's status.
    pub fn set_preference(&mut self, id: Id) -> Result<(), VmError> {
        match self.status_of(id)? {
            None => Err(VmError::NotFound(id)),
            Some(status @ (Status::Unknown | Status::Rejected)) => {
                Err(VmError::InvalidPreference(id, status))
            }
            Some(_) => {
                self.preferred = id;
                self.store.set_preferred(id)?;
                Ok(())
            }
        }
    }

    /// Returns the id of the deepest accepted block.
    pub fn last_accepted(&self) -> Id {
        self.last_accepted
    }

    /// Returns the id of the preferred tip.
    pub fn preferred(&self) -> Id {
        self.preferred
    }

    /// Returns the number of payloads awaiting inclusion.
    pub fn mempool_len(&self) -> usize {
        self.mempool.len()
    }

    /// Marks a processing block as accepted, making it the chain tip.
    ///
    /// The block's parent must already be accepted. Undecided siblings (and
    /// their descendants) lose to the accepted block and are rejected; the
    /// chain is linear from the application's perspective. The decision is
    /// committed before returning; a persist failure here is fatal to the
    /// caller.
    pub fn accept(&mut self, id: Id) -> Result<(), VmError> {
        let block = self
            .processing
            .get(&id)
            .cloned()
            .ok_or(VmError::NotProcessing(id))?;

        if !matches!(self.status_of(block.parent_id())?, Some(Status::Accepted)) {
            return Err(VmError::ParentNotAccepted {
                block: id,
                parent: block.parent_id(),
            });
        }

        self.store.put_block(&block, Status::Accepted)?;
        self.store.set_last_accepted(id)?;
        self.last_accepted = id;
        self.processing.remove(&id);

        let siblings: Vec<Id> = self
            .processing
            .values()
            .filter(|candidate| candidate.parent_id() == block.parent_id())
            .map(|candidate| candidate.id())
            .collect();
        for sibling in siblings {
            self.reject_subtree(sibling)?;
        }

        if self.preferred != id && !self.processing.contains_key(&self.preferred) {
            self.preferred = id;
            self.store.set_preferred(id)?;
        }

        self.store.commit()?;
        info!(block = %id, timestamp = block.timestamp(), "accepted block");
        Ok(())
    }

    /// Marks a processing block as rejected, along with every undecided
    /// descendant.
    pub fn reject(&mut self, id: Id) -> Result<(), VmError> {
        if !self.processing.contains_key(&id) {
            return Err(VmError::NotProcessing(id));
        }
        self.reject_subtree(id)?;

        if self.preferred != self.last_accepted && !self.processing.contains_key(&self.preferred) {
            self.preferred = self.last_accepted;
            self.store.set_preferred(self.last_accepted)?;
        }

        self.store.commit()?;
        Ok(())
    }

    /// Returns the handler namespaces this VM exposes. There are no static
    /// handlers.
    pub fn create_handlers(&self) -> HashMap<&'static str, Service> {
        let mut handlers = HashMap::new();
        handlers.insert(
            "timestamp",
            Service::new(Arc::clone(&self.mempool), self.engine.clone()),
        );
        handlers
    }

    /// Commits pending writes, closes the database, and hangs up the engine
    /// doorbell.
    pub fn shutdown(mut self) -> Result<(), VmError> {
        self.store.commit()?;
        self.store.close()?;
        info!(chain = %self.ctx.chain_id, "vm shut down");
        Ok(())
    }

    fn status_of(&self, id: Id) -> Result<Option<Status>, VmError> {
        if let Some(block) = self.processing.get(&id) {
            return Ok(Some(block.status()));
        }
        Ok(self.store.get_status(id)?)
    }

    fn reject_subtree(&mut self, id: Id) -> Result<(), VmError> {
        let Some(block) = self.processing.remove(&id) else {
            return Ok(());
        };
        self.store.put_block(&block, Status::Rejected)?;
        warn!(block = %id, parent = %block.parent_id(), "rejected block");

        let children: Vec<Id> = self
            .processing
            .values()
            .filter(|candidate| candidate.parent_id() == id)
            .map(|candidate| candidate.id())
            .collect();
        for child in children {
            self.reject_subtree(child)?;
        }
        Ok(())
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}
