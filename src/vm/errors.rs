//! Errors surfaced by the chain VM.

use crate::core::block::{BlockError, Status};
use crate::storage::DatabaseError;
use crate::types::id::Id;
use thiserror::Error;

/// Errors returned by [`TimestampVm`](crate::vm::TimestampVm) operations.
///
/// `NoPendingBlocks` and `NotFound` are recoverable: the operation was a
/// no-op and the caller may retry later. Errors raised during `initialize`
/// or while persisting an accept are fatal to the caller.
#[derive(Debug, Error)]
pub enum VmError {
    /// The mempool is empty; there is no block to propose.
    #[error("there is no block to propose")]
    NoPendingBlocks,
    /// Genesis data exceeds the 32-byte payload size.
    #[error("genesis data must be at most 32 bytes, got {0}")]
    BadGenesisBytes(usize),
    /// No block with the given id is known.
    #[error("block {0} not found")]
    NotFound(Id),
    /// The block is not awaiting a consensus decision.
    #[error("block {0} is not processing")]
    NotProcessing(Id),
    /// A block cannot be accepted before its parent.
    #[error("cannot accept block {block}: parent {parent} is not accepted")]
    ParentNotAccepted { block: Id, parent: Id },
    /// A block chains on a rejected ancestor.
    #[error("block {block} builds on rejected block {parent}")]
    RejectedAncestor { block: Id, parent: Id },
    /// Preference must name a processing or accepted block.
    #[error("cannot prefer block {0} with status {1}")]
    InvalidPreference(Id, Status),
    /// Block construction, parsing, or validation failed.
    #[error(transparent)]
    Block(#[from] BlockError),
    /// The storage collaborator failed.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}
