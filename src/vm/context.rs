//! Execution context handed to the VM by the embedder.

use crate::types::id::{Id, ShortId};

/// Identity of the chain instance a VM runs.
///
/// Built by the embedding node and passed to
/// [`TimestampVm::initialize`](crate::vm::TimestampVm::initialize); the VM
/// itself only reads it for log attribution.
#[derive(Clone, Debug)]
pub struct Context {
    /// Network this node participates in.
    pub network_id: u32,
    /// Chain this VM instance runs.
    pub chain_id: Id,
    /// This node's identity.
    pub node_id: ShortId,
}

impl Context {
    /// Creates a context for the given network, chain, and node.
    pub fn new(network_id: u32, chain_id: Id, node_id: ShortId) -> Context {
        Context {
            network_id,
            chain_id,
            node_id,
        }
    }
}
