//! Handler bodies exposed under the VM's `"timestamp"` namespace.
//!
//! Transport plumbing (HTTP, JSON-RPC framing) belongs to the embedding
//! node; the service owns only the method semantics. It shares exactly two
//! things with the VM, the mempool and the engine doorbell, so proposing
//! is safe concurrently with the engine driving the VM.

use crate::core::block::DATA_LEN;
use crate::core::mempool::Mempool;
use crate::vm::engine::EngineNotifier;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by service methods.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The payload string is not valid hex.
    #[error("payload is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// The decoded payload is not exactly 32 bytes.
    #[error("payload must decode to exactly 32 bytes, got {0}")]
    BadLength(usize),
}

/// Arguments to [`Service::propose_block`].
#[derive(Clone, Debug)]
pub struct ProposeBlockArgs {
    /// Hex-encoded 32-byte payload, with or without a `0x` prefix.
    pub data: String,
}

/// Reply from [`Service::propose_block`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProposeBlockReply {
    pub success: bool,
}

/// The `"timestamp"` handler namespace.
pub struct Service {
    mempool: Arc<Mempool>,
    engine: EngineNotifier,
}

impl Service {
    pub(crate) fn new(mempool: Arc<Mempool>, engine: EngineNotifier) -> Service {
        Service { mempool, engine }
    }

    /// Queues a payload for inclusion in a future block and signals the
    /// consensus engine.
    pub fn propose_block(&self, args: ProposeBlockArgs) -> Result<ProposeBlockReply, ServiceError> {
        let payload = args.data.strip_prefix("0x").unwrap_or(&args.data);
        let raw = hex::decode(payload)?;
        let data: [u8; DATA_LEN] = raw
            .try_into()
            .map_err(|raw: Vec<u8>| ServiceError::BadLength(raw.len()))?;

        self.mempool.push(data);
        self.engine.notify();
        Ok(ProposeBlockReply { success: true })
    }
}
