//! Core of a proof-of-stake platform node.
//!
//! Two subsystems carry the weight: the deterministic big-endian wire codec
//! ([`types::packer`], [`types::fields`]) used for all on-disk and on-wire
//! serialization, and the timestamp chain VM ([`vm::TimestampVm`]) that
//! implements the platform's pluggable chain contract for an external
//! consensus engine. Consensus itself, networking, staking, and RPC
//! transport are collaborators of this crate, not part of it.

pub mod core;
pub mod storage;
pub mod types;
pub mod vm;
