//! Core type definitions and the binary wire codec.
//!
//! This module provides the fundamental types used throughout the node:
//! - [`id`]: fixed-size identifiers (32-byte [`Id`](id::Id), 20-byte
//!   [`ShortId`](id::ShortId))
//! - [`ip`]: the IP/port descriptor carried on the wire
//! - [`packer`]: the sequential byte packer with accumulated-error semantics
//! - [`fields`]: the schema-driven field codec layered on the packer
//!
//! Every encoding is deterministic and big-endian; peers must agree
//! byte-for-byte on block content.

pub mod fields;
pub mod id;
pub mod ip;
pub mod packer;
