//! Chain block record with canonical serialization and lifecycle state.

use crate::types::id::{Id, ID_LEN};
use crate::types::packer::{Packer, PackerError, INT_LEN, LONG_LEN};
use std::fmt;
use thiserror::Error;

/// Length of a block's data payload in bytes.
pub const DATA_LEN: usize = 32;

/// Length of a block's canonical serialized form in bytes.
///
/// Layout, big-endian throughout:
/// `parent_id (32) | status (4) | data (32) | timestamp (8)`.
pub const BLOCK_BYTE_LEN: usize = ID_LEN + INT_LEN + DATA_LEN + LONG_LEN;

/// Number of seconds a block timestamp may run ahead of wallclock.
pub const FUTURE_TOLERANCE_SECS: i64 = 3600;

/// Lifecycle state of a block.
///
/// `Unknown` is the pre-parse state. A block enters `Processing` once handed
/// to the consensus engine, and reaches exactly one of the terminal states
/// `Accepted` or `Rejected`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Status {
    Unknown = 0,
    Processing = 1,
    Rejected = 2,
    Accepted = 3,
}

impl Status {
    /// Returns the wire discriminant of this status.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Maps a wire discriminant back to a status.
    pub fn from_u32(val: u32) -> Option<Status> {
        match val {
            0 => Some(Status::Unknown),
            1 => Some(Status::Processing),
            2 => Some(Status::Rejected),
            3 => Some(Status::Accepted),
            _ => None,
        }
    }

    /// Returns `true` for the terminal states.
    pub fn is_decided(self) -> bool {
        matches!(self, Status::Accepted | Status::Rejected)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Unknown => write!(f, "Unknown"),
            Status::Processing => write!(f, "Processing"),
            Status::Rejected => write!(f, "Rejected"),
            Status::Accepted => write!(f, "Accepted"),
        }
    }
}

/// Errors raised while constructing, parsing, or validating a block.
#[derive(Debug, Error)]
pub enum BlockError {
    /// Serialized block is not exactly 76 bytes.
    #[error("block must be exactly 76 bytes, got {0}")]
    InvalidLength(usize),
    /// Serialized status word is not a known discriminant.
    #[error("unknown block status {0}")]
    InvalidStatus(u32),
    /// Block timestamp precedes its parent's timestamp.
    #[error("block timestamp {actual} precedes parent timestamp {parent}")]
    TimestampBeforeParent { actual: i64, parent: i64 },
    /// Block timestamp runs too far ahead of wallclock.
    #[error("block timestamp {actual} is more than 3600s ahead of wallclock {now}")]
    TimestampTooFar { actual: i64, now: i64 },
    /// The codec reported an error while encoding or decoding.
    #[error("codec: {0}")]
    Codec(#[from] PackerError),
}

/// A chain entry: parent reference, 32-byte payload, Unix timestamp.
///
/// The canonical encoding is produced exactly once, at construction or parse
/// time, and is immutable thereafter; the id is the SHA-256 digest of those
/// bytes. The status word written into the encoding is the status the block
/// carries at that moment, which for locally constructed blocks is always
/// `Unknown`, so an id never depends on the block's later lifecycle. The
/// `status` field on the value is a lifecycle snapshot; the VM is
/// authoritative while running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    parent_id: Id,
    data: [u8; DATA_LEN],
    timestamp: i64,
    bytes: Vec<u8>,
    id: Id,
    status: Status,
}

impl Block {
    /// Constructs a block and derives its canonical bytes and id.
    pub fn new(parent_id: Id, data: [u8; DATA_LEN], timestamp: i64) -> Result<Block, BlockError> {
        let bytes = encode(parent_id, Status::Unknown, &data, timestamp)?;
        let id = Id::sha256(&bytes);
        Ok(Block {
            parent_id,
            data,
            timestamp,
            bytes,
            id,
            status: Status::Unknown,
        })
    }

    /// Parses a block from its canonical 76-byte serialized form.
    ///
    /// The id is recomputed from the input bytes; the embedded status word is
    /// validated but does not become the block's lifecycle state, which
    /// starts at `Unknown` until the VM assigns one.
    pub fn parse(bytes: &[u8]) -> Result<Block, BlockError> {
        if bytes.len() != BLOCK_BYTE_LEN {
            return Err(BlockError::InvalidLength(bytes.len()));
        }

        let mut packer = Packer::from_bytes(bytes.to_vec());
        let parent_raw = packer.unpack_fixed_bytes(ID_LEN);
        let status_word = packer.unpack_int();
        let data_raw = packer.unpack_fixed_bytes(DATA_LEN);
        let timestamp = packer.unpack_long() as i64;
        if let Some(err) = packer.errors().first() {
            return Err(BlockError::Codec(*err));
        }

        Status::from_u32(status_word).ok_or(BlockError::InvalidStatus(status_word))?;

        // Lengths were checked above, so both conversions hold.
        let parent_id = Id::from_slice(&parent_raw).expect("parent id is 32 bytes");
        let mut data = [0u8; DATA_LEN];
        data.copy_from_slice(&data_raw);

        Ok(Block {
            parent_id,
            data,
            timestamp,
            bytes: bytes.to_vec(),
            id: Id::sha256(bytes),
            status: Status::Unknown,
        })
    }

    /// Returns the block's id, the SHA-256 digest of its canonical bytes.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Returns the id of the block's parent.
    pub fn parent_id(&self) -> Id {
        self.parent_id
    }

    /// Returns the block's 32-byte payload.
    pub fn data(&self) -> &[u8; DATA_LEN] {
        &self.data
    }

    /// Returns the block's Unix timestamp in seconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Returns the block's canonical serialized form.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the block's lifecycle status snapshot.
    pub fn status(&self) -> Status {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// Checks this block's timestamp against its parent and the wallclock.
    ///
    /// Valid iff `parent.timestamp ≤ timestamp ≤ now + 3600`.
    pub fn verify_timestamp(&self, parent: &Block, now: i64) -> Result<(), BlockError> {
        if self.timestamp < parent.timestamp {
            return Err(BlockError::TimestampBeforeParent {
                actual: self.timestamp,
                parent: parent.timestamp,
            });
        }
        if self.timestamp > now + FUTURE_TOLERANCE_SECS {
            return Err(BlockError::TimestampTooFar {
                actual: self.timestamp,
                now,
            });
        }
        Ok(())
    }
}

fn encode(
    parent_id: Id,
    status: Status,
    data: &[u8; DATA_LEN],
    timestamp: i64,
) -> Result<Vec<u8>, PackerError> {
    let mut packer = Packer::new(BLOCK_BYTE_LEN);
    packer.pack_fixed_bytes(parent_id.as_slice());
    packer.pack_int(status.as_u32());
    packer.pack_fixed_bytes(data);
    packer.pack_long(timestamp as u64);
    if let Some(err) = packer.errors().first() {
        return Err(*err);
    }
    Ok(packer.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(data: &[u8]) -> [u8; DATA_LEN] {
        let mut out = [0u8; DATA_LEN];
        out[..data.len()].copy_from_slice(data);
        out
    }

    #[test]
    fn serialized_layout_is_76_bytes() {
        let block = Block::new(Id([9u8; 32]), padded(b"payload"), 1234).unwrap();
        let bytes = block.bytes();
        assert_eq!(bytes.len(), BLOCK_BYTE_LEN);
        assert_eq!(&bytes[..32], &[9u8; 32]);
        assert_eq!(&bytes[32..36], &[0, 0, 0, 0]);
        assert_eq!(&bytes[36..68], block.data());
        assert_eq!(&bytes[68..76], &1234u64.to_be_bytes());
    }

    #[test]
    fn id_is_sha256_of_canonical_bytes() {
        let block = Block::new(Id::zero(), padded(b"hello"), 0).unwrap();

        let mut expected = Vec::with_capacity(BLOCK_BYTE_LEN);
        expected.extend_from_slice(&[0u8; 32]);
        expected.extend_from_slice(&[0u8; 4]);
        expected.extend_from_slice(b"hello");
        expected.extend_from_slice(&[0u8; 27]);
        expected.extend_from_slice(&[0u8; 8]);

        assert_eq!(block.bytes(), expected.as_slice());
        assert_eq!(block.id(), Id::sha256(&expected));
    }

    #[test]
    fn id_is_independent_of_lifecycle_state() {
        let mut block = Block::new(Id::zero(), padded(b"x"), 7).unwrap();
        let id = block.id();
        block.set_status(Status::Processing);
        block.set_status(Status::Accepted);
        assert_eq!(block.id(), id);
    }

    #[test]
    fn parse_roundtrips_construction() {
        let block = Block::new(Id([3u8; 32]), padded(b"round"), 99).unwrap();
        let parsed = Block::parse(block.bytes()).unwrap();

        assert_eq!(parsed.id(), block.id());
        assert_eq!(parsed.parent_id(), block.parent_id());
        assert_eq!(parsed.data(), block.data());
        assert_eq!(parsed.timestamp(), block.timestamp());
        assert_eq!(parsed.bytes(), block.bytes());
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(matches!(
            Block::parse(&[0u8; 75]),
            Err(BlockError::InvalidLength(75))
        ));
        assert!(matches!(
            Block::parse(&[0u8; 77]),
            Err(BlockError::InvalidLength(77))
        ));
        assert!(matches!(
            Block::parse(&[]),
            Err(BlockError::InvalidLength(0))
        ));
    }

    #[test]
    fn parse_rejects_unknown_status_word() {
        let block = Block::new(Id::zero(), padded(b"x"), 0).unwrap();
        let mut bytes = block.bytes().to_vec();
        bytes[32..36].copy_from_slice(&9u32.to_be_bytes());
        assert!(matches!(
            Block::parse(&bytes),
            Err(BlockError::InvalidStatus(9))
        ));
    }

    #[test]
    fn negative_timestamp_roundtrips() {
        let block = Block::new(Id::zero(), padded(b"t"), -1).unwrap();
        let parsed = Block::parse(block.bytes()).unwrap();
        assert_eq!(parsed.timestamp(), -1);
    }

    #[test]
    fn timestamp_before_parent_fails_verification() {
        let parent = Block::new(Id::zero(), padded(b"p"), 100).unwrap();
        let child = Block::new(parent.id(), padded(b"c"), 99).unwrap();
        assert!(matches!(
            child.verify_timestamp(&parent, 100),
            Err(BlockError::TimestampBeforeParent { actual: 99, parent: 100 })
        ));
    }

    #[test]
    fn timestamp_too_far_ahead_fails_verification() {
        let parent = Block::new(Id::zero(), padded(b"p"), 100).unwrap();
        let child = Block::new(parent.id(), padded(b"c"), 100 + FUTURE_TOLERANCE_SECS + 1).unwrap();
        assert!(matches!(
            child.verify_timestamp(&parent, 100),
            Err(BlockError::TimestampTooFar { .. })
        ));
    }

    #[test]
    fn timestamp_within_bounds_verifies() {
        let parent = Block::new(Id::zero(), padded(b"p"), 100).unwrap();
        let child = Block::new(parent.id(), padded(b"c"), 100).unwrap();
        assert!(child.verify_timestamp(&parent, 100).is_ok());

        let at_limit = Block::new(parent.id(), padded(b"c"), 100 + FUTURE_TOLERANCE_SECS).unwrap();
        assert!(at_limit.verify_timestamp(&parent, 100).is_ok());
    }

    #[test]
    fn status_wire_discriminants_roundtrip() {
        for status in [
            Status::Unknown,
            Status::Processing,
            Status::Rejected,
            Status::Accepted,
        ] {
            assert_eq!(Status::from_u32(status.as_u32()), Some(status));
        }
        assert_eq!(Status::from_u32(4), None);
    }

    #[test]
    fn only_terminal_statuses_are_decided() {
        assert!(Status::Accepted.is_decided());
        assert!(Status::Rejected.is_decided());
        assert!(!Status::Processing.is_decided());
        assert!(!Status::Unknown.is_decided());
    }
}
