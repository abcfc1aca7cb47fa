//! Fixed-size identifier types used throughout the chain.

use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a block or chain identifier in bytes.
pub const ID_LEN: usize = 32;

/// Length of an address-width identifier in bytes.
pub const SHORT_ID_LEN: usize = 20;

/// 32-byte opaque identifier.
///
/// Block ids are derived as the SHA-256 digest of the block's canonical
/// encoding. The all-zero id is reserved as the "empty/none" sentinel and is
/// used as the genesis block's parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Id(pub [u8; ID_LEN]);

impl Id {
    /// Returns the reserved all-zero identifier.
    pub const fn zero() -> Id {
        Id([0u8; ID_LEN])
    }

    /// Returns `true` if this is the reserved all-zero identifier.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ID_LEN]
    }

    /// Derives an identifier as the SHA-256 digest of `bytes`.
    pub fn sha256(bytes: &[u8]) -> Id {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Id(hasher.finalize().into())
    }

    /// Returns the identifier as a byte slice.
    pub const fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Creates an identifier from a byte slice.
    ///
    /// Returns `None` if the slice length is not exactly [`ID_LEN`] bytes.
    pub fn from_slice(slice: &[u8]) -> Option<Id> {
        if slice.len() != ID_LEN {
            return None;
        }
        let mut bytes = [0u8; ID_LEN];
        bytes.copy_from_slice(slice);
        Some(Id(bytes))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// 20-byte identifier for address-width values.
///
/// Carried by the typed field codec (`Addr` and `AddrList` kinds) and by peer
/// records during handshakes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ShortId(pub [u8; SHORT_ID_LEN]);

impl ShortId {
    /// Returns the all-zero short identifier.
    pub const fn zero() -> ShortId {
        ShortId([0u8; SHORT_ID_LEN])
    }

    /// Returns the identifier as a byte slice.
    pub const fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Creates a short identifier from a byte slice.
    ///
    /// Returns `None` if the slice length is not exactly [`SHORT_ID_LEN`] bytes.
    pub fn from_slice(slice: &[u8]) -> Option<ShortId> {
        if slice.len() != SHORT_ID_LEN {
            return None;
        }
        let mut bytes = [0u8; SHORT_ID_LEN];
        bytes.copy_from_slice(slice);
        Some(ShortId(bytes))
    }
}

impl fmt::Display for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
