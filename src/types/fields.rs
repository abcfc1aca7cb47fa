//! Schema-driven field codec over the [`Packer`] primitives.
//!
//! A higher-level schema engine dispatches encoding by field descriptor
//! without specializing per field. The supported wire types form a closed
//! set, so the dispatch is a tagged enum: [`FieldKind`] names the wire type
//! and [`FieldValue`] carries a value of one of those types. Packing a value
//! whose variant does not match the kind records [`PackerError::BadType`] on
//! the packer; wire output is identical to calling the primitives directly.

use crate::types::id::{Id, ShortId, ID_LEN, SHORT_ID_LEN};
use crate::types::ip::IpDesc;
use crate::types::packer::{Packer, PackerError};

/// Wire type of a schema field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Byte,
    Short,
    Int,
    Long,
    Hash,
    Addr,
    Hashes,
    AddrList,
    Bytes,
    Str,
    Ip,
    IpList,
}

/// A value of one of the supported wire types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Byte(u8),
    Short(u16),
    Int(u32),
    Long(u64),
    Hash(Id),
    Addr(ShortId),
    Hashes(Vec<Id>),
    AddrList(Vec<ShortId>),
    Bytes(Vec<u8>),
    Str(String),
    Ip(IpDesc),
    IpList(Vec<IpDesc>),
}

impl FieldValue {
    /// Returns the wire type this value belongs to.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Byte(_) => FieldKind::Byte,
            FieldValue::Short(_) => FieldKind::Short,
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Long(_) => FieldKind::Long,
            FieldValue::Hash(_) => FieldKind::Hash,
            FieldValue::Addr(_) => FieldKind::Addr,
            FieldValue::Hashes(_) => FieldKind::Hashes,
            FieldValue::AddrList(_) => FieldKind::AddrList,
            FieldValue::Bytes(_) => FieldKind::Bytes,
            FieldValue::Str(_) => FieldKind::Str,
            FieldValue::Ip(_) => FieldKind::Ip,
            FieldValue::IpList(_) => FieldKind::IpList,
        }
    }
}

impl FieldKind {
    /// Packs `value` if it matches this kind, recording
    /// [`PackerError::BadType`] otherwise.
    pub fn try_pack(self, packer: &mut Packer, value: &FieldValue) {
        match (self, value) {
            (FieldKind::Byte, FieldValue::Byte(v)) => packer.pack_byte(*v),
            (FieldKind::Short, FieldValue::Short(v)) => packer.pack_short(*v),
            (FieldKind::Int, FieldValue::Int(v)) => packer.pack_int(*v),
            (FieldKind::Long, FieldValue::Long(v)) => packer.pack_long(*v),
            (FieldKind::Hash, FieldValue::Hash(v)) => packer.pack_fixed_bytes(v.as_slice()),
            (FieldKind::Addr, FieldValue::Addr(v)) => packer.pack_fixed_bytes(v.as_slice()),
            (FieldKind::Hashes, FieldValue::Hashes(v)) => {
                let slices: Vec<Vec<u8>> = v.iter().map(|id| id.as_slice().to_vec()).collect();
                packer.pack_fixed_byte_slices(&slices);
            }
            (FieldKind::AddrList, FieldValue::AddrList(v)) => {
                let slices: Vec<Vec<u8>> = v.iter().map(|id| id.as_slice().to_vec()).collect();
                packer.pack_fixed_byte_slices(&slices);
            }
            (FieldKind::Bytes, FieldValue::Bytes(v)) => packer.pack_bytes(v),
            (FieldKind::Str, FieldValue::Str(v)) => packer.pack_str(v),
            (FieldKind::Ip, FieldValue::Ip(v)) => packer.pack_ip(*v),
            (FieldKind::IpList, FieldValue::IpList(v)) => packer.pack_ips(v),
            _ => packer.record(PackerError::BadType),
        }
    }

    /// Unpacks a value of this kind.
    ///
    /// Once the packer has errored the returned value is the kind's zero
    /// value, indistinguishable from genuine zero content; callers check
    /// [`Packer::errored`] afterwards.
    pub fn try_unpack(self, packer: &mut Packer) -> FieldValue {
        match self {
            FieldKind::Byte => FieldValue::Byte(packer.unpack_byte()),
            FieldKind::Short => FieldValue::Short(packer.unpack_short()),
            FieldKind::Int => FieldValue::Int(packer.unpack_int()),
            FieldKind::Long => FieldValue::Long(packer.unpack_long()),
            FieldKind::Hash => {
                let raw = packer.unpack_fixed_bytes(ID_LEN);
                FieldValue::Hash(Id::from_slice(&raw).unwrap_or_else(Id::zero))
            }
            FieldKind::Addr => {
                let raw = packer.unpack_fixed_bytes(SHORT_ID_LEN);
                FieldValue::Addr(ShortId::from_slice(&raw).unwrap_or_else(ShortId::zero))
            }
            FieldKind::Hashes => {
                let slices = packer.unpack_fixed_byte_slices(ID_LEN);
                FieldValue::Hashes(
                    slices
                        .iter()
                        .filter_map(|s| Id::from_slice(s))
                        .collect(),
                )
            }
            FieldKind::AddrList => {
                let slices = packer.unpack_fixed_byte_slices(SHORT_ID_LEN);
                FieldValue::AddrList(
                    slices
                        .iter()
                        .filter_map(|s| ShortId::from_slice(s))
                        .collect(),
                )
            }
            FieldKind::Bytes => FieldValue::Bytes(packer.unpack_bytes()),
            FieldKind::Str => FieldValue::Str(packer.unpack_str()),
            FieldKind::Ip => FieldValue::Ip(packer.unpack_ip()),
            FieldKind::IpList => FieldValue::IpList(packer.unpack_ips()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn roundtrip(kind: FieldKind, value: FieldValue) {
        let mut p = Packer::new(1024);
        kind.try_pack(&mut p, &value);
        assert!(!p.errored(), "pack failed for {:?}", kind);

        let mut p = Packer::from_bytes(p.into_bytes());
        assert_eq!(kind.try_unpack(&mut p), value);
        assert!(!p.errored(), "unpack failed for {:?}", kind);
        assert_eq!(p.remaining_space(), 0);
    }

    #[test]
    fn every_kind_roundtrips() {
        roundtrip(FieldKind::Byte, FieldValue::Byte(0x7F));
        roundtrip(FieldKind::Short, FieldValue::Short(0x1234));
        roundtrip(FieldKind::Int, FieldValue::Int(0xDEADBEEF));
        roundtrip(FieldKind::Long, FieldValue::Long(u64::MAX));
        roundtrip(FieldKind::Hash, FieldValue::Hash(Id([3u8; 32])));
        roundtrip(FieldKind::Addr, FieldValue::Addr(ShortId([4u8; 20])));
        roundtrip(
            FieldKind::Hashes,
            FieldValue::Hashes(vec![Id([1u8; 32]), Id([2u8; 32])]),
        );
        roundtrip(
            FieldKind::AddrList,
            FieldValue::AddrList(vec![ShortId([5u8; 20])]),
        );
        roundtrip(FieldKind::Bytes, FieldValue::Bytes(b"payload".to_vec()));
        roundtrip(FieldKind::Str, FieldValue::Str("timestamp".to_string()));
        roundtrip(
            FieldKind::Ip,
            FieldValue::Ip(IpDesc::new(IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4)), 9651)),
        );
        roundtrip(
            FieldKind::IpList,
            FieldValue::IpList(vec![
                IpDesc::new(IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4)), 9651),
                IpDesc::new(IpAddr::V4(Ipv4Addr::new(5, 6, 7, 8)), 9652),
            ]),
        );
    }

    #[test]
    fn kind_mismatch_records_bad_type() {
        let mut p = Packer::new(64);
        FieldKind::Int.try_pack(&mut p, &FieldValue::Str("not an int".to_string()));
        assert_eq!(p.errors(), &[PackerError::BadType]);
        assert_eq!(p.offset(), 0);
        assert!(p.bytes().is_empty());
    }

    #[test]
    fn mismatch_poisons_subsequent_fields() {
        let mut p = Packer::new(64);
        FieldKind::Short.try_pack(&mut p, &FieldValue::Short(7));
        FieldKind::Long.try_pack(&mut p, &FieldValue::Int(7));
        FieldKind::Byte.try_pack(&mut p, &FieldValue::Byte(1));
        assert!(p.errored());
        assert_eq!(p.offset(), 2);
    }

    #[test]
    fn wire_bytes_match_direct_primitives() {
        let mut via_fields = Packer::new(64);
        FieldKind::Short.try_pack(&mut via_fields, &FieldValue::Short(0x1234));
        FieldKind::Str.try_pack(&mut via_fields, &FieldValue::Str("ok".to_string()));
        FieldKind::Int.try_pack(&mut via_fields, &FieldValue::Int(0xDEADBEEF));

        let mut direct = Packer::new(64);
        direct.pack_short(0x1234);
        direct.pack_str("ok");
        direct.pack_int(0xDEADBEEF);

        assert_eq!(via_fields.bytes(), direct.bytes());
    }

    #[test]
    fn value_kind_is_total() {
        assert_eq!(FieldValue::Byte(0).kind(), FieldKind::Byte);
        assert_eq!(FieldValue::Hashes(vec![]).kind(), FieldKind::Hashes);
        assert_eq!(FieldValue::IpList(vec![]).kind(), FieldKind::IpList);
    }

    #[test]
    fn unpack_on_errored_packer_returns_zero_values() {
        let mut p = Packer::from_bytes(vec![0u8; 4]);
        p.record(PackerError::BadType);

        assert_eq!(FieldKind::Hash.try_unpack(&mut p), FieldValue::Hash(Id::zero()));
        assert_eq!(FieldKind::Bytes.try_unpack(&mut p), FieldValue::Bytes(vec![]));
        assert_eq!(
            FieldKind::Str.try_unpack(&mut p),
            FieldValue::Str(String::new())
        );
    }
}
