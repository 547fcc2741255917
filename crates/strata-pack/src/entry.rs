use strata_store::ObjectKind;
use strata_types::ObjectId;

use crate::error::{PackError, PackResult};

/// Serialize an object kind to its pack type byte.
pub fn type_byte(kind: ObjectKind) -> u8 {
    match kind {
        ObjectKind::Chunk => 1,
        ObjectKind::Tree => 2,
        ObjectKind::Commit => 3,
    }
}

/// Parse a pack type byte back into an object kind.
pub fn kind_from_type_byte(byte: u8) -> Option<ObjectKind> {
    match byte {
        1 => Some(ObjectKind::Chunk),
        2 => Some(ObjectKind::Tree),
        3 => Some(ObjectKind::Commit),
        _ => None,
    }
}

/// One pack entry, compressed and ready to append.
///
/// Entries are encoded at `put` time (not at seal time) so the assembler
/// knows an object's exact on-disk footprint before admitting it to the
/// open pack.
#[derive(Clone, Debug)]
pub struct EncodedEntry {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub uncompressed_len: u64,
    pub compressed: Vec<u8>,
    pub crc32: u32,
}

impl EncodedEntry {
    /// Compress `data` and compute its checksum.
    pub fn encode(id: ObjectId, kind: ObjectKind, data: &[u8]) -> PackResult<Self> {
        let compressed = zstd::encode_all(data, 3)
            .map_err(|e| PackError::CompressionFailed(e.to_string()))?;
        let crc32 = crc32fast::hash(&compressed);
        Ok(Self {
            id,
            kind,
            uncompressed_len: data.len() as u64,
            compressed,
            crc32,
        })
    }

    /// Exact byte footprint of this entry inside a pack file.
    pub fn encoded_size(&self) -> u64 {
        let mut size = 1; // type byte
        size += varint_len(self.uncompressed_len);
        size += varint_len(self.compressed.len() as u64);
        size + self.compressed.len() as u64
    }

    /// Append this entry's wire form to `buf`.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        buf.push(type_byte(self.kind));
        encode_varint(buf, self.uncompressed_len);
        encode_varint(buf, self.compressed.len() as u64);
        buf.extend_from_slice(&self.compressed);
    }
}

/// Encode a u64 as a variable-length integer.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Byte length of a u64's varint encoding.
pub(crate) fn varint_len(value: u64) -> u64 {
    let bits = 64 - value.leading_zeros().min(63) as u64;
    bits.div_ceil(7).max(1)
}

/// Decode a variable-length integer. Returns (value, bytes_consumed).
pub(crate) fn decode_varint(data: &[u8]) -> PackResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        value |= ((byte & 0x7F) as u64) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        if shift >= 64 {
            return Err(PackError::CorruptEntry {
                offset: 0,
                reason: "varint overflow".into(),
            });
        }
    }
    Err(PackError::CorruptEntry {
        offset: 0,
        reason: "truncated varint".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_byte_roundtrip() {
        for kind in [ObjectKind::Chunk, ObjectKind::Tree, ObjectKind::Commit] {
            assert_eq!(kind_from_type_byte(type_byte(kind)), Some(kind));
        }
    }

    #[test]
    fn unknown_type_bytes_rejected() {
        assert!(kind_from_type_byte(0).is_none());
        assert!(kind_from_type_byte(4).is_none());
        assert!(kind_from_type_byte(255).is_none());
    }

    #[test]
    fn varint_roundtrip() {
        for value in [0u64, 1, 42, 127, 128, 1_000_000, u64::MAX] {
            let mut buf = Vec::new();
            encode_varint(&mut buf, value);
            assert_eq!(buf.len() as u64, varint_len(value), "len for {value}");
            let (decoded, consumed) = decode_varint(&buf).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, buf.len());
        }
    }

    #[test]
    fn decode_varint_truncated() {
        let err = decode_varint(&[0x80]).unwrap_err();
        assert!(matches!(err, PackError::CorruptEntry { .. }));
    }

    #[test]
    fn encoded_size_matches_wire_form() {
        let entry = EncodedEntry::encode(
            ObjectId::from_bytes(b"x"),
            ObjectKind::Chunk,
            &vec![7u8; 10_000],
        )
        .unwrap();
        let mut buf = Vec::new();
        entry.write_to(&mut buf);
        assert_eq!(buf.len() as u64, entry.encoded_size());
    }
}
