use strata_types::ObjectId;

use crate::error::{PackError, PackResult};

const INDEX_MAGIC: &[u8; 4] = b"STRI";
const INDEX_VERSION: u32 = 1;

/// Sidecar index for one sealed pack: every object's offset and entry
/// CRC, addressable without touching the pack itself.
///
/// On disk: magic, version, a 256-slot fan-out table, then the sorted ID
/// array with parallel CRC32 and offset arrays, and finally the checksum
/// of the pack the index describes. `fan_out[b]` holds the number of
/// objects whose leading hash byte is at most `b`, so slot `b` of the ID
/// array spans `fan_out[b-1]..fan_out[b]`.
#[derive(Clone, Debug)]
pub struct PackIndex {
    pub fan_out: [u32; 256],
    pub object_ids: Vec<ObjectId>,
    pub crc32s: Vec<u32>,
    pub offsets: Vec<u64>,
    pub pack_checksum: [u8; 32],
}

impl PackIndex {
    /// Build an index from (id, crc32, offset) entries and a pack checksum.
    pub fn build(mut entries: Vec<(ObjectId, u32, u64)>, pack_checksum: [u8; 32]) -> Self {
        entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

        // Bucket counts first, then a running total turns them into the
        // cumulative fan-out form.
        let mut fan_out = [0u32; 256];
        for (id, _, _) in &entries {
            fan_out[id.as_bytes()[0] as usize] += 1;
        }
        let mut total = 0u32;
        for slot in fan_out.iter_mut() {
            total += *slot;
            *slot = total;
        }

        let mut object_ids = Vec::with_capacity(entries.len());
        let mut crc32s = Vec::with_capacity(entries.len());
        let mut offsets = Vec::with_capacity(entries.len());
        for (id, crc, offset) in entries {
            object_ids.push(id);
            crc32s.push(crc);
            offsets.push(offset);
        }

        Self {
            fan_out,
            object_ids,
            crc32s,
            offsets,
            pack_checksum,
        }
    }

    /// Look up an object's (offset, crc32) by ID.
    pub fn lookup(&self, id: &ObjectId) -> Option<(u64, u32)> {
        let bucket = id.as_bytes()[0] as usize;
        let start = bucket
            .checked_sub(1)
            .map_or(0, |prev| self.fan_out[prev] as usize);
        let end = self.fan_out[bucket] as usize;

        let pos = self.object_ids[start..end]
            .binary_search_by(|candidate| candidate.as_bytes().cmp(id.as_bytes()))
            .ok()?;
        Some((self.offsets[start + pos], self.crc32s[start + pos]))
    }

    /// Total object count.
    pub fn object_count(&self) -> usize {
        self.object_ids.len()
    }

    /// Check if an object exists.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.lookup(id).is_some()
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let n = self.object_ids.len();
        let mut buf = Vec::with_capacity(8 + 256 * 4 + n * (32 + 4 + 8) + 32);
        buf.extend_from_slice(INDEX_MAGIC);
        buf.extend_from_slice(&INDEX_VERSION.to_be_bytes());
        for &count in &self.fan_out {
            buf.extend_from_slice(&count.to_be_bytes());
        }
        for id in &self.object_ids {
            buf.extend_from_slice(id.as_bytes());
        }
        for &crc in &self.crc32s {
            buf.extend_from_slice(&crc.to_be_bytes());
        }
        for &offset in &self.offsets {
            buf.extend_from_slice(&offset.to_be_bytes());
        }
        buf.extend_from_slice(&self.pack_checksum);
        buf
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> PackResult<Self> {
        let header = field(data, 0, 8, "header")?;
        if &header[0..4] != INDEX_MAGIC {
            return Err(PackError::InvalidMagic {
                expected: String::from_utf8_lossy(INDEX_MAGIC).into(),
                actual: String::from_utf8_lossy(&header[0..4]).into(),
            });
        }
        let version = u32::from_be_bytes(header[4..8].try_into().expect("slice is 4 bytes"));
        if version != INDEX_VERSION {
            return Err(PackError::UnsupportedVersion(version));
        }

        let mut pos = 8;
        let mut fan_out = [0u32; 256];
        let table = field(data, pos, 256 * 4, "fan-out table")?;
        for (slot, raw) in fan_out.iter_mut().zip(table.chunks_exact(4)) {
            *slot = u32::from_be_bytes(raw.try_into().expect("chunk is 4 bytes"));
        }
        pos += 256 * 4;

        let count = fan_out[255] as usize;

        let mut object_ids = Vec::with_capacity(count);
        for raw in field(data, pos, count * 32, "object ids")?.chunks_exact(32) {
            let mut hash = [0u8; 32];
            hash.copy_from_slice(raw);
            object_ids.push(ObjectId::from_hash(hash));
        }
        pos += count * 32;

        let mut crc32s = Vec::with_capacity(count);
        for raw in field(data, pos, count * 4, "entry crcs")?.chunks_exact(4) {
            crc32s.push(u32::from_be_bytes(raw.try_into().expect("chunk is 4 bytes")));
        }
        pos += count * 4;

        let mut offsets = Vec::with_capacity(count);
        for raw in field(data, pos, count * 8, "entry offsets")?.chunks_exact(8) {
            offsets.push(u64::from_be_bytes(raw.try_into().expect("chunk is 8 bytes")));
        }
        pos += count * 8;

        let mut pack_checksum = [0u8; 32];
        pack_checksum.copy_from_slice(field(data, pos, 32, "pack checksum")?);

        Ok(Self {
            fan_out,
            object_ids,
            crc32s,
            offsets,
            pack_checksum,
        })
    }
}

fn field<'a>(data: &'a [u8], pos: usize, len: usize, what: &str) -> PackResult<&'a [u8]> {
    data.get(pos..pos + len)
        .ok_or_else(|| PackError::IndexCorrupted(format!("{what} truncated")))
}
