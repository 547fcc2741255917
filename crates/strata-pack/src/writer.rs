use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use strata_store::{ObjectKind, StoredObject};
use strata_types::ObjectId;
use tracing::debug;

use crate::entry::EncodedEntry;
use crate::error::PackResult;
use crate::index::PackIndex;

pub(crate) const PACK_MAGIC: &[u8; 4] = b"STRP";
pub(crate) const PACK_VERSION: u32 = 1;

/// Fixed bytes around the entries: header (magic + version + count) and the
/// BLAKE3 trailer checksum.
pub(crate) const PACK_OVERHEAD: u64 = 12 + 32;

/// A sealed pack on disk.
#[derive(Clone, Debug)]
pub struct PackFile {
    pub pack_path: PathBuf,
    pub index_path: PathBuf,
    pub object_count: usize,
    pub size: u64,
    pub checksum: [u8; 32],
}

/// Builds a single pack segment.
///
/// Entries arrive already encoded (see [`EncodedEntry`]), so the running
/// size reported by [`encoded_size`](Self::encoded_size) is exact before the
/// segment is ever written.
#[derive(Debug, Default)]
pub struct PackWriter {
    entries: Vec<EncodedEntry>,
    entry_bytes: u64,
}

impl PackWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode and queue an object.
    pub fn add_object(&mut self, id: ObjectId, kind: ObjectKind, data: &[u8]) -> PackResult<()> {
        let entry = EncodedEntry::encode(id, kind, data)?;
        self.append(entry);
        Ok(())
    }

    /// Queue an already-encoded entry.
    pub fn append(&mut self, entry: EncodedEntry) {
        self.entry_bytes += entry.encoded_size();
        self.entries.push(entry);
    }

    /// Number of objects queued.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no objects are queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact size of the pack file this writer would produce.
    pub fn encoded_size(&self) -> u64 {
        PACK_OVERHEAD + self.entry_bytes
    }

    /// Build the pack bytes and index in memory (no disk I/O).
    pub fn finish_to_bytes(self) -> (Vec<u8>, PackIndex) {
        let mut pack_data = Vec::with_capacity(self.encoded_size() as usize);
        let mut index_entries = Vec::with_capacity(self.entries.len());

        pack_data.extend_from_slice(PACK_MAGIC);
        pack_data.extend_from_slice(&PACK_VERSION.to_be_bytes());
        pack_data.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());

        for entry in &self.entries {
            let offset = pack_data.len() as u64;
            entry.write_to(&mut pack_data);
            index_entries.push((entry.id, entry.crc32, offset));
        }

        // Trailer: BLAKE3 checksum of everything so far.
        let checksum = *blake3::hash(&pack_data).as_bytes();
        pack_data.extend_from_slice(&checksum);

        let index = PackIndex::build(index_entries, checksum);
        (pack_data, index)
    }

    /// Seal this segment to disk under `dir`, named by its checksum.
    ///
    /// Both files are flushed and fsynced before returning: a ref update
    /// that depends on these objects must never race an unflushed pack.
    pub fn finish(self, dir: &Path) -> PackResult<PackFile> {
        let object_count = self.len();
        let (pack_data, index) = self.finish_to_bytes();
        let checksum = index.pack_checksum;
        let name = hex::encode(&checksum[..8]);

        let pack_path = dir.join(format!("pack-{name}.pack"));
        let index_path = dir.join(format!("pack-{name}.idx"));

        write_durably(&pack_path, &pack_data)?;
        write_durably(&index_path, &index.to_bytes())?;

        debug!(
            pack = %pack_path.display(),
            objects = object_count,
            bytes = pack_data.len(),
            "sealed pack"
        );

        Ok(PackFile {
            pack_path,
            index_path,
            object_count,
            size: pack_data.len() as u64,
            checksum,
        })
    }
}

fn write_durably(path: &Path, data: &[u8]) -> PackResult<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}
