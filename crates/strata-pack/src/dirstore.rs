use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use strata_store::{ObjectRead, StoreError, StoreResult, StoredObject};
use strata_types::ObjectId;
use tracing::{debug, trace};

use crate::error::{PackError, PackResult};
use crate::index::PackIndex;
use crate::reader::PackReader;

/// One sealed pack known to the store. The index is resident; pack data is
/// loaded on the first object read that hits this pack.
#[derive(Debug)]
struct SealedPack {
    pack_path: PathBuf,
    index: PackIndex,
    reader: RwLock<Option<Arc<PackReader>>>,
}

impl SealedPack {
    fn reader(&self) -> PackResult<Arc<PackReader>> {
        if let Some(reader) = self.reader.read().unwrap_or_else(|e| e.into_inner()).as_ref() {
            return Ok(Arc::clone(reader));
        }
        let mut slot = self.reader.write().unwrap_or_else(|e| e.into_inner());
        if let Some(reader) = slot.as_ref() {
            return Ok(Arc::clone(reader));
        }
        trace!(pack = %self.pack_path.display(), "loading pack data");
        let data = fs::read(&self.pack_path)?;
        let reader = Arc::new(PackReader::from_bytes(data, self.index.clone())?);
        *slot = Some(Arc::clone(&reader));
        Ok(reader)
    }
}

/// Read-only object store over a directory of sealed packs.
///
/// Opening scans only the `.idx` files, so containment checks are cheap even
/// when the packs themselves are large. Serves the restore path and the
/// assembler's cross-run deduplication.
#[derive(Debug)]
pub struct PackDirStore {
    packs: Vec<SealedPack>,
}

impl PackDirStore {
    /// Scan `dir` for `pack-*.idx` / `pack-*.pack` pairs. A missing or empty
    /// directory yields an empty store. Index files without a matching pack
    /// are skipped.
    pub fn open(dir: &Path) -> PackResult<Self> {
        let mut packs = Vec::new();
        if dir.is_dir() {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.extension().map_or(true, |ext| ext != "idx") {
                    continue;
                }
                let pack_path = path.with_extension("pack");
                if !pack_path.is_file() {
                    debug!(index = %path.display(), "index without pack file, skipping");
                    continue;
                }
                let index = PackIndex::from_bytes(&fs::read(&path)?)?;
                packs.push(SealedPack {
                    pack_path,
                    index,
                    reader: RwLock::new(None),
                });
            }
        }
        // Scan order is filesystem-dependent; fix it.
        packs.sort_by(|a, b| a.pack_path.cmp(&b.pack_path));
        debug!(dir = %dir.display(), packs = packs.len(), "opened pack directory");
        Ok(Self { packs })
    }

    /// Number of packs found.
    pub fn pack_count(&self) -> usize {
        self.packs.len()
    }

    /// Total objects across all pack indexes.
    pub fn object_count(&self) -> usize {
        self.packs.iter().map(|p| p.index.object_count()).sum()
    }

    /// Containment check against the indexes only; never touches pack data.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.packs.iter().any(|p| p.index.contains(id))
    }
}

impl ObjectRead for PackDirStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        for pack in &self.packs {
            if !pack.index.contains(id) {
                continue;
            }
            let reader = pack.reader().map_err(|e| store_error(*id, e))?;
            match reader.read_object(id) {
                Ok(Some(obj)) => return Ok(Some(obj)),
                Ok(None) => continue,
                Err(e) => return Err(store_error(*id, e)),
            }
        }
        Ok(None)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.contains(id))
    }
}

fn store_error(id: ObjectId, err: PackError) -> StoreError {
    match err {
        PackError::Io(e) => StoreError::Io(e),
        other => StoreError::CorruptObject {
            id,
            reason: other.to_string(),
        },
    }
}
