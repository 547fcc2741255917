use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use strata_store::{object_id, Commit, ObjectKind, Tree};
use strata_tree::TreeSink;
use strata_types::ObjectId;
use tracing::{debug, trace};

use crate::dirstore::PackDirStore;
use crate::entry::EncodedEntry;
use crate::error::{PackError, PackResult};
use crate::writer::{PackFile, PackWriter};

/// Bounds on a single pack segment.
#[derive(Clone, Copy, Debug)]
pub struct PackLimits {
    /// Maximum encoded pack size in bytes, header and trailer included.
    pub max_pack_size: u64,
    /// Maximum object count per pack.
    pub max_pack_objects: usize,
}

impl Default for PackLimits {
    fn default() -> Self {
        Self {
            max_pack_size: 1_000_000_000,
            max_pack_objects: 200_000,
        }
    }
}

/// Write-path object store that batches objects into bounded pack segments.
///
/// Every `put` is deduplicated by content hash: against everything written
/// during this run (open and sealed segments alike), and optionally against
/// packs already on disk from earlier runs. A segment is sealed and a fresh
/// one opened *before* admitting an object that would push it past either
/// limit, so a sealed pack never exceeds its bounds. An object too large to
/// share a pack with anything still gets a segment of its own.
///
/// Compression happens at `put` time, so the size check is against the exact
/// encoded size, not an estimate.
#[derive(Debug)]
pub struct PackAssembler {
    dir: PathBuf,
    limits: PackLimits,
    open: PackWriter,
    seen: HashSet<ObjectId>,
    sealed: Vec<PackFile>,
    prior: Option<PackDirStore>,
}

impl PackAssembler {
    /// Create an assembler writing packs under `dir` (created if missing).
    pub fn create(dir: impl Into<PathBuf>, limits: PackLimits) -> PackResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            limits,
            open: PackWriter::new(),
            seen: HashSet::new(),
            sealed: Vec::new(),
            prior: None,
        })
    }

    /// Also deduplicate against packs already sealed under the directory by
    /// earlier runs. Scans their indexes once, up front.
    pub fn with_dedup_sealed(mut self) -> PackResult<Self> {
        let prior = PackDirStore::open(&self.dir)?;
        debug!(packs = prior.pack_count(), "deduplicating against sealed packs");
        self.prior = Some(prior);
        Ok(self)
    }

    /// Directory this assembler writes to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of distinct objects admitted this run.
    pub fn objects_written(&self) -> usize {
        self.seen.len()
    }

    /// Store an object, returning its content-addressed ID.
    ///
    /// Duplicate content is a no-op that still returns the ID.
    pub fn put(&mut self, kind: ObjectKind, data: &[u8]) -> PackResult<ObjectId> {
        let id = object_id(kind, data);
        if self.seen.contains(&id) {
            trace!(%id, "duplicate within run, skipping");
            return Ok(id);
        }
        if let Some(prior) = &self.prior {
            if prior.contains(&id) {
                trace!(%id, "already in a sealed pack, skipping");
                self.seen.insert(id);
                return Ok(id);
            }
        }

        let entry = EncodedEntry::encode(id, kind, data)?;
        if !self.open.is_empty()
            && (self.open.encoded_size() + entry.encoded_size() > self.limits.max_pack_size
                || self.open.len() + 1 > self.limits.max_pack_objects)
        {
            self.seal_open()?;
        }
        self.open.append(entry);
        self.seen.insert(id);
        Ok(id)
    }

    /// Serialize and store a tree node.
    pub fn new_tree(&mut self, tree: &Tree) -> PackResult<ObjectId> {
        let obj = tree.to_stored_object()?;
        self.put(ObjectKind::Tree, &obj.data)
    }

    /// Build and store a commit pointing at `tree`.
    pub fn new_commit(
        &mut self,
        tree: ObjectId,
        parent: Option<ObjectId>,
        timestamp: i64,
        message: &str,
    ) -> PackResult<ObjectId> {
        let commit = Commit::new(tree, parent, timestamp, message);
        let obj = commit.to_stored_object()?;
        self.put(ObjectKind::Commit, &obj.data)
    }

    fn seal_open(&mut self) -> PackResult<()> {
        let writer = std::mem::take(&mut self.open);
        let pack = writer.finish(&self.dir)?;
        self.sealed.push(pack);
        Ok(())
    }

    /// Seal the open segment (if non-empty) and return every pack written
    /// this run, in seal order.
    pub fn finish(mut self) -> PackResult<Vec<PackFile>> {
        if !self.open.is_empty() {
            self.seal_open()?;
        }
        debug!(
            packs = self.sealed.len(),
            objects = self.seen.len(),
            "assembler finished"
        );
        Ok(self.sealed)
    }

    /// Discard the open segment without writing it.
    ///
    /// Segments sealed earlier in the run stay on disk; their objects are
    /// unreferenced until some later ref update reaches them, which is safe
    /// under content addressing.
    pub fn abort(self) -> Vec<PackFile> {
        self.sealed
    }
}

impl TreeSink for PackAssembler {
    type Error = PackError;

    fn put_tree(&mut self, tree: &Tree) -> Result<ObjectId, PackError> {
        self.new_tree(tree)
    }
}
