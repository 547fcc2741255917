//! Write-path client for a remote store.

use std::collections::HashSet;

use strata_pack::{EncodedEntry, PackLimits, PackWriter};
use strata_store::{object_id, Commit, ObjectKind, Tree};
use strata_tree::TreeSink;
use strata_types::ObjectId;
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};
use crate::limiter::RateLimiter;
use crate::transport::Transport;

/// Assembles bounded packs in memory and ships each sealed pack over a
/// [`Transport`], optionally throttled by a [`RateLimiter`].
///
/// Mirrors the local pack assembler's admission rules: dedup by content
/// hash within the run, seal before a segment would exceed its limits.
/// There is no cross-run dedup here; querying a remote index would cost a
/// round trip per object.
///
/// `update_ref` seals and ships the open segment first, so every object the
/// new ref target depends on is acknowledged by the remote before the ref
/// moves.
pub struct RemoteClient<T: Transport> {
    transport: T,
    limiter: Option<RateLimiter>,
    limits: PackLimits,
    open: PackWriter,
    seen: HashSet<ObjectId>,
    packs_sent: usize,
}

impl<T: Transport> RemoteClient<T> {
    /// Create a client over `transport`.
    pub fn new(transport: T, limits: PackLimits) -> Self {
        Self {
            transport,
            limiter: None,
            limits,
            open: PackWriter::new(),
            seen: HashSet::new(),
            packs_sent: 0,
        }
    }

    /// Cap upload throughput at `bytes_per_sec`.
    pub fn with_rate_limit(mut self, bytes_per_sec: u64) -> Self {
        self.limiter = Some(RateLimiter::new(bytes_per_sec));
        self
    }

    /// Number of distinct objects admitted this run.
    pub fn objects_written(&self) -> usize {
        self.seen.len()
    }

    /// Store an object on the remote, returning its content-addressed ID.
    pub fn put(&mut self, kind: ObjectKind, data: &[u8]) -> RemoteResult<ObjectId> {
        let id = object_id(kind, data);
        if self.seen.contains(&id) {
            return Ok(id);
        }
        let entry = EncodedEntry::encode(id, kind, data)?;
        if !self.open.is_empty()
            && (self.open.encoded_size() + entry.encoded_size() > self.limits.max_pack_size
                || self.open.len() + 1 > self.limits.max_pack_objects)
        {
            self.ship_open()?;
        }
        self.open.append(entry);
        self.seen.insert(id);
        Ok(id)
    }

    /// Serialize and store a tree node.
    pub fn new_tree(&mut self, tree: &Tree) -> RemoteResult<ObjectId> {
        let obj = tree.to_stored_object().map_err(strata_pack::PackError::from)?;
        self.put(ObjectKind::Tree, &obj.data)
    }

    /// Build and store a commit pointing at `tree`.
    pub fn new_commit(
        &mut self,
        tree: ObjectId,
        parent: Option<ObjectId>,
        timestamp: i64,
        message: &str,
    ) -> RemoteResult<ObjectId> {
        let commit = Commit::new(tree, parent, timestamp, message);
        let obj = commit.to_stored_object().map_err(strata_pack::PackError::from)?;
        self.put(ObjectKind::Commit, &obj.data)
    }

    fn ship_open(&mut self) -> RemoteResult<()> {
        let writer = std::mem::take(&mut self.open);
        let object_count = writer.len();
        let (pack, index) = writer.finish_to_bytes();
        let index_bytes = index.to_bytes();
        if let Some(limiter) = &mut self.limiter {
            limiter.throttle((pack.len() + index_bytes.len()) as u64);
        }
        self.transport.send_pack(&pack, &index_bytes)?;
        self.packs_sent += 1;
        debug!(objects = object_count, bytes = pack.len(), "shipped pack");
        Ok(())
    }

    /// Ship the open segment (if non-empty). Returns total packs sent so far.
    pub fn finish(&mut self) -> RemoteResult<usize> {
        if !self.open.is_empty() {
            self.ship_open()?;
        }
        Ok(self.packs_sent)
    }

    /// Read a remote ref.
    pub fn read_ref(&mut self, name: &str) -> RemoteResult<Option<ObjectId>> {
        self.transport.read_ref(name)
    }

    /// Compare-and-swap a remote ref. Ships any open segment first.
    pub fn update_ref(
        &mut self,
        name: &str,
        new: ObjectId,
        expected: Option<ObjectId>,
    ) -> RemoteResult<()> {
        self.finish()?;
        self.transport.update_ref(name, new, expected)
    }

    /// Give the transport back, shipping any open segment first.
    pub fn into_transport(mut self) -> RemoteResult<T> {
        self.finish()?;
        Ok(self.transport)
    }
}

impl<T: Transport> TreeSink for RemoteClient<T> {
    type Error = RemoteError;

    fn put_tree(&mut self, tree: &Tree) -> Result<ObjectId, RemoteError> {
        self.new_tree(tree)
    }
}
