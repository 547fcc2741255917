//! The [`Transport`] trait and the loopback implementation.

use std::fs;
use std::path::PathBuf;

use strata_refs::{FileRefStore, RefStore};
use strata_types::ObjectId;
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};

/// A synchronous channel to a remote store.
///
/// Every call is acknowledged before the next one is issued, so ordering
/// holds by construction: once `send_pack` returns, the pack's objects are
/// durable on the remote, and a ref update that depends on them may follow.
pub trait Transport: Send {
    /// Ship one sealed pack and its index. Returns only once both are
    /// durable on the remote.
    fn send_pack(&mut self, pack: &[u8], index: &[u8]) -> RemoteResult<()>;

    /// Read a remote ref. `Ok(None)` if it does not exist.
    fn read_ref(&mut self, name: &str) -> RemoteResult<Option<ObjectId>>;

    /// Compare-and-swap a remote ref, same contract as
    /// [`RefStore::update_ref`].
    fn update_ref(
        &mut self,
        name: &str,
        new: ObjectId,
        expected: Option<ObjectId>,
    ) -> RemoteResult<()>;
}

/// A [`Transport`] backed by a local directory. The "remote" store has the
/// same on-disk layout as a local one: packs under `packs/`, refs under
/// `refs/`.
#[derive(Debug)]
pub struct LoopbackTransport {
    pack_dir: PathBuf,
    refs: FileRefStore,
}

impl LoopbackTransport {
    /// Open (or create) the target directory.
    pub fn open(root: impl Into<PathBuf>) -> RemoteResult<Self> {
        let root = root.into();
        let pack_dir = root.join("packs");
        fs::create_dir_all(&pack_dir)?;
        let refs = FileRefStore::open(root.join("refs"))?;
        Ok(Self { pack_dir, refs })
    }

    /// Directory sealed packs land in.
    pub fn pack_dir(&self) -> &PathBuf {
        &self.pack_dir
    }
}

impl Transport for LoopbackTransport {
    fn send_pack(&mut self, pack: &[u8], index: &[u8]) -> RemoteResult<()> {
        if pack.len() < 32 {
            return Err(RemoteError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "pack shorter than its trailer",
            )));
        }
        // Packs are named by their trailer checksum, like local seals.
        let checksum = &pack[pack.len() - 32..];
        let name = hex::encode(&checksum[..8]);
        let pack_path = self.pack_dir.join(format!("pack-{name}.pack"));
        let index_path = self.pack_dir.join(format!("pack-{name}.idx"));
        fs::write(&pack_path, pack)?;
        fs::write(&index_path, index)?;
        debug!(pack = %pack_path.display(), bytes = pack.len(), "received pack");
        Ok(())
    }

    fn read_ref(&mut self, name: &str) -> RemoteResult<Option<ObjectId>> {
        Ok(self.refs.read_ref(name)?)
    }

    fn update_ref(
        &mut self,
        name: &str,
        new: ObjectId,
        expected: Option<ObjectId>,
    ) -> RemoteResult<()> {
        Ok(self.refs.update_ref(name, new, expected)?)
    }
}
