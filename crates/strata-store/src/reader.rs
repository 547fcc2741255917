//! Pull-based reconstruction of stored byte streams.
//!
//! [`ObjectReader`] walks an object graph by content hash and yields the
//! original bytes on demand through [`std::io::Read`]. Because it is
//! pull-based, the chunker can re-split arbitrarily large stored objects
//! without ever buffering them whole.

use std::collections::VecDeque;
use std::io::Read;

use strata_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{Commit, ObjectKind, StoredObject, Tree, TreeEntry};
use crate::traits::ObjectRead;

/// Streams the content behind a hash: a chunk directly, a tree by
/// concatenating its children in entry order, a commit via its tree.
///
/// Owns its store handle, so a reader over a shared store (`&S` or
/// `Arc<S>`) can outlive the scope that opened it.
pub struct ObjectReader<S: ObjectRead> {
    store: S,
    stack: Vec<VecDeque<TreeEntry>>,
    current: Option<(Vec<u8>, usize)>,
}

impl<S: ObjectRead> ObjectReader<S> {
    /// Open a reader positioned at the start of the object's content.
    ///
    /// Fails with [`StoreError::ObjectNotFound`] if the hash is absent.
    pub fn open(store: S, id: &ObjectId) -> StoreResult<Self> {
        let obj = store
            .read(id)?
            .ok_or(StoreError::ObjectNotFound(*id))?;
        let mut reader = Self {
            store,
            stack: Vec::new(),
            current: None,
        };
        reader.enter(obj)?;
        Ok(reader)
    }

    /// Convenience: read the whole content into memory.
    pub fn read_to_vec(store: S, id: &ObjectId) -> StoreResult<Vec<u8>> {
        let mut reader = ObjectReader::open(store, id)?;
        let mut out = Vec::new();
        reader
            .read_to_end(&mut out)
            .map_err(unwrap_store_error)?;
        Ok(out)
    }

    fn enter(&mut self, obj: StoredObject) -> StoreResult<()> {
        match obj.kind {
            ObjectKind::Chunk => {
                self.current = Some((obj.data, 0));
            }
            ObjectKind::Tree => {
                let tree = Tree::from_stored_object(&obj)?;
                self.stack.push(tree.entries.into());
            }
            ObjectKind::Commit => {
                let commit = Commit::from_stored_object(&obj)?;
                let tree = self
                    .store
                    .read(&commit.tree)?
                    .ok_or(StoreError::ObjectNotFound(commit.tree))?;
                self.enter(tree)?;
            }
        }
        Ok(())
    }

    /// Load the next chunk into `current`. Returns `false` at end of content.
    fn advance(&mut self) -> StoreResult<bool> {
        while self.current.is_none() {
            let Some(top) = self.stack.last_mut() else {
                return Ok(false);
            };
            match top.pop_front() {
                None => {
                    self.stack.pop();
                }
                Some(entry) => {
                    let obj = self
                        .store
                        .read(&entry.id)?
                        .ok_or(StoreError::ObjectNotFound(entry.id))?;
                    self.enter(obj)?;
                }
            }
        }
        Ok(true)
    }
}

impl<S: ObjectRead> Read for ObjectReader<S> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            if let Some((data, pos)) = &mut self.current {
                if *pos < data.len() {
                    let n = (data.len() - *pos).min(buf.len());
                    buf[..n].copy_from_slice(&data[*pos..*pos + n]);
                    *pos += n;
                    if *pos == data.len() {
                        self.current = None;
                    }
                    return Ok(n);
                }
                self.current = None;
            }
            match self.advance() {
                Ok(true) => continue,
                Ok(false) => return Ok(0),
                Err(err) => return Err(std::io::Error::other(err)),
            }
        }
    }
}

impl<S: ObjectRead> std::fmt::Debug for ObjectReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectReader")
            .field("depth", &self.stack.len())
            .finish()
    }
}

/// Recover a `StoreError` smuggled through `std::io::Error` by the `Read`
/// impl; anything else stays an I/O error.
pub fn unwrap_store_error(err: std::io::Error) -> StoreError {
    match err.downcast::<StoreError>() {
        Ok(store_err) => store_err,
        Err(io_err) => StoreError::Io(io_err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryObjectStore;
    use crate::object::EntryMode;
    use crate::traits::ObjectStore;

    fn put_chunk(store: &InMemoryObjectStore, data: &[u8]) -> ObjectId {
        store
            .write(&StoredObject::new(ObjectKind::Chunk, data.to_vec()))
            .unwrap()
    }

    fn put_tree(store: &InMemoryObjectStore, entries: Vec<TreeEntry>) -> ObjectId {
        let obj = Tree::new(entries).to_stored_object().unwrap();
        store.write(&obj).unwrap()
    }

    #[test]
    fn reads_chunk_directly() {
        let store = InMemoryObjectStore::new();
        let id = put_chunk(&store, b"chunk bytes");
        assert_eq!(
            ObjectReader::read_to_vec(&store, &id).unwrap(),
            b"chunk bytes"
        );
    }

    #[test]
    fn reads_tree_in_entry_order() {
        let store = InMemoryObjectStore::new();
        let a = put_chunk(&store, b"alpha ");
        let b = put_chunk(&store, b"beta");
        let tree = put_tree(
            &store,
            vec![
                TreeEntry::new(EntryMode::Blob, "0", a),
                TreeEntry::new(EntryMode::Blob, "1", b),
            ],
        );
        assert_eq!(ObjectReader::read_to_vec(&store, &tree).unwrap(), b"alpha beta");
    }

    #[test]
    fn reads_nested_trees_depth_first() {
        let store = InMemoryObjectStore::new();
        let a = put_chunk(&store, b"a");
        let b = put_chunk(&store, b"b");
        let c = put_chunk(&store, b"c");
        let inner = put_tree(
            &store,
            vec![
                TreeEntry::new(EntryMode::Blob, "0", a),
                TreeEntry::new(EntryMode::Blob, "1", b),
            ],
        );
        let root = put_tree(
            &store,
            vec![
                TreeEntry::new(EntryMode::Tree, "0", inner),
                TreeEntry::new(EntryMode::Blob, "1", c),
            ],
        );
        assert_eq!(ObjectReader::read_to_vec(&store, &root).unwrap(), b"abc");
    }

    #[test]
    fn reads_commit_content_via_tree() {
        let store = InMemoryObjectStore::new();
        let chunk = put_chunk(&store, b"payload");
        let tree = put_tree(&store, vec![TreeEntry::new(EntryMode::Blob, "0", chunk)]);
        let commit = Commit::new(tree, None, 1_700_000_000, "msg")
            .to_stored_object()
            .unwrap();
        let commit_id = store.write(&commit).unwrap();
        assert_eq!(
            ObjectReader::read_to_vec(&store, &commit_id).unwrap(),
            b"payload"
        );
    }

    #[test]
    fn open_missing_hash_is_not_found() {
        let store = InMemoryObjectStore::new();
        let err = ObjectReader::open(&store, &ObjectId::from_bytes(b"ghost")).unwrap_err();
        assert!(matches!(err, StoreError::ObjectNotFound(_)));
    }

    #[test]
    fn missing_child_surfaces_not_found() {
        let store = InMemoryObjectStore::new();
        let ghost = ObjectId::from_bytes(b"never stored");
        let tree = put_tree(&store, vec![TreeEntry::new(EntryMode::Blob, "0", ghost)]);
        let err = ObjectReader::read_to_vec(&store, &tree).unwrap_err();
        assert!(matches!(err, StoreError::ObjectNotFound(id) if id == ghost));
    }

    #[test]
    fn empty_chunk_reads_as_empty_stream() {
        let store = InMemoryObjectStore::new();
        let id = put_chunk(&store, b"");
        assert!(ObjectReader::read_to_vec(&store, &id).unwrap().is_empty());
    }

    #[test]
    fn small_buffer_reads_see_all_bytes() {
        let store = InMemoryObjectStore::new();
        let a = put_chunk(&store, b"hello ");
        let b = put_chunk(&store, b"world");
        let tree = put_tree(
            &store,
            vec![
                TreeEntry::new(EntryMode::Blob, "0", a),
                TreeEntry::new(EntryMode::Blob, "1", b),
            ],
        );
        let mut reader = ObjectReader::open(&store, &tree).unwrap();
        let mut out = Vec::new();
        let mut tiny = [0u8; 3];
        loop {
            let n = reader.read(&mut tiny).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&tiny[..n]);
        }
        assert_eq!(out, b"hello world");
    }
}
