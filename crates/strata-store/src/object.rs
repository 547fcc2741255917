use serde::{Deserialize, Serialize};

use strata_types::{ContentHasher, ObjectId};

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Raw content-defined span of input bytes.
    Chunk,
    /// Ordered entries referencing chunks or subtrees.
    Tree,
    /// A tree hash plus provenance: parent, timestamp, message.
    Commit,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chunk => write!(f, "chunk"),
            Self::Tree => write!(f, "tree"),
            Self::Commit => write!(f, "commit"),
        }
    }
}

/// A stored object: kind tag + serialized data + cached size.
///
/// The unit of storage. The store never interprets the data; decoding into
/// [`Tree`] or [`Commit`] happens at the read path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The serialized bytes of the object.
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and data.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Compute the content-addressed ID for this object.
    pub fn compute_id(&self) -> ObjectId {
        object_id(self.kind, &self.data)
    }
}

/// Content-addressed ID for serialized object bytes.
///
/// Uses the domain-separated hasher for the object kind, so identical bytes
/// stored as different kinds get distinct IDs.
pub fn object_id(kind: ObjectKind, data: &[u8]) -> ObjectId {
    let hasher = match kind {
        ObjectKind::Chunk => &ContentHasher::CHUNK,
        ObjectKind::Tree => &ContentHasher::TREE,
        ObjectKind::Commit => &ContentHasher::COMMIT,
    };
    hasher.hash(data)
}

/// Mode of a tree entry: what the referenced object is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Leaf chunk of ordinary data.
    Blob,
    /// Leaf chunk carrying the executable bit (when splitting files).
    Executable,
    /// Leaf chunk holding a symlink target.
    Symlink,
    /// Internal tree node.
    Tree,
}

impl EntryMode {
    /// Returns `true` if the entry references a subtree.
    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Tree)
    }
}

/// A single (mode, name, hash) entry in a tree node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub name: String,
    pub id: ObjectId,
}

impl TreeEntry {
    pub fn new(mode: EntryMode, name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            id,
        }
    }
}

/// An internal tree node: an ordered sequence of entries.
///
/// Entry order is insertion order and is part of the serialized content, so
/// reordering entries changes the node's hash.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(entries: Vec<TreeEntry>) -> Self {
        Self { entries }
    }

    /// Serialize into a `StoredObject` ready for `put`.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let data = bincode::serialize(self)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(ObjectKind::Tree, data))
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != ObjectKind::Tree {
            return Err(StoreError::CorruptObject {
                id: obj.compute_id(),
                reason: format!("expected tree, got {}", obj.kind),
            });
        }
        bincode::deserialize(&obj.data).map_err(|e| StoreError::CorruptObject {
            id: obj.compute_id(),
            reason: format!("undecodable tree: {e}"),
        })
    }
}

/// A commit: the root of one stored stream plus provenance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Root tree of the content this commit snapshots.
    pub tree: ObjectId,
    /// Previous commit on the same ref, if any.
    pub parent: Option<ObjectId>,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// Free-text provenance (by convention: the invoking command line).
    pub message: String,
}

impl Commit {
    pub fn new(tree: ObjectId, parent: Option<ObjectId>, timestamp: i64, message: impl Into<String>) -> Self {
        Self {
            tree,
            parent,
            timestamp,
            message: message.into(),
        }
    }

    /// Serialize into a `StoredObject` ready for `put`.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let data = bincode::serialize(self)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(ObjectKind::Commit, data))
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != ObjectKind::Commit {
            return Err(StoreError::CorruptObject {
                id: obj.compute_id(),
                reason: format!("expected commit, got {}", obj.kind),
            });
        }
        bincode::deserialize(&obj.data).map_err(|e| StoreError::CorruptObject {
            id: obj.compute_id(),
            reason: format!("undecodable commit: {e}"),
        })
    }
}
