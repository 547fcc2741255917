use std::collections::HashMap;
use std::sync::RwLock;

use strata_types::ObjectId;

use crate::error::StoreResult;
use crate::object::StoredObject;
use crate::traits::{ObjectRead, ObjectStore};

/// In-memory, HashMap-based object store.
///
/// Intended for tests, the `--noop` path, and as the buffer behind the
/// remote client. All objects are held behind a `RwLock`; objects are cloned
/// on read and write.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|obj| obj.size)
            .sum()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectRead for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let mut map = self.objects.write().expect("lock poisoned");
        // Idempotent: content-addressing guarantees the same ID always maps
        // to the same content, so an existing entry is left alone.
        map.entry(id).or_insert_with(|| object.clone());
        Ok(id)
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;

    fn make_chunk(content: &[u8]) -> StoredObject {
        StoredObject::new(ObjectKind::Chunk, content.to_vec())
    }

    #[test]
    fn write_then_read_roundtrip() {
        let store = InMemoryObjectStore::new();
        let obj = make_chunk(b"hello");
        let id = store.write(&obj).unwrap();
        assert_eq!(store.read(&id).unwrap().unwrap(), obj);
    }

    #[test]
    fn write_is_idempotent() {
        let store = InMemoryObjectStore::new();
        let obj = make_chunk(b"dup");
        let id1 = store.write(&obj).unwrap();
        let id2 = store.write(&obj).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_object_reads_as_none() {
        let store = InMemoryObjectStore::new();
        assert!(store.read(&ObjectId::from_bytes(b"nope")).unwrap().is_none());
        assert!(!store.exists(&ObjectId::from_bytes(b"nope")).unwrap());
    }

    #[test]
    fn total_bytes_counts_object_data() {
        let store = InMemoryObjectStore::new();
        store.write(&make_chunk(b"1234")).unwrap();
        store.write(&make_chunk(b"56")).unwrap();
        assert_eq!(store.total_bytes(), 6);
    }
}
