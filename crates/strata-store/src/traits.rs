use strata_types::ObjectId;

use crate::error::StoreResult;
use crate::object::StoredObject;

/// Read access to content-addressed objects.
///
/// Implemented by everything the retrieval path can pull from: the in-memory
/// store, a directory of sealed packs, a remote peer.
pub trait ObjectRead: Send + Sync {
    /// Read an object by its content-addressed ID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.read(id)?.is_some())
    }
}

impl<T: ObjectRead + ?Sized> ObjectRead for &T {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        (**self).read(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        (**self).exists(id)
    }
}

impl<T: ObjectRead + ?Sized> ObjectRead for std::sync::Arc<T> {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        (**self).read(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        (**self).exists(id)
    }
}

/// A writable content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. Content-addressing guarantees this:
///   the same data always produces the same ID.
/// - `write` is idempotent: writing an object that already exists is a no-op
///   that still returns the correct ID.
/// - Concurrent reads are always safe (objects are immutable).
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: ObjectRead {
    /// Write an object and return its content-addressed ID.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;
}
