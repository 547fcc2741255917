//! The [`RefStore`] trait defining the reference storage interface.

use strata_types::ObjectId;

use crate::error::RefResult;

/// Storage backend for named references.
///
/// A ref maps a human-readable name to a commit ID. Updates are
/// compare-and-swap: the caller states what it believes the ref currently
/// points at, and the update fails with [`RefError::Conflict`] if the ref
/// moved in the meantime. Writers re-read and retry (or give up) on
/// conflict; they never blindly overwrite.
///
/// [`RefError::Conflict`]: crate::error::RefError::Conflict
pub trait RefStore: Send + Sync {
    /// Read a ref by name. `Ok(None)` if the ref does not exist.
    fn read_ref(&self, name: &str) -> RefResult<Option<ObjectId>>;

    /// Atomically point `name` at `new`, provided it currently points at
    /// `expected` (`None` means the ref must not exist yet).
    fn update_ref(&self, name: &str, new: ObjectId, expected: Option<ObjectId>) -> RefResult<()>;

    /// List all refs, sorted by name.
    fn list_refs(&self) -> RefResult<Vec<(String, ObjectId)>>;
}
