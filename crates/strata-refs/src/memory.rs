//! In-memory reference store for testing and ephemeral use.

use std::collections::HashMap;
use std::sync::RwLock;

use strata_types::ObjectId;

use crate::error::{RefError, RefResult};
use crate::names::validate_ref_name;
use crate::traits::RefStore;

/// An in-memory [`RefStore`] with the same compare-and-swap semantics as the
/// file-backed store. Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<HashMap<String, ObjectId>>,
}

impl InMemoryRefStore {
    /// Create a new empty ref store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> RefResult<Option<ObjectId>> {
        validate_ref_name(name)?;
        let refs = self.refs.read().unwrap_or_else(|e| e.into_inner());
        Ok(refs.get(name).copied())
    }

    fn update_ref(&self, name: &str, new: ObjectId, expected: Option<ObjectId>) -> RefResult<()> {
        validate_ref_name(name)?;
        let mut refs = self.refs.write().unwrap_or_else(|e| e.into_inner());
        let actual = refs.get(name).copied();
        if actual != expected {
            return Err(RefError::Conflict {
                name: name.to_string(),
                expected,
                actual,
            });
        }
        refs.insert(name.to_string(), new);
        Ok(())
    }

    fn list_refs(&self) -> RefResult<Vec<(String, ObjectId)>> {
        let refs = self.refs.read().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<(String, ObjectId)> =
            refs.iter().map(|(k, v)| (k.clone(), *v)).collect();
        out.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(out)
    }
}
