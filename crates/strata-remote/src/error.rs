//! Error types for remote transport operations.

use strata_pack::PackError;
use strata_refs::RefError;
use strata_types::ObjectId;
use thiserror::Error;

/// Errors that can occur while talking to a remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The remote ref moved since it was last read. Recoverable: re-read
    /// and retry with a fresh expected value.
    #[error("remote ref update conflict on {name}: expected {}, found {}",
        fmt_opt(expected), fmt_opt(actual))]
    RefConflict {
        name: String,
        expected: Option<ObjectId>,
        actual: Option<ObjectId>,
    },

    /// A non-conflict ref failure on the remote side.
    #[error("remote ref error: {0}")]
    Ref(RefError),

    /// Pack encoding or sealing failed before the bytes left this host.
    #[error("pack error: {0}")]
    Pack(#[from] PackError),

    /// Transport-level I/O failure.
    #[error("transport io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RefError> for RemoteError {
    fn from(err: RefError) -> Self {
        // Conflicts stay distinguishable from ordinary I/O failures.
        match err {
            RefError::Conflict {
                name,
                expected,
                actual,
            } => Self::RefConflict {
                name,
                expected,
                actual,
            },
            other => Self::Ref(other),
        }
    }
}

fn fmt_opt(id: &Option<ObjectId>) -> String {
    match id {
        Some(id) => id.to_hex(),
        None => "(absent)".into(),
    }
}

/// Convenience type alias for remote operations.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;
