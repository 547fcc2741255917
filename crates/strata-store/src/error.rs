use thiserror::Error;

use strata_types::ObjectId;

/// Errors from object storage and retrieval.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested hash is absent from every reachable store.
    /// Recoverable: callers may skip the item and continue.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// Stored bytes do not decode as the expected object kind.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// Object payload could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Underlying I/O failure. Fatal to the write path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
