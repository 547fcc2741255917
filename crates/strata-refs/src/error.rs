//! Error types for reference operations.

use strata_types::ObjectId;
use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The ref name is invalid.
    #[error("invalid ref name: {name}: {reason}")]
    InvalidName { name: String, reason: String },

    /// Compare-and-swap failed: the ref moved since it was last read.
    #[error("ref update conflict on {name}: expected {}, found {}",
        fmt_opt(expected), fmt_opt(actual))]
    Conflict {
        name: String,
        expected: Option<ObjectId>,
        actual: Option<ObjectId>,
    },

    /// The ref file exists but does not hold a valid object ID.
    #[error("corrupt ref {name}: {reason}")]
    Corrupt { name: String, reason: String },

    /// I/O error during file-based ref operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn fmt_opt(id: &Option<ObjectId>) -> String {
    match id {
        Some(id) => id.to_hex(),
        None => "(absent)".into(),
    }
}

/// Convenience type alias for ref operations.
pub type RefResult<T> = std::result::Result<T, RefError>;
