use thiserror::Error;

/// Errors from parsing or constructing foundation types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid hash length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
