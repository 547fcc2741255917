use thiserror::Error;

use strata_types::ObjectId;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("invalid pack magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported pack version: {0}")]
    UnsupportedVersion(u32),

    #[error("corrupt pack entry at offset {offset}: {reason}")]
    CorruptEntry { offset: u64, reason: String },

    #[error("CRC32 mismatch for object {id}")]
    CrcMismatch { id: ObjectId },

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("index corrupted: {0}")]
    IndexCorrupted(String),

    #[error("object serialization failed: {0}")]
    Object(#[from] strata_store::StoreError),

    /// Disk I/O during put or seal. Fatal: the run must abort without
    /// committing a ref.
    #[error("pack write failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type PackResult<T> = Result<T, PackError>;
