use thiserror::Error;

/// Errors from the chunking pipeline.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The chunker configuration is unusable.
    #[error("invalid chunk config: {0}")]
    InvalidConfig(String),

    /// An input source failed mid-read. Fatal to the run; the error carries
    /// the identity of the offending stream.
    #[error("unreadable input '{source}': {err}")]
    InputUnreadable {
        source: String,
        #[source]
        err: std::io::Error,
    },
}

/// Convenience alias for chunking operations.
pub type ChunkResult<T> = Result<T, ChunkError>;
