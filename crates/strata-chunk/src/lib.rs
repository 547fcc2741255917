//! Content-defined chunking for Strata.
//!
//! This crate turns byte streams into variable-length chunks whose boundaries
//! depend only on the data itself. Identical content therefore always splits
//! the same way, regardless of which file (or stored object) it came from --
//! this is what makes deduplication work downstream.
//!
//! # Architecture
//!
//! - [`Rollsum`] -- the rolling checksum over a fixed 64-byte window
//! - [`BoundaryDetector`] -- declares chunk boundaries from the checksum,
//!   reporting how strong each boundary is (which tree level it seals)
//! - [`StreamChunker`] -- drives the detector across a queue of named input
//!   sources, handling the `keep_boundaries` policy and progress reporting
//!
//! The chunker accepts anything implementing [`std::io::Read`], so real
//! files, stdin, and the object-store read path all feed the same pipeline.

pub mod config;
pub mod error;
pub mod rollsum;
pub mod split;

pub use config::{ChunkConfig, DEFAULT_FAN_BITS, DEFAULT_SPLIT_BITS};
pub use error::{ChunkError, ChunkResult};
pub use rollsum::{Rollsum, ROLLSUM_WINDOW};
pub use split::{Chunk, SourceEntry, StreamChunker};
