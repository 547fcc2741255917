//! Pack file format and bounded pack assembly for Strata.
//!
//! Objects are batched into immutable pack segments: zstd-compressed,
//! CRC-checked entries with a BLAKE3 trailer checksum, plus a fan-out index
//! for O(log n) lookups.
//!
//! # Architecture
//!
//! - **Pack file** (`.pack`): concatenated compressed objects + checksum
//! - **Pack index** (`.idx`): fan-out table + sorted IDs
//! - **PackWriter** / **PackReader**: one segment, write and random-access read
//! - **PackAssembler**: the write-path store; deduplicates by content hash
//!   and seals a segment before `max_pack_size` / `max_pack_objects` would
//!   be exceeded, opening a fresh one for the violating object
//! - **PackDirStore**: read-only object store over a directory of sealed
//!   packs (restore path and cross-run dedup)

pub mod assembler;
pub mod dirstore;
pub mod entry;
pub mod error;
pub mod index;
pub mod reader;
pub mod writer;

pub use assembler::{PackAssembler, PackLimits};
pub use dirstore::PackDirStore;
pub use entry::EncodedEntry;
pub use error::{PackError, PackResult};
pub use index::PackIndex;
pub use reader::PackReader;
pub use writer::{PackFile, PackWriter};
