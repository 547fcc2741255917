//! Object model and storage interface for Strata.
//!
//! Every piece of data Strata persists -- chunks, tree nodes, commits -- is
//! an immutable object identified by the BLAKE3 hash of its content
//! (domain-separated by object kind).
//!
//! # Object Types
//!
//! - [`ObjectKind::Chunk`] -- raw content-defined span of input bytes
//! - [`Tree`] -- ordered entries referencing chunks or subtrees; entry order
//!   is part of the hashed content
//! - [`Commit`] -- a tree hash, optional parent, timestamp, and message
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Write-then-link: all objects reachable from a hash are stored before
//!    anything references that hash.
//! 3. Concurrent reads are always safe (objects are immutable).
//! 4. The store never interprets chunk contents -- it is a pure key-value
//!    store; only [`reader::ObjectReader`] understands trees and commits.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod object;
pub mod reader;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use object::{object_id, Commit, EntryMode, ObjectKind, StoredObject, Tree, TreeEntry};
pub use reader::{unwrap_store_error, ObjectReader};
pub use traits::{ObjectRead, ObjectStore};
