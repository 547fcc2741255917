//! Named references for Strata.
//!
//! A ref maps a human-readable name (a backup series like `laptop` or
//! `backups/mail`) to the commit at its tip. Refs are the only mutable state
//! in a store; everything they point at is immutable and content-addressed.
//!
//! Updates are compare-and-swap: a writer passes the ID it last read, and
//! the update fails with [`RefError::Conflict`] if another writer advanced
//! the ref in between. A ref is only moved after every object reachable from
//! the new target is durably stored, so a reader following a ref never dangles.
//!
//! # Modules
//!
//! - [`error`] — Error types for ref operations
//! - [`traits`] — The [`RefStore`] trait defining the storage interface
//! - [`names`] — Ref name validation
//! - [`file`] — File-backed [`FileRefStore`] (one file per ref, atomic rename)
//! - [`memory`] — In-memory [`InMemoryRefStore`] for tests

pub mod error;
pub mod file;
pub mod memory;
pub mod names;
pub mod traits;

pub use error::{RefError, RefResult};
pub use file::FileRefStore;
pub use memory::InMemoryRefStore;
pub use names::validate_ref_name;
pub use traits::RefStore;
