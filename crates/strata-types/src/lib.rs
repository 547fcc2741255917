//! Foundation types for Strata.
//!
//! Everything stored by Strata -- chunks, tree nodes, commits -- is an
//! immutable object identified by the BLAKE3 hash of its content. This crate
//! provides the [`ObjectId`] content address and the domain-separated
//! [`ContentHasher`] used to compute it.

pub mod error;
pub mod hasher;
pub mod object;

pub use error::TypeError;
pub use hasher::ContentHasher;
pub use object::ObjectId;
