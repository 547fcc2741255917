//! Remote transport for Strata.
//!
//! Moves sealed packs and ref updates to a non-local store over a
//! synchronous, strictly ordered channel: every `send_pack` is acknowledged
//! before anything that depends on its objects is sent, so a remote ref can
//! never point at objects the remote does not hold.
//!
//! Upload throughput can be capped with a sliding-window rate limiter that
//! sleeps the caller; throttling never drops data and is never an error.
//!
//! # Modules
//!
//! - [`error`] — [`RemoteError`], with ref conflicts kept distinct
//! - [`transport`] — the [`Transport`] trait and [`LoopbackTransport`]
//! - [`limiter`] — the [`RateLimiter`]
//! - [`client`] — [`RemoteClient`], the remote write path

pub mod client;
pub mod error;
pub mod limiter;
pub mod transport;

pub use client::RemoteClient;
pub use error::{RemoteError, RemoteResult};
pub use limiter::RateLimiter;
pub use transport::{LoopbackTransport, Transport};
