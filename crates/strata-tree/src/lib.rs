//! Fanout tree builder for Strata.
//!
//! Folds an ordered sequence of (chunk hash, boundary level) pairs into a
//! bounded-width, bounded-depth tree of [`Tree`] nodes, submitting each
//! sealed node to a [`TreeSink`] as a content-addressed object.
//!
//! The builder keeps one open accumulator per tree level. Level-0 chunks
//! append to the bottom accumulator; a stronger boundary (level L > 0) seals
//! the accumulators below it bottom-up, each sealed node becoming an entry
//! of the level above. Independently, any accumulator that reaches the
//! fanout limit is force-sealed, so depth stays O(log_fanout(n)) even for a
//! pathological run of same-level boundaries.
//!
//! Fanout 0 selects flat mode: no tree synthesis, the caller receives the
//! ordered entry list.

pub mod builder;

pub use builder::{TreeBuilder, TreeOutcome, TreeSink};
