use serde::{Deserialize, Serialize};

use crate::error::ChunkError;

/// Default boundary bit width: mean chunk size 2^13 = 8 KiB.
pub const DEFAULT_SPLIT_BITS: u32 = 13;

/// Default bits consumed per tree level (fanout 128 = 2^7).
pub const DEFAULT_FAN_BITS: u32 = 7;

/// Configuration for content-defined chunking.
///
/// `split_bits` controls the expected mean chunk size (`2^split_bits` bytes).
/// A boundary is declared when the low `split_bits` bits of the rolling
/// digest are all ones. Extra consecutive one bits above that threshold make
/// the boundary "stronger": every `fan_bits` extra bits promote it one tree
/// level, so a single rolling computation drives multi-level grouping.
///
/// `max_chunk` caps worst-case chunk length on structureless input (for
/// example an all-zero stream never hits a checksum boundary).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    split_bits: u32,
    fan_bits: u32,
    max_chunk: usize,
}

impl ChunkConfig {
    /// Create a configuration from a boundary bit width.
    ///
    /// Returns an error for widths outside 7..=21 (128 B to 2 MiB mean
    /// chunk size), which would make chunks degenerate or useless.
    pub fn new(split_bits: u32) -> Result<Self, ChunkError> {
        if !(7..=21).contains(&split_bits) {
            return Err(ChunkError::InvalidConfig(format!(
                "split bits must be in 7..=21, got {split_bits}"
            )));
        }
        Ok(Self {
            split_bits,
            fan_bits: DEFAULT_FAN_BITS,
            max_chunk: 1 << (split_bits + 2),
        })
    }

    /// Set the bits consumed per tree level (`log2(fanout)`). Zero disables
    /// level promotion: every boundary is level 0.
    pub fn with_fan_bits(mut self, fan_bits: u32) -> Self {
        self.fan_bits = fan_bits;
        self
    }

    /// Override the hard maximum chunk length.
    pub fn with_max_chunk(mut self, max_chunk: usize) -> Self {
        self.max_chunk = max_chunk;
        self
    }

    /// The boundary bit width.
    pub fn split_bits(&self) -> u32 {
        self.split_bits
    }

    /// Bits consumed per tree level.
    pub fn fan_bits(&self) -> u32 {
        self.fan_bits
    }

    /// The hard maximum chunk length.
    pub fn max_chunk(&self) -> usize {
        self.max_chunk
    }

    /// The digest mask for boundary detection.
    pub(crate) fn mask(&self) -> u32 {
        (1u32 << self.split_bits) - 1
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SPLIT_BITS).expect("default split bits are valid")
    }
}
