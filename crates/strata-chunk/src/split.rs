//! Drives the boundary detector across a queue of input sources.
//!
//! The chunker is a pull-based iterator: each `next()` produces exactly one
//! chunk, reading just enough input to find its boundary. Nothing downstream
//! is buffered beyond the chunk in flight, so the pipeline stays
//! back-pressured however large the inputs are.

use std::collections::VecDeque;
use std::io::Read;

use crate::config::ChunkConfig;
use crate::error::{ChunkError, ChunkResult};
use crate::rollsum::BoundaryDetector;

const READ_BLOCK: usize = 64 * 1024;

/// A named input source. The name only exists for error reporting and
/// progress display; chunk boundaries never depend on it.
pub struct SourceEntry {
    pub name: String,
    pub reader: Box<dyn Read>,
}

impl SourceEntry {
    pub fn new(name: impl Into<String>, reader: Box<dyn Read>) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }
}

impl std::fmt::Debug for SourceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceEntry").field("name", &self.name).finish()
    }
}

/// One content-defined chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// The raw bytes of this chunk.
    pub data: Vec<u8>,
    /// Boundary strength: how many tree levels this chunk's trailing
    /// boundary seals (0 = ordinary chunk).
    pub level: usize,
    /// Monotonically increasing position in the output sequence.
    pub index: u64,
}

/// Fire-and-forget progress callback: (source ordinal, total bytes read).
pub type ProgressFn = Box<dyn FnMut(usize, u64)>;

/// Splits a sequence of input sources into content-defined chunks.
///
/// With `keep_boundaries` set, the end of each source forces a chunk
/// boundary, so no chunk ever contains bytes from two inputs. Without it,
/// sources are chunked as one transparent concatenation.
pub struct StreamChunker {
    sources: VecDeque<SourceEntry>,
    detector: BoundaryDetector,
    keep_boundaries: bool,
    progress: Option<ProgressFn>,
    pending: Vec<u8>,
    scanned: usize,
    source_ordinal: usize,
    source_bytes: u64,
    total_bytes: u64,
    next_index: u64,
    emitted_any: bool,
    done: bool,
}

impl StreamChunker {
    pub fn new(config: ChunkConfig, keep_boundaries: bool) -> Self {
        Self {
            sources: VecDeque::new(),
            detector: BoundaryDetector::new(&config),
            keep_boundaries,
            progress: None,
            pending: Vec::new(),
            scanned: 0,
            source_ordinal: 0,
            source_bytes: 0,
            total_bytes: 0,
            next_index: 0,
            emitted_any: false,
            done: false,
        }
    }

    /// Append an input source to the queue.
    pub fn push_source(&mut self, source: SourceEntry) {
        self.sources.push_back(source);
    }

    /// Install a progress callback. It must never block; throttling is the
    /// callback's own business.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Total bytes consumed from all sources so far.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    fn take_chunk(&mut self, level: usize) -> Chunk {
        debug_assert!(self.scanned <= self.pending.len());
        let data: Vec<u8> = self.pending.drain(..self.scanned).collect();
        self.scanned = 0;
        let chunk = Chunk {
            data,
            level,
            index: self.next_index,
        };
        self.next_index += 1;
        self.emitted_any = true;
        chunk
    }

    /// Emit everything buffered as a forced level-0 chunk.
    fn take_tail(&mut self) -> Chunk {
        self.scanned = self.pending.len();
        self.detector.reset();
        self.take_chunk(0)
    }
}

impl Iterator for StreamChunker {
    type Item = ChunkResult<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            // Scan buffered bytes for the next boundary.
            while self.scanned < self.pending.len() {
                let byte = self.pending[self.scanned];
                self.scanned += 1;
                if let Some(level) = self.detector.feed(byte) {
                    return Some(Ok(self.take_chunk(level)));
                }
            }

            // Buffer exhausted without a boundary; pull more input.
            let Some(source) = self.sources.front_mut() else {
                self.done = true;
                // A run over empty input still yields one (empty) chunk so
                // that an empty stream has a well-defined stored form.
                if !self.pending.is_empty() || !self.emitted_any {
                    return Some(Ok(self.take_tail()));
                }
                return None;
            };

            let mut buf = [0u8; READ_BLOCK];
            match source.reader.read(&mut buf) {
                Ok(0) => {
                    let drained_source_bytes = self.source_bytes;
                    self.sources.pop_front();
                    self.source_ordinal += 1;
                    self.source_bytes = 0;
                    if self.keep_boundaries
                        && (!self.pending.is_empty() || drained_source_bytes == 0)
                    {
                        return Some(Ok(self.take_tail()));
                    }
                }
                Ok(n) => {
                    self.pending.extend_from_slice(&buf[..n]);
                    self.source_bytes += n as u64;
                    self.total_bytes += n as u64;
                    if let Some(progress) = &mut self.progress {
                        progress(self.source_ordinal, self.total_bytes);
                    }
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.done = true;
                    return Some(Err(ChunkError::InputUnreadable {
                        source: source.name.clone(),
                        err,
                    }));
                }
            }
        }
    }
}

impl std::fmt::Debug for StreamChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamChunker")
            .field("sources", &self.sources.len())
            .field("keep_boundaries", &self.keep_boundaries)
            .field("total_bytes", &self.total_bytes)
            .finish()
    }
}
