//! Rate-limited progress reporting on stderr.

use std::io::Write;
use std::time::{Duration, Instant};

/// Prints a one-line progress report at most every `interval`.
///
/// The report is fire-and-forget: it never blocks the pipeline and a write
/// failure on stderr is ignored.
pub struct Progress {
    label: &'static str,
    interval: Duration,
    last: Option<Instant>,
    reported: bool,
}

impl Progress {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            interval: Duration::from_millis(200),
            last: None,
            reported: false,
        }
    }

    /// Report the running byte total, if enough time has passed.
    pub fn tick(&mut self, bytes: u64) {
        let now = Instant::now();
        if let Some(last) = self.last {
            if now.duration_since(last) < self.interval {
                return;
            }
        }
        self.last = Some(now);
        self.reported = true;
        let _ = write!(std::io::stderr(), "\r{}: {} bytes", self.label, bytes);
        let _ = std::io::stderr().flush();
    }

    /// Print the final total and end the progress line.
    pub fn finish(&mut self, bytes: u64) {
        if self.reported {
            let _ = writeln!(std::io::stderr(), "\r{}: {} bytes, done", self.label, bytes);
        }
    }
}
