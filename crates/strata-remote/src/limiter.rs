//! Upload rate limiting.

use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

/// Caps throughput at a bytes-per-second ceiling measured over a sliding
/// interval.
///
/// Callers report bytes *before* sending them; when the bytes recorded
/// inside the interval exceed the budget, the caller is put to sleep until
/// enough of the window has aged out. Data is never dropped and throttling
/// is never reported as an error.
#[derive(Debug)]
pub struct RateLimiter {
    bytes_per_sec: u64,
    window: Duration,
    sent: VecDeque<(Instant, u64)>,
}

impl RateLimiter {
    /// Create a limiter with a one-second measurement window.
    pub fn new(bytes_per_sec: u64) -> Self {
        Self::with_window(bytes_per_sec, Duration::from_secs(1))
    }

    /// Create a limiter with an explicit measurement window.
    pub fn with_window(bytes_per_sec: u64, window: Duration) -> Self {
        Self {
            bytes_per_sec,
            window,
            sent: VecDeque::new(),
        }
    }

    /// Bytes allowed inside one full window.
    fn budget(&self) -> u64 {
        let bytes = self.bytes_per_sec as f64 * self.window.as_secs_f64();
        bytes.max(1.0) as u64
    }

    /// Record `bytes` about to be sent, sleeping until the sliding window
    /// has room for them.
    pub fn throttle(&mut self, bytes: u64) {
        if bytes == 0 {
            return;
        }
        self.sent.push_back((Instant::now(), bytes));
        loop {
            let now = Instant::now();
            while let Some(&(at, _)) = self.sent.front() {
                if now.duration_since(at) >= self.window {
                    self.sent.pop_front();
                } else {
                    break;
                }
            }
            let in_window: u64 = self.sent.iter().map(|&(_, b)| b).sum();
            if in_window <= self.budget() {
                return;
            }
            let Some(&(oldest, _)) = self.sent.front() else {
                return;
            };
            // Sleep until the oldest record ages out of the window.
            let wait = (oldest + self.window).saturating_duration_since(now);
            if wait.is_zero() {
                continue;
            }
            trace!(?wait, in_window, "rate limit sleep");
            thread::sleep(wait);
        }
    }
}
