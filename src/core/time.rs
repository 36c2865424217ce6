/*!
 * Tick Clock
 *
 * Millisecond tick counter in the style of a 32-bit OS tick count.
 * The counter wraps roughly every 49.7 days, so elapsed time is always
 * computed with wrapping subtraction.
 */

use std::sync::OnceLock;
use std::time::{Duration, Instant};

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Monotonic milliseconds since the first call, truncated to 32 bits
#[inline]
pub fn tick_count() -> u32 {
    let epoch = *EPOCH.get_or_init(Instant::now);
    // Truncation is the wraparound.
    epoch.elapsed().as_millis() as u32
}

/// Sleep the calling thread
#[inline]
pub fn sleep(interval: Duration) {
    std::thread::sleep(interval);
}

/// Tracks time elapsed since the start of one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElapsedTracker {
    start: u32,
}

impl ElapsedTracker {
    /// Start tracking from the current tick
    #[inline]
    pub fn start() -> Self {
        Self::starting_at(tick_count())
    }

    pub const fn starting_at(start: u32) -> Self {
        Self { start }
    }

    /// Milliseconds between the start tick and `now`, wraparound-safe
    #[inline]
    pub const fn elapsed_at(&self, now: u32) -> u32 {
        now.wrapping_sub(self.start)
    }

    #[inline]
    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_at(tick_count())
    }

    /// Whether at least `timeout_ms` have passed
    #[inline]
    pub fn has_expired(&self, timeout_ms: u32) -> bool {
        self.elapsed_ms() >= timeout_ms
    }
}
