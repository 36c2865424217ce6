/*!
 * Polling Fallback
 *
 * Used when the host has no native address wait. The waiter never blocks on
 * a notification channel: it sleeps a short fixed interval and re-reads the
 * value, so progress comes from re-polling and a missed wake can only add
 * one interval of latency. That is what makes wake a safe no-op here.
 */

use super::config::MIN_POLL_INTERVAL;
use super::traits::{Timeout, WaitStrategy};
use super::width::Snapshot;
use crate::core::errors::{CompatError, CompatResult};
use crate::core::time::{self, ElapsedTracker};
use std::ffi::c_void;
use std::time::Duration;
use tracing::trace;

/// Sleep-and-recheck wait strategy
#[derive(Debug, Clone, Copy)]
pub struct PollWait {
    interval: Duration,
}

impl PollWait {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_POLL_INTERVAL),
        }
    }

    /// Poller at the shortest supported interval
    pub const fn finest() -> Self {
        Self {
            interval: MIN_POLL_INTERVAL,
        }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for PollWait {
    fn default() -> Self {
        Self::finest()
    }
}

impl WaitStrategy for PollWait {
    unsafe fn wait(
        &self,
        address: *const c_void,
        expected: Snapshot,
        timeout: Timeout,
    ) -> CompatResult<()> {
        let width = expected.width();
        let tracker = ElapsedTracker::start();

        if Snapshot::load(address, width) != expected {
            return Ok(());
        }

        loop {
            let nap = match timeout {
                Timeout::Infinite => self.interval,
                Timeout::Millis(ms) => {
                    let elapsed = tracker.elapsed_ms();
                    if elapsed >= ms {
                        trace!(timeout_ms = ms, "poll wait timed out");
                        return Err(CompatError::Timeout);
                    }
                    // Never sleep past the deadline
                    self.interval
                        .min(Duration::from_millis(u64::from(ms - elapsed)))
                }
            };

            time::sleep(nap);

            if Snapshot::load(address, width) != expected {
                return Ok(());
            }
        }
    }

    #[inline]
    fn wake_one(&self, _address: *const c_void) {}

    #[inline]
    fn wake_all(&self, _address: *const c_void) {}

    fn name(&self) -> &'static str {
        "poll"
    }
}
