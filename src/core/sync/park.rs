/*!
 * Parking Fallback
 *
 * Keyed-event style fallback: the waiter parks on its address through
 * parking_lot_core and wake unparks it. Each park is bounded by the poll
 * interval, so the waiter still re-polls and a wake that races the park
 * costs at most one interval, same as the polling fallback.
 *
 * # Design
 *
 * Follows Linux futex design: a fixed sharded table of waiter counters.
 * - Zero allocations after initialization
 * - Wake skips the parking lot entirely when the slot has no waiters
 * - Multiple addresses can share a slot (extra unpark calls are harmless)
 */

use super::config::MIN_POLL_INTERVAL;
use super::traits::{Timeout, WaitStrategy};
use super::width::Snapshot;
use crate::core::errors::{CompatError, CompatResult};
use crate::core::time::ElapsedTracker;
use parking_lot_core::{park, unpark_all, unpark_one, DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};
use std::ffi::c_void;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::trace;

/// Number of waiter slots (power of 2 for fast modulo via bitwise AND)
const PARKING_SLOTS: usize = 256;
const SLOT_MASK: usize = PARKING_SLOTS - 1;

#[repr(C, align(64))] // Cache-line aligned to prevent false sharing
struct ParkingSlot {
    waiters: AtomicUsize,
}

impl ParkingSlot {
    const fn new() -> Self {
        Self {
            waiters: AtomicUsize::new(0),
        }
    }
}

/// Park-between-rechecks wait strategy
pub struct ParkWait {
    /// Fixed array of slots (never resizes)
    slots: Box<[ParkingSlot; PARKING_SLOTS]>,
    interval: Duration,
}

impl ParkWait {
    pub fn new(interval: Duration) -> Self {
        Self {
            slots: Box::new([const { ParkingSlot::new() }; PARKING_SLOTS]),
            interval: interval.max(MIN_POLL_INTERVAL),
        }
    }

    #[inline]
    fn slot(&self, key: usize) -> &ParkingSlot {
        let mut hasher = ahash::AHasher::default();
        key.hash(&mut hasher);
        &self.slots[(hasher.finish() as usize) & SLOT_MASK]
    }

    /// Threads currently parked (or about to park) in the slot for `address`
    pub fn waiter_count(&self, address: *const c_void) -> usize {
        self.slot(address as usize).waiters.load(Ordering::SeqCst)
    }
}

impl Default for ParkWait {
    fn default() -> Self {
        Self::new(MIN_POLL_INTERVAL)
    }
}

impl WaitStrategy for ParkWait {
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

        let key = address as usize;
        let slot = self.slot(key);

        loop {
            let nap = match timeout {
                Timeout::Infinite => self.interval,
                Timeout::Millis(ms) => {
                    let elapsed = tracker.elapsed_ms();
                    if elapsed >= ms {
                        trace!(timeout_ms = ms, "park wait timed out");
                        return Err(CompatError::Timeout);
                    }
                    self.interval
                        .min(Duration::from_millis(u64::from(ms - elapsed)))
                }
            };

            slot.waiters.fetch_add(1, Ordering::SeqCst);
            park(
                key,
                // Runs under the bucket lock: never sleep past a change
                || Snapshot::load(address, width) == expected,
                || {},
                |_, _| {},
                DEFAULT_PARK_TOKEN,
                Some(Instant::now() + nap),
            );
            slot.waiters.fetch_sub(1, Ordering::SeqCst);

            if Snapshot::load(address, width) != expected {
                return Ok(());
            }
        }
    }

    fn wake_one(&self, address: *const c_void) {
        let key = address as usize;
        if self.slot(key).waiters.load(Ordering::SeqCst) == 0 {
            return;
        }
        // SAFETY: the key is only used as a parking lot address.
        unsafe { unpark_one(key, |_| DEFAULT_UNPARK_TOKEN) };
    }

    fn wake_all(&self, address: *const c_void) {
        let key = address as usize;
        if self.slot(key).waiters.load(Ordering::SeqCst) == 0 {
            return;
        }
        // SAFETY: the key is only used as a parking lot address.
        unsafe { unpark_all(key, DEFAULT_UNPARK_TOKEN) };
    }

    fn name(&self) -> &'static str {
        "park"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sync::width::Waitable;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_park_wake_all() {
        // Interval far above the expected latency, so only the wake can be fast
        let park = Arc::new(ParkWait::new(Duration::from_secs(2)));
        let value = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let park = park.clone();
                let value = value.clone();
                thread::spawn(move || {
                    let start = Instant::now();
                    let result = unsafe {
                        park.wait(value.address(), AtomicU32::snapshot(0), Timeout::Millis(5000))
                    };
                    (result, start.elapsed())
                })
            })
            .collect();

        // Give threads time to park
        thread::sleep(Duration::from_millis(100));
        value.store(1, Ordering::SeqCst);
        park.wake_all(value.address());

        for handle in handles {
            let (result, elapsed) = handle.join().unwrap();
            assert!(result.is_ok());
            assert!(elapsed < Duration::from_millis(1500));
        }
        assert_eq!(park.waiter_count(value.address()), 0);
    }

    #[test]
    fn test_park_timeout() {
        let park = ParkWait::default();
        let value = AtomicU32::new(0);

        let start = Instant::now();
        let result = unsafe { park.wait(value.address(), AtomicU32::snapshot(0), Timeout::Millis(50)) };

        assert_eq!(result, Err(CompatError::Timeout));
        // Tick granularity is one millisecond
        assert!(start.elapsed() >= Duration::from_millis(49));
    }

    #[test]
    fn test_park_wake_without_waiters() {
        let park = ParkWait::default();
        let value = AtomicU32::new(0);
        park.wake_one(value.address());
        park.wake_all(value.address());
        assert_eq!(park.waiter_count(value.address()), 0);
    }
}
