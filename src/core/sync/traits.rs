/*!
 * Synchronization Traits
 *
 * Core abstractions for address wait/wake.
 *
 * # Design: Trait-Based Abstraction for Implementations
 *
 * `AddressWaiter` dispatches through an enum chosen once at resolution;
 * this trait is the contract every variant implements.
 */

use super::width::Snapshot;
use crate::core::errors::CompatResult;
use std::ffi::c_void;
use std::time::Duration;

/// `INFINITE` in the millisecond ABI
pub const INFINITE: u32 = u32::MAX;

/// How long a wait may block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeout {
    Infinite,
    Millis(u32),
}

impl Timeout {
    /// Millisecond form used by the ABI
    #[inline]
    pub const fn as_millis(self) -> u32 {
        match self {
            Timeout::Infinite => INFINITE,
            Timeout::Millis(ms) => ms,
        }
    }
}

impl From<u32> for Timeout {
    #[inline]
    fn from(ms: u32) -> Self {
        if ms == INFINITE {
            Timeout::Infinite
        } else {
            Timeout::Millis(ms)
        }
    }
}

impl From<Duration> for Timeout {
    /// Saturates just below `INFINITE` so a long duration stays finite
    fn from(d: Duration) -> Self {
        Timeout::Millis(d.as_millis().min(u128::from(INFINITE - 1)) as u32)
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(d: Option<Duration>) -> Self {
        d.map_or(Timeout::Infinite, Timeout::from)
    }
}

/// Strategy for waiting on an address
///
/// Implementations must be:
/// - **Thread-safe**: Safe to call from multiple threads
/// - **Value-driven**: Return as soon as the value differs from the snapshot
pub trait WaitStrategy: Send + Sync {
    /// Block while the value at `address` equals `expected`
    ///
    /// Returns `Ok(())` once the value differs (or on a tolerated spurious
    /// wake), `Err(CompatError::Timeout)` when the deadline passes.
    ///
    /// # Safety
    ///
    /// `address` must be non-null, aligned to `expected.width()`, and valid
    /// for atomic access for the duration of the call.
    unsafe fn wait(
        &self,
        address: *const c_void,
        expected: Snapshot,
        timeout: Timeout,
    ) -> CompatResult<()>;

    /// Wake one waiter on `address`
    ///
    /// The address is used as a key only and is never dereferenced.
    fn wake_one(&self, address: *const c_void);

    /// Wake all waiters on `address`
    fn wake_all(&self, address: *const c_void);

    /// Get strategy name for debugging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_conversions() {
        assert_eq!(Timeout::from(INFINITE), Timeout::Infinite);
        assert_eq!(Timeout::from(0u32), Timeout::Millis(0));
        assert_eq!(Timeout::from(None::<Duration>), Timeout::Infinite);
        assert_eq!(
            Timeout::from(Some(Duration::from_millis(250))),
            Timeout::Millis(250)
        );
        assert_eq!(
            Timeout::from(Duration::from_secs(u64::MAX)),
            Timeout::Millis(INFINITE - 1)
        );
        assert_eq!(Timeout::Infinite.as_millis(), INFINITE);
    }
}
