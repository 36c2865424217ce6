/*!
 * Capability Cell
 *
 * Process-wide, run-once storage for a probed capability state.
 *
 * # State Machine
 *
 * `UNINITIALIZED -> RESOLVING -> RESOLVED`, driven by a single `AtomicU8`:
 * - The caller that wins the `UNINITIALIZED -> RESOLVING` compare-and-set runs
 *   the probe, writes the value, then publishes `RESOLVED` with `Release`.
 * - Every reader observes `RESOLVED` with `Acquire` before touching the value,
 *   so the winner's writes are visible to all of them.
 * - Losers spin (then yield) until the winner publishes.
 * - A call made from inside the probe, on the winner's own thread, gets
 *   `None` instead of waiting on itself.
 *
 * After `RESOLVED` the cell is a single acquire load plus a pointer read.
 */

use parking_lot_core::SpinWait;
use std::cell::{RefCell, UnsafeCell};
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

const UNINITIALIZED: u8 = 0;
const RESOLVING: u8 = 1;
const RESOLVED: u8 = 2;

/// Observable resolution state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Uninitialized,
    Resolving,
    Resolved,
}

/// Run-once cell for a capability state
pub struct CapabilityCell<T> {
    state: AtomicU8,
    probes: AtomicUsize,
    value: UnsafeCell<MaybeUninit<T>>,
}

// SAFETY: the value is written once by the probe winner before the Release
// store of RESOLVED and only read after an Acquire load observes RESOLVED.
unsafe impl<T: Send + Sync> Sync for CapabilityCell<T> {}
unsafe impl<T: Send> Send for CapabilityCell<T> {}

thread_local! {
    /// Cells whose probe is running on this thread
    static PROBING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks the current thread as probing a cell until dropped.
/// Rolls the state back if the probe unwinds, so a later caller can retry
/// instead of every caller spinning forever.
struct ProbeGuard<'a> {
    state: &'a AtomicU8,
    key: usize,
    published: bool,
}

impl<'a> ProbeGuard<'a> {
    fn enter(state: &'a AtomicU8, key: usize) -> Self {
        let _ = PROBING.try_with(|probing| probing.borrow_mut().push(key));
        Self {
            state,
            key,
            published: false,
        }
    }

    fn publish(mut self) {
        self.published = true;
        self.state.store(RESOLVED, Ordering::Release);
    }
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        let key = self.key;
        let _ = PROBING.try_with(|probing| {
            let mut probing = probing.borrow_mut();
            if let Some(pos) = probing.iter().rposition(|&k| k == key) {
                probing.swap_remove(pos);
            }
        });
        if !self.published {
            self.state.store(UNINITIALIZED, Ordering::Release);
        }
    }
}

impl<T> CapabilityCell<T> {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(UNINITIALIZED),
            probes: AtomicUsize::new(0),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// Get the resolved state, running `probe` if nobody has yet
    ///
    /// Returns `None` only when called from inside `probe` itself (directly
    /// or through anything the probe calls) on the probing thread; the caller
    /// must then proceed without the resolved state.
    #[inline]
    pub fn get_or_resolve<F>(&self, probe: F) -> Option<&T>
    where
        F: FnOnce() -> T,
    {
        if self.state.load(Ordering::Acquire) == RESOLVED {
            // SAFETY: RESOLVED observed with Acquire.
            return Some(unsafe { self.get_unchecked() });
        }
        self.resolve_slow(probe)
    }

    #[cold]
    fn resolve_slow<F>(&self, probe: F) -> Option<&T>
    where
        F: FnOnce() -> T,
    {
        let mut spin = SpinWait::new();
        loop {
            match self.state.load(Ordering::Acquire) {
                RESOLVED => break,
                UNINITIALIZED => {
                    // A failed CAS means another thread won (or resolved); re-check.
                    if self
                        .state
                        .compare_exchange(
                            UNINITIALIZED,
                            RESOLVING,
                            Ordering::Acquire,
                            Ordering::Acquire,
                        )
                        .is_ok()
                    {
                        self.run_probe(probe);
                        break;
                    }
                }
                _ => {
                    if self.is_probing_on_current_thread() {
                        return None;
                    }
                    if !spin.spin() {
                        std::thread::yield_now();
                    }
                }
            }
        }
        // SAFETY: the loop only exits on RESOLVED observed or published.
        Some(unsafe { self.get_unchecked() })
    }

    fn run_probe<F>(&self, probe: F)
    where
        F: FnOnce() -> T,
    {
        let guard = ProbeGuard::enter(&self.state, self.key());
        self.probes.fetch_add(1, Ordering::Relaxed);
        let value = probe();
        // SAFETY: only the CAS winner writes, and no reader touches the
        // value until RESOLVED is published.
        unsafe { (*self.value.get()).write(value) };
        guard.publish();
    }

    #[inline]
    fn key(&self) -> usize {
        self as *const Self as usize
    }

    /// Whether the calling thread is inside this cell's probe
    pub fn is_probing_on_current_thread(&self) -> bool {
        let key = self.key();
        PROBING
            .try_with(|probing| probing.borrow().contains(&key))
            .unwrap_or(false)
    }

    /// Resolved state, if resolution has completed
    #[inline]
    pub fn get(&self) -> Option<&T> {
        if self.is_resolved() {
            // SAFETY: RESOLVED observed with Acquire.
            Some(unsafe { self.get_unchecked() })
        } else {
            None
        }
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.state.load(Ordering::Acquire) == RESOLVED
    }

    pub fn state(&self) -> ResolutionState {
        match self.state.load(Ordering::Acquire) {
            UNINITIALIZED => ResolutionState::Uninitialized,
            RESOLVING => ResolutionState::Resolving,
            _ => ResolutionState::Resolved,
        }
    }

    /// How many times a probe has started (1 after a clean resolution)
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::Relaxed)
    }

    /// # Safety
    ///
    /// The caller must have observed `RESOLVED` with `Acquire`.
    #[inline]
    unsafe fn get_unchecked(&self) -> &T {
        (*self.value.get()).assume_init_ref()
    }
}

impl<T> Default for CapabilityCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for CapabilityCell<T> {
    fn drop(&mut self) {
        if *self.state.get_mut() == RESOLVED {
            // SAFETY: RESOLVED means the value was initialized; `&mut self`
            // rules out concurrent readers.
            unsafe { self.value.get_mut().assume_init_drop() };
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CapabilityCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityCell")
            .field("state", &self.state())
            .field("probes", &self.probe_count())
            .field("value", &self.get())
            .finish()
    }
}
