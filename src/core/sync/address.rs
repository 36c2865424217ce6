/*!
 * Address Waiter
 *
 * Wait until the value at an address changes; wake threads waiting on it.
 * The first call probes the host once and picks a strategy; every later call
 * is a single dispatch.
 *
 * # Design: Enum Dispatch Chosen Once
 *
 * Native-or-fallback is decided during resolution and cached in the
 * capability cell as an enum. No call re-checks the probe result.
 */

use super::capability::CapabilityCell;
use super::config::{ConfigSource, FallbackMode, SyncConfig};
use super::native::{NativeWait, NativeWaitHandles};
use super::park::ParkWait;
use super::poll::PollWait;
use super::traits::{Timeout, WaitStrategy};
use super::width::{AddressWidth, Snapshot, Waitable};
use crate::core::errors::{CompatError, CompatResult};
use crate::resolver::{
    FunctionHandle, SymbolResolver, SystemResolver, KEYED_EVENT_RELEASE, KEYED_EVENT_WAIT,
    WAIT_MODULES, WAIT_ON_ADDRESS, WAKE_BY_ADDRESS_ALL, WAKE_BY_ADDRESS_SINGLE,
};
use serde::Serialize;
use std::ffi::c_void;
use tracing::{debug, info, trace};

/// Legacy keyed-event entry points, recorded for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyedEventHandles {
    pub wait: FunctionHandle,
    pub release: FunctionHandle,
}

/// What the probe found for address wait/wake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WaitCapabilities {
    pub native: Option<NativeWaitHandles>,
    pub keyed_event: Option<KeyedEventHandles>,
    pub config: SyncConfig,
}

impl WaitCapabilities {
    #[inline]
    pub fn has_native(&self) -> bool {
        self.native.is_some()
    }
}

/// Wait strategy implementation (enum dispatch)
enum WaitStrategyImpl {
    Native(NativeWait),
    Poll(PollWait),
    Park(ParkWait),
}

impl WaitStrategyImpl {
    #[inline(always)]
    unsafe fn wait(
        &self,
        address: *const c_void,
        expected: Snapshot,
        timeout: Timeout,
    ) -> CompatResult<()> {
        match self {
            Self::Native(s) => s.wait(address, expected, timeout),
            Self::Poll(s) => s.wait(address, expected, timeout),
            Self::Park(s) => s.wait(address, expected, timeout),
        }
    }

    #[inline(always)]
    fn wake_one(&self, address: *const c_void) {
        match self {
            Self::Native(s) => s.wake_one(address),
            Self::Poll(s) => s.wake_one(address),
            Self::Park(s) => s.wake_one(address),
        }
    }

    #[inline(always)]
    fn wake_all(&self, address: *const c_void) {
        match self {
            Self::Native(s) => s.wake_all(address),
            Self::Poll(s) => s.wake_all(address),
            Self::Park(s) => s.wake_all(address),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Native(s) => s.name(),
            Self::Poll(s) => s.name(),
            Self::Park(s) => s.name(),
        }
    }
}

struct ResolvedWait {
    capabilities: WaitCapabilities,
    strategy: WaitStrategyImpl,
}

/// Served to calls made from inside the probe on the probing thread:
/// nothing resolved yet, so poll and treat wake as a no-op.
static PROBING_FALLBACK: ResolvedWait = ResolvedWait {
    capabilities: WaitCapabilities {
        native: None,
        keyed_event: None,
        config: SyncConfig::DEFAULT,
    },
    strategy: WaitStrategyImpl::Poll(PollWait::finest()),
};

/// Address wait/wake primitive
///
/// # Examples
///
/// ```
/// use ai_os_compat::{AddressWaiter, CompatError, StaticResolver, SyncConfig};
/// use std::sync::atomic::AtomicU32;
///
/// let resolver: &'static StaticResolver = Box::leak(Box::new(StaticResolver::new()));
/// let waiter = AddressWaiter::with_resolver(resolver, SyncConfig::default());
///
/// let flag = AtomicU32::new(0);
/// // Value already differs from the comparand: returns at once
/// assert!(waiter.wait(&flag, 7, 1000u32).is_ok());
/// // Value unchanged: a zero timeout reports a timeout
/// assert_eq!(waiter.wait(&flag, 0, 0u32), Err(CompatError::Timeout));
/// ```
pub struct AddressWaiter {
    resolver: &'static dyn SymbolResolver,
    config: ConfigSource,
    state: CapabilityCell<ResolvedWait>,
}

impl AddressWaiter {
    /// Waiter over the OS loader, configured from the environment
    pub const fn system() -> Self {
        Self {
            resolver: &SystemResolver,
            config: ConfigSource::Environment,
            state: CapabilityCell::new(),
        }
    }

    /// Waiter over a custom resolver with a fixed configuration
    pub const fn with_resolver(resolver: &'static dyn SymbolResolver, config: SyncConfig) -> Self {
        Self {
            resolver,
            config: ConfigSource::Fixed(config),
            state: CapabilityCell::new(),
        }
    }

    #[inline]
    fn resolved(&self) -> &ResolvedWait {
        self.state
            .get_or_resolve(|| self.probe())
            .unwrap_or(&PROBING_FALLBACK)
    }

    fn probe(&self) -> ResolvedWait {
        let config = self.config.load();
        let native = probe_native(self.resolver);
        let keyed_event = if native.is_none() {
            probe_keyed_event(self.resolver)
        } else {
            None
        };

        let strategy = match (&native, config.fallback) {
            // SAFETY: the handles were resolved under the native names.
            (Some(handles), _) => WaitStrategyImpl::Native(unsafe { NativeWait::from_handles(handles) }),
            (None, FallbackMode::Poll) => WaitStrategyImpl::Poll(PollWait::new(config.poll_interval)),
            (None, FallbackMode::Park) => WaitStrategyImpl::Park(ParkWait::new(config.poll_interval)),
        };

        info!(
            resolver = self.resolver.name(),
            strategy = strategy.name(),
            native_module = native.map(|n| n.module),
            keyed_event = keyed_event.is_some(),
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            "Address wait capabilities resolved"
        );

        ResolvedWait {
            capabilities: WaitCapabilities {
                native,
                keyed_event,
                config,
            },
            strategy,
        }
    }

    /// Block while `atom` still holds `expected`
    ///
    /// Returns `Ok(())` once the value differs (immediately if it already
    /// does) and `Err(CompatError::Timeout)` if it did not change in time.
    /// The native path may also return on a spurious wake; callers re-check.
    pub fn wait<A: Waitable>(
        &self,
        atom: &A,
        expected: A::Value,
        timeout: impl Into<Timeout>,
    ) -> CompatResult<()> {
        let expected = A::snapshot(expected);
        // SAFETY: a live atomic reference is aligned, valid and atomically accessed.
        unsafe { self.dispatch_wait(atom.address(), expected, timeout.into()) }
    }

    /// Raw form matching `WaitOnAddress`
    ///
    /// # Safety
    ///
    /// `address` must be valid for atomic reads of `size` bytes and only be
    /// accessed atomically by other threads while the call runs;
    /// `compare_address` must be valid for reads of `size` bytes.
    pub unsafe fn wait_raw(
        &self,
        address: *const c_void,
        compare_address: *const c_void,
        size: usize,
        timeout_ms: u32,
    ) -> CompatResult<()> {
        let width = AddressWidth::try_from(size)?;
        if address.is_null() || compare_address.is_null() {
            return Err(CompatError::InvalidArgument("null address".to_string()));
        }
        if !width.is_aligned(address) {
            return Err(CompatError::InvalidArgument(format!(
                "address {:p} is not aligned to {} bytes",
                address,
                width.size()
            )));
        }

        // Taken by value now; the caller's comparand may change afterwards.
        let expected = Snapshot::read(compare_address, width);
        self.dispatch_wait(address, expected, Timeout::from(timeout_ms))
    }

    #[inline]
    unsafe fn dispatch_wait(
        &self,
        address: *const c_void,
        expected: Snapshot,
        timeout: Timeout,
    ) -> CompatResult<()> {
        let resolved = self.resolved();
        trace!(address = ?address, width = expected.width().size(), timeout = ?timeout, "wait");
        let result = resolved.strategy.wait(address, expected, timeout);
        if let Err(err) = &result {
            if !err.is_timeout() {
                debug!(error = %err, strategy = resolved.strategy.name(), "wait failed");
            }
        }
        result
    }

    /// Wake one thread waiting on `atom`
    #[inline]
    pub fn wake_one<A: Waitable>(&self, atom: &A) {
        self.wake_one_raw(atom.address());
    }

    /// Wake every thread waiting on `atom`
    #[inline]
    pub fn wake_all<A: Waitable>(&self, atom: &A) {
        self.wake_all_raw(atom.address());
    }

    /// Raw form matching `WakeByAddressSingle`; never dereferences `address`
    pub fn wake_one_raw(&self, address: *const c_void) {
        self.resolved().strategy.wake_one(address);
    }

    /// Raw form matching `WakeByAddressAll`; never dereferences `address`
    pub fn wake_all_raw(&self, address: *const c_void) {
        self.resolved().strategy.wake_all(address);
    }

    /// Probe results, resolving if needed
    ///
    /// Called from inside the probe itself this reports nothing resolved.
    pub fn capabilities(&self) -> &WaitCapabilities {
        &self.resolved().capabilities
    }

    /// Name of the active strategy: `native`, `poll` or `park`
    pub fn strategy_name(&self) -> &'static str {
        self.resolved().strategy.name()
    }

    /// Whether the probe has completed
    pub fn is_resolved(&self) -> bool {
        self.state.is_resolved()
    }

    /// How many probes have run (1 once resolved)
    pub fn probe_count(&self) -> usize {
        self.state.probe_count()
    }
}

/// Find the native triple, all three from the same module
fn probe_native(resolver: &dyn SymbolResolver) -> Option<NativeWaitHandles> {
    WAIT_MODULES.iter().find_map(|&module| {
        let wait = resolver.resolve(module, WAIT_ON_ADDRESS)?;
        let wake_one = resolver.resolve(module, WAKE_BY_ADDRESS_SINGLE)?;
        let wake_all = resolver.resolve(module, WAKE_BY_ADDRESS_ALL)?;
        Some(NativeWaitHandles {
            module,
            wait,
            wake_one,
            wake_all,
        })
    })
}

fn probe_keyed_event(resolver: &dyn SymbolResolver) -> Option<KeyedEventHandles> {
    let wait = resolver.resolve(KEYED_EVENT_WAIT.module, KEYED_EVENT_WAIT.symbol)?;
    let release = resolver.resolve(KEYED_EVENT_RELEASE.module, KEYED_EVENT_RELEASE.symbol)?;
    Some(KeyedEventHandles { wait, release })
}
