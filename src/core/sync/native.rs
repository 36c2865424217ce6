/*!
 * Native Wait Strategy
 *
 * Pass-through to the host's own address wait/wake entry points.
 * Results are returned unchanged, including the native notion of a
 * spurious wake; on failure the error comes from the last-error slot the
 * native call filled in.
 */

use super::traits::{Timeout, WaitStrategy};
use super::width::Snapshot;
use crate::core::errors::{CompatError, CompatResult};
use crate::core::last_error;
use crate::resolver::FunctionHandle;
use serde::Serialize;
use std::ffi::c_void;

/// `WaitOnAddress(Address, CompareAddress, AddressSize, dwMilliseconds) -> BOOL`
pub type WaitOnAddressFn =
    unsafe extern "system" fn(*const c_void, *const c_void, usize, u32) -> i32;

/// `WakeByAddressSingle(Address)` / `WakeByAddressAll(Address)`
pub type WakeByAddressFn = unsafe extern "system" fn(*const c_void);

/// The native triple; present only when all three resolved from one module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NativeWaitHandles {
    pub module: &'static str,
    pub wait: FunctionHandle,
    pub wake_one: FunctionHandle,
    pub wake_all: FunctionHandle,
}

/// Native wait strategy
#[derive(Debug, Clone, Copy)]
pub struct NativeWait {
    wait: WaitOnAddressFn,
    wake_one: WakeByAddressFn,
    wake_all: WakeByAddressFn,
}

impl NativeWait {
    /// # Safety
    ///
    /// The handles must point at functions with the `WaitOnAddress` and
    /// `WakeByAddress*` signatures.
    pub unsafe fn from_handles(handles: &NativeWaitHandles) -> Self {
        Self {
            wait: handles.wait.cast(),
            wake_one: handles.wake_one.cast(),
            wake_all: handles.wake_all.cast(),
        }
    }
}

impl WaitStrategy for NativeWait {
    unsafe fn wait(
        &self,
        address: *const c_void,
        expected: Snapshot,
        timeout: Timeout,
    ) -> CompatResult<()> {
        let ok = (self.wait)(
            address,
            expected.as_ptr(),
            expected.width().size(),
            timeout.as_millis(),
        );
        if ok != 0 {
            Ok(())
        } else {
            Err(CompatError::from_code(last_error::last_error()))
        }
    }

    #[inline]
    fn wake_one(&self, address: *const c_void) {
        // SAFETY: the wake entry point treats the address as a key.
        unsafe { (self.wake_one)(address) }
    }

    #[inline]
    fn wake_all(&self, address: *const c_void) {
        // SAFETY: the wake entry point treats the address as a key.
        unsafe { (self.wake_all)(address) }
    }

    fn name(&self) -> &'static str {
        "native"
    }
}
