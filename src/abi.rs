/*!
 * ABI Entry Points
 *
 * Process-wide primitives exposed with the exact native signatures, so code
 * written against the OS functions runs unchanged on the compat path:
 * - `ProcessPrng(pbData, cbData) -> BOOL`
 * - `WaitOnAddress(Address, CompareAddress, AddressSize, dwMilliseconds) -> BOOL`
 * - `WakeByAddressSingle(Address)` / `WakeByAddressAll(Address)`
 *
 * Failures return `FALSE` and set the last-error code. With the
 * `export-symbols` feature the functions are exported under those names.
 */

#![allow(non_snake_case)]

use crate::core::errors::CompatResult;
use crate::core::last_error;
use crate::core::sync::{AddressWaiter, Timeout, Waitable};
use crate::random::RandomGenerator;
use std::ffi::c_void;

pub const TRUE: i32 = 1;
pub const FALSE: i32 = 0;

static ADDRESS_WAITER: AddressWaiter = AddressWaiter::system();
static RANDOM_GENERATOR: RandomGenerator = RandomGenerator::system();

/// The process-wide address waiter behind the entry points
pub fn address_waiter() -> &'static AddressWaiter {
    &ADDRESS_WAITER
}

/// The process-wide random generator behind `ProcessPrng`
pub fn random_generator() -> &'static RandomGenerator {
    &RANDOM_GENERATOR
}

#[inline]
fn to_bool(result: CompatResult<()>) -> i32 {
    match result {
        Ok(()) => TRUE,
        Err(err) => {
            last_error::record(&err);
            FALSE
        }
    }
}

/// # Safety
///
/// `pbData` must be valid for writes of `cbData` bytes.
#[cfg_attr(feature = "export-symbols", no_mangle)]
pub unsafe extern "system" fn ProcessPrng(pbData: *mut u8, cbData: usize) -> i32 {
    to_bool(RANDOM_GENERATOR.fill_raw(pbData, cbData))
}

/// # Safety
///
/// `Address` must be valid for atomic reads of `AddressSize` bytes and
/// `CompareAddress` valid for reads of `AddressSize` bytes.
#[cfg_attr(feature = "export-symbols", no_mangle)]
pub unsafe extern "system" fn WaitOnAddress(
    Address: *const c_void,
    CompareAddress: *const c_void,
    AddressSize: usize,
    dwMilliseconds: u32,
) -> i32 {
    to_bool(ADDRESS_WAITER.wait_raw(Address, CompareAddress, AddressSize, dwMilliseconds))
}

/// # Safety
///
/// Always safe to call; the address is only used as a key.
#[cfg_attr(feature = "export-symbols", no_mangle)]
pub unsafe extern "system" fn WakeByAddressSingle(Address: *const c_void) {
    ADDRESS_WAITER.wake_one_raw(Address);
}

/// # Safety
///
/// Always safe to call; the address is only used as a key.
#[cfg_attr(feature = "export-symbols", no_mangle)]
pub unsafe extern "system" fn WakeByAddressAll(Address: *const c_void) {
    ADDRESS_WAITER.wake_all_raw(Address);
}

/// `__imp_` pointers for toolchains that import undecorated names.
/// On x86 the leading `\x01` stops the usual underscore prefix.
#[cfg(all(windows, feature = "export-symbols"))]
mod import_aliases {
    use crate::core::sync::{WaitOnAddressFn, WakeByAddressFn};
    use crate::random::ProcessPrngFn;

    #[cfg_attr(target_arch = "x86", export_name = "\x01__imp_ProcessPrng")]
    #[cfg_attr(not(target_arch = "x86"), export_name = "__imp_ProcessPrng")]
    pub static IMP_PROCESS_PRNG: ProcessPrngFn = super::ProcessPrng;

    #[cfg_attr(target_arch = "x86", export_name = "\x01__imp_WaitOnAddress")]
    #[cfg_attr(not(target_arch = "x86"), export_name = "__imp_WaitOnAddress")]
    pub static IMP_WAIT_ON_ADDRESS: WaitOnAddressFn = super::WaitOnAddress;

    #[cfg_attr(target_arch = "x86", export_name = "\x01__imp_WakeByAddressSingle")]
    #[cfg_attr(not(target_arch = "x86"), export_name = "__imp_WakeByAddressSingle")]
    pub static IMP_WAKE_BY_ADDRESS_SINGLE: WakeByAddressFn = super::WakeByAddressSingle;

    #[cfg_attr(target_arch = "x86", export_name = "\x01__imp_WakeByAddressAll")]
    #[cfg_attr(not(target_arch = "x86"), export_name = "__imp_WakeByAddressAll")]
    pub static IMP_WAKE_BY_ADDRESS_ALL: WakeByAddressFn = super::WakeByAddressAll;
}

/// Wait on a process-wide address until it no longer holds `expected`
pub fn wait_on_address<A: Waitable>(
    atom: &A,
    expected: A::Value,
    timeout: impl Into<Timeout>,
) -> CompatResult<()> {
    ADDRESS_WAITER.wait(atom, expected, timeout)
}

pub fn wake_by_address_single<A: Waitable>(atom: &A) {
    ADDRESS_WAITER.wake_one(atom);
}

pub fn wake_by_address_all<A: Waitable>(atom: &A) {
    ADDRESS_WAITER.wake_all(atom);
}

/// Fill `buffer` from the process-wide random generator
pub fn fill_random(buffer: &mut [u8]) -> CompatResult<()> {
    RANDOM_GENERATOR.fill(buffer)
}
