/*!
 * Probe Tables
 *
 * Well-known modules and entry points probed during capability resolution.
 * Candidates are tried in order; the first hit wins.
 */

use super::builtin::BUILTIN_MODULE;

/// One candidate entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolRef {
    pub module: &'static str,
    pub symbol: &'static str,
}

impl SymbolRef {
    pub const fn new(module: &'static str, symbol: &'static str) -> Self {
        Self { module, symbol }
    }
}

pub const WAIT_ON_ADDRESS: &str = "WaitOnAddress";
pub const WAKE_BY_ADDRESS_SINGLE: &str = "WakeByAddressSingle";
pub const WAKE_BY_ADDRESS_ALL: &str = "WakeByAddressAll";

/// Modules that may export the native wait/wake triple
pub const WAIT_MODULES: &[&str] = &["kernel32.dll", "api-ms-win-core-synch-l1-2-0.dll"];

/// Legacy keyed-event pair, recorded when the native triple is missing
pub const KEYED_EVENT_WAIT: SymbolRef = SymbolRef::new("ntdll.dll", "NtWaitForKeyedEvent");
pub const KEYED_EVENT_RELEASE: SymbolRef = SymbolRef::new("ntdll.dll", "NtReleaseKeyedEvent");

/// Modern random entry point
pub const RANDOM_NATIVE: &[SymbolRef] = &[SymbolRef::new("bcryptprimitives.dll", "ProcessPrng")];

/// Legacy random entry points; the builtin shim covers hosts without advapi32
pub const RANDOM_LEGACY: &[SymbolRef] = &[
    SymbolRef::new("advapi32.dll", "SystemFunction036"),
    SymbolRef::new(BUILTIN_MODULE, "SystemFunction036"),
];
