/*!
 * AI-OS Compat Library
 * Capability-negotiated primitives for hosts that may lack the native ones
 *
 * - Address wait/wake (`WaitOnAddress` family) with a polling fallback
 * - Secure random fill (`ProcessPrng`) with a chunked legacy fallback
 */

pub mod abi;
pub mod core;
pub mod monitoring;
pub mod random;
pub mod resolver;

// Re-exports
pub use crate::abi::{
    address_waiter, fill_random, random_generator, wait_on_address, wake_by_address_all,
    wake_by_address_single,
};
pub use crate::core::errors::{CompatError, CompatResult};
pub use crate::core::sync::{
    AddressWaiter, AddressWidth, FallbackMode, SyncConfig, Timeout, WaitCapabilities, Waitable,
};
pub use crate::monitoring::init_tracing;
pub use crate::random::{RandomCapabilities, RandomGenerator};
pub use crate::resolver::{FunctionHandle, StaticResolver, SymbolResolver, SystemResolver};
