/*!
 * Synchronization Primitives
 *
 * Address-based wait/wake with capability negotiation:
 * - Native pass-through when the host exports the address wait triple
 * - Polling fallback otherwise (wake is a no-op)
 * - Optional parking fallback that also honors wakes
 *
 * # Architecture
 *
 * `AddressWaiter` resolves capabilities once through a `CapabilityCell`,
 * then dispatches every call through an enum picked at that moment.
 * Compared values are width-tagged (`Snapshot`) so every width is read with
 * its own atomic load.
 */

mod address;
mod capability;
mod config;
mod native;
mod park;
mod poll;
mod traits;
mod width;

pub use address::{AddressWaiter, KeyedEventHandles, WaitCapabilities};
pub use capability::{CapabilityCell, ResolutionState};
pub use config::{
    ConfigSource, FallbackMode, SyncConfig, FALLBACK_MODE_ENV, LEGACY_MAX_CHUNK,
    MIN_POLL_INTERVAL, POLL_INTERVAL_ENV, RANDOM_MAX_CHUNK_ENV,
};
pub use native::{NativeWaitHandles, WaitOnAddressFn, WakeByAddressFn};
pub use traits::{Timeout, WaitStrategy, INFINITE};
pub use width::{AddressWidth, Snapshot, Waitable};

// Re-export specific strategies for advanced users
pub use native::NativeWait;
pub use park::ParkWait;
pub use poll::PollWait;
