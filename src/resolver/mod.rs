/*!
 * Capability Probing
 *
 * Symbol lookup used by the capability resolvers:
 * - `SystemResolver` goes through the OS loader
 * - `StaticResolver` serves a fixed table
 * - The builtin module supplies shims for hosts missing legacy exports
 */

mod builtin;
mod fixed;
mod system;
mod table;
mod traits;

pub use builtin::BUILTIN_MODULE;
pub use fixed::StaticResolver;
pub use system::SystemResolver;
pub use table::{
    SymbolRef, KEYED_EVENT_RELEASE, KEYED_EVENT_WAIT, RANDOM_LEGACY, RANDOM_NATIVE,
    WAIT_MODULES, WAIT_ON_ADDRESS, WAKE_BY_ADDRESS_ALL, WAKE_BY_ADDRESS_SINGLE,
};
pub use traits::{FunctionHandle, SymbolResolver};

/// Resolve the first candidate that exists
pub fn resolve_first(
    resolver: &dyn SymbolResolver,
    candidates: &[SymbolRef],
) -> Option<FunctionHandle> {
    candidates
        .iter()
        .find_map(|c| resolver.resolve(c.module, c.symbol))
}
