/*!
 * Static Resolver
 *
 * In-memory symbol table. Lets hosts (and tests) supply their own
 * providers without going through the OS loader.
 */

use super::traits::{FunctionHandle, SymbolResolver};
use ahash::AHashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Resolver backed by a fixed module/symbol table
#[derive(Debug, Default)]
pub struct StaticResolver {
    symbols: AHashMap<(String, String), FunctionHandle>,
    lookups: AtomicUsize,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry point
    pub fn with(mut self, module: &str, symbol: &str, handle: FunctionHandle) -> Self {
        self.insert(module, symbol, handle);
        self
    }

    pub fn insert(&mut self, module: &str, symbol: &str, handle: FunctionHandle) {
        self.symbols
            .insert((module.to_string(), symbol.to_string()), handle);
    }

    /// Number of lookups served so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl SymbolResolver for StaticResolver {
    fn resolve(&self, module: &str, symbol: &str) -> Option<FunctionHandle> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.symbols
            .get(&(module.to_string(), symbol.to_string()))
            .copied()
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
