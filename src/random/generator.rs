/*!
 * Random Generator
 *
 * Fills buffers with secure random bytes. The modern provider takes any
 * length in one call; the legacy one is limited per call, so requests are
 * split into chunks and filled in order. A single failed chunk fails the
 * whole request; nothing is retried.
 */

use super::chunk::chunk_lengths;
use crate::core::errors::{CompatError, CompatResult};
use crate::core::last_error;
use crate::core::sync::{CapabilityCell, ConfigSource, SyncConfig, LEGACY_MAX_CHUNK};
use crate::resolver::{
    resolve_first, FunctionHandle, SymbolResolver, SystemResolver, RANDOM_LEGACY, RANDOM_NATIVE,
};
use serde::Serialize;
use std::ffi::c_void;
use tracing::{info, trace, warn};

/// `ProcessPrng(pbData, cbData) -> BOOL`
pub type ProcessPrngFn = unsafe extern "system" fn(*mut u8, usize) -> i32;

/// `SystemFunction036(RandomBuffer, RandomBufferLength) -> BOOLEAN`
pub type GenRandomFn = unsafe extern "system" fn(*mut c_void, u32) -> u8;

/// What the probe found for random generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RandomCapabilities {
    pub native: Option<FunctionHandle>,
    pub legacy: Option<FunctionHandle>,
    pub max_chunk: usize,
}

impl RandomCapabilities {
    /// Name of the active provider
    pub fn provider_name(&self) -> &'static str {
        match (self.native, self.legacy) {
            (Some(_), _) => "native",
            (None, Some(_)) => "legacy",
            (None, None) => "none",
        }
    }
}

/// Served to calls made from inside the probe on the probing thread
static PROBING_CAPABILITIES: RandomCapabilities = RandomCapabilities {
    native: None,
    legacy: None,
    max_chunk: LEGACY_MAX_CHUNK,
};

/// Chunked secure random generator
pub struct RandomGenerator {
    resolver: &'static dyn SymbolResolver,
    config: ConfigSource,
    state: CapabilityCell<RandomCapabilities>,
}

impl RandomGenerator {
    /// Generator over the OS loader, configured from the environment
    pub const fn system() -> Self {
        Self {
            resolver: &SystemResolver,
            config: ConfigSource::Environment,
            state: CapabilityCell::new(),
        }
    }

    pub const fn with_resolver(resolver: &'static dyn SymbolResolver, config: SyncConfig) -> Self {
        Self {
            resolver,
            config: ConfigSource::Fixed(config),
            state: CapabilityCell::new(),
        }
    }

    /// Probe results, resolving if needed
    ///
    /// Called from inside the probe itself this reports no provider.
    pub fn capabilities(&self) -> &RandomCapabilities {
        self.state
            .get_or_resolve(|| self.probe())
            .unwrap_or(&PROBING_CAPABILITIES)
    }

    fn probe(&self) -> RandomCapabilities {
        let config = self.config.load();
        let native = resolve_first(self.resolver, RANDOM_NATIVE);
        let legacy = if native.is_none() {
            resolve_first(self.resolver, RANDOM_LEGACY)
        } else {
            None
        };

        let caps = RandomCapabilities {
            native,
            legacy,
            max_chunk: config.random_max_chunk,
        };
        info!(
            resolver = self.resolver.name(),
            provider = caps.provider_name(),
            max_chunk = caps.max_chunk,
            "Random capabilities resolved"
        );
        caps
    }

    /// Fill `buffer` completely with random bytes
    ///
    /// On error the buffer contents are unspecified.
    pub fn fill(&self, buffer: &mut [u8]) -> CompatResult<()> {
        // SAFETY: the slice is valid for `len` writable bytes.
        unsafe { self.fill_raw(buffer.as_mut_ptr(), buffer.len()) }
    }

    /// Raw form matching `ProcessPrng`
    ///
    /// The native provider receives the arguments unchanged and judges them
    /// itself. The legacy path rejects a null buffer with a non-zero length.
    ///
    /// # Safety
    ///
    /// `buffer` must be valid for writes of `length` bytes.
    pub unsafe fn fill_raw(&self, buffer: *mut u8, length: usize) -> CompatResult<()> {
        let caps = self.capabilities();

        if let Some(native) = caps.native {
            // SAFETY: resolved under the `ProcessPrng` name.
            let process_prng: ProcessPrngFn = native.cast();
            return if process_prng(buffer, length) != 0 {
                Ok(())
            } else {
                Err(CompatError::from_code(last_error::last_error()))
            };
        }

        let Some(legacy) = caps.legacy else {
            return Err(CompatError::ProviderUnavailable);
        };
        if length == 0 {
            return Ok(());
        }
        if buffer.is_null() {
            return Err(CompatError::InvalidArgument("null buffer".to_string()));
        }
        // SAFETY: resolved under the `SystemFunction036` name.
        let gen_random: GenRandomFn = legacy.cast();
        let buffer = std::slice::from_raw_parts_mut(buffer, length);

        let mut offset = 0;
        for len in chunk_lengths(buffer.len(), caps.max_chunk) {
            let chunk = &mut buffer[offset..offset + len];
            trace!(offset, len, "random chunk");
            // `len` <= max_chunk <= MAXLONG, so the cast is lossless.
            if gen_random(chunk.as_mut_ptr().cast(), len as u32) == 0 {
                warn!(offset, len, "Legacy random provider failed");
                return Err(CompatError::GenerationFailure);
            }
            offset += len;
        }
        Ok(())
    }

    pub fn is_resolved(&self) -> bool {
        self.state.is_resolved()
    }

    pub fn probe_count(&self) -> usize {
        self.state.probe_count()
    }
}
