/*!
 * Synchronization Configuration
 *
 * Runtime configuration for the fallback paths. The process-wide primitives
 * read it from the environment once, while resolving capabilities.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Largest transfer the legacy random entry point accepts per call (MAXLONG)
pub const LEGACY_MAX_CHUNK: usize = 0x7FFF_FFFF;

/// Shortest interval the fallback poller sleeps between checks
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

pub const POLL_INTERVAL_ENV: &str = "COMPAT_POLL_INTERVAL_MS";
pub const FALLBACK_MODE_ENV: &str = "COMPAT_FALLBACK_MODE";
pub const RANDOM_MAX_CHUNK_ENV: &str = "COMPAT_RANDOM_MAX_CHUNK";

/// How the wait fallback blocks when no native entry point exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    /// Sleep-and-recheck loop; wake is a no-op
    Poll,
    /// Park on the address between rechecks; wake unparks
    Park,
}

impl FromStr for FallbackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poll" => Ok(FallbackMode::Poll),
            "park" => Ok(FallbackMode::Park),
            other => Err(format!("unknown fallback mode '{}'", other)),
        }
    }
}

impl fmt::Display for FallbackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackMode::Poll => f.write_str("poll"),
            FallbackMode::Park => f.write_str("park"),
        }
    }
}

/// Synchronization configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Sleep between rechecks on the fallback path
    pub poll_interval: Duration,
    /// Fallback blocking mode
    pub fallback: FallbackMode,
    /// Per-call transfer limit for the legacy random provider
    pub random_max_chunk: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl SyncConfig {
    pub const DEFAULT: Self = Self {
        poll_interval: MIN_POLL_INTERVAL,
        fallback: FallbackMode::Poll,
        random_max_chunk: LEGACY_MAX_CHUNK,
    };

    /// Park between rechecks so wakes are delivered promptly
    pub const fn low_latency() -> Self {
        Self {
            poll_interval: MIN_POLL_INTERVAL,
            fallback: FallbackMode::Park,
            random_max_chunk: LEGACY_MAX_CHUNK,
        }
    }

    /// Coarser polling for waits expected to last a long time
    pub const fn long_wait() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            fallback: FallbackMode::Poll,
            random_max_chunk: LEGACY_MAX_CHUNK,
        }
    }

    /// Defaults overridden by `COMPAT_*` environment variables
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SyncConfig::from_env`] with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(POLL_INTERVAL_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.poll_interval = Duration::from_millis(ms),
                Err(e) => warn!(var = POLL_INTERVAL_ENV, value = %raw, error = %e, "Ignoring invalid poll interval"),
            }
        }

        if let Some(raw) = lookup(FALLBACK_MODE_ENV) {
            match raw.parse::<FallbackMode>() {
                Ok(mode) => config.fallback = mode,
                Err(e) => warn!(var = FALLBACK_MODE_ENV, error = %e, "Ignoring invalid fallback mode"),
            }
        }

        if let Some(raw) = lookup(RANDOM_MAX_CHUNK_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(chunk) => config.random_max_chunk = chunk,
                Err(e) => warn!(var = RANDOM_MAX_CHUNK_ENV, value = %raw, error = %e, "Ignoring invalid chunk size"),
            }
        }

        config.normalized()
    }

    /// Clamp every field into its supported range
    pub fn normalized(self) -> Self {
        Self {
            poll_interval: self.poll_interval.max(MIN_POLL_INTERVAL),
            fallback: self.fallback,
            random_max_chunk: self.random_max_chunk.clamp(1, LEGACY_MAX_CHUNK),
        }
    }
}

/// Where a process-wide primitive gets its configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read `COMPAT_*` variables when capabilities are resolved
    Environment,
    Fixed(SyncConfig),
}

impl ConfigSource {
    pub fn load(&self) -> SyncConfig {
        match self {
            ConfigSource::Environment => SyncConfig::from_env(),
            ConfigSource::Fixed(config) => config.normalized(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::from_lookup(|_| None);
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.poll_interval, Duration::from_millis(1));
        assert_eq!(config.fallback, FallbackMode::Poll);
        assert_eq!(config.random_max_chunk, LEGACY_MAX_CHUNK);
    }

    #[test]
    fn test_env_overrides() {
        let config = SyncConfig::from_lookup(lookup_from(&[
            (POLL_INTERVAL_ENV, "5"),
            (FALLBACK_MODE_ENV, "Park"),
            (RANDOM_MAX_CHUNK_ENV, "4096"),
        ]));
        assert_eq!(config.poll_interval, Duration::from_millis(5));
        assert_eq!(config.fallback, FallbackMode::Park);
        assert_eq!(config.random_max_chunk, 4096);
    }

    #[test]
    fn test_invalid_values_ignored_and_clamped() {
        let config = SyncConfig::from_lookup(lookup_from(&[
            (POLL_INTERVAL_ENV, "0"),
            (FALLBACK_MODE_ENV, "futex"),
            (RANDOM_MAX_CHUNK_ENV, "99999999999"),
        ]));
        assert_eq!(config.poll_interval, MIN_POLL_INTERVAL);
        assert_eq!(config.fallback, FallbackMode::Poll);
        assert_eq!(config.random_max_chunk, LEGACY_MAX_CHUNK);

        let config = SyncConfig::from_lookup(lookup_from(&[(POLL_INTERVAL_ENV, "soon")]));
        assert_eq!(config.poll_interval, MIN_POLL_INTERVAL);
    }

    #[test]
    fn test_presets() {
        assert_eq!(SyncConfig::low_latency().fallback, FallbackMode::Park);
        assert!(SyncConfig::long_wait().poll_interval > SyncConfig::default().poll_interval);
    }
}
