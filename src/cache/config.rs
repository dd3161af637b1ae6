//! Cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_INDEX_TTL_SECS: u64 = 20;
const DEFAULT_MAX_ENTRIES: usize = 256;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve and store cached pages at all.
    pub enabled: bool,
    /// Lifetime of a cached index page.
    pub index_ttl_seconds: u64,
    /// Maximum pages held at once; least recently used pages go first.
    pub max_entries: usize,
    /// How often expired pages are purged in the background.
    pub sweep_interval_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            index_ttl_seconds: DEFAULT_INDEX_TTL_SECS,
            max_entries: DEFAULT_MAX_ENTRIES,
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            index_ttl_seconds: settings.index_ttl.as_secs(),
            max_entries: settings.max_entries.get(),
            sweep_interval_seconds: settings.sweep_interval.as_secs(),
        }
    }
}

impl CacheConfig {
    pub fn index_ttl(&self) -> Duration {
        Duration::from_secs(self.index_ttl_seconds)
    }

    /// Sweep period, never shorter than one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }

    /// Returns the entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}
