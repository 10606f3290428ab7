use serde::{Deserialize, Serialize};

use super::{ConfigError, Validate};

/// Tuning for a single fuse
///
/// Fields follow the canonical parameter order used across the crate: after
/// the fuse name come `max_melts` (M), `window_ms` (T) and `anneal_ms` (R).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuseConfig {
    /// Melts tolerated inside one window; the next one blows the fuse
    #[serde(default = "default_max_melts")]
    pub max_melts: u32,
    /// Width of the sliding melt window in milliseconds
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// Minimum time in milliseconds a blown fuse stays blown
    #[serde(default = "default_anneal_ms")]
    pub anneal_ms: u64,
}

/// Store backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Key prefix for namespace isolation in shared backends
    #[serde(default = "default_store_prefix")]
    pub prefix: String,
    /// Redis connection URL, required by the Redis store
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl FuseConfig {
    pub fn new(max_melts: u32, window_ms: u64, anneal_ms: u64) -> Self {
        Self {
            max_melts,
            window_ms,
            anneal_ms,
        }
    }
}

// Default functions for FuseConfig
fn default_max_melts() -> u32 {
    10
}

fn default_window_ms() -> u64 {
    100
}

fn default_anneal_ms() -> u64 {
    1000
}

// Default functions for StoreConfig
fn default_store_prefix() -> String {
    "lighter-fuse".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    3000
}

impl Default for FuseConfig {
    fn default() -> Self {
        Self {
            max_melts: default_max_melts(),
            window_ms: default_window_ms(),
            anneal_ms: default_anneal_ms(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            prefix: default_store_prefix(),
            redis_url: None,
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Validate for FuseConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.window_ms == 0 {
            return Err(ConfigError::ValidationError("fuse.window_ms must be > 0".to_string()));
        }
        Ok(())
    }
}

impl Validate for StoreConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() {
            return Err(ConfigError::ValidationError("store.prefix cannot be empty".to_string()));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::ValidationError("store.connect_timeout_ms must be > 0".to_string()));
        }
        if let Some(url) = &self.redis_url
            && url.is_empty()
        {
            return Err(ConfigError::ValidationError("store.redis_url cannot be empty when set".to_string()));
        }
        Ok(())
    }
}
