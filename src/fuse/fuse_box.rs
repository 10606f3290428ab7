use std::sync::Arc;

use super::Fuse;
use crate::clock::{Clock, SystemClock};
use crate::config::{FuseConfig, FuseSettings, Validate};
use crate::error::FuseError;
use crate::store::Store;

/// Factory handing out fuses that share one store and clock
///
/// # Example
///
/// ```rust
/// use lighter_fuse::{FuseBox, FuseSettings, MemoryStore};
/// use std::sync::Arc;
///
/// # fn example() -> Result<(), lighter_fuse::FuseError> {
/// let fuse_box = FuseBox::new(Arc::new(MemoryStore::new()), FuseSettings::default())?;
///
/// // M = 10, T = 100 ms, R = 1000 ms unless configured otherwise
/// let fuse = fuse_box.fuse("search-index")?;
/// assert_eq!(fuse.max_melts(), 10);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FuseBox<S: Store> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    settings: FuseSettings,
}

impl<S: Store> FuseBox<S> {
    /// Create a fuse box on the system clock
    pub fn new(store: Arc<S>, settings: FuseSettings) -> Result<Self, FuseError> {
        Self::with_clock(store, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<S>,
        settings: FuseSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FuseError> {
        settings.validate()?;

        Ok(Self {
            store,
            clock,
            settings,
        })
    }

    /// Fuse named `name`, using its configured override or the defaults
    pub fn fuse(&self, name: &str) -> Result<Fuse<S>, FuseError> {
        self.fuse_with(name, self.settings.for_fuse(name))
    }

    /// Fuse named `name` with explicit parameters
    pub fn fuse_with(&self, name: &str, config: FuseConfig) -> Result<Fuse<S>, FuseError> {
        ::tracing::debug!(
            fuse = %name,
            max_melts = config.max_melts,
            window_ms = config.window_ms,
            anneal_ms = config.anneal_ms,
            "Creating fuse"
        );

        Fuse::with_clock(name, config, Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    pub fn settings(&self) -> &FuseSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}
