#![deny(warnings)]

//! Store-backed fuses: circuit breakers that blow after too many failures in
//! a sliding window and anneal back after a cooldown.

pub mod clock;
pub mod config;
pub mod error;
pub mod fuse;
pub mod metrics;
pub mod observer;
pub mod store;

// Re-export commonly used types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{FuseConfig, FuseSettings, StoreConfig};
pub use error::FuseError;
pub use fuse::{Fuse, FuseBox, FuseSnapshot, FuseStatus, Transition};
pub use observer::{FuseObserver, ObserverRegistry};
#[cfg(feature = "redis-store")]
pub use store::RedisStore;
pub use store::{MemoryStore, Store, StoreKey};
