//! Key-value stores backing fuse state
//!
//! A fuse keeps nothing between calls. Its melt history, status and restart
//! deadline live in a [`Store`] under keys built by [`StoreKey`], so several
//! fuse handles (or processes, with a shared backend) see the same state.
//!
//! Stores make no atomicity promises. Two writers racing on the same key lose
//! one of the updates, which fuses tolerate.

mod memory;
#[cfg(feature = "redis-store")]
mod redis;

pub use memory::MemoryStore;
#[cfg(feature = "redis-store")]
pub use redis::RedisStore;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Generic store trait for fetching, storing and deleting fuse records
#[async_trait]
pub trait Store: Send + Sync + Debug {
    /// Fetch a value from the store
    ///
    /// Returns `Ok(None)` only when the key is absent. Backend failures are
    /// errors, never `None`.
    async fn fetch<V>(&self, key: &str) -> Result<Option<V>>
    where
        V: for<'de> Deserialize<'de> + Send;

    /// Insert or overwrite a value
    async fn store<V>(&self, key: &str, value: &V) -> Result<()>
    where
        V: Serialize + Send + Sync + ?Sized;

    /// Delete a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Builder for the per-fuse key namespace
pub struct StoreKey;

impl StoreKey {
    /// Ordered list of melt timestamps
    pub fn melt_history(name: &str) -> String {
        format!("{}-melt-history", name)
    }

    /// Status token, `"ok"` or `"blown"`
    pub fn state(name: &str) -> String {
        format!("{}-state", name)
    }

    /// Restart deadline, present only while blown
    pub fn restart(name: &str) -> String {
        format!("{}-restart", name)
    }

    /// All keys owned by a fuse
    pub fn all(name: &str) -> [String; 3] {
        [Self::melt_history(name), Self::state(name), Self::restart(name)]
    }
}
