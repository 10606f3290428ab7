use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::Store;

/// Process-local store using DashMap
///
/// Values are encoded with bincode, the same encoding the Redis store writes,
/// so fuse state round-trips identically through either backend. Entries
/// never expire; a fuse deletes its own records on recovery or reset.
///
/// Clones share the same map.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    /// DashMap storage with configurable shards
    entries: Arc<DashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create a new MemoryStore with default shard count (CPU count * 4)
    pub fn new() -> Self {
        Self::with_shard_count(num_cpus::get() * 4)
    }

    /// Create a new MemoryStore with specific shard count
    ///
    /// DashMap requires a power of two; other values are rounded up.
    pub fn with_shard_count(shard_count: usize) -> Self {
        let shards = shard_count.max(2).next_power_of_two();

        Self {
            entries: Arc::new(DashMap::with_shard_amount(shards)),
        }
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove every key, regardless of which fuse owns it
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch<V>(&self, key: &str) -> Result<Option<V>>
    where
        V: for<'de> Deserialize<'de> + Send,
    {
        match self.entries.get(key) {
            Some(entry) => {
                let value: V = bincode::deserialize(entry.value())
                    .with_context(|| format!("Failed to deserialize stored value for `{}`", key))?;

                ::tracing::trace!(store_key = %key, "Store hit");
                Ok(Some(value))
            }
            None => {
                ::tracing::trace!(store_key = %key, "Store miss");
                Ok(None)
            }
        }
    }

    async fn store<V>(&self, key: &str, value: &V) -> Result<()>
    where
        V: Serialize + Send + Sync + ?Sized,
    {
        let data = bincode::serialize(value)
            .with_context(|| format!("Failed to serialize value for `{}`", key))?;

        self.entries.insert(key.to_string(), data);

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
