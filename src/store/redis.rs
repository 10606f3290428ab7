use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use super::Store;
use crate::config::StoreConfig;

/// Redis-backed store shared across processes
///
/// Features:
/// - Async operations using redis::aio::ConnectionManager
/// - Automatic reconnection handled by the connection manager
/// - Key prefixing for namespace isolation
/// - Bincode serialization, identical to [`MemoryStore`](super::MemoryStore)
///
/// Reads and writes are plain GET/SET/DEL with no transactions, so concurrent
/// melts against one fuse may overwrite each other's history.
#[derive(Clone)]
pub struct RedisStore {
    /// Connection manager for pooled async operations
    conn_manager: Arc<ConnectionManager>,
    /// Key prefix for namespace isolation (e.g., "lighter-fuse")
    prefix: String,
}

impl RedisStore {
    /// Connect with a default timeout of 3 seconds
    ///
    /// # Example
    /// ```no_run
    /// use lighter_fuse::store::RedisStore;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let store = RedisStore::new("redis://localhost:6379", "lighter-fuse").await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(url: &str, prefix: &str) -> Result<Self> {
        Self::with_timeout(url, prefix, Duration::from_secs(3)).await
    }

    /// Connect using [`StoreConfig`]
    ///
    /// Fails if no `redis_url` is configured.
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        let url = config
            .redis_url
            .as_deref()
            .context("store.redis_url must be set to use the Redis store")?;

        Self::with_timeout(
            url,
            &config.prefix,
            Duration::from_millis(config.connect_timeout_ms),
        )
        .await
    }

    /// Connect with a custom connection timeout
    pub async fn with_timeout(
        url: &str,
        prefix: &str,
        connection_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::open(url).context("Failed to create Redis client")?;

        let conn_manager = timeout(connection_timeout, ConnectionManager::new(client))
            .await
            .with_context(|| {
                format!(
                    "Redis connection timeout after {:?}. Check Redis is running at: {}",
                    connection_timeout, url
                )
            })?
            .context("Failed to create Redis connection manager")?;

        Ok(Self {
            conn_manager: Arc::new(conn_manager),
            prefix: prefix.to_string(),
        })
    }

    /// Build the full key with prefix
    fn build_key(&self, key: &str) -> String {
        prefixed_key(&self.prefix, key)
    }

    fn connection(&self) -> ConnectionManager {
        (*self.conn_manager).clone()
    }
}

fn prefixed_key(prefix: &str, key: &str) -> String {
    format!("{}:{}", prefix, key)
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Store for RedisStore {
    #[tracing::instrument(skip(self), fields(store_key = %key))]
    async fn fetch<V>(&self, key: &str) -> Result<Option<V>>
    where
        V: for<'de> Deserialize<'de> + Send,
    {
        let full_key = self.build_key(key);
        let mut conn = self.connection();

        let data: Option<Vec<u8>> = conn
            .get(&full_key)
            .await
            .context("Failed to get value from Redis")?;

        match data {
            Some(bytes) => {
                let value: V = bincode::deserialize(&bytes)
                    .context("Failed to deserialize stored value")?;

                ::tracing::debug!("Store hit");
                Ok(Some(value))
            }
            None => {
                ::tracing::debug!("Store miss");
                Ok(None)
            }
        }
    }

    #[tracing::instrument(skip(self, value), fields(store_key = %key))]
    async fn store<V>(&self, key: &str, value: &V) -> Result<()>
    where
        V: Serialize + Send + Sync + ?Sized,
    {
        let full_key = self.build_key(key);
        let mut conn = self.connection();

        let data = bincode::serialize(value).context("Failed to serialize value")?;

        let _: () = conn
            .set(&full_key, data)
            .await
            .context("Failed to set value in Redis")?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(store_key = %key))]
    async fn delete(&self, key: &str) -> Result<()> {
        let full_key = self.build_key(key);
        let mut conn = self.connection();

        let deleted: u32 = conn
            .del(&full_key)
            .await
            .context("Failed to delete value from Redis")?;

        if deleted > 0 {
            ::tracing::debug!("Store value deleted");
        }

        Ok(())
    }
}
