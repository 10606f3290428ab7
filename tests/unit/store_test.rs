// Store failures and absence handling as seen through fuses

use anyhow::{Result, bail};
use async_trait::async_trait;
use lighter_fuse::{Fuse, FuseConfig, FuseError, ManualClock, MemoryStore, Store, StoreKey};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// ============================================================================
// Test Doubles
// ============================================================================

/// MemoryStore that can be switched into an outage
#[derive(Debug, Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn fetch<V>(&self, key: &str) -> Result<Option<V>>
    where
        V: for<'de> Deserialize<'de> + Send,
    {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("connection refused");
        }
        self.inner.fetch(key).await
    }

    async fn store<V>(&self, key: &str, value: &V) -> Result<()>
    where
        V: Serialize + Send + Sync + ?Sized,
    {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("connection refused");
        }
        self.inner.store(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("connection refused");
        }
        self.inner.delete(key).await
    }
}

fn flaky_fuse(config: FuseConfig) -> (Fuse<FlakyStore>, Arc<FlakyStore>, ManualClock) {
    let store = Arc::new(FlakyStore::default());
    let clock = ManualClock::new(0);
    let fuse = Fuse::with_clock("flaky", config, store.clone(), Arc::new(clock.clone())).unwrap();
    (fuse, store, clock)
}

// ============================================================================
// Outages
// ============================================================================

#[tokio::test]
async fn test_read_outage_is_not_reported_as_ok() {
    let (fuse, store, _clock) = flaky_fuse(FuseConfig::default());
    store.fail_reads(true);

    let result = fuse.ok().await;
    assert!(matches!(result, Err(FuseError::Store(_))));
}

#[tokio::test]
async fn test_read_outage_while_blown_is_not_reported_as_ok() {
    let (fuse, store, _clock) = flaky_fuse(FuseConfig::new(0, 100, 1000));
    fuse.melt().await.unwrap();

    store.fail_reads(true);
    assert!(fuse.blown().await.is_err());

    store.fail_reads(false);
    assert!(fuse.blown().await.unwrap());
}

#[tokio::test]
async fn test_read_outage_fails_melt() {
    let (fuse, store, _clock) = flaky_fuse(FuseConfig::default());
    store.fail_reads(true);

    assert!(matches!(fuse.melt().await, Err(FuseError::Store(_))));
}

#[tokio::test]
async fn test_write_outage_fails_melt_without_recording() {
    let (fuse, store, _clock) = flaky_fuse(FuseConfig::default());
    store.fail_writes(true);

    assert!(fuse.melt().await.is_err());

    store.fail_writes(false);
    assert!(fuse.snapshot().await.unwrap().melts.is_empty());
}

#[tokio::test]
async fn test_write_outage_during_recovery_keeps_fuse_blown() {
    let (fuse, store, clock) = flaky_fuse(FuseConfig::new(0, 100, 100));
    fuse.melt().await.unwrap();

    clock.set(100);
    store.fail_writes(true);
    assert!(fuse.ok().await.is_err());

    store.fail_writes(false);
    assert!(fuse.ok().await.unwrap());
}

#[tokio::test]
async fn test_store_error_names_fuse_and_key() {
    let (fuse, store, _clock) = flaky_fuse(FuseConfig::default());
    store.fail_reads(true);

    let err = fuse.blown().await.unwrap_err();
    let message = format!("{:#}", err);

    assert!(message.contains("flaky"), "{}", message);
    assert!(message.contains("flaky-state"), "{}", message);
    assert!(message.contains("connection refused"), "{}", message);
}

// ============================================================================
// Absence
// ============================================================================

#[tokio::test]
async fn test_absent_keys_mean_fresh_closed_fuse() {
    let (fuse, store, _clock) = flaky_fuse(FuseConfig::default());

    let snapshot = fuse.snapshot().await.unwrap();
    assert!(snapshot.melts.is_empty());
    assert_eq!(snapshot.restart_at, None);

    assert!(fuse.ok().await.unwrap());

    let token: Option<String> = store.fetch(&StoreKey::state("flaky")).await.unwrap();
    assert_eq!(token.as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_persisted_layout() {
    let (fuse, store, _clock) = flaky_fuse(FuseConfig::new(1, 100, 250));

    fuse.melt().await.unwrap();
    fuse.melt().await.unwrap();

    let history: Option<Vec<u64>> = store.fetch("flaky-melt-history").await.unwrap();
    let state: Option<String> = store.fetch("flaky-state").await.unwrap();
    let restart: Option<u64> = store.fetch("flaky-restart").await.unwrap();

    assert_eq!(history, Some(vec![0, 0]));
    assert_eq!(state.as_deref(), Some("blown"));
    assert_eq!(restart, Some(250));
}

#[tokio::test]
async fn test_lost_update_undercounts() {
    // Two handles read the same history before either writes back
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(0);
    let fuse = Fuse::with_clock(
        "racy",
        FuseConfig::new(1, 100, 1000),
        store.clone(),
        Arc::new(clock.clone()),
    )
    .unwrap();

    let key = StoreKey::melt_history("racy");
    let snapshot: Vec<u64> = store.fetch(&key).await.unwrap().unwrap_or_default();

    fuse.melt().await.unwrap();

    // a second writer stores its own view, dropping the first melt
    let mut stale = snapshot;
    stale.push(0);
    store.store(&key, stale.as_slice()).await.unwrap();

    assert_eq!(fuse.snapshot().await.unwrap().melts.len(), 1);
    assert!(fuse.ok().await.unwrap());
}
