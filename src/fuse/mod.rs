//! Fuse: a store-backed circuit breaker
//!
//! A fuse counts failures ("melts") against a named resource. When more than
//! `max_melts` melts land inside a sliding `window_ms`, the fuse blows and
//! stays blown for at least `anneal_ms`. Callers ask [`Fuse::ok`] or
//! [`Fuse::blown`] before touching the resource.
//!
//! # State Machine
//!
//! ```text
//!                 melt(), melts <= M
//!                 ┌────┐
//!                 │    ▼
//!             ┌────────┐   melt(), melts > M    ┌─────────┐
//!  start ───► │ Closed │ ─────────────────────► │  Blown  │ ◄─┐ melt()
//!             │  "ok"  │                        │ "blown" │ ──┘ check, now < restart
//!             └────────┘ ◄───────────────────── └─────────┘
//!                         check, now >= restart
//! ```
//!
//! Recovery is lazy. Nothing happens when the anneal period ends; the next
//! `blown()`/`ok()` call notices and closes the fuse.
//!
//! All state lives in the [`Store`], re-read on every call. Concurrent melts
//! on the same name can overwrite each other's history, so counting is
//! best-effort.
//!
//! # Example
//!
//! ```rust
//! use lighter_fuse::{Fuse, FuseConfig, MemoryStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), lighter_fuse::FuseError> {
//! let store = Arc::new(MemoryStore::new());
//! let fuse = Fuse::new("payment-api", FuseConfig::new(10, 100, 1000), store)?;
//!
//! if fuse.ok().await? {
//!     // call the payment API; on failure:
//!     fuse.melt().await?;
//! }
//! # Ok(())
//! # }
//! ```

mod fuse_box;
mod history;

pub use fuse_box::FuseBox;

use anyhow::Context;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::{FuseConfig, Validate};
use crate::error::FuseError;
use crate::metrics;
use crate::observer::{FuseObserver, ObserverRegistry};
use crate::store::{Store, StoreKey};
use history::MeltHistory;

/// Fuse status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuseStatus {
    /// Normal operation, the resource may be used
    Closed,
    /// Tripped, the resource should be left alone until the fuse recovers
    Blown,
}

impl FuseStatus {
    /// Token persisted in the store
    pub fn as_str(&self) -> &'static str {
        match self {
            FuseStatus::Closed => "ok",
            FuseStatus::Blown => "blown",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "ok" => Some(FuseStatus::Closed),
            "blown" => Some(FuseStatus::Blown),
            _ => None,
        }
    }
}

impl fmt::Display for FuseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuseStatus::Closed => write!(f, "Closed"),
            FuseStatus::Blown => write!(f, "Blown"),
        }
    }
}

/// The edge an observer is being notified about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Closed -> Blown; the fuse stays blown until `restart_at` (ms)
    Blown { restart_at: u64 },
    /// Blown -> Closed
    Recovered,
}

/// Persisted fuse state as currently stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuseSnapshot {
    pub status: FuseStatus,
    /// Set only while blown
    pub restart_at: Option<u64>,
    /// Melt timestamps as of the last trim
    pub melts: Vec<u64>,
}

/// A named fuse backed by a [`Store`]
///
/// Construct with [`Fuse::new`] or [`Fuse::with_clock`], or through a
/// [`FuseBox`]. Handles are cheap: any number of fuses with the same name and
/// store share one persisted state.
pub struct Fuse<S: Store> {
    name: String,
    config: FuseConfig,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    observers: ObserverRegistry<S>,
}

impl<S: Store> Fuse<S> {
    /// Create a fuse using the system clock
    ///
    /// Fails with [`FuseError::InvalidConfig`] for an empty name or a zero
    /// window.
    pub fn new(
        name: impl Into<String>,
        config: FuseConfig,
        store: Arc<S>,
    ) -> Result<Self, FuseError> {
        Self::with_clock(name, config, store, Arc::new(SystemClock))
    }

    /// Create a fuse reading time from `clock`
    pub fn with_clock(
        name: impl Into<String>,
        config: FuseConfig,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FuseError> {
        let name = name.into();
        if name.is_empty() {
            return Err(FuseError::InvalidConfig("fuse name cannot be empty".to_string()));
        }
        config.validate()?;

        Ok(Self {
            name,
            config,
            store,
            clock,
            observers: ObserverRegistry::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Melts tolerated per window (M)
    pub fn max_melts(&self) -> u32 {
        self.config.max_melts
    }

    /// Sliding window width in milliseconds (T)
    pub fn window_ms(&self) -> u64 {
        self.config.window_ms
    }

    /// Minimum blown period in milliseconds (R)
    pub fn anneal_ms(&self) -> u64 {
        self.config.anneal_ms
    }

    pub fn config(&self) -> &FuseConfig {
        &self.config
    }

    /// Record one failure now
    ///
    /// Appends to the melt history and trims it to the window. If more than
    /// `max_melts` melts remain and the fuse is closed, the fuse blows and
    /// observers are notified. Melting a blown fuse only updates the history;
    /// it never pushes the restart deadline back.
    #[tracing::instrument(skip(self), fields(fuse = %self.name))]
    pub async fn melt(&self) -> Result<(), FuseError> {
        let now = self.clock.now_ms();
        let history_key = StoreKey::melt_history(&self.name);

        let melts: Vec<u64> = self.load(&history_key).await?.unwrap_or_default();
        let mut history = MeltHistory::new(melts);
        history.record(now, self.config.window_ms);
        self.save(&history_key, history.as_slice()).await?;

        metrics::record_melt(&self.name);
        ::tracing::debug!(
            melts = history.len(),
            max_melts = self.config.max_melts,
            "Fuse melted"
        );

        if history.len() as u64 <= u64::from(self.config.max_melts) {
            return Ok(());
        }

        if self.read_status().await? == Some(FuseStatus::Blown) {
            return Ok(());
        }

        let restart_at = now.saturating_add(self.config.anneal_ms);
        self.save(&StoreKey::restart(&self.name), &restart_at).await?;
        self.save(&StoreKey::state(&self.name), FuseStatus::Blown.as_str())
            .await?;

        metrics::record_trip(&self.name);
        ::tracing::warn!(
            state = "Closed -> Blown",
            melts = history.len(),
            window_ms = self.config.window_ms,
            restart_at,
            "Fuse blown"
        );

        self.observers
            .notify(self, Transition::Blown { restart_at })
            .await;

        Ok(())
    }

    /// Is the fuse blown?
    ///
    /// A blown fuse whose restart deadline has passed recovers here: status
    /// goes back to closed, the deadline and melt history are deleted,
    /// observers are notified and `false` is returned.
    #[tracing::instrument(skip(self), fields(fuse = %self.name))]
    pub async fn blown(&self) -> Result<bool, FuseError> {
        let status = match self.read_status().await? {
            Some(status) => status,
            None => {
                self.save(&StoreKey::state(&self.name), FuseStatus::Closed.as_str())
                    .await?;
                FuseStatus::Closed
            }
        };

        if status == FuseStatus::Closed {
            return Ok(false);
        }

        let now = self.clock.now_ms();
        let restart_at: Option<u64> = self.load(&StoreKey::restart(&self.name)).await?;

        match restart_at {
            Some(restart_at) if now < restart_at => return Ok(true),
            Some(_) => {}
            // Lost to a racing writer; nothing left to wait for
            None => ::tracing::warn!("Blown fuse has no restart deadline, recovering"),
        }

        self.save(&StoreKey::state(&self.name), FuseStatus::Closed.as_str())
            .await?;
        self.remove(&StoreKey::restart(&self.name)).await?;
        self.remove(&StoreKey::melt_history(&self.name)).await?;

        metrics::record_recovery(&self.name);
        ::tracing::info!(
            state = "Blown -> Closed",
            restart_at = ?restart_at,
            now,
            "Fuse recovered"
        );

        self.observers.notify(self, Transition::Recovered).await;

        Ok(false)
    }

    /// Is the fuse usable? Same side effects as [`Fuse::blown`].
    pub async fn ok(&self) -> Result<bool, FuseError> {
        Ok(!self.blown().await?)
    }

    /// Read the persisted state without triggering recovery
    pub async fn snapshot(&self) -> Result<FuseSnapshot, FuseError> {
        let status = self.read_status().await?.unwrap_or(FuseStatus::Closed);
        let restart_at: Option<u64> = self.load(&StoreKey::restart(&self.name)).await?;
        let melts: Vec<u64> = self
            .load(&StoreKey::melt_history(&self.name))
            .await?
            .unwrap_or_default();

        Ok(FuseSnapshot {
            status,
            restart_at,
            melts,
        })
    }

    /// Delete every record this fuse owns
    ///
    /// The next call starts from a fresh closed fuse. Observers are not
    /// notified.
    #[tracing::instrument(skip(self), fields(fuse = %self.name))]
    pub async fn reset(&self) -> Result<(), FuseError> {
        for key in StoreKey::all(&self.name) {
            self.remove(&key).await?;
        }

        ::tracing::info!("Fuse manually reset");
        Ok(())
    }

    /// Subscribe to transitions
    pub fn attach(&self, observer: Arc<dyn FuseObserver<S>>) {
        self.observers.attach(observer);
    }

    /// Unsubscribe a previously attached observer; unknown observers are ignored
    pub fn detach<O>(&self, observer: &Arc<O>) -> bool
    where
        O: ?Sized,
    {
        self.observers.detach(observer)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    async fn read_status(&self) -> Result<Option<FuseStatus>, FuseError> {
        let key = StoreKey::state(&self.name);
        let token: Option<String> = self.load(&key).await?;

        match token {
            None => Ok(None),
            Some(token) => match FuseStatus::from_token(&token) {
                Some(status) => Ok(Some(status)),
                None => Err(FuseError::CorruptState { key, value: token }),
            },
        }
    }

    async fn load<V>(&self, key: &str) -> Result<Option<V>, FuseError>
    where
        V: for<'de> Deserialize<'de> + Send,
    {
        let value = self
            .store
            .fetch(key)
            .await
            .with_context(|| format!("fuse `{}`: failed to fetch `{}`", self.name, key))?;
        Ok(value)
    }

    async fn save<V>(&self, key: &str, value: &V) -> Result<(), FuseError>
    where
        V: serde::Serialize + Send + Sync + ?Sized,
    {
        self.store
            .store(key, value)
            .await
            .with_context(|| format!("fuse `{}`: failed to store `{}`", self.name, key))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), FuseError> {
        self.store
            .delete(key)
            .await
            .with_context(|| format!("fuse `{}`: failed to delete `{}`", self.name, key))?;
        Ok(())
    }
}

impl<S: Store> fmt::Debug for Fuse<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fuse")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("store", &self.store)
            .field("observers", &self.observers.len())
            .finish()
    }
}
