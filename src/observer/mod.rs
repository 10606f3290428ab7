//! Transition observers
//!
//! Observers subscribe to a fuse and are told when it blows or recovers.
//! They are never called for melts that leave the fuse closed, nor for status
//! checks that find nothing to change.

use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::fuse::{Fuse, Transition};
use crate::store::Store;

/// Receives fuse transition notifications
///
/// `fuse` is the fuse that changed state, so an observer can query it (for
/// example with [`Fuse::snapshot`] or [`Fuse::blown`]) while handling the
/// event.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use lighter_fuse::{Fuse, FuseObserver, Store, Transition};
///
/// struct Pager;
///
/// #[async_trait]
/// impl<S: Store> FuseObserver<S> for Pager {
///     async fn update(&self, fuse: &Fuse<S>, transition: Transition) {
///         if let Transition::Blown { restart_at } = transition {
///             eprintln!("{} blown until {}", fuse.name(), restart_at);
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait FuseObserver<S: Store>: Send + Sync {
    async fn update(&self, fuse: &Fuse<S>, transition: Transition);
}

/// Ordered list of attached observers
///
/// Identity is the `Arc` allocation: detaching removes the exact handle that
/// was attached, not an equal-looking one.
pub struct ObserverRegistry<S: Store> {
    observers: RwLock<Vec<Arc<dyn FuseObserver<S>>>>,
}

impl<S: Store> ObserverRegistry<S> {
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Append an observer. The same handle attached twice is notified twice.
    pub fn attach(&self, observer: Arc<dyn FuseObserver<S>>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Remove the first attachment of `observer`
    ///
    /// Returns `false` if it was not attached.
    pub fn detach<O>(&self, observer: &Arc<O>) -> bool
    where
        O: ?Sized,
    {
        let mut observers = self
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let position = observers
            .iter()
            .position(|attached| std::ptr::addr_eq(Arc::as_ptr(attached), Arc::as_ptr(observer)));

        match position {
            Some(index) => {
                observers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether `observer` is currently attached
    pub fn contains<O>(&self, observer: &Arc<O>) -> bool
    where
        O: ?Sized,
    {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|attached| std::ptr::addr_eq(Arc::as_ptr(attached), Arc::as_ptr(observer)))
    }

    pub fn len(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every observer in attachment order
    ///
    /// Works on a copy of the list, so observers may attach or detach (or
    /// query the fuse) from inside `update` without deadlocking.
    pub async fn notify(&self, fuse: &Fuse<S>, transition: Transition) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for observer in observers {
            observer.update(fuse, transition).await;
        }
    }
}

impl<S: Store> Default for ObserverRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Store> fmt::Debug for ObserverRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.len())
            .finish()
    }
}
