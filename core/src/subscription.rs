//! Subscription handles and the bag that owns them.
//!
//! Wiring a reactor creates long-lived work: the pipeline task, tasks that
//! forward effect streams, and the hook that closes the output relays. Each
//! piece is wrapped in a [`Subscription`] and added to the reactor's
//! [`CompositeSubscription`]. Teardown clears the bag exactly once per entry.
//!
//! # Example
//!
//! ```
//! use rxreactor_core::subscription::{CompositeSubscription, DisposedBy, Subscription};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bag = CompositeSubscription::new();
//!
//! tokio::spawn(async { /* long-running work */ }).disposed_by(&bag);
//! bag.add(Subscription::from_fn(|| Ok(())));
//!
//! bag.clear();
//! bag.clear(); // no-op
//! assert!(bag.is_empty());
//! # }
//! ```

use crate::error::ReactorError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

/// Something that holds a resource until disposed.
pub trait Disposable: Send {
    /// Release the resource.
    ///
    /// # Errors
    ///
    /// Returns [`ReactorError::Disposal`] when the resource could not be
    /// released cleanly.
    fn dispose(&mut self) -> Result<(), ReactorError>;

    /// Whether the resource is already gone and can be dropped from a bag.
    fn is_disposed(&self) -> bool {
        false
    }
}

impl<T: Send + 'static> Disposable for JoinHandle<T> {
    fn dispose(&mut self) -> Result<(), ReactorError> {
        self.abort();
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.is_finished()
    }
}

struct FnDisposable<F> {
    release: Option<F>,
}

impl<F> Disposable for FnDisposable<F>
where
    F: FnOnce() -> Result<(), ReactorError> + Send,
{
    fn dispose(&mut self) -> Result<(), ReactorError> {
        self.release.take().map_or(Ok(()), |release| release())
    }

    fn is_disposed(&self) -> bool {
        self.release.is_none()
    }
}

/// Owned cancellation token for one piece of pipeline work.
pub struct Subscription {
    inner: Box<dyn Disposable>,
}

impl Subscription {
    /// Wrap any [`Disposable`].
    #[must_use]
    pub fn new(disposable: impl Disposable + 'static) -> Self {
        Self {
            inner: Box::new(disposable),
        }
    }

    /// A subscription that aborts a spawned task.
    #[must_use]
    pub fn task<T: Send + 'static>(handle: JoinHandle<T>) -> Self {
        Self::new(handle)
    }

    /// A subscription that runs `release` once when disposed.
    #[must_use]
    pub fn from_fn<F>(release: F) -> Self
    where
        F: FnOnce() -> Result<(), ReactorError> + Send + 'static,
    {
        Self::new(FnDisposable {
            release: Some(release),
        })
    }

    /// Whether the underlying resource is already gone.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    /// Release the underlying resource.
    ///
    /// # Errors
    ///
    /// Propagates the error of the wrapped [`Disposable`].
    pub fn dispose(mut self) -> Result<(), ReactorError> {
        self.inner.dispose()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Shared bag of subscriptions, cleared as a unit.
///
/// Clones share the same entries.
#[derive(Clone, Default)]
pub struct CompositeSubscription {
    entries: Arc<Mutex<Vec<Subscription>>>,
}

impl CompositeSubscription {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Track `subscription`.
    ///
    /// Entries whose resource is already gone (finished tasks) are dropped
    /// from the bag at the same time.
    pub fn add(&self, subscription: Subscription) {
        let mut entries = self.entries();
        entries.retain(|entry| !entry.is_disposed());
        entries.push(subscription);
    }

    /// Number of tracked subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Dispose every tracked subscription and empty the bag.
    ///
    /// Disposal is best effort: a subscription that fails or panics while
    /// disposing is logged and the remaining ones are still disposed. Calling
    /// this on an empty bag does nothing. The bag stays usable afterwards.
    ///
    /// Returns the number of subscriptions released.
    pub fn clear(&self) -> usize {
        let drained = std::mem::take(&mut *self.entries());
        let total = drained.len();
        let mut failures = 0_usize;

        for subscription in drained {
            match panic::catch_unwind(AssertUnwindSafe(|| subscription.dispose())) {
                Ok(Ok(())) => {},
                Ok(Err(error)) => {
                    failures += 1;
                    tracing::warn!(error = %error, "Subscription disposal failed, continuing teardown");
                },
                Err(_) => {
                    failures += 1;
                    tracing::warn!("Subscription disposal panicked, continuing teardown");
                },
            }
        }

        if total > 0 {
            tracing::debug!(total, failures, "Cleared subscriptions");
        }
        total
    }
}

impl std::fmt::Debug for CompositeSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeSubscription")
            .field("len", &self.len())
            .finish()
    }
}

/// Adds a disposable to a bag at the end of an expression.
///
/// ```
/// # use rxreactor_core::subscription::{CompositeSubscription, DisposedBy};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let bag = CompositeSubscription::new();
/// tokio::spawn(std::future::pending::<()>()).disposed_by(&bag);
/// assert_eq!(bag.len(), 1);
/// # }
/// ```
pub trait DisposedBy {
    /// Track `self` in `bag`.
    fn disposed_by(self, bag: &CompositeSubscription);
}

impl<D: Disposable + 'static> DisposedBy for D {
    fn disposed_by(self, bag: &CompositeSubscription) {
        bag.add(Subscription::new(self));
    }
}
