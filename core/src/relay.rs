//! Multicast relays with an explicit replay depth.
//!
//! | Relay | Replay depth | Used for |
//! |---|---|---|
//! | [`PublishRelay`] | 0 | effects (one-shot notifications) |
//! | [`ReplayRelay`] | 1 | state (new observers see the latest value first) |
//!
//! Every observer owns an unbounded queue, so a slow observer never loses a
//! value accepted while it was attached. Closing a relay completes every
//! observer stream once its queue is drained and turns later `accept` calls
//! into no-ops.

use futures::stream::{self, BoxStream, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

type Observers<T> = Vec<mpsc::UnboundedSender<T>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn receiver_stream<T>(receiver: mpsc::UnboundedReceiver<T>) -> BoxStream<'static, T>
where
    T: Send + 'static,
{
    stream::unfold(receiver, |mut receiver| async move {
        receiver.recv().await.map(|value| (value, receiver))
    })
    .boxed()
}

/// Send `value` to every observer, dropping the ones that went away.
fn deliver<T: Clone>(observers: &mut Observers<T>, value: &T) -> usize {
    observers.retain(|observer| observer.send(value.clone()).is_ok());
    observers.len()
}

fn live_count<T>(observers: &Observers<T>) -> usize {
    observers.iter().filter(|observer| !observer.is_closed()).count()
}

/// Multicast relay without replay.
///
/// Values accepted while nobody observes are dropped. An observer only sees
/// values accepted after it called [`observe`](Self::observe).
pub struct PublishRelay<T> {
    observers: Arc<Mutex<Option<Observers<T>>>>,
}

impl<T> PublishRelay<T>
where
    T: Clone + Send + 'static,
{
    /// Create an open relay with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: Arc::new(Mutex::new(Some(Vec::new()))),
        }
    }

    /// Deliver `value` to every current observer.
    ///
    /// Returns the number of observers that received it.
    pub fn accept(&self, value: T) -> usize {
        self.try_accept(value).unwrap_or(0)
    }

    /// Like [`accept`](Self::accept), but returns `None` if the relay is closed.
    pub fn try_accept(&self, value: T) -> Option<usize> {
        lock(&self.observers)
            .as_mut()
            .map(|observers| deliver(observers, &value))
    }

    /// Observe values accepted from now on.
    ///
    /// The stream completes when the relay is closed. Observing a closed
    /// relay yields an already completed stream.
    #[must_use]
    pub fn observe(&self) -> BoxStream<'static, T> {
        let mut guard = lock(&self.observers);
        match guard.as_mut() {
            Some(observers) => {
                let (sender, receiver) = mpsc::unbounded_channel();
                observers.push(sender);
                receiver_stream(receiver)
            },
            None => stream::empty().boxed(),
        }
    }

    /// Close the relay. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        lock(&self.observers).take().is_some()
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        lock(&self.observers).is_none()
    }

    /// Number of live observers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.observers).as_ref().map_or(0, live_count)
    }
}

impl<T> Clone for PublishRelay<T> {
    fn clone(&self) -> Self {
        Self {
            observers: Arc::clone(&self.observers),
        }
    }
}

impl<T> Default for PublishRelay<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for PublishRelay<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = lock(&self.observers);
        f.debug_struct("PublishRelay")
            .field("closed", &guard.is_none())
            .field("subscribers", &guard.as_ref().map_or(0, live_count))
            .finish()
    }
}

struct ReplayInner<T> {
    latest: Option<T>,
    observers: Option<Observers<T>>,
}

/// Multicast relay replaying the most recent value.
///
/// The latest value and the observer list are updated under one lock, so an
/// observer never misses or duplicates a value between the replayed one and
/// the live ones.
pub struct ReplayRelay<T> {
    inner: Arc<Mutex<ReplayInner<T>>>,
}

impl<T> ReplayRelay<T>
where
    T: Clone + Send + 'static,
{
    /// Create an empty, open relay.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ReplayInner {
                latest: None,
                observers: Some(Vec::new()),
            })),
        }
    }

    /// Record `value` as the latest and deliver it to every current observer.
    ///
    /// Ignored once the relay is closed. Returns the number of observers that
    /// received it.
    pub fn accept(&self, value: T) -> usize {
        let mut guard = lock(&self.inner);
        let inner = &mut *guard;
        match inner.observers.as_mut() {
            Some(observers) => {
                let delivered = deliver(observers, &value);
                inner.latest = Some(value);
                delivered
            },
            None => 0,
        }
    }

    /// Observe the latest value (if any) followed by every later value.
    ///
    /// After the relay is closed this yields the last value once and completes.
    #[must_use]
    pub fn observe(&self) -> BoxStream<'static, T> {
        let mut guard = lock(&self.inner);
        let inner = &mut *guard;
        let (sender, receiver) = mpsc::unbounded_channel();
        if let Some(latest) = &inner.latest {
            // The receiver is alive, so this cannot fail.
            let _ = sender.send(latest.clone());
        }
        if let Some(observers) = inner.observers.as_mut() {
            observers.push(sender);
        }
        receiver_stream(receiver)
    }

    /// The most recently accepted value.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        lock(&self.inner).latest.clone()
    }

    /// Close the relay. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        lock(&self.inner).observers.take().is_some()
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        lock(&self.inner).observers.is_none()
    }

    /// Number of live observers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).observers.as_ref().map_or(0, live_count)
    }
}

impl<T> Clone for ReplayRelay<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ReplayRelay<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ReplayRelay<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = lock(&self.inner);
        f.debug_struct("ReplayRelay")
            .field("has_value", &guard.latest.is_some())
            .field("closed", &guard.observers.is_none())
            .finish()
    }
}
