//! Recording observers for asynchronous streams.
//!
//! Delivery from a store is asynchronous, so tests cannot assert right after
//! `submit`. A [`Recorder`] subscribes immediately, collects every item on a
//! background task, and lets the test wait for a count, for completion, or
//! for the stream to go quiet.

#![allow(clippy::module_name_repetitions)]

use futures::stream::{BoxStream, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Default time to wait for expected values.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Why waiting on a [`Recorder`] failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    /// Not enough values arrived in time
    #[error("Timed out after {timeout:?} waiting for {expected} values, received {received}")]
    Timeout {
        /// Values waited for
        expected: usize,
        /// Values received before the deadline
        received: usize,
        /// How long we waited
        timeout: Duration,
    },

    /// The stream completed before enough values arrived
    #[error("Stream completed after {received} values, expected {expected}")]
    Completed {
        /// Values waited for
        expected: usize,
        /// Values received before completion
        received: usize,
    },
}

struct Shared<T> {
    values: Mutex<Vec<T>>,
    completed: AtomicBool,
    changed: Notify,
}

impl<T> Shared<T> {
    fn values(&self) -> MutexGuard<'_, Vec<T>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Collects every item of a stream in the background.
///
/// Dropping the recorder stops collection.
///
/// # Example
///
/// ```ignore
/// let states = Recorder::record(store.observe_state());
/// store.submit(Action::Increment);
/// assert_eq!(states.wait_for(2, DEFAULT_TIMEOUT).await?, vec![0, 1]);
/// ```
pub struct Recorder<T> {
    shared: Arc<Shared<T>>,
    task: JoinHandle<()>,
}

impl<T: Clone + Send + 'static> Recorder<T> {
    /// Start recording `stream`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    #[must_use]
    pub fn record(mut stream: BoxStream<'static, T>) -> Self {
        let shared = Arc::new(Shared {
            values: Mutex::new(Vec::new()),
            completed: AtomicBool::new(false),
            changed: Notify::new(),
        });

        let sink = Arc::clone(&shared);
        let task = tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                sink.values().push(item);
                sink.changed.notify_waiters();
            }
            sink.completed.store(true, Ordering::Release);
            sink.changed.notify_waiters();
        });

        Self { shared, task }
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.shared.values().clone()
    }

    /// Number of values recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.values().len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the recorded stream has completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.shared.completed.load(Ordering::Acquire)
    }

    /// Wait until at least `count` values were recorded, then return them all.
    ///
    /// # Errors
    ///
    /// [`WaitError::Timeout`] if `timeout` elapses first,
    /// [`WaitError::Completed`] if the stream ends first.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Result<Vec<T>, WaitError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let changed = self.shared.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            let received = self.len();
            if received >= count {
                return Ok(self.values());
            }
            if self.is_completed() {
                return Err(WaitError::Completed { expected: count, received });
            }
            if tokio::time::timeout_at(deadline, changed).await.is_err() {
                return Err(WaitError::Timeout {
                    expected: count,
                    received: self.len(),
                    timeout,
                });
            }
        }
    }

    /// Wait until the stream completes, then return everything recorded.
    ///
    /// # Errors
    ///
    /// [`WaitError::Timeout`] if `timeout` elapses first.
    pub async fn wait_for_completion(&self, timeout: Duration) -> Result<Vec<T>, WaitError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let changed = self.shared.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            if self.is_completed() {
                return Ok(self.values());
            }
            if tokio::time::timeout_at(deadline, changed).await.is_err() {
                let received = self.len();
                return Err(WaitError::Timeout {
                    expected: received,
                    received,
                    timeout,
                });
            }
        }
    }

    /// Wait until no value arrived for `quiet`, then return everything recorded.
    ///
    /// Use when the expected number of values is unknown or when asserting
    /// that nothing more arrives.
    pub async fn settle(&self, quiet: Duration) -> Vec<T> {
        loop {
            let changed = self.shared.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            if self.is_completed() {
                return self.values();
            }
            if tokio::time::timeout(quiet, changed).await.is_err() {
                return self.values();
            }
        }
    }
}

impl<T> Drop for Recorder<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<T> std::fmt::Debug for Recorder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("len", &self.shared.values().len())
            .field("completed", &self.shared.completed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn test_records_until_completion() {
        let recorder = Recorder::record(stream::iter(vec![1, 2, 3]).boxed());
        let values = recorder.wait_for_completion(DEFAULT_TIMEOUT).await.unwrap();
        assert_eq!(values, vec![1, 2, 3]);
        assert!(recorder.is_completed());
    }

    #[tokio::test]
    async fn test_wait_for_reports_early_completion() {
        let recorder = Recorder::record(stream::iter(vec!["a"]).boxed());
        let error = recorder.wait_for(2, DEFAULT_TIMEOUT).await.unwrap_err();
        assert_eq!(error, WaitError::Completed { expected: 2, received: 1 });
    }

    #[tokio::test]
    async fn test_wait_for_times_out() {
        let recorder = Recorder::record(stream::pending::<u8>().boxed());
        let error = recorder
            .wait_for(1, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(error, WaitError::Timeout { received: 0, .. }));
        assert!(recorder.is_empty());
    }

    #[tokio::test]
    async fn test_settle_waits_for_delayed_values() {
        let delayed = async_stream::stream! {
            yield 1;
            tokio::time::sleep(Duration::from_millis(10)).await;
            yield 2;
            futures::future::pending::<()>().await;
        };
        let recorder = Recorder::record(delayed.boxed());
        let values = recorder.settle(Duration::from_millis(100)).await;
        assert_eq!(values, vec![1, 2]);
        assert!(!recorder.is_completed());
    }
}
