//! The current-state cell.
//!
//! A [`StateCell`] holds the single "current" state of a reactor. It is
//! written only by the runtime's fold stage, immediately before the folded
//! value is published, and read synchronously by
//! [`Context::current_state`](crate::context::Context::current_state) and
//! `Store::current_state`.

use std::sync::{Arc, PoisonError, RwLock};

/// Shared, synchronously readable state snapshot.
pub struct StateCell<S> {
    inner: Arc<RwLock<S>>,
}

impl<S: Clone> StateCell<S> {
    /// Create a cell holding `initial`.
    #[must_use]
    pub fn new(initial: S) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Clone the current snapshot.
    #[must_use]
    pub fn get(&self) -> S {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read the current snapshot through a closure without cloning it.
    pub fn with<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Replace the snapshot. Reserved for the fold stage of a pipeline.
    pub fn replace(&self, next: S) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

impl<S> Clone for StateCell<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for StateCell<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_tuple("StateCell").field(&*state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let cell = StateCell::new(1);
        let reader = cell.clone();
        cell.replace(2);
        assert_eq!(reader.get(), 2);
        assert_eq!(reader.with(|value| value * 10), 20);
    }
}
