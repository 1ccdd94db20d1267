//! # RxReactor Runtime
//!
//! Runtime implementation for the RxReactor architecture.
//!
//! This crate provides the [`Store`](store::Store): it wires a
//! [`Reactor`](rxreactor_core::Reactor) into a running pipeline, keeps the
//! current state, multicasts states (replaying the latest) and effects (no
//! replay), and releases everything on teardown.
//!
//! ## Core Components
//!
//! - **Store**: owns the pipeline task, the state cell, both output relays
//!   and the subscription bag
//! - **Pipeline**: action intake → mutation derivation (concurrent merge) →
//!   sequential fold → state publication
//! - **Scheduler**: moves pipeline stages onto another Tokio runtime
//! - **Metrics**: Prometheus counters for every pipeline stage
//!
//! ## Example
//!
//! ```ignore
//! use rxreactor_runtime::Store;
//!
//! let store = Store::new(CounterReactor, 0);
//! let mut states = store.observe_state(); // yields 0 first
//!
//! store.submit(Action::Increment);
//! assert_eq!(states.next().await, Some(0));
//! assert_eq!(states.next().await, Some(1));
//!
//! store.clear_subscriptions();
//! ```

use serde::{Deserialize, Serialize};

/// Prometheus metrics for observability
pub mod metrics;

/// Moving pipeline stages onto another runtime
pub mod scheduler;

/// The Store runtime
pub mod store;

mod pipeline;

pub use error::StoreError;
pub use scheduler::{Scheduled, run_on};
pub use store::{Lifecycle, Store};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    ///
    /// Pipeline failures (mutation derivation, reduction, disposal) are never
    /// surfaced here; they are contained and logged inside the pipeline.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// The store has been torn down and no longer processes actions
        ///
        /// Returned by `try_submit()` after `clear_subscriptions()`.
        #[error("Store has been torn down")]
        TornDown,

        /// The configuration cannot be used to build a store
        #[error("Invalid reactor configuration: {0}")]
        InvalidConfig(String),
    }
}

/// Configuration for a [`Store`]
///
/// # Example
///
/// ```
/// use rxreactor_runtime::ReactorConfig;
///
/// let config = ReactorConfig::new("login");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorConfig {
    /// Name recorded on the pipeline's tracing span
    pub name: String,
}

impl ReactorConfig {
    /// Create a configuration with the given name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Check that the configuration can back a store
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the name is empty.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.name.trim().is_empty() {
            return Err(StoreError::InvalidConfig("name must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self::new("reactor")
    }
}
