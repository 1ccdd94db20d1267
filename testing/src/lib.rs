//! # RxReactor Testing
//!
//! Testing utilities and helpers for the RxReactor architecture.
//!
//! This crate provides:
//! - [`Recorder`]: a background observer for asynchronous state and effect streams
//! - [`ReactorTest`]: Given-When-Then tests that run a reactor in a real store
//! - [`ReduceTest`]: synchronous Given-When-Then tests for `reduce`
//! - Assertion helpers and a tracing setup for test output
//!
//! ## Example
//!
//! ```ignore
//! use rxreactor_runtime::Store;
//! use rxreactor_testing::{DEFAULT_TIMEOUT, Recorder};
//!
//! #[tokio::test]
//! async fn test_counter() {
//!     let store = Store::new(CounterReactor, 0);
//!     let states = Recorder::record(store.observe_state());
//!
//!     store.submit(Action::Increment);
//!
//!     assert_eq!(states.wait_for(2, DEFAULT_TIMEOUT).await.unwrap(), vec![0, 1]);
//! }
//! ```

pub mod recorder;

pub use reactor_test::ReactorTest;
pub use recorder::{DEFAULT_TIMEOUT, Recorder, WaitError};
pub use reduce_test::{ReduceTest, assertions};

/// Test helpers
pub mod helpers {
    /// Route `tracing` output through the test harness
    ///
    /// Honors `RUST_LOG`; defaults to `debug` for the reactor crates. Safe to
    /// call from every test, only the first call installs a subscriber.
    pub fn init_tracing() {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "rxreactor_core=debug,rxreactor_runtime=debug".into());

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

pub use helpers::init_tracing;
