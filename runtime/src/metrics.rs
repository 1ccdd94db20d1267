//! Prometheus metrics for observability and monitoring.
//!
//! Every pipeline stage records into the global `metrics` recorder:
//! - Action intake
//! - Mutation derivation errors
//! - Reduction (count, errors, duration)
//! - State publication
//! - Effect emission
//!
//! Nothing is exported until a recorder is installed, e.g. with
//! [`MetricsServer::start`].
//!
//! # Example
//!
//! ```rust,no_run
//! use rxreactor_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! if let Some(text) = server.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics recorder handle.
///
/// Installs the global recorder and renders the scrape text for `addr`.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address the scrape endpoint is reported on
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Describe the reactor metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g. by another test), this logs a
    /// warning and succeeds without a handle.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this server did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!(
        "reactor_actions_submitted_total",
        "Total number of actions accepted by reactor stores"
    );
    describe_counter!(
        "reactor_mutation_errors_total",
        "Total number of mutation streams ended by an error"
    );
    describe_counter!(
        "reactor_mutations_reduced_total",
        "Total number of mutations folded into state"
    );
    describe_counter!(
        "reactor_reduce_errors_total",
        "Total number of mutations dropped because reduce failed or panicked"
    );
    describe_histogram!(
        "reactor_reduce_duration_seconds",
        "Time taken to reduce one mutation"
    );
    describe_counter!(
        "reactor_states_published_total",
        "Total number of states published to observers"
    );
    describe_counter!(
        "reactor_effects_emitted_total",
        "Total number of effects emitted"
    );
}

/// Pipeline metrics recorder.
pub struct ReactorMetrics;

impl ReactorMetrics {
    /// Record an accepted action.
    pub fn record_action() {
        counter!("reactor_actions_submitted_total").increment(1);
    }

    /// Record a mutation stream that ended with an error.
    pub fn record_mutation_error() {
        counter!("reactor_mutation_errors_total").increment(1);
    }

    /// Record a successful reduction.
    pub fn record_reduce(duration: Duration) {
        counter!("reactor_mutations_reduced_total").increment(1);
        histogram!("reactor_reduce_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a failed or panicking reduction.
    pub fn record_reduce_error() {
        counter!("reactor_reduce_errors_total").increment(1);
    }

    /// Record a published state.
    pub fn record_state() {
        counter!("reactor_states_published_total").increment(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_server_creation() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let server = MetricsServer::new(addr);
        assert!(server.handle().is_none());
        assert!(server.render().is_none());
    }

    #[test]
    fn test_metrics_server_render() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let mut server = MetricsServer::new(addr);
        server.start().unwrap();

        ReactorMetrics::record_action();
        ReactorMetrics::record_reduce(Duration::from_micros(20));
        ReactorMetrics::record_state();

        // Another test may have installed the recorder first.
        if let Some(rendered) = server.render() {
            assert!(rendered.contains("reactor_actions_submitted_total"));
            assert!(rendered.contains("reactor_mutations_reduced_total"));
        }
    }
}
