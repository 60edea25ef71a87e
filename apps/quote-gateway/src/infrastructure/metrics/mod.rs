//! Prometheus Metrics Module
//!
//! Exposes gateway metrics in Prometheus format.
//!
//! # Metrics Categories
//!
//! - **Upstream**: request counts by provider and outcome, request latency
//! - **Fan-out**: quotes published and quotes dropped for lagging subscribers
//! - **Lifecycle**: active pollers, connected WebSocket clients, poll failures
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::application::ports::{ErrorKind, ServiceMetrics, UpstreamOutcome};
use crate::domain::symbol::AssetKind;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder.
///
/// Repeated calls return the handle installed by the first one.
///
/// # Errors
///
/// Returns an error if another global recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "gateway_upstream_requests_total",
        "Upstream requests by provider and outcome"
    );
    describe_histogram!(
        "gateway_upstream_request_seconds",
        "Upstream request latency"
    );

    describe_counter!(
        "gateway_quotes_published_total",
        "Quotes published to subscribers"
    );
    describe_counter!(
        "gateway_quotes_dropped_total",
        "Quotes skipped by subscribers that fell behind"
    );

    describe_gauge!("gateway_active_pollers", "Symbols with a running poller");
    describe_gauge!(
        "gateway_websocket_clients",
        "Connected WebSocket clients"
    );
    describe_counter!(
        "gateway_poll_failures_total",
        "Failed poll attempts by error kind"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record one upstream request.
pub fn record_upstream_request(provider: &'static str, outcome: UpstreamOutcome, elapsed: Duration) {
    counter!(
        "gateway_upstream_requests_total",
        "provider" => provider,
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!(
        "gateway_upstream_request_seconds",
        "provider" => provider
    )
    .record(elapsed.as_secs_f64());
}

/// Record a quote published by a poller.
pub fn record_quote_published(kind: AssetKind) {
    counter!("gateway_quotes_published_total", "type" => kind.as_str()).increment(1);
}

/// Record quotes a lagging subscriber skipped.
pub fn record_quotes_dropped(count: u64) {
    counter!("gateway_quotes_dropped_total").increment(count);
}

/// Record a failed poll.
pub fn record_poll_failure(error_kind: &'static str) {
    counter!("gateway_poll_failures_total", "error" => error_kind).increment(1);
}

/// Update the active poller count.
#[allow(clippy::cast_precision_loss)]
pub fn set_active_pollers(count: usize) {
    gauge!("gateway_active_pollers").set(count as f64);
}

/// A WebSocket client connected.
pub fn websocket_client_connected() {
    gauge!("gateway_websocket_clients").increment(1.0);
}

/// A WebSocket client disconnected.
pub fn websocket_client_disconnected() {
    gauge!("gateway_websocket_clients").decrement(1.0);
}

// =============================================================================
// Service Metrics Adapter
// =============================================================================

/// Records service and poller measurements into the global recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusMetrics;

impl ServiceMetrics for PrometheusMetrics {
    fn upstream_request(&self, provider: &'static str, outcome: UpstreamOutcome, elapsed: Duration) {
        record_upstream_request(provider, outcome, elapsed);
    }

    fn quote_published(&self, kind: AssetKind) {
        record_quote_published(kind);
    }

    fn poll_failed(&self, error: ErrorKind) {
        record_poll_failure(error.as_str());
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_noop() {
        record_upstream_request("binance", UpstreamOutcome::Success, Duration::from_millis(5));
        record_quote_published(AssetKind::Crypto);
        record_quotes_dropped(3);
        set_active_pollers(2);
    }

    #[test]
    fn adapter_renders_into_recorder() {
        let handle = init_metrics().unwrap();
        let sink = PrometheusMetrics;
        sink.upstream_request("yahoo", UpstreamOutcome::Timeout, Duration::from_millis(8));
        sink.poll_failed(ErrorKind::UpstreamError);

        let rendered = handle.render();
        assert!(rendered.contains("gateway_upstream_requests_total"));
        assert!(rendered.contains(r#"outcome="timeout""#));
        assert!(rendered.contains(r#"error="upstream_error""#));
    }
}
