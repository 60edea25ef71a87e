//! Per-Symbol Poller
//!
//! One poller runs per actively watched symbol. It calls the upstream on a
//! fixed cadence and publishes every quote into the symbol's broadcast
//! channel, so N subscribers share a single upstream poll.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──spawn──► Running ──cancel──► Stopping ──► Idle
//! ```
//!
//! A failed poll never ends the loop: the failure is logged and the next
//! attempt waits `max(cadence, backoff)`. The first success resets the
//! backoff. Cancellation is observed both while waiting and while a call
//! is in flight; an in-flight result is discarded.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::backoff::{BackoffConfig, BackoffPolicy};
use super::market_data::MarketDataService;
use crate::application::ports::MarketDataError;
use crate::domain::market::Quote;
use crate::domain::symbol::Symbol;

// =============================================================================
// Configuration
// =============================================================================

/// Poll cadence and failure backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    /// Wait between successful polls.
    pub interval: Duration,
    /// Backoff applied to consecutive failures.
    pub backoff: BackoffConfig,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            backoff: BackoffConfig::default(),
        }
    }
}

// =============================================================================
// Status
// =============================================================================

/// Poller lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollerState {
    /// Not yet started, or fully stopped.
    #[default]
    Idle,
    /// Polling.
    Running,
    /// Cancellation observed; winding down.
    Stopping,
}

/// Point-in-time view of one poller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollerSnapshot {
    /// Lifecycle state.
    pub state: PollerState,
    /// Failures since the last success.
    pub consecutive_failures: u32,
    /// Completed poll attempts.
    pub total_polls: u64,
    /// Failed poll attempts.
    pub total_failures: u64,
    /// Time of the last successful poll.
    pub last_success: Option<DateTime<Utc>>,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
    /// Most recently published quote.
    pub last_quote: Option<Quote>,
}

impl PollerSnapshot {
    /// Whether the most recent poll attempt failed.
    #[must_use]
    pub const fn is_failing(&self) -> bool {
        self.consecutive_failures > 0
    }
}

/// Shared, lock-protected poller status.
///
/// Written by the poller task, read by the hub and the health endpoint.
#[derive(Debug, Default)]
pub struct PollerStatus {
    inner: RwLock<PollerSnapshot>,
}

impl PollerStatus {
    /// Copy of the current status.
    #[must_use]
    pub fn snapshot(&self) -> PollerSnapshot {
        self.inner.read().clone()
    }

    /// Most recently published quote.
    #[must_use]
    pub fn last_quote(&self) -> Option<Quote> {
        self.inner.read().last_quote.clone()
    }

    fn set_state(&self, state: PollerState) {
        self.inner.write().state = state;
    }

    fn record_success(&self, quote: Quote) {
        let mut status = self.inner.write();
        status.total_polls += 1;
        status.consecutive_failures = 0;
        status.last_success = Some(Utc::now());
        status.last_quote = Some(quote);
    }

    fn record_failure(&self, error: &MarketDataError) {
        let mut status = self.inner.write();
        status.total_polls += 1;
        status.total_failures += 1;
        status.consecutive_failures = status.consecutive_failures.saturating_add(1);
        status.last_error = Some(error.to_string());
    }
}

// =============================================================================
// Poller
// =============================================================================

/// Polling loop for one symbol.
#[derive(Debug)]
pub struct Poller {
    symbol: Symbol,
    service: MarketDataService,
    config: PollerConfig,
    sender: broadcast::Sender<Quote>,
    status: Arc<PollerStatus>,
    cancel: CancellationToken,
}

impl Poller {
    /// Create a poller publishing into `sender`.
    #[must_use]
    pub fn new(
        symbol: Symbol,
        service: MarketDataService,
        config: PollerConfig,
        sender: broadcast::Sender<Quote>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            symbol,
            service,
            config,
            sender,
            status: Arc::new(PollerStatus::default()),
            cancel,
        }
    }

    /// Shared status handle.
    #[must_use]
    pub fn status(&self) -> Arc<PollerStatus> {
        Arc::clone(&self.status)
    }

    /// Run the loop on a new task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until cancelled.
    pub async fn run(self) {
        let symbol = self.symbol.normalized();
        let mut backoff = BackoffPolicy::new(self.config.backoff.clone());

        self.status.set_state(PollerState::Running);
        tracing::info!(symbol, kind = %self.symbol.kind(), "Poller started");

        loop {
            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                result = self.service.fetch_quote(&self.symbol) => result,
            };

            let wait = match result {
                Ok(quote) => {
                    backoff.reset();
                    self.publish(quote);
                    self.config.interval
                }
                Err(error) => {
                    let delay = backoff.next_delay().max(self.config.interval);
                    self.status.record_failure(&error);
                    self.service.metrics().poll_failed(error.kind());
                    tracing::warn!(
                        symbol,
                        error = %error,
                        consecutive_failures = backoff.failures(),
                        retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Poll failed"
                    );
                    delay
                }
            };

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(wait) => {}
            }
        }

        self.status.set_state(PollerState::Stopping);
        tracing::info!(symbol, "Poller stopped");
        self.status.set_state(PollerState::Idle);
    }

    fn publish(&self, quote: Quote) {
        let kind = quote.kind;
        self.status.record_success(quote.clone());
        self.service.metrics().quote_published(kind);

        // No receivers only happens between the last unsubscribe and cancellation.
        if self.sender.send(quote).is_err() {
            tracing::debug!(symbol = self.symbol.normalized(), "No receivers for quote");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
