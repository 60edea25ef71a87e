//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems following
//! the Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `QuoteProvider`: one upstream market data provider (crypto or equity)
//! - `ServiceMetrics`: counters reported by the services and pollers

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::market::{HistoryPoint, Quote};
use crate::domain::symbol::{AssetKind, Symbol};

// =============================================================================
// Errors
// =============================================================================

/// Machine-readable error category, as returned in HTTP error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network or provider failure, including timeouts.
    UpstreamError,
    /// Bad period, interval, or ticker shape.
    InvalidParameter,
    /// Zero reference price while computing a percent change.
    DivisionByZero,
    /// Ticker could map to more than one asset kind.
    ClassificationAmbiguous,
}

impl ErrorKind {
    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UpstreamError => "upstream_error",
            Self::InvalidParameter => "invalid_parameter",
            Self::DivisionByZero => "division_by_zero",
            Self::ClassificationAmbiguous => "classification_ambiguous",
        }
    }
}

/// Errors raised while fetching market data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketDataError {
    /// Upstream call failed (transport, non-success status, bad body, timeout).
    #[error("upstream {provider} request failed: {message}")]
    Upstream {
        /// Provider name.
        provider: &'static str,
        /// Failure description.
        message: String,
    },

    /// Request parameter outside the accepted set.
    #[error("invalid {name}: {value:?}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: String,
    },

    /// Reference price was zero.
    #[error("reference price is zero for {symbol}")]
    DivisionByZero {
        /// Symbol being quoted.
        symbol: String,
    },

    /// Reserved: the classifier currently never raises this.
    #[error("ambiguous ticker: {raw}")]
    ClassificationAmbiguous {
        /// Raw ticker.
        raw: String,
    },
}

impl MarketDataError {
    /// Build an upstream error.
    #[must_use]
    pub fn upstream(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider,
            message: message.into(),
        }
    }

    /// Build an invalid-parameter error.
    #[must_use]
    pub fn invalid_parameter(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
        }
    }

    /// Error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Upstream { .. } => ErrorKind::UpstreamError,
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::DivisionByZero { .. } => ErrorKind::DivisionByZero,
            Self::ClassificationAmbiguous { .. } => ErrorKind::ClassificationAmbiguous,
        }
    }
}

// =============================================================================
// Quote Provider Port
// =============================================================================

/// One upstream market data provider.
///
/// Implementations own all provider-specific semantics: symbol spelling,
/// accepted period/interval values, and field mapping. Each call makes a
/// single round trip; retry policy belongs to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Provider name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Fetch the latest quote for a symbol.
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError>;

    /// Fetch a close-price series, ascending by time.
    ///
    /// Fails with [`MarketDataError::InvalidParameter`] when `period` or
    /// `interval` is not accepted by this provider.
    async fn fetch_history(
        &self,
        symbol: &Symbol,
        period: &str,
        interval: &str,
    ) -> Result<Vec<HistoryPoint>, MarketDataError>;

    /// Check that the provider endpoint is reachable.
    async fn ping(&self) -> Result<(), MarketDataError>;
}

// =============================================================================
// Metrics Port
// =============================================================================

/// How one upstream call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamOutcome {
    /// Provider answered with usable data.
    Success,
    /// Provider call failed.
    Error,
    /// Call exceeded the upstream timeout.
    Timeout,
}

impl UpstreamOutcome {
    /// Metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Timeout => "timeout",
        }
    }
}

/// Sink for the counters the services and pollers emit.
#[cfg_attr(test, mockall::automock)]
pub trait ServiceMetrics: Send + Sync {
    /// One upstream call finished.
    fn upstream_request(&self, provider: &'static str, outcome: UpstreamOutcome, elapsed: Duration);

    /// A poller published a quote.
    fn quote_published(&self, kind: AssetKind);

    /// A poll attempt failed.
    fn poll_failed(&self, error: ErrorKind);
}

/// Discards every measurement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl ServiceMetrics for NoopMetrics {
    fn upstream_request(&self, _: &'static str, _: UpstreamOutcome, _: Duration) {}

    fn quote_published(&self, _: AssetKind) {}

    fn poll_failed(&self, _: ErrorKind) {}
}

// =============================================================================
// Tests
// =============================================================================
