//! Shared fixtures for integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use quote_gateway::{
    BackoffConfig, BroadcastHub, HistoryPoint, HubConfig, MarketDataError, MarketDataService,
    PollerConfig, Quote, QuoteProvider, Symbol,
};

/// Intervals the stub accepts for history.
const STUB_INTERVALS: &[&str] = &["1m", "5m", "1h", "1d"];

/// In-memory provider whose quote price is the number of prior calls.
#[derive(Debug)]
pub struct StubProvider {
    name: &'static str,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl StubProvider {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl QuoteProvider for StubProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(MarketDataError::upstream(self.name, "stub outage"));
        }

        #[allow(clippy::cast_precision_loss)]
        let price = call as f64;
        Ok(Quote {
            symbol: symbol.normalized().to_string(),
            price,
            change_percent: 0.0,
            volume: None,
            timestamp_millis: 1_700_000_000_000,
            kind: symbol.kind(),
        })
    }

    async fn fetch_history(
        &self,
        _symbol: &Symbol,
        _period: &str,
        interval: &str,
    ) -> Result<Vec<HistoryPoint>, MarketDataError> {
        if !STUB_INTERVALS.contains(&interval) {
            return Err(MarketDataError::invalid_parameter("interval", interval));
        }
        // Deliberately out of order.
        Ok(vec![
            HistoryPoint {
                time_seconds: 1_700_000_120.0,
                close_price: 3.0,
            },
            HistoryPoint {
                time_seconds: 1_700_000_000.0,
                close_price: 1.0,
            },
            HistoryPoint {
                time_seconds: 1_700_000_060.0,
                close_price: 2.0,
            },
        ])
    }

    async fn ping(&self) -> Result<(), MarketDataError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(MarketDataError::upstream(self.name, "stub outage"))
        } else {
            Ok(())
        }
    }
}

/// Hub over two stub providers, polling every `interval`.
pub fn stub_hub(
    crypto: &Arc<StubProvider>,
    equity: &Arc<StubProvider>,
    interval: Duration,
) -> Arc<BroadcastHub> {
    let service = MarketDataService::new(crypto.clone(), equity.clone(), Duration::from_secs(5));
    Arc::new(BroadcastHub::new(
        service,
        HubConfig {
            queue_capacity: 16,
            poller: PollerConfig {
                interval,
                backoff: BackoffConfig {
                    initial_delay: interval,
                    max_delay: interval * 4,
                    multiplier: 2.0,
                    jitter_factor: 0.0,
                },
            },
        },
    ))
}
