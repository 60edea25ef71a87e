//! Market Data Service
//!
//! Routes a classified symbol to the provider for its asset kind and bounds
//! every call with the upstream timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::application::ports::{
    MarketDataError, NoopMetrics, QuoteProvider, ServiceMetrics, UpstreamOutcome,
};
use crate::domain::market::{HistoryPoint, Quote, sort_history};
use crate::domain::symbol::{AssetKind, Symbol};

/// Entry point for one-shot quote and history lookups.
///
/// Cheap to clone; providers are shared.
#[derive(Clone)]
pub struct MarketDataService {
    crypto: Arc<dyn QuoteProvider>,
    equity: Arc<dyn QuoteProvider>,
    timeout: Duration,
    metrics: Arc<dyn ServiceMetrics>,
}

impl std::fmt::Debug for MarketDataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataService")
            .field("crypto", &self.crypto.name())
            .field("equity", &self.equity.name())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl MarketDataService {
    /// Create a service over the two providers.
    ///
    /// Measurements are discarded until [`Self::with_metrics`] installs a sink.
    #[must_use]
    pub fn new(
        crypto: Arc<dyn QuoteProvider>,
        equity: Arc<dyn QuoteProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            crypto,
            equity,
            timeout,
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Report upstream calls, published quotes and poll failures to `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn ServiceMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub(crate) fn metrics(&self) -> &dyn ServiceMetrics {
        self.metrics.as_ref()
    }

    /// Per-call upstream timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Provider responsible for a symbol.
    #[must_use]
    pub fn provider_for(&self, symbol: &Symbol) -> &Arc<dyn QuoteProvider> {
        match symbol.kind() {
            AssetKind::Crypto => &self.crypto,
            AssetKind::Equity => &self.equity,
        }
    }

    /// Fetch the latest quote.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, or [`MarketDataError::Upstream`] when
    /// the call does not finish within the timeout.
    pub async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError> {
        let provider = self.provider_for(symbol);
        self.bounded(provider.name(), provider.fetch_quote(symbol))
            .await
    }

    /// Fetch a close-price series sorted ascending by time.
    ///
    /// # Errors
    ///
    /// Returns [`MarketDataError::InvalidParameter`] for an unsupported
    /// period or interval, otherwise as [`Self::fetch_quote`].
    pub async fn fetch_history(
        &self,
        symbol: &Symbol,
        period: &str,
        interval: &str,
    ) -> Result<Vec<HistoryPoint>, MarketDataError> {
        let provider = self.provider_for(symbol);
        let mut points = self
            .bounded(
                provider.name(),
                provider.fetch_history(symbol, period, interval),
            )
            .await?;
        sort_history(&mut points);
        Ok(points)
    }

    /// Check that both providers are reachable.
    ///
    /// # Errors
    ///
    /// Returns the first provider failure.
    pub async fn probe(&self) -> Result<(), MarketDataError> {
        for provider in [&self.crypto, &self.equity] {
            self.bounded(provider.name(), provider.ping()).await?;
            tracing::info!(provider = provider.name(), "Upstream reachable");
        }
        Ok(())
    }

    async fn bounded<T, F>(&self, provider: &'static str, call: F) -> Result<T, MarketDataError>
    where
        F: Future<Output = Result<T, MarketDataError>>,
    {
        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, call).await;
        let elapsed = started.elapsed();

        let (outcome, result) = match result {
            Ok(Ok(value)) => (UpstreamOutcome::Success, Ok(value)),
            Ok(Err(err)) => (UpstreamOutcome::Error, Err(err)),
            Err(_) => (
                UpstreamOutcome::Timeout,
                Err(MarketDataError::upstream(
                    provider,
                    format!("timed out after {}ms", self.timeout.as_millis()),
                )),
            ),
        };
        self.metrics.upstream_request(provider, outcome, elapsed);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockQuoteProvider, MockServiceMetrics};
    use crate::domain::symbol::classify;

    fn quote_for(symbol: &Symbol, price: f64) -> Quote {
        Quote {
            symbol: symbol.normalized().to_string(),
            price,
            change_percent: 0.0,
            volume: None,
            timestamp_millis: 1,
            kind: symbol.kind(),
        }
    }

    fn named_mock(name: &'static str) -> MockQuoteProvider {
        let mut mock = MockQuoteProvider::new();
        mock.expect_name().return_const(name);
        mock
    }

    #[tokio::test]
    async fn routes_by_asset_kind() {
        let mut crypto = named_mock("crypto");
        crypto
            .expect_fetch_quote()
            .times(1)
            .returning(|symbol| Ok(quote_for(symbol, 1.0)));
        let mut equity = named_mock("equity");
        equity
            .expect_fetch_quote()
            .times(1)
            .returning(|symbol| Ok(quote_for(symbol, 2.0)));

        let service =
            MarketDataService::new(Arc::new(crypto), Arc::new(equity), Duration::from_secs(1));

        let btc = service.fetch_quote(&classify("BTC")).await.unwrap();
        assert_eq!(btc.symbol, "BTC/USDT");
        assert!((btc.price - 1.0).abs() < f64::EPSILON);

        let aapl = service.fetch_quote(&classify("AAPL")).await.unwrap();
        assert_eq!(aapl.kind, AssetKind::Equity);
        assert!((aapl.price - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn history_is_sorted() {
        let crypto = named_mock("crypto");
        let mut equity = named_mock("equity");
        equity.expect_fetch_history().returning(|_, _, _| {
            Ok(vec![
                HistoryPoint::from_millis(3_000, 3.0),
                HistoryPoint::from_millis(1_000, 1.0),
            ])
        });

        let service =
            MarketDataService::new(Arc::new(crypto), Arc::new(equity), Duration::from_secs(1));
        let points = service
            .fetch_history(&classify("MSFT"), "1d", "1m")
            .await
            .unwrap();

        assert_eq!(points[0].time_seconds, 1.0);
        assert_eq!(points[1].time_seconds, 3.0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        struct Slow;

        #[async_trait::async_trait]
        impl QuoteProvider for Slow {
            fn name(&self) -> &'static str {
                "slow"
            }
            async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(quote_for(symbol, 1.0))
            }
            async fn fetch_history(
                &self,
                _: &Symbol,
                _: &str,
                _: &str,
            ) -> Result<Vec<HistoryPoint>, MarketDataError> {
                Ok(vec![])
            }
            async fn ping(&self) -> Result<(), MarketDataError> {
                Ok(())
            }
        }

        let mut metrics = MockServiceMetrics::new();
        metrics
            .expect_upstream_request()
            .withf(|provider, outcome, elapsed| {
                provider == "slow"
                    && *outcome == UpstreamOutcome::Timeout
                    && *elapsed >= Duration::from_secs(8)
            })
            .times(1)
            .return_const(());

        let service =
            MarketDataService::new(Arc::new(Slow), Arc::new(Slow), Duration::from_secs(8))
                .with_metrics(Arc::new(metrics));
        let err = service.fetch_quote(&classify("AAPL")).await.unwrap_err();

        assert!(matches!(err, MarketDataError::Upstream { provider: "slow", .. }));
    }

    #[tokio::test]
    async fn calls_are_reported_with_outcome() {
        let mut crypto = named_mock("crypto");
        crypto
            .expect_fetch_quote()
            .returning(|symbol| Ok(quote_for(symbol, 1.0)));
        let mut equity = named_mock("equity");
        equity
            .expect_fetch_history()
            .returning(|_, _, _| Err(MarketDataError::invalid_parameter("interval", "7m")));

        let mut metrics = MockServiceMetrics::new();
        metrics
            .expect_upstream_request()
            .withf(|provider, outcome, _| {
                provider == "crypto" && *outcome == UpstreamOutcome::Success
            })
            .times(1)
            .return_const(());
        metrics
            .expect_upstream_request()
            .withf(|provider, outcome, _| provider == "equity" && *outcome == UpstreamOutcome::Error)
            .times(1)
            .return_const(());

        let service =
            MarketDataService::new(Arc::new(crypto), Arc::new(equity), Duration::from_secs(1))
                .with_metrics(Arc::new(metrics));

        service.fetch_quote(&classify("ETH")).await.unwrap();
        service
            .fetch_history(&classify("AAPL"), "1d", "7m")
            .await
            .unwrap_err();
    }

    #[tokio::test]
    async fn probe_reports_first_failure() {
        let mut crypto = named_mock("crypto");
        crypto.expect_ping().returning(|| Ok(()));
        let mut equity = named_mock("equity");
        equity
            .expect_ping()
            .returning(|| Err(MarketDataError::upstream("equity", "connection refused")));

        let service =
            MarketDataService::new(Arc::new(crypto), Arc::new(equity), Duration::from_secs(1));
        let err = service.probe().await.unwrap_err();

        assert!(matches!(err, MarketDataError::Upstream { provider: "equity", .. }));
    }
}
