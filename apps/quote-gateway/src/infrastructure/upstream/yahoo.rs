//! Yahoo Chart REST Adapter
//!
//! Equity quotes and history from `/v8/finance/chart/{symbol}`. The chart
//! `meta` block carries the latest price, previous close, and session
//! volume; the series comes from `timestamp[]` and
//! `indicators.quote[0].close[]`, where missing closes are skipped.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use super::{HISTORY_PERIODS, ensure_supported, get_json};
use crate::application::ports::{MarketDataError, QuoteProvider};
use crate::domain::market::{HistoryPoint, Quote, change_percent};
use crate::domain::symbol::Symbol;

const PROVIDER: &str = "yahoo";

/// Default chart API base URL.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Chart intervals accepted by the provider.
pub const EQUITY_INTERVALS: &[&str] = &[
    "1m", "2m", "5m", "15m", "30m", "60m", "90m", "1h", "1d", "5d", "1wk", "1mo", "3mo",
];

/// The chart API rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) quote-gateway/0.1";

const API_KEY_HEADER: &str = "x-api-key";

/// Adapter configuration.
#[derive(Clone)]
pub struct YahooConfig {
    /// API base URL, optionally with a path prefix.
    pub base_url: String,
    /// Client-level request timeout.
    pub timeout: Duration,
    /// Optional key for keyed deployments of the chart API.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for YahooConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(8),
            api_key: None,
        }
    }
}

/// Yahoo-chart-compatible equity provider.
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: reqwest::Url,
    api_key: Option<String>,
}

impl std::fmt::Debug for YahooProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooProvider")
            .field("base_url", &self.base_url.as_str())
            .field("keyed", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
    regular_market_volume: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteIndicator {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl ChartEnvelope {
    fn into_result(self) -> Result<ChartResult, MarketDataError> {
        if let Some(error) = self.chart.error {
            return Err(MarketDataError::upstream(
                PROVIDER,
                format!("{}: {}", error.code, error.description),
            ));
        }
        self.chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| MarketDataError::upstream(PROVIDER, "empty chart result"))
    }
}

impl ChartResult {
    #[allow(clippy::cast_precision_loss)]
    fn points(&self) -> Vec<HistoryPoint> {
        let closes = self
            .indicators
            .quote
            .first()
            .map_or(&[][..], |q| q.close.as_slice());

        self.timestamp
            .iter()
            .zip(closes)
            .filter_map(|(&time, &close)| {
                close
                    .filter(|c| c.is_finite())
                    .map(|close_price| HistoryPoint {
                        time_seconds: time as f64,
                        close_price,
                    })
            })
            .collect()
    }
}

// =============================================================================
// Provider
// =============================================================================

impl YahooProvider {
    /// Create a provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute http(s) URL or
    /// the HTTP client cannot be built.
    pub fn new(config: YahooConfig) -> Result<Self, MarketDataError> {
        let base_url = reqwest::Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                MarketDataError::upstream(
                    PROVIDER,
                    format!("invalid base URL: {:?}", config.base_url),
                )
            })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MarketDataError::upstream(PROVIDER, e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.filter(|k| !k.is_empty()),
        })
    }

    /// `{base}/v8/finance/chart/{symbol}` with the symbol percent-encoded
    /// as a single path segment, so `?`, `#` and `/` stay part of it.
    fn chart_url(&self, symbol: &str) -> Result<reqwest::Url, MarketDataError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| MarketDataError::upstream(PROVIDER, "base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }

    fn chart_request(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<reqwest::RequestBuilder, MarketDataError> {
        let request = self
            .client
            .get(self.chart_url(symbol)?)
            .query(&[("range", range), ("interval", interval)]);

        Ok(match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        })
    }

    async fn chart(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<ChartResult, MarketDataError> {
        let envelope: ChartEnvelope =
            get_json(PROVIDER, self.chart_request(symbol, range, interval)?).await?;
        envelope.into_result()
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError> {
        let meta = self.chart(symbol.normalized(), "1d", "1d").await?.meta;

        let price = meta
            .regular_market_price
            .ok_or_else(|| MarketDataError::upstream(PROVIDER, "missing regularMarketPrice"))?;
        let previous_close = meta
            .previous_close
            .or(meta.chart_previous_close)
            .ok_or_else(|| MarketDataError::upstream(PROVIDER, "missing previous close"))?;

        let change = change_percent(price, previous_close).ok_or_else(|| {
            MarketDataError::DivisionByZero {
                symbol: symbol.normalized().to_string(),
            }
        })?;

        Ok(Quote {
            symbol: symbol.normalized().to_string(),
            price,
            change_percent: change,
            volume: meta.regular_market_volume,
            timestamp_millis: Utc::now().timestamp_millis(),
            kind: symbol.kind(),
        })
    }

    async fn fetch_history(
        &self,
        symbol: &Symbol,
        period: &str,
        interval: &str,
    ) -> Result<Vec<HistoryPoint>, MarketDataError> {
        ensure_supported("period", period, HISTORY_PERIODS)?;
        ensure_supported("interval", interval, EQUITY_INTERVALS)?;

        Ok(self.chart(symbol.normalized(), period, interval).await?.points())
    }

    async fn ping(&self) -> Result<(), MarketDataError> {
        self.chart_request("SPY", "1d", "1d")?
            .send()
            .await
            .map(|_| ())
            .map_err(|e| MarketDataError::upstream(PROVIDER, e.to_string()))
    }
}
