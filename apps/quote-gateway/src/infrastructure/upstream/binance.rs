//! Binance Spot REST Adapter
//!
//! Crypto quotes from `/api/v3/ticker/24hr` and close-price history from
//! `/api/v3/klines`. Pair symbols drop the separator on the wire
//! (`BTC/USDT` is requested as `BTCUSDT`); quotes carry the normalized form.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{HISTORY_PERIODS, ensure_supported, get_json, parse_price};
use crate::application::ports::{MarketDataError, QuoteProvider};
use crate::domain::market::{HistoryPoint, Quote, change_percent};
use crate::domain::symbol::{PAIR_SEPARATOR, Symbol};

const PROVIDER: &str = "binance";

/// Default spot API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Largest candle count a single klines request may return.
pub const DEFAULT_HISTORY_LIMIT: u32 = 1000;

/// Kline intervals accepted by the exchange.
pub const CRYPTO_INTERVALS: &[&str] = &[
    "1s", "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w",
    "1M",
];

const DAY_SECS: u64 = 86_400;

/// Adapter configuration.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// API base URL without a trailing slash.
    pub base_url: String,
    /// Client-level request timeout.
    pub timeout: Duration,
    /// Maximum candles per history request.
    pub history_limit: u32,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(8),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Binance-compatible crypto provider.
#[derive(Debug, Clone)]
pub struct BinanceProvider {
    client: reqwest::Client,
    base_url: String,
    history_limit: u32,
}

/// Subset of the 24h rolling ticker.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    last_price: String,
    open_price: String,
    quote_volume: String,
    close_time: i64,
}

impl BinanceProvider {
    /// Create a provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: BinanceConfig) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MarketDataError::upstream(PROVIDER, e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            history_limit: config.history_limit.max(1),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Exchange spelling of a pair.
fn market_symbol(symbol: &Symbol) -> String {
    symbol.normalized().replace(PAIR_SEPARATOR, "")
}

fn interval_secs(interval: &str) -> Option<u64> {
    let secs = match interval {
        "1s" => 1,
        "1m" => 60,
        "3m" => 180,
        "5m" => 300,
        "15m" => 900,
        "30m" => 1_800,
        "1h" => 3_600,
        "2h" => 7_200,
        "4h" => 14_400,
        "6h" => 21_600,
        "8h" => 28_800,
        "12h" => 43_200,
        "1d" => DAY_SECS,
        "3d" => 3 * DAY_SECS,
        "1w" => 7 * DAY_SECS,
        "1M" => 30 * DAY_SECS,
        _ => return None,
    };
    Some(secs)
}

/// Period length; `None` for open-ended periods (`ytd`, `max`).
fn period_secs(period: &str) -> Option<u64> {
    let days = match period {
        "1d" => 1,
        "5d" => 5,
        "1mo" => 30,
        "3mo" => 90,
        "6mo" => 180,
        "1y" => 365,
        "2y" => 730,
        "5y" => 1_825,
        "10y" => 3_650,
        _ => return None,
    };
    Some(days * DAY_SECS)
}

/// Number of candles covering `period` at `interval`, capped at `limit`.
fn candle_count(period_secs: Option<u64>, interval_secs: u64, limit: u32) -> u32 {
    period_secs.map_or(limit, |period| {
        let candles = (period / interval_secs.max(1)).max(1);
        u32::try_from(candles).unwrap_or(u32::MAX).min(limit)
    })
}

/// Decode one kline row: `[openTime, open, high, low, close, ...]`.
fn parse_kline(row: &[Value]) -> Result<HistoryPoint, MarketDataError> {
    let open_time = row
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| MarketDataError::upstream(PROVIDER, "kline missing open time"))?;
    let close = row
        .get(4)
        .and_then(Value::as_str)
        .ok_or_else(|| MarketDataError::upstream(PROVIDER, "kline missing close"))?;

    Ok(HistoryPoint::from_millis(
        open_time,
        parse_price(PROVIDER, "close", close)?,
    ))
}

#[async_trait]
impl QuoteProvider for BinanceProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError> {
        let request = self
            .client
            .get(self.url("/api/v3/ticker/24hr"))
            .query(&[("symbol", market_symbol(symbol))]);
        let ticker: Ticker24h = get_json(PROVIDER, request).await?;

        let price = parse_price(PROVIDER, "lastPrice", &ticker.last_price)?;
        let open = parse_price(PROVIDER, "openPrice", &ticker.open_price)?;
        let volume = parse_price(PROVIDER, "quoteVolume", &ticker.quote_volume)?;

        let change = change_percent(price, open).ok_or_else(|| MarketDataError::DivisionByZero {
            symbol: symbol.normalized().to_string(),
        })?;

        Ok(Quote {
            symbol: symbol.normalized().to_string(),
            price,
            change_percent: change,
            volume: Some(volume),
            timestamp_millis: ticker.close_time,
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
        let step = interval_secs(interval)
            .ok_or_else(|| MarketDataError::invalid_parameter("interval", interval))?;
        let limit = candle_count(period_secs(period), step, self.history_limit);

        let request = self.client.get(self.url("/api/v3/klines")).query(&[
            ("symbol", market_symbol(symbol)),
            ("interval", interval.to_string()),
            ("limit", limit.to_string()),
        ]);
        let rows: Vec<Vec<Value>> = get_json(PROVIDER, request).await?;

        rows.iter().map(|row| parse_kline(row)).collect()
    }

    async fn ping(&self) -> Result<(), MarketDataError> {
        self.client
            .get(self.url("/api/v3/ping"))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| MarketDataError::upstream(PROVIDER, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::symbol::classify;

    #[test]
    fn market_symbol_drops_separator() {
        assert_eq!(market_symbol(&classify("btc/usdt")), "BTCUSDT");
        assert_eq!(market_symbol(&classify("ETH")), "ETHUSDT");
    }

    #[test]
    fn every_listed_interval_has_a_length() {
        for interval in CRYPTO_INTERVALS {
            assert!(interval_secs(interval).is_some(), "{interval}");
        }
        assert!(interval_secs("7m").is_none());
        assert!(interval_secs("1wk").is_none());
    }

    #[test]
    fn candle_count_is_capped() {
        // 1 day of minutes
        assert_eq!(candle_count(period_secs("1d"), 60, 1000), 1000);
        // 1 day of hours
        assert_eq!(candle_count(period_secs("1d"), 3_600, 1000), 24);
        // 5 days of days
        assert_eq!(candle_count(period_secs("5d"), DAY_SECS, 1000), 5);
        // interval longer than period still yields one candle
        assert_eq!(candle_count(period_secs("1d"), 7 * DAY_SECS, 1000), 1);
        // open-ended periods use the limit
        assert_eq!(candle_count(period_secs("ytd"), 60, 500), 500);
        assert_eq!(candle_count(period_secs("max"), DAY_SECS, 1000), 1000);
    }

    #[test]
    fn kline_row_decodes() {
        let row: Vec<Value> = serde_json::from_str(
            r#"[1700000000000,"1.0","2.0","0.5","1.5","100",1700000059999,"150",10,"50","75","0"]"#,
        )
        .unwrap();
        let point = parse_kline(&row).unwrap();
        assert_eq!(point.time_seconds, 1_700_000_000.0);
        assert_eq!(point.close_price, 1.5);
    }

    #[test]
    fn short_kline_row_is_rejected() {
        let row: Vec<Value> = serde_json::from_str(r#"[1700000000000,"1.0"]"#).unwrap();
        assert!(matches!(
            parse_kline(&row),
            Err(MarketDataError::Upstream { .. })
        ));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = BinanceProvider::new(BinanceConfig {
            base_url: "http://localhost:9999/".to_string(),
            ..BinanceConfig::default()
        })
        .unwrap();
        assert_eq!(
            provider.url("/api/v3/ping"),
            "http://localhost:9999/api/v3/ping"
        );
    }
}
