//! Upstream Market Data Adapters
//!
//! REST implementations of [`QuoteProvider`](crate::application::ports::QuoteProvider):
//!
//! - [`BinanceProvider`]: crypto pairs via a Binance-compatible spot API
//! - [`YahooProvider`]: equities via a Yahoo-chart-compatible API
//!
//! Each call performs exactly one HTTP round trip. Retry and backoff are
//! the poller's job.

pub mod binance;
pub mod yahoo;

use serde::de::DeserializeOwned;

use crate::application::ports::MarketDataError;

pub use binance::{BinanceConfig, BinanceProvider};
pub use yahoo::{YahooConfig, YahooProvider};

/// History periods accepted by both adapters.
pub const HISTORY_PERIODS: &[&str] = &[
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

/// Ensure `value` is one of `allowed`.
pub(crate) fn ensure_supported(
    name: &'static str,
    value: &str,
    allowed: &[&str],
) -> Result<(), MarketDataError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(MarketDataError::invalid_parameter(name, value))
    }
}

/// Send a request and decode a JSON body.
///
/// Transport failures, non-success statuses, and undecodable bodies all
/// map to [`MarketDataError::Upstream`].
pub(crate) async fn get_json<T: DeserializeOwned>(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, MarketDataError> {
    let response = request
        .send()
        .await
        .map_err(|e| MarketDataError::upstream(provider, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MarketDataError::upstream(
            provider,
            format!("HTTP {}: {}", status.as_u16(), truncate(&body, 200)),
        ));
    }

    response
        .json()
        .await
        .map_err(|e| MarketDataError::upstream(provider, format!("invalid response body: {e}")))
}

/// Parse a decimal string field.
pub(crate) fn parse_price(
    provider: &'static str,
    field: &str,
    value: &str,
) -> Result<f64, MarketDataError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| MarketDataError::upstream(provider, format!("invalid {field}: {value:?}")))
}

fn truncate(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(idx, _)| &text[..idx])
}
