//! Market Data Types
//!
//! Canonical quote and history records produced by upstream adapters.
//! These types double as the wire format: a [`Quote`] serializes to the
//! WebSocket payload `{ticker, price, change, volume?, timestamp, type}` and
//! a [`HistoryPoint`] to `{time, value}`.

use serde::{Deserialize, Serialize};

use super::symbol::AssetKind;

/// Latest price snapshot for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Normalized symbol.
    #[serde(rename = "ticker")]
    pub symbol: String,
    /// Last traded price.
    pub price: f64,
    /// Change against the reference price, in percent.
    #[serde(rename = "change")]
    pub change_percent: f64,
    /// Traded volume, when the provider reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// Unix time in milliseconds.
    #[serde(rename = "timestamp")]
    pub timestamp_millis: i64,
    /// Asset kind.
    #[serde(rename = "type")]
    pub kind: AssetKind,
}

/// One close price in a history series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Unix time in seconds.
    #[serde(rename = "time")]
    pub time_seconds: f64,
    /// Close price for the bucket.
    #[serde(rename = "value")]
    pub close_price: f64,
}

impl HistoryPoint {
    /// Create a point from a millisecond timestamp.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_millis(timestamp_millis: i64, close_price: f64) -> Self {
        Self {
            time_seconds: timestamp_millis as f64 / 1000.0,
            close_price,
        }
    }
}

/// Percent change of `price` against `reference`.
///
/// Returns `None` when the reference is zero or either input is not
/// finite, so callers never emit `inf` or `NaN`.
#[must_use]
pub fn change_percent(price: f64, reference: f64) -> Option<f64> {
    if reference == 0.0 || !reference.is_finite() || !price.is_finite() {
        return None;
    }
    Some((price - reference) / reference * 100.0)
}

/// Sort a history series ascending by time.
///
/// The sort is stable, so points sharing a timestamp keep upstream order.
pub fn sort_history(points: &mut [HistoryPoint]) {
    points.sort_by(|a, b| a.time_seconds.total_cmp(&b.time_seconds));
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_quote() -> Quote {
        Quote {
            symbol: "BTC/USDT".to_string(),
            price: 64_250.5,
            change_percent: 1.25,
            volume: Some(1_234_567.0),
            timestamp_millis: 1_718_000_000_000,
            kind: AssetKind::Crypto,
        }
    }

    #[test]
    fn quote_wire_field_names() {
        let json = serde_json::to_value(sample_quote()).unwrap();
        assert_eq!(json["ticker"], "BTC/USDT");
        assert_eq!(json["price"], 64_250.5);
        assert_eq!(json["change"], 1.25);
        assert_eq!(json["volume"], 1_234_567.0);
        assert_eq!(json["timestamp"], 1_718_000_000_000_i64);
        assert_eq!(json["type"], "crypto");
    }

    #[test]
    fn quote_without_volume_omits_field() {
        let quote = Quote {
            volume: None,
            kind: AssetKind::Equity,
            ..sample_quote()
        };
        let json = serde_json::to_value(&quote).unwrap();
        assert!(json.get("volume").is_none());
        assert_eq!(json["type"], "stock");
    }

    #[test]
    fn quote_parses_back_from_wire() {
        let quote = sample_quote();
        let text = serde_json::to_string(&quote).unwrap();
        let parsed: Quote = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, quote);
    }

    #[test]
    fn history_point_wire_format() {
        let point = HistoryPoint::from_millis(1_700_000_060_000, 42.5);
        let json = serde_json::to_value(point).unwrap();
        assert_eq!(json["time"], 1_700_000_060.0);
        assert_eq!(json["value"], 42.5);
    }

    #[test]
    fn change_percent_computes_relative_move() {
        let change = change_percent(110.0, 100.0).unwrap();
        assert!((change - 10.0).abs() < 1e-9);

        let change = change_percent(90.0, 100.0).unwrap();
        assert!((change + 10.0).abs() < 1e-9);
    }

    #[test]
    fn change_percent_rejects_zero_reference() {
        assert!(change_percent(10.0, 0.0).is_none());
        assert!(change_percent(10.0, -0.0).is_none());
    }

    #[test]
    fn change_percent_rejects_non_finite() {
        assert!(change_percent(f64::NAN, 1.0).is_none());
        assert!(change_percent(1.0, f64::INFINITY).is_none());
    }

    #[test]
    fn sort_history_orders_by_time() {
        let mut points = vec![
            HistoryPoint::from_millis(3_000, 3.0),
            HistoryPoint::from_millis(1_000, 1.0),
            HistoryPoint::from_millis(2_000, 2.0),
        ];
        sort_history(&mut points);
        let times: Vec<f64> = points.iter().map(|p| p.time_seconds).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
    }
}
