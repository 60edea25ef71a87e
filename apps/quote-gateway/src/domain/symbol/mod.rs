//! Symbol Classification
//!
//! Maps a raw ticker string to an asset kind and the normalized symbol used
//! as the upstream lookup key and the fan-out key.
//!
//! # Rules
//!
//! Input is trimmed and uppercased, then classified as crypto when it:
//! - contains the pair separator `/` (kept as-is),
//! - ends with a known quote currency and has a non-empty base
//!   (`BTCUSDT` becomes `BTC/USDT`),
//! - is one of the bare tickers `BTC`, `ETH`, `SOL`, `DOGE`
//!   (`ETH` becomes `ETH/USDT`).
//!
//! Everything else is an equity. The rules are a heuristic, not an
//! exchange lookup: a ticker listed both as a stock and as a crypto asset
//! resolves by the rules above only.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between base and quote currency in a crypto pair.
pub const PAIR_SEPARATOR: char = '/';

/// Quote currency appended to bare crypto tickers.
pub const DEFAULT_QUOTE_CURRENCY: &str = "USDT";

/// Quote-currency suffixes that mark an unseparated crypto pair.
pub const QUOTE_CURRENCY_SUFFIXES: &[&str] = &["USDT", "USDC"];

/// Bare tickers that are always treated as crypto.
pub const BARE_CRYPTO_TICKERS: &[&str] = &["BTC", "ETH", "SOL", "DOGE"];

/// Kind of asset a symbol refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    /// Crypto pair quoted on an exchange.
    #[serde(rename = "crypto")]
    Crypto,
    /// Listed equity.
    #[serde(rename = "stock")]
    Equity,
}

impl AssetKind {
    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crypto => "crypto",
            Self::Equity => "stock",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified ticker.
///
/// Built once by [`classify`]; fields are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    raw: String,
    kind: AssetKind,
    normalized: String,
}

impl Symbol {
    /// The ticker as the client sent it.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Asset kind decided by the classifier.
    #[must_use]
    pub const fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Canonical symbol (fan-out key and upstream lookup key).
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Whether the symbol is a crypto pair.
    #[must_use]
    pub const fn is_crypto(&self) -> bool {
        matches!(self.kind, AssetKind::Crypto)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

/// Classify a raw ticker.
///
/// Never fails: anything that is not recognized as crypto is an equity
/// whose normalized form is the trimmed, uppercased input.
///
/// Surrounding whitespace is dropped before uppercasing rather than kept,
/// so `" aapl"` and `"AAPL"` are the same symbol and share one poller.
/// Interior whitespace is preserved.
///
/// # Example
///
/// ```rust
/// use quote_gateway::domain::symbol::{AssetKind, classify};
///
/// let btc = classify("btc");
/// assert_eq!(btc.kind(), AssetKind::Crypto);
/// assert_eq!(btc.normalized(), "BTC/USDT");
///
/// let aapl = classify("aapl");
/// assert_eq!(aapl.kind(), AssetKind::Equity);
/// assert_eq!(aapl.normalized(), "AAPL");
///
/// assert_eq!(classify(" aapl\t").normalized(), "AAPL");
/// ```
#[must_use]
pub fn classify(raw: &str) -> Symbol {
    // Trim first: a padded ticker must not open a second poller.
    let upper = raw.trim().to_uppercase();

    let (kind, normalized) = if upper.contains(PAIR_SEPARATOR) {
        (AssetKind::Crypto, upper)
    } else if BARE_CRYPTO_TICKERS.contains(&upper.as_str()) {
        let pair = format!("{upper}{PAIR_SEPARATOR}{DEFAULT_QUOTE_CURRENCY}");
        (AssetKind::Crypto, pair)
    } else if let Some(pair) = split_quote_suffix(&upper) {
        (AssetKind::Crypto, pair)
    } else {
        (AssetKind::Equity, upper)
    };

    Symbol {
        raw: raw.to_string(),
        kind,
        normalized,
    }
}

/// Split `BASEQUOTE` into `BASE/QUOTE` for a known quote currency.
fn split_quote_suffix(upper: &str) -> Option<String> {
    QUOTE_CURRENCY_SUFFIXES.iter().find_map(|suffix| {
        upper
            .strip_suffix(suffix)
            .filter(|base| !base.is_empty())
            .map(|base| format!("{base}{PAIR_SEPARATOR}{suffix}"))
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_means_crypto() {
        let symbol = classify("eth/btc");
        assert_eq!(symbol.kind(), AssetKind::Crypto);
        assert_eq!(symbol.normalized(), "ETH/BTC");
        assert_eq!(symbol.raw(), "eth/btc");
    }

    #[test]
    fn bare_tickers_get_default_quote() {
        for ticker in BARE_CRYPTO_TICKERS {
            let symbol = classify(ticker);
            assert!(symbol.is_crypto());
            assert_eq!(symbol.normalized(), format!("{ticker}/USDT"));
        }
    }

    #[test]
    fn quote_suffix_is_split() {
        let symbol = classify("BTCUSDT");
        assert_eq!(symbol.kind(), AssetKind::Crypto);
        assert_eq!(symbol.normalized(), "BTC/USDT");

        let symbol = classify("solusdc");
        assert_eq!(symbol.normalized(), "SOL/USDC");
    }

    #[test]
    fn bare_suffix_is_equity() {
        let symbol = classify("USDT");
        assert_eq!(symbol.kind(), AssetKind::Equity);
        assert_eq!(symbol.normalized(), "USDT");
    }

    #[test]
    fn other_input_is_equity() {
        let symbol = classify(" brk.b ");
        assert_eq!(symbol.kind(), AssetKind::Equity);
        assert_eq!(symbol.normalized(), "BRK.B");
    }

    #[test]
    fn padding_is_trimmed_before_uppercasing() {
        assert_eq!(classify(" aapl").normalized(), "AAPL");
        assert_eq!(classify("\tbtc\n").normalized(), "BTC/USDT");
        assert_eq!(classify(" a b ").normalized(), "A B");
    }

    #[test]
    fn empty_input_is_equity() {
        let symbol = classify("");
        assert_eq!(symbol.kind(), AssetKind::Equity);
        assert_eq!(symbol.normalized(), "");
    }

    #[test]
    fn kind_wire_names() {
        assert_eq!(AssetKind::Crypto.as_str(), "crypto");
        assert_eq!(AssetKind::Equity.as_str(), "stock");
        assert_eq!(
            serde_json::to_string(&AssetKind::Equity).unwrap(),
            "\"stock\""
        );
    }

    #[test]
    fn display_uses_normalized() {
        assert_eq!(classify("doge").to_string(), "DOGE/USDT");
    }
}
