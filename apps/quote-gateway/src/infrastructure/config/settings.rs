//! Gateway Configuration Settings
//!
//! Configuration types for the gateway, loaded from environment variables.
//! Every variable is optional; unset or empty variables take the default.
//! A value that is set but unusable is an error rather than a silent
//! fallback.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::application::services::{BackoffConfig, PollerConfig};
use crate::infrastructure::broadcast::{DEFAULT_QUEUE_CAPACITY, HubConfig};
use crate::infrastructure::upstream::{BinanceConfig, YahooConfig, binance, yahoo};

/// Jitter applied to poll backoff.
const BACKOFF_JITTER: f64 = 0.1;

/// Listen addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Bind address for the gateway.
    pub host: IpAddr,
    /// Gateway REST/WebSocket port.
    pub port: u16,
    /// Health and metrics port.
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            health_port: 8082,
        }
    }
}

/// Poll cadence, backoff, and fan-out sizing.
#[derive(Debug, Clone, PartialEq)]
pub struct PollingSettings {
    /// Wait between successful polls.
    pub interval: Duration,
    /// Bound on each upstream call.
    pub upstream_timeout: Duration,
    /// Backoff after the first failure.
    pub backoff_initial: Duration,
    /// Backoff ceiling.
    pub backoff_max: Duration,
    /// Backoff growth factor.
    pub backoff_multiplier: f64,
    /// Per-subscriber queue capacity.
    pub queue_capacity: usize,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1_000),
            upstream_timeout: Duration::from_secs(8),
            backoff_initial: Duration::from_millis(1_000),
            backoff_max: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Upstream provider endpoints.
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamSettings {
    /// Crypto (Binance-compatible) base URL.
    pub crypto_base_url: String,
    /// Equity (Yahoo-chart-compatible) base URL.
    pub equity_base_url: String,
    /// Optional equity API key.
    pub equity_api_key: Option<String>,
    /// Maximum candles per crypto history request.
    pub history_limit: u32,
    /// Probe both upstreams before serving.
    pub startup_probe: bool,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            crypto_base_url: binance::DEFAULT_BASE_URL.to_string(),
            equity_base_url: yahoo::DEFAULT_BASE_URL.to_string(),
            equity_api_key: None,
            history_limit: binance::DEFAULT_HISTORY_LIMIT,
            startup_probe: true,
        }
    }
}

impl std::fmt::Debug for UpstreamSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamSettings")
            .field("crypto_base_url", &self.crypto_base_url)
            .field("equity_base_url", &self.equity_base_url)
            .field(
                "equity_api_key",
                &self.equity_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("history_limit", &self.history_limit)
            .field("startup_probe", &self.startup_probe)
            .finish()
    }
}

/// Complete gateway configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatewayConfig {
    /// Listen addresses.
    pub server: ServerSettings,
    /// Polling behavior.
    pub polling: PollingSettings,
    /// Upstream providers.
    pub upstream: UpstreamSettings,
}

impl GatewayConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let defaults = Self::default();

        let server = ServerSettings {
            host: env.parse("GATEWAY_HOST", defaults.server.host)?,
            port: env.parse("GATEWAY_PORT", defaults.server.port)?,
            health_port: env.parse("GATEWAY_HEALTH_PORT", defaults.server.health_port)?,
        };

        let polling = PollingSettings {
            interval: env.positive_millis("GATEWAY_POLL_INTERVAL_MS", defaults.polling.interval)?,
            upstream_timeout: env.positive_secs(
                "GATEWAY_UPSTREAM_TIMEOUT_SECS",
                defaults.polling.upstream_timeout,
            )?,
            backoff_initial: env.positive_millis(
                "GATEWAY_BACKOFF_INITIAL_MS",
                defaults.polling.backoff_initial,
            )?,
            backoff_max: env.positive_secs("GATEWAY_BACKOFF_MAX_SECS", defaults.polling.backoff_max)?,
            backoff_multiplier: env.parse(
                "GATEWAY_BACKOFF_MULTIPLIER",
                defaults.polling.backoff_multiplier,
            )?,
            queue_capacity: env.parse(
                "GATEWAY_SUBSCRIBER_QUEUE_CAPACITY",
                defaults.polling.queue_capacity,
            )?,
        };

        if polling.queue_capacity == 0 {
            return Err(ConfigError::invalid(
                "GATEWAY_SUBSCRIBER_QUEUE_CAPACITY",
                "0",
                "must be at least 1",
            ));
        }
        if !polling.backoff_multiplier.is_finite() || polling.backoff_multiplier < 1.0 {
            return Err(ConfigError::invalid(
                "GATEWAY_BACKOFF_MULTIPLIER",
                polling.backoff_multiplier.to_string(),
                "must be a finite number >= 1.0",
            ));
        }

        let upstream = UpstreamSettings {
            crypto_base_url: env.base_url("CRYPTO_API_BASE_URL", &defaults.upstream.crypto_base_url)?,
            equity_base_url: env.base_url("EQUITY_API_BASE_URL", &defaults.upstream.equity_base_url)?,
            equity_api_key: env.get("EQUITY_API_KEY"),
            history_limit: env.parse("GATEWAY_HISTORY_LIMIT", defaults.upstream.history_limit)?,
            startup_probe: env.flag("GATEWAY_STARTUP_PROBE", defaults.upstream.startup_probe)?,
        };

        if upstream.history_limit == 0 {
            return Err(ConfigError::invalid(
                "GATEWAY_HISTORY_LIMIT",
                "0",
                "must be at least 1",
            ));
        }

        Ok(Self {
            server,
            polling,
            upstream,
        })
    }

    /// Gateway listen address.
    #[must_use]
    pub const fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }

    /// Health server listen address.
    #[must_use]
    pub const fn health_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.health_port)
    }

    /// Hub settings derived from the polling section.
    #[must_use]
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            queue_capacity: self.polling.queue_capacity,
            poller: PollerConfig {
                interval: self.polling.interval,
                backoff: BackoffConfig {
                    initial_delay: self.polling.backoff_initial,
                    max_delay: self.polling.backoff_max,
                    multiplier: self.polling.backoff_multiplier,
                    jitter_factor: BACKOFF_JITTER,
                },
            },
        }
    }

    /// Crypto adapter settings.
    #[must_use]
    pub fn binance_config(&self) -> BinanceConfig {
        BinanceConfig {
            base_url: self.upstream.crypto_base_url.clone(),
            timeout: self.polling.upstream_timeout,
            history_limit: self.upstream.history_limit,
        }
    }

    /// Equity adapter settings.
    #[must_use]
    pub fn yahoo_config(&self) -> YahooConfig {
        YahooConfig {
            base_url: self.upstream.equity_base_url.clone(),
            timeout: self.polling.upstream_timeout,
            api_key: self.upstream.equity_api_key.clone(),
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable could not be used.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
        /// What was expected.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Parsing Helpers
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed value; empty counts as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        self.get(key).map_or(Ok(default), |raw| {
            raw.parse()
                .map_err(|_| ConfigError::invalid(key, raw, "could not be parsed"))
        })
    }

    fn positive_u64(&self, key: &str) -> Result<Option<u64>, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        match raw.parse::<u64>() {
            Ok(0) => Err(ConfigError::invalid(key, raw, "must be greater than zero")),
            Ok(value) => Ok(Some(value)),
            Err(_) => Err(ConfigError::invalid(key, raw, "expected a whole number")),
        }
    }

    fn positive_millis(&self, key: &str, default: Duration) -> Result<Duration, ConfigError> {
        Ok(self
            .positive_u64(key)?
            .map_or(default, Duration::from_millis))
    }

    fn positive_secs(&self, key: &str, default: Duration) -> Result<Duration, ConfigError> {
        Ok(self.positive_u64(key)?.map_or(default, Duration::from_secs))
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };
        match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::invalid(key, raw, "expected true or false")),
        }
    }

    fn base_url(&self, key: &str, default: &str) -> Result<String, ConfigError> {
        let url = self.get(key).unwrap_or_else(|| default.to_string());
        if url.starts_with("http://") || url.starts_with("https://") {
            Ok(url.trim_end_matches('/').to_string())
        } else {
            Err(ConfigError::invalid(key, url, "expected an http(s):// URL"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        GatewayConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:8000");
        assert_eq!(config.health_addr().port(), 8082);
        assert_eq!(config.polling.interval, Duration::from_secs(1));
        assert_eq!(config.polling.upstream_timeout, Duration::from_secs(8));
        assert_eq!(config.polling.queue_capacity, 16);
        assert_eq!(config.upstream.history_limit, 1000);
        assert!(config.upstream.startup_probe);
        assert_eq!(config.upstream.crypto_base_url, "https://api.binance.com");
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("GATEWAY_HOST", "127.0.0.1"),
            ("GATEWAY_PORT", "9000"),
            ("GATEWAY_POLL_INTERVAL_MS", "250"),
            ("GATEWAY_BACKOFF_MULTIPLIER", "1.5"),
            ("GATEWAY_STARTUP_PROBE", "false"),
            ("CRYPTO_API_BASE_URL", "http://localhost:9001/"),
            ("EQUITY_API_KEY", "k"),
        ])
        .unwrap();

        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.polling.interval, Duration::from_millis(250));
        assert!((config.polling.backoff_multiplier - 1.5).abs() < f64::EPSILON);
        assert!(!config.upstream.startup_probe);
        assert_eq!(config.upstream.crypto_base_url, "http://localhost:9001");
        assert_eq!(config.upstream.equity_api_key.as_deref(), Some("k"));
    }

    #[test]
    fn empty_values_use_defaults() {
        let config = load(&[("GATEWAY_PORT", ""), ("EQUITY_API_KEY", "  ")]).unwrap();
        assert_eq!(config.server.port, 8000);
        assert!(config.upstream.equity_api_key.is_none());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = load(&[("GATEWAY_POLL_INTERVAL_MS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "GATEWAY_POLL_INTERVAL_MS"));
    }

    #[test]
    fn zero_timeout_and_capacity_are_rejected() {
        assert!(load(&[("GATEWAY_UPSTREAM_TIMEOUT_SECS", "0")]).is_err());
        assert!(load(&[("GATEWAY_SUBSCRIBER_QUEUE_CAPACITY", "0")]).is_err());
    }

    #[test]
    fn unparsable_values_are_rejected() {
        assert!(load(&[("GATEWAY_PORT", "eighty")]).is_err());
        assert!(load(&[("GATEWAY_HOST", "not-an-ip")]).is_err());
        assert!(load(&[("GATEWAY_STARTUP_PROBE", "maybe")]).is_err());
        assert!(load(&[("GATEWAY_BACKOFF_MULTIPLIER", "0.5")]).is_err());
    }

    #[test]
    fn base_url_requires_scheme() {
        let err = load(&[("EQUITY_API_BASE_URL", "query1.finance.yahoo.com")]).unwrap_err();
        assert!(err.to_string().contains("EQUITY_API_BASE_URL"));
    }

    #[test]
    fn derived_component_configs() {
        let config = load(&[("GATEWAY_SUBSCRIBER_QUEUE_CAPACITY", "4")]).unwrap();

        let hub = config.hub_config();
        assert_eq!(hub.queue_capacity, 4);
        assert_eq!(hub.poller.interval, Duration::from_secs(1));
        assert_eq!(hub.poller.backoff.max_delay, Duration::from_secs(30));

        assert_eq!(config.binance_config().history_limit, 1000);
        assert_eq!(config.yahoo_config().timeout, Duration::from_secs(8));
    }

    #[test]
    fn api_key_redacted_debug() {
        let config = load(&[("EQUITY_API_KEY", "secret456")]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret456"));
        assert!(debug.contains("[REDACTED]"));
    }
}
