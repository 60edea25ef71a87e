#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Quote Gateway - Shared Polling Market Data Fan-out
//!
//! An HTTP/WebSocket service that serves crypto and equity quotes, price
//! history, and asset search. Live quotes are polled once per watched
//! symbol no matter how many clients watch it, then fanned out to every
//! WebSocket subscriber.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure types and rules
//!   - `symbol`: Ticker classification and normalization
//!   - `market`: Quotes, history points, change percentage
//!   - `subscription`: Per-symbol reference counting
//!   - `catalog`: Static asset catalog for search
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: The `QuoteProvider` and `ServiceMetrics` traits, `MarketDataError`
//!   - `services`: Provider routing, per-symbol pollers, backoff
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `upstream`: Binance and Yahoo HTTP adapters
//!   - `broadcast`: Poller lifecycle and quote fan-out
//!   - `gateway`: REST and WebSocket routes
//!   - `config`: Configuration from the environment
//!   - `health`: Health check and metrics endpoint
//!
//! # Data Flow
//!
//! ```text
//! Binance REST ──┐                       ┌──────────────┐
//!                ├──► Poller (1/symbol) ─►│ BroadcastHub │──► WS client 1
//! Yahoo chart  ──┘                       │  (per-symbol │──► WS client 2
//!                                        │   channels)  │──► WS client N
//!                                        └──────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use quote_gateway::{BroadcastHub, HubConfig, MarketDataService};
//!
//! let service = MarketDataService::new(crypto, equity, timeout);
//! let hub = Arc::new(BroadcastHub::new(service, HubConfig::default()));
//! let mut subscription = hub.subscribe_ticker("BTC");
//! while let Some(quote) = subscription.recv().await {
//!     println!("{} {}", quote.symbol, quote.price);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Pure types with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::catalog::CatalogEntry;
pub use domain::market::{HistoryPoint, Quote};
pub use domain::subscription::{ConsumerId, SubscriptionRegistry, SubscriptionStats};
pub use domain::symbol::{AssetKind, Symbol, classify};

// Application
pub use application::ports::{
    ErrorKind, MarketDataError, NoopMetrics, QuoteProvider, ServiceMetrics, UpstreamOutcome,
};
pub use application::services::{
    BackoffConfig, BackoffPolicy, MarketDataService, Poller, PollerConfig, PollerSnapshot,
    PollerState,
};

// Infrastructure config
pub use infrastructure::config::{
    ConfigError, GatewayConfig, PollingSettings, ServerSettings, UpstreamSettings,
};

// Broadcast hub
pub use infrastructure::broadcast::{BroadcastHub, HubConfig, HubStats, QuoteSubscription};

// Servers
pub use infrastructure::gateway::{GatewayServer, GatewayServerError, GatewayState};
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Upstream adapters
pub use infrastructure::upstream::{BinanceConfig, BinanceProvider, YahooConfig, YahooProvider};

// Metrics
pub use infrastructure::metrics::{PrometheusMetrics, init_metrics};

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
