//! REST routes and the gateway HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::error::ApiError;
use super::websocket::ws_handler;
use crate::application::ports::MarketDataError;
use crate::application::services::MarketDataService;
use crate::domain::catalog::{self, CatalogEntry};
use crate::domain::market::{HistoryPoint, Quote};
use crate::domain::symbol::{Symbol, classify};
use crate::infrastructure::broadcast::BroadcastHub;

/// Service name reported by `GET /`.
pub const SERVICE_NAME: &str = "Finance API";

const DEFAULT_PERIOD: &str = "1d";
const DEFAULT_INTERVAL: &str = "1m";

// =============================================================================
// State
// =============================================================================

/// State shared by all gateway handlers.
#[derive(Debug, Clone)]
pub struct GatewayState {
    /// Live quote fan-out.
    pub hub: Arc<BroadcastHub>,
    /// One-shot lookups.
    pub service: MarketDataService,
}

impl GatewayState {
    /// State whose one-shot lookups share the hub's service.
    #[must_use]
    pub fn new(hub: Arc<BroadcastHub>) -> Self {
        let service = hub.service().clone();
        Self { hub, service }
    }
}

// =============================================================================
// Router
// =============================================================================

/// Build the gateway router.
///
/// Ticker path segments are catch-all so pairs like `BTC/USDT` route
/// without escaping.
pub fn create_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/history/{*ticker}", get(history))
        .route("/quote/{*ticker}", get(quote))
        .route("/search", get(search))
        .route("/ws/{*ticker}", get(ws_handler))
        .with_state(state)
}

/// Response for `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Service name.
    pub service: String,
}

/// Query for `GET /history`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    /// Lookback period, default `1d`.
    pub period: Option<String>,
    /// Bucket interval, default `1m`.
    pub interval: Option<String>,
}

/// Query for `GET /search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    /// Search text; missing behaves as empty.
    pub q: Option<String>,
}

/// Classify a path ticker, rejecting blank input.
pub(crate) fn parse_ticker(raw: &str) -> Result<Symbol, MarketDataError> {
    let symbol = classify(raw);
    if symbol.normalized().is_empty() {
        return Err(MarketDataError::invalid_parameter("ticker", raw));
    }
    Ok(symbol)
}

async fn root() -> impl IntoResponse {
    Json(RootResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

async fn history(
    State(state): State<GatewayState>,
    Path(ticker): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryPoint>>, ApiError> {
    let symbol = parse_ticker(&ticker)?;
    let period = query.period.as_deref().unwrap_or(DEFAULT_PERIOD);
    let interval = query.interval.as_deref().unwrap_or(DEFAULT_INTERVAL);

    let points = state
        .service
        .fetch_history(&symbol, period, interval)
        .await?;

    tracing::debug!(
        symbol = symbol.normalized(),
        period,
        interval,
        points = points.len(),
        "History served"
    );
    Ok(Json(points))
}

async fn quote(
    State(state): State<GatewayState>,
    Path(ticker): Path<String>,
) -> Result<Json<Quote>, ApiError> {
    let symbol = parse_ticker(&ticker)?;

    if let Some(cached) = state.hub.last_quote(symbol.normalized()) {
        return Ok(Json(cached));
    }

    Ok(Json(state.service.fetch_quote(&symbol).await?))
}

async fn search(Query(query): Query<SearchQuery>) -> Json<Vec<CatalogEntry>> {
    Json(catalog::search(query.q.as_deref().unwrap_or_default()))
}

// =============================================================================
// Server
// =============================================================================

/// Gateway HTTP/WebSocket server.
#[derive(Debug)]
pub struct GatewayServer {
    addr: SocketAddr,
    state: GatewayState,
    cancel: CancellationToken,
}

impl GatewayServer {
    /// Create a server for `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr, state: GatewayState, cancel: CancellationToken) -> Self {
        Self {
            addr,
            state,
            cancel,
        }
    }

    /// Bind and serve until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `GatewayServerError` if binding fails or the server stops
    /// with an error.
    pub async fn run(self) -> Result<(), GatewayServerError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayServerError::BindFailed(self.addr, e.to_string()))?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `GatewayServerError` if the server stops with an error.
    pub async fn serve(self, listener: TcpListener) -> Result<(), GatewayServerError> {
        let local_addr = listener.local_addr().unwrap_or(self.addr);
        let hub = Arc::clone(&self.state.hub);
        let app = create_router(self.state);

        tracing::info!(addr = %local_addr, "Gateway listening");

        // Stop pollers first so open WebSocket streams end and connections drain.
        let cancel = self.cancel.clone();
        let shutdown = async move {
            cancel.cancelled().await;
            hub.shutdown();
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

/// Gateway server errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayServerError {
    /// Failed to bind the listen address.
    #[error("failed to bind {0}: {1}")]
    BindFailed(SocketAddr, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ticker_is_rejected() {
        assert!(matches!(
            parse_ticker("  "),
            Err(MarketDataError::InvalidParameter { name: "ticker", .. })
        ));
    }

    #[test]
    fn pair_ticker_is_accepted() {
        let symbol = parse_ticker("btc/usdt").unwrap();
        assert_eq!(symbol.normalized(), "BTC/USDT");
    }
}
