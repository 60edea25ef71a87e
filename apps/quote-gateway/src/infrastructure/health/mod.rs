//! Operational HTTP server.
//!
//! Runs on its own port so probes and scrapes never compete with client
//! traffic on the gateway.
//!
//! - `GET /health`: JSON status built from the hub's poller snapshots
//! - `GET /healthz`: liveness, always 200 while the process serves
//! - `GET /readyz`: 503 once every active poller is failing
//! - `GET /metrics`: Prometheus text exposition

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::broadcast::{BroadcastHub, PollerInfo};
use crate::infrastructure::metrics::get_metrics_handle;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

// =============================================================================
// Response Types
// =============================================================================

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Aggregate poller health.
    pub status: HealthStatus,
    /// Crate version.
    pub version: String,
    /// Seconds since the server state was created.
    pub uptime_secs: u64,
    /// Time the response was built.
    pub current_time: DateTime<Utc>,
    /// Poller summary and detail.
    pub pollers: PollersStatus,
    /// Live subscriptions across all symbols.
    pub subscriptions: usize,
}

/// Aggregate poller health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// No poller is failing.
    Healthy,
    /// Some pollers are failing.
    Degraded,
    /// Every poller is failing.
    Unhealthy,
}

/// Poller summary.
#[derive(Debug, Clone, Serialize)]
pub struct PollersStatus {
    /// Running pollers.
    pub active: usize,
    /// Pollers whose latest attempt failed.
    pub failing: usize,
    /// Per-poller detail.
    pub details: Vec<PollerInfo>,
}

// =============================================================================
// Health Server State
// =============================================================================

/// Shared state for the health server.
#[derive(Debug)]
pub struct HealthServerState {
    version: String,
    started_at: Instant,
    hub: Arc<BroadcastHub>,
}

impl HealthServerState {
    /// State reporting on `hub`; uptime counts from now.
    #[must_use]
    pub fn new(version: String, hub: Arc<BroadcastHub>) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            hub,
        }
    }
}

// =============================================================================
// Health Server
// =============================================================================

/// Operational HTTP server.
#[derive(Debug)]
pub struct HealthServer {
    addr: SocketAddr,
    state: Arc<HealthServerState>,
    cancel: CancellationToken,
}

impl HealthServer {
    /// Server that will listen on `addr` until `cancel` fires.
    #[must_use]
    pub const fn new(
        addr: SocketAddr,
        state: Arc<HealthServerState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            addr,
            state,
            cancel,
        }
    }

    /// Routes served by the operational port.
    pub fn router(state: Arc<HealthServerState>) -> Router {
        Router::new()
            .route("/health", get(status))
            .route("/healthz", get(live))
            .route("/readyz", get(ready))
            .route("/metrics", get(prometheus))
            .with_state(state)
    }

    /// Bind and serve until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HealthServerError` if the address cannot be bound or the
    /// server stops with an error.
    pub async fn run(self) -> Result<(), HealthServerError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| HealthServerError::BindFailed(self.addr, e.to_string()))?;
        tracing::info!(addr = %self.addr, "Health server listening");

        let shutdown = self.cancel.cancelled_owned();
        if let Err(e) = axum::serve(listener, Self::router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
        {
            return Err(HealthServerError::ServerFailed(e.to_string()));
        }

        tracing::info!(addr = %self.addr, "Health server stopped");
        Ok(())
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn status(State(state): State<Arc<HealthServerState>>) -> Response {
    let report = build_health_response(&state);
    let code = if report.status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(report)).into_response()
}

async fn live() -> &'static str {
    "OK"
}

async fn ready(State(state): State<Arc<HealthServerState>>) -> Response {
    let stats = state.hub.stats();
    match determine_health_status(stats.active_pollers, stats.failing_pollers()) {
        HealthStatus::Unhealthy => (StatusCode::SERVICE_UNAVAILABLE, "NOT READY").into_response(),
        HealthStatus::Healthy | HealthStatus::Degraded => "READY".into_response(),
    }
}

async fn prometheus() -> Response {
    let Some(handle) = get_metrics_handle() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response();
    };
    ([(CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], handle.render()).into_response()
}

fn build_health_response(state: &HealthServerState) -> HealthResponse {
    let stats = state.hub.stats();
    let failing = stats.failing_pollers();

    HealthResponse {
        status: determine_health_status(stats.active_pollers, failing),
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        pollers: PollersStatus {
            active: stats.active_pollers,
            failing,
            details: stats.pollers,
        },
        subscriptions: stats.subscriptions,
    }
}

const fn determine_health_status(active: usize, failing: usize) -> HealthStatus {
    if failing == 0 {
        HealthStatus::Healthy
    } else if failing < active {
        HealthStatus::Degraded
    } else {
        HealthStatus::Unhealthy
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Operational server failures.
#[derive(Debug, thiserror::Error)]
pub enum HealthServerError {
    /// The listen address could not be bound.
    #[error("health server could not bind {0}: {1}")]
    BindFailed(SocketAddr, String),

    /// The server stopped with an I/O error.
    #[error("health server failed: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================
