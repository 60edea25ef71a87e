//! Quote Gateway Binary
//!
//! Starts the REST/WebSocket gateway and the health server.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin quote-gateway
//! ```
//!
//! # Environment Variables
//!
//! All optional.
//!
//! - `GATEWAY_HOST`: Listen host (default: 0.0.0.0)
//! - `GATEWAY_PORT`: Gateway port (default: 8000)
//! - `GATEWAY_HEALTH_PORT`: Health and metrics port (default: 8082)
//! - `GATEWAY_POLL_INTERVAL_MS`: Per-symbol poll interval (default: 1000)
//! - `GATEWAY_UPSTREAM_TIMEOUT_SECS`: Upstream call timeout (default: 8)
//! - `GATEWAY_BACKOFF_INITIAL_MS` / `GATEWAY_BACKOFF_MAX_SECS` / `GATEWAY_BACKOFF_MULTIPLIER`
//! - `GATEWAY_SUBSCRIBER_QUEUE_CAPACITY`: Quotes buffered per subscriber (default: 16)
//! - `GATEWAY_HISTORY_LIMIT`: Max crypto candles per history request (default: 1000)
//! - `GATEWAY_STARTUP_PROBE`: Ping both providers before serving (default: true)
//! - `CRYPTO_API_BASE_URL` / `EQUITY_API_BASE_URL` / `EQUITY_API_KEY`
//! - `OTEL_ENABLED`, `OTEL_EXPORTER_OTLP_ENDPOINT`, `OTEL_SERVICE_NAME`
//! - `RUST_LOG`: Log filter

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use quote_gateway::infrastructure::telemetry;
use quote_gateway::{
    BinanceProvider, BroadcastHub, GatewayConfig, GatewayServer, GatewayState, HealthServer,
    HealthServerState, MarketDataService, PrometheusMetrics, YahooProvider, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// How long servers get to drain after a shutdown signal.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    load_dotenv();

    let _telemetry_guard = telemetry::init().context("failed to initialize telemetry")?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting quote gateway");

    let _metrics_handle = init_metrics().context("failed to install Prometheus recorder")?;

    let config = GatewayConfig::from_env().context("invalid configuration")?;
    log_config(&config);

    let crypto = BinanceProvider::new(config.binance_config())
        .context("failed to build crypto provider")?;
    let equity =
        YahooProvider::new(config.yahoo_config()).context("failed to build equity provider")?;
    let service = MarketDataService::new(
        Arc::new(crypto),
        Arc::new(equity),
        config.polling.upstream_timeout,
    )
    .with_metrics(Arc::new(PrometheusMetrics));

    if config.upstream.startup_probe {
        service
            .probe()
            .await
            .context("upstream provider unreachable at startup")?;
    }

    let shutdown_token = CancellationToken::new();
    let hub = Arc::new(BroadcastHub::new(service, config.hub_config()));

    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&hub),
    ));
    let health_server = HealthServer::new(
        config.health_addr(),
        health_state,
        shutdown_token.clone(),
    );
    let gateway_server = GatewayServer::new(
        config.listen_addr(),
        GatewayState::new(Arc::clone(&hub)),
        shutdown_token.clone(),
    );

    let health_task = tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });
    let mut gateway_task = tokio::spawn(gateway_server.run());

    tracing::info!("Quote gateway ready");

    tokio::select! {
        result = &mut gateway_task => {
            // The gateway stopped before any signal; tear the rest down.
            shutdown_token.cancel();
            hub.shutdown();
            let _ = health_task.await;
            return result
                .context("gateway task panicked")?
                .context("gateway server failed");
        }
        () = await_shutdown(shutdown_token.clone()) => {}
    }

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        let gateway = gateway_task.await;
        let _ = health_task.await;
        gateway
    })
    .await
    {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "Gateway server error during shutdown"),
        Ok(Err(e)) => tracing::error!(error = %e, "Gateway task panicked"),
        Err(_) => tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Shutdown timed out with connections still open"
        ),
    }

    hub.shutdown();
    tracing::info!("Quote gateway stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &GatewayConfig) {
    tracing::info!(
        listen = %config.listen_addr(),
        health = %config.health_addr(),
        poll_interval_ms = u64::try_from(config.polling.interval.as_millis()).unwrap_or(u64::MAX),
        upstream_timeout_secs = config.polling.upstream_timeout.as_secs(),
        queue_capacity = config.polling.queue_capacity,
        "Configuration loaded"
    );
    tracing::debug!(
        crypto = %config.upstream.crypto_base_url,
        equity = %config.upstream.equity_base_url,
        equity_api_key = config.upstream.equity_api_key.is_some(),
        "Upstream endpoints"
    );
}

/// Load .env from the current directory or the nearest ancestor that has one.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        for dir in cwd.ancestors().skip(1) {
            let env_path = dir.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
        }
    }
}

/// Wait for SIGTERM or SIGINT, then cancel `shutdown_token`.
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
