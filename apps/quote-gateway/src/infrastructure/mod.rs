//! Infrastructure Layer
//!
//! Adapters that connect the gateway to the outside world.

/// Per-symbol pollers and quote fan-out.
pub mod broadcast;

/// Configuration loaded from the environment.
pub mod config;

/// Client-facing REST and WebSocket server.
pub mod gateway;

/// Health check and metrics HTTP endpoint.
pub mod health;

/// Prometheus metrics.
pub mod metrics;

/// Logging and OpenTelemetry tracing.
pub mod telemetry;

/// HTTP adapters for the crypto and equity quote providers.
pub mod upstream;
