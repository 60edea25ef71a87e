//! Configuration Module
//!
//! Environment-driven configuration for the gateway and its components.

mod settings;

pub use settings::{
    ConfigError, GatewayConfig, PollingSettings, ServerSettings, UpstreamSettings,
};
