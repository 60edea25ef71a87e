//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and port interfaces
//! that define how the domain interacts with external systems.

/// Port interfaces for upstream quote providers.
pub mod ports;

/// Application services: provider routing, polling, and backoff.
pub mod services;
