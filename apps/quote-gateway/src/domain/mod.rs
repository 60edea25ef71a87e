//! Domain Layer - Core market data types and business rules.
//!
//! This layer contains the core domain types for quote streaming
//! with no I/O. All types here are pure Rust with serialization support.

/// Asset catalog used by symbol search.
pub mod catalog;

/// Quotes, history points, and price-change arithmetic.
pub mod market;

/// Subscription tracking and reference counting.
pub mod subscription;

/// Ticker classification and normalization.
pub mod symbol;
