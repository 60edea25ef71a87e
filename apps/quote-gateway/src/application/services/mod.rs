//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `MarketDataService`: Routes symbols to providers with a bounded timeout
//! - `Poller`: Per-symbol polling loop feeding the broadcast hub
//! - `BackoffPolicy`: Exponential backoff for consecutive poll failures

pub mod backoff;
pub mod market_data;
pub mod poller;

pub use backoff::{BackoffConfig, BackoffPolicy};
pub use market_data::MarketDataService;
pub use poller::{Poller, PollerConfig, PollerSnapshot, PollerState, PollerStatus};
