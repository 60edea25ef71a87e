//! Subscription Tracking
//!
//! Reference counts per normalized symbol.
//!
//! Many subscriptions can watch the same symbol while only one upstream
//! poller runs for it: the registry reports the 0→1 and 1→0 transitions so
//! the hub knows when to start and stop that poller.

use std::collections::HashMap;

use parking_lot::RwLock;

// =============================================================================
// Types
// =============================================================================

/// Identifier the hub assigns to each subscription (one WebSocket
/// connection or one in-process subscriber).
pub type ConsumerId = u64;

/// A normalized symbol string (fan-out key).
pub type SymbolKey = String;

/// Result of adding a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// First subscriber for the symbol; a poller must be started.
    FirstSubscriber,
    /// Symbol already had subscribers.
    Joined,
}

/// Result of removing a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    /// Last subscriber left; the poller must be stopped.
    LastSubscriber,
    /// Other subscribers remain.
    Left,
    /// The symbol had no subscribers.
    NotSubscribed,
}

// =============================================================================
// Subscription Registry
// =============================================================================

/// Thread-safe per-symbol subscriber counts.
///
/// # Example
///
/// ```rust
/// use quote_gateway::domain::subscription::{
///     SubscribeOutcome, SubscriptionRegistry, UnsubscribeOutcome,
/// };
///
/// let registry = SubscriptionRegistry::new();
///
/// // First watcher of BTC/USDT - a poller is needed
/// assert_eq!(registry.add("BTC/USDT"), SubscribeOutcome::FirstSubscriber);
///
/// // A second watcher shares it
/// assert_eq!(registry.add("BTC/USDT"), SubscribeOutcome::Joined);
///
/// assert_eq!(registry.remove("BTC/USDT"), UnsubscribeOutcome::Left);
///
/// // Last watcher leaves - stop the poller
/// assert_eq!(registry.remove("BTC/USDT"), UnsubscribeOutcome::LastSubscriber);
/// ```
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    counts: RwLock<HashMap<SymbolKey, usize>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more subscription to `symbol`.
    pub fn add(&self, symbol: &str) -> SubscribeOutcome {
        let mut counts = self.counts.write();
        let count = counts.entry(symbol.to_string()).or_insert(0);
        *count += 1;

        if *count == 1 {
            SubscribeOutcome::FirstSubscriber
        } else {
            SubscribeOutcome::Joined
        }
    }

    /// Count one subscription to `symbol` as released.
    pub fn remove(&self, symbol: &str) -> UnsubscribeOutcome {
        let mut counts = self.counts.write();
        let Some(count) = counts.get_mut(symbol) else {
            return UnsubscribeOutcome::NotSubscribed;
        };

        *count -= 1;
        if *count == 0 {
            counts.remove(symbol);
            UnsubscribeOutcome::LastSubscriber
        } else {
            UnsubscribeOutcome::Left
        }
    }

    /// Number of subscriptions to a symbol.
    #[must_use]
    pub fn subscriber_count(&self, symbol: &str) -> usize {
        self.counts.read().get(symbol).copied().unwrap_or(0)
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> SubscriptionStats {
        let counts = self.counts.read();
        SubscriptionStats {
            symbol_count: counts.len(),
            subscription_count: counts.values().sum(),
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Registry statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriptionStats {
    /// Symbols with at least one subscription.
    pub symbol_count: usize,
    /// Live subscriptions across all symbols.
    pub subscription_count: usize,
}

// =============================================================================
// Tests
// =============================================================================
