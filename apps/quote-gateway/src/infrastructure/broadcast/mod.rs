//! Broadcast Hub
//!
//! Per-symbol fan-out of polled quotes using tokio broadcast channels.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────── BroadcastHub ────────────┐
//! upstream ◄──────┤ Poller(BTC/USDT) ──► broadcast(16) ──┼──► subscription 1
//!                 │                                  └───┼──► subscription 2
//! upstream ◄──────┤ Poller(AAPL)     ──► broadcast(16) ──┼──► subscription 3
//!                 └──────────────────────────────────────┘
//! ```
//!
//! The first subscription for a normalized symbol starts its poller; the
//! last release cancels it. Each subscription is a broadcast receiver with
//! a bounded queue: when a subscriber falls behind, the oldest quotes are
//! overwritten and the subscriber resumes from the oldest retained one.
//!
//! The feed map and the subscription registry are only mutated while the
//! feed mutex is held, so a start and a stop for the same symbol never
//! interleave.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::application::services::{
    MarketDataService, Poller, PollerConfig, PollerSnapshot, PollerStatus,
};
use crate::domain::market::Quote;
use crate::domain::subscription::{
    ConsumerId, SubscribeOutcome, SubscriptionRegistry, SymbolKey, UnsubscribeOutcome,
};
use crate::domain::symbol::{AssetKind, Symbol, classify};
use crate::infrastructure::metrics;

/// Default per-subscriber queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

// =============================================================================
// Configuration
// =============================================================================

/// Hub configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct HubConfig {
    /// Quotes buffered per subscriber before the oldest are dropped.
    pub queue_capacity: usize,
    /// Cadence and backoff for every poller the hub starts.
    pub poller: PollerConfig,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            poller: PollerConfig::default(),
        }
    }
}

// =============================================================================
// Hub
// =============================================================================

struct ActiveFeed {
    kind: AssetKind,
    sender: broadcast::Sender<Quote>,
    cancel: CancellationToken,
    status: Arc<PollerStatus>,
}

/// Registry of active pollers and their subscribers.
///
/// # Example
///
/// ```rust,no_run
/// # async fn demo(service: quote_gateway::MarketDataService) {
/// use std::sync::Arc;
/// use quote_gateway::{BroadcastHub, HubConfig};
///
/// let hub = Arc::new(BroadcastHub::new(service, HubConfig::default()));
///
/// let mut subscription = hub.subscribe_ticker("btc");
/// if let Some(quote) = subscription.recv().await {
///     println!("{} {}", quote.symbol, quote.price);
/// }
/// // Dropping the subscription releases it; the poller stops with the last one.
/// # }
/// ```
pub struct BroadcastHub {
    service: MarketDataService,
    config: HubConfig,
    feeds: Mutex<HashMap<SymbolKey, ActiveFeed>>,
    registry: SubscriptionRegistry,
    next_consumer: AtomicU64,
}

impl std::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("config", &self.config)
            .field("active_pollers", &self.feeds.lock().len())
            .finish_non_exhaustive()
    }
}

impl BroadcastHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new(service: MarketDataService, config: HubConfig) -> Self {
        Self {
            service,
            config,
            feeds: Mutex::new(HashMap::new()),
            registry: SubscriptionRegistry::new(),
            next_consumer: AtomicU64::new(1),
        }
    }

    /// The service pollers fetch through.
    #[must_use]
    pub const fn service(&self) -> &MarketDataService {
        &self.service
    }

    /// Classify a raw ticker and subscribe to it.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn subscribe_ticker(self: &Arc<Self>, raw: &str) -> QuoteSubscription {
        self.subscribe(classify(raw))
    }

    /// Subscribe to a symbol.
    ///
    /// Starts a poller when this is the symbol's first subscriber. The
    /// subscription sees quotes published from now on; there is no replay.
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn subscribe(self: &Arc<Self>, symbol: Symbol) -> QuoteSubscription {
        let consumer = self.next_consumer.fetch_add(1, Ordering::Relaxed);
        let key = symbol.normalized().to_string();

        let mut feeds = self.feeds.lock();
        let outcome = self.registry.add(&key);

        let receiver = match feeds.get(&key) {
            Some(feed) => feed.sender.subscribe(),
            None => {
                let (feed, receiver) = self.start_feed(&symbol);
                feeds.insert(key.clone(), feed);
                metrics::set_active_pollers(feeds.len());
                receiver
            }
        };
        drop(feeds);

        tracing::debug!(
            consumer,
            symbol = %key,
            first = outcome == SubscribeOutcome::FirstSubscriber,
            "Subscribed"
        );

        QuoteSubscription {
            hub: Arc::clone(self),
            consumer,
            symbol,
            receiver,
        }
    }

    /// Release a subscription.
    ///
    /// Equivalent to dropping it.
    pub fn unsubscribe(&self, subscription: QuoteSubscription) {
        drop(subscription);
    }

    fn start_feed(&self, symbol: &Symbol) -> (ActiveFeed, broadcast::Receiver<Quote>) {
        let (sender, receiver) = broadcast::channel(self.config.queue_capacity.max(1));
        let cancel = CancellationToken::new();

        let poller = Poller::new(
            symbol.clone(),
            self.service.clone(),
            self.config.poller.clone(),
            sender.clone(),
            cancel.clone(),
        );
        let status = poller.status();
        // The task ends on cancellation; its handle is not needed.
        drop(poller.spawn());

        let feed = ActiveFeed {
            kind: symbol.kind(),
            sender,
            cancel,
            status,
        };
        (feed, receiver)
    }

    fn release(&self, consumer: ConsumerId, symbol: &str) {
        let mut feeds = self.feeds.lock();

        match self.registry.remove(symbol) {
            UnsubscribeOutcome::LastSubscriber => {
                if let Some(feed) = feeds.remove(symbol) {
                    feed.cancel.cancel();
                }
                metrics::set_active_pollers(feeds.len());
                tracing::debug!(consumer, symbol, "Last subscriber left, poller cancelled");
            }
            UnsubscribeOutcome::Left => {
                tracing::debug!(consumer, symbol, "Unsubscribed");
            }
            UnsubscribeOutcome::NotSubscribed => {}
        }
    }

    /// Cancel every poller.
    ///
    /// Outstanding subscriptions observe the end of their stream once their
    /// poller exits.
    pub fn shutdown(&self) {
        let mut feeds = self.feeds.lock();
        for (symbol, feed) in feeds.drain() {
            feed.cancel.cancel();
            tracing::debug!(symbol = %symbol, "Poller cancelled by shutdown");
        }
        metrics::set_active_pollers(0);
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Normalized symbols with a running poller.
    #[must_use]
    pub fn active_pollers(&self) -> Vec<SymbolKey> {
        let mut symbols: Vec<_> = self.feeds.lock().keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Number of subscriptions for a normalized symbol.
    #[must_use]
    pub fn subscriber_count(&self, symbol: &str) -> usize {
        self.registry.subscriber_count(symbol)
    }

    /// Most recent quote published for a normalized symbol, if its poller
    /// is running and has succeeded at least once.
    #[must_use]
    pub fn last_quote(&self, symbol: &str) -> Option<Quote> {
        self.feeds
            .lock()
            .get(symbol)
            .and_then(|feed| feed.status.last_quote())
    }

    /// Snapshot of every active poller.
    #[must_use]
    pub fn stats(&self) -> HubStats {
        let feeds = self.feeds.lock();
        let mut pollers: Vec<PollerInfo> = feeds
            .iter()
            .map(|(symbol, feed)| PollerInfo {
                symbol: symbol.clone(),
                kind: feed.kind,
                subscribers: self.registry.subscriber_count(symbol),
                status: feed.status.snapshot(),
            })
            .collect();
        drop(feeds);
        pollers.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        HubStats {
            active_pollers: pollers.len(),
            subscriptions: self.registry.stats().subscription_count,
            pollers,
        }
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// A live quote stream for one symbol.
///
/// Dropping the subscription releases it from the hub.
pub struct QuoteSubscription {
    hub: Arc<BroadcastHub>,
    consumer: ConsumerId,
    symbol: Symbol,
    receiver: broadcast::Receiver<Quote>,
}

impl std::fmt::Debug for QuoteSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteSubscription")
            .field("consumer", &self.consumer)
            .field("symbol", &self.symbol)
            .finish_non_exhaustive()
    }
}

impl QuoteSubscription {
    /// Symbol this subscription watches.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Hub-assigned consumer id.
    #[must_use]
    pub const fn consumer_id(&self) -> ConsumerId {
        self.consumer
    }

    /// Wait for the next quote.
    ///
    /// Skips over quotes lost to queue overflow. Returns `None` once the
    /// poller has stopped (hub shutdown).
    pub async fn recv(&mut self) -> Option<Quote> {
        loop {
            match self.receiver.recv().await {
                Ok(quote) => return Some(quote),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        consumer = self.consumer,
                        symbol = self.symbol.normalized(),
                        skipped,
                        "Subscriber lagged, oldest quotes dropped"
                    );
                    metrics::record_quotes_dropped(skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for QuoteSubscription {
    fn drop(&mut self) {
        self.hub.release(self.consumer, self.symbol.normalized());
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Hub statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HubStats {
    /// Number of running pollers.
    pub active_pollers: usize,
    /// Number of live subscriptions.
    pub subscriptions: usize,
    /// Per-poller detail, sorted by symbol.
    pub pollers: Vec<PollerInfo>,
}

impl HubStats {
    /// Pollers whose most recent attempt failed.
    #[must_use]
    pub fn failing_pollers(&self) -> usize {
        self.pollers.iter().filter(|p| p.status.is_failing()).count()
    }
}

/// One poller in [`HubStats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollerInfo {
    /// Normalized symbol.
    pub symbol: SymbolKey,
    /// Asset kind.
    #[serde(rename = "type")]
    pub kind: AssetKind,
    /// Live subscriptions.
    pub subscribers: usize,
    /// Poller health.
    #[serde(flatten)]
    pub status: PollerSnapshot,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::application::ports::{MarketDataError, QuoteProvider};
    use crate::application::services::BackoffConfig;
    use crate::domain::market::HistoryPoint;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuoteProvider for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError> {
            #[allow(clippy::cast_precision_loss)]
            let price = self.calls.fetch_add(1, Ordering::SeqCst) as f64;
            Ok(Quote {
                symbol: symbol.normalized().to_string(),
                price,
                change_percent: 0.0,
                volume: None,
                timestamp_millis: 0,
                kind: symbol.kind(),
            })
        }

        async fn fetch_history(
            &self,
            _: &Symbol,
            _: &str,
            _: &str,
        ) -> Result<Vec<HistoryPoint>, MarketDataError> {
            Ok(vec![])
        }

        async fn ping(&self) -> Result<(), MarketDataError> {
            Ok(())
        }
    }

    fn hub(provider: &Arc<Counting>, capacity: usize) -> Arc<BroadcastHub> {
        let service =
            MarketDataService::new(provider.clone(), provider.clone(), Duration::from_secs(8));
        Arc::new(BroadcastHub::new(
            service,
            HubConfig {
                queue_capacity: capacity,
                poller: PollerConfig {
                    interval: Duration::from_millis(100),
                    backoff: BackoffConfig::default().without_jitter(),
                },
            },
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn first_subscriber_starts_poller() {
        let provider = Arc::new(Counting::default());
        let hub = hub(&provider, 16);

        let mut sub = hub.subscribe_ticker("btc");
        assert_eq!(hub.active_pollers(), vec!["BTC/USDT".to_string()]);
        assert_eq!(hub.subscriber_count("BTC/USDT"), 1);

        let quote = sub.recv().await.unwrap();
        assert_eq!(quote.symbol, "BTC/USDT");
        assert_eq!(hub.last_quote("BTC/USDT").unwrap().symbol, "BTC/USDT");
    }

    #[tokio::test(start_paused = true)]
    async fn same_symbol_shares_one_poller() {
        let provider = Arc::new(Counting::default());
        let hub = hub(&provider, 16);

        let mut a = hub.subscribe_ticker("BTCUSDT");
        let mut b = hub.subscribe_ticker("btc/usdt");
        assert_eq!(hub.active_pollers().len(), 1);
        assert_eq!(hub.subscriber_count("BTC/USDT"), 2);

        for _ in 0..3 {
            let qa = a.recv().await.unwrap();
            let qb = b.recv().await.unwrap();
            assert_eq!(qa, qb);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn last_drop_stops_poller() {
        let provider = Arc::new(Counting::default());
        let hub = hub(&provider, 16);

        let mut a = hub.subscribe_ticker("AAPL");
        let b = hub.subscribe_ticker("AAPL");
        a.recv().await.unwrap();

        drop(a);
        assert_eq!(hub.active_pollers().len(), 1);

        hub.unsubscribe(b);
        assert!(hub.active_pollers().is_empty());
        assert_eq!(hub.subscriber_count("AAPL"), 0);
        assert!(hub.last_quote("AAPL").is_none());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let calls = provider.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn resubscribe_after_stop_starts_fresh_poller() {
        let provider = Arc::new(Counting::default());
        let hub = hub(&provider, 16);

        let mut first = hub.subscribe_ticker("ETH");
        first.recv().await.unwrap();
        drop(first);
        assert!(hub.active_pollers().is_empty());

        let mut second = hub.subscribe_ticker("ETH");
        assert!(second.recv().await.is_some());
        assert_eq!(hub.active_pollers(), vec!["ETH/USDT".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn lagged_subscriber_keeps_receiving() {
        let provider = Arc::new(Counting::default());
        let hub = hub(&provider, 2);

        let mut slow = hub.subscribe_ticker("MSFT");
        // Let several polls overflow the two-slot queue
        tokio::time::sleep(Duration::from_millis(550)).await;

        let quote = slow.recv().await.unwrap();
        assert!(quote.price >= 3.0, "expected oldest quotes dropped, got {}", quote.price);
        let next = slow.recv().await.unwrap();
        assert!(next.price > quote.price);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_ends_streams() {
        let provider = Arc::new(Counting::default());
        let hub = hub(&provider, 16);

        let mut sub = hub.subscribe_ticker("AAPL");
        sub.recv().await.unwrap();

        hub.shutdown();
        assert!(hub.active_pollers().is_empty());

        // Drain anything already queued, then observe the end of stream
        while sub.recv().await.is_some() {}
    }

    #[tokio::test(start_paused = true)]
    async fn stats_report_pollers() {
        let provider = Arc::new(Counting::default());
        let hub = hub(&provider, 16);

        let mut a = hub.subscribe_ticker("AAPL");
        let _b = hub.subscribe_ticker("AAPL");
        let _c = hub.subscribe_ticker("SOL");
        a.recv().await.unwrap();

        let stats = hub.stats();
        assert_eq!(stats.active_pollers, 2);
        assert_eq!(stats.subscriptions, 3);
        assert_eq!(stats.failing_pollers(), 0);
        assert_eq!(stats.pollers[0].symbol, "AAPL");
        assert_eq!(stats.pollers[0].subscribers, 2);
        assert_eq!(stats.pollers[1].symbol, "SOL/USDT");
        assert_eq!(stats.pollers[1].kind, AssetKind::Crypto);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["pollers"][0]["type"], "stock");
        assert_eq!(json["pollers"][0]["state"], "running");
    }
}
