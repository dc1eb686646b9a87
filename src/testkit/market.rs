//! Scripted market data.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::port::outbound::{MarketDataError, MarketDataProvider, MarketQuote};

/// Market data that can be told to fail or stall.
#[derive(Debug, Default)]
pub struct ScriptedMarketData {
    quotes: RwLock<HashMap<String, MarketQuote>>,
    failures_left: AtomicU32,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedMarketData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_quote(self, underlying: &str, price: Decimal, volatility: Decimal) -> Self {
        self.set_quote(underlying, price, volatility);
        self
    }

    /// Answer the next `n` calls with `Unavailable`.
    #[must_use]
    pub fn failing_times(self, n: u32) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// Sleep before answering every call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_quote(&self, underlying: &str, price: Decimal, volatility: Decimal) {
        self.quotes
            .write()
            .insert(underlying.to_string(), MarketQuote { price, volatility });
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedMarketData {
    async fn quote(&self, underlying: &str) -> Result<MarketQuote, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(MarketDataError::Unavailable("scripted outage".into()));
        }
        self.quotes
            .read()
            .get(underlying)
            .copied()
            .ok_or_else(|| MarketDataError::NoData {
                underlying: underlying.to_string(),
            })
    }
}
