//! Static market data feed.
//!
//! Serves quotes loaded from configuration or set at runtime. Used by the
//! CLI and by deployments that push marks from elsewhere.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::port::outbound::{MarketDataError, MarketDataProvider, MarketQuote};

#[derive(Debug, Default)]
pub struct StaticMarketData {
    quotes: RwLock<HashMap<String, MarketQuote>>,
}

impl StaticMarketData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(underlying, quote)` pairs.
    pub fn from_quotes<I, S>(quotes: I) -> Self
    where
        I: IntoIterator<Item = (S, MarketQuote)>,
        S: Into<String>,
    {
        let feed = Self::new();
        for (underlying, quote) in quotes {
            feed.set_quote(underlying, quote.price, quote.volatility);
        }
        feed
    }

    /// Insert or replace the quote of an underlying.
    pub fn set_quote(&self, underlying: impl Into<String>, price: Decimal, volatility: Decimal) {
        self.quotes.write().insert(
            normalize(&underlying.into()),
            MarketQuote { price, volatility },
        );
    }

    pub fn remove(&self, underlying: &str) -> Option<MarketQuote> {
        self.quotes.write().remove(&normalize(underlying))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.read().is_empty()
    }
}

fn normalize(underlying: &str) -> String {
    underlying.trim().to_uppercase()
}

#[async_trait]
impl MarketDataProvider for StaticMarketData {
    async fn quote(&self, underlying: &str) -> Result<MarketQuote, MarketDataError> {
        self.quotes
            .read()
            .get(&normalize(underlying))
            .copied()
            .ok_or_else(|| MarketDataError::NoData {
                underlying: underlying.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn lookups_ignore_case_and_whitespace() {
        let feed = StaticMarketData::new();
        feed.set_quote("eth", dec!(2500), dec!(0.55));
        let quote = feed.quote(" ETH ").await.unwrap();
        assert_eq!(quote.price, dec!(2500));
    }

    #[tokio::test]
    async fn missing_underlying_reports_no_data() {
        let feed = StaticMarketData::new();
        assert_eq!(
            feed.quote("SOL").await.unwrap_err(),
            MarketDataError::NoData {
                underlying: "SOL".into()
            }
        );
    }
}
