//! Market data port.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Spot price and implied volatility of one underlying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub price: Decimal,
    /// Annualized volatility as a fraction (0.65 = 65%).
    pub volatility: Decimal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    /// No data exists for this underlying.
    #[error("no market data for {underlying}")]
    NoData { underlying: String },

    /// Upstream feed unavailable.
    #[error("market data unavailable: {0}")]
    Unavailable(String),
}

/// Source of current underlying prices and volatilities.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn quote(&self, underlying: &str) -> Result<MarketQuote, MarketDataError>;
}
