//! Static market data configuration.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::port::outbound::MarketQuote;

/// One configured quote.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteConfig {
    pub underlying: String,
    pub price: Decimal,
    /// Annualized volatility as a fraction.
    pub volatility: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketConfig {
    #[serde(default)]
    pub quotes: Vec<QuoteConfig>,
}

impl MarketConfig {
    /// `(underlying, quote)` pairs for the static feed.
    pub fn quotes(&self) -> impl Iterator<Item = (String, MarketQuote)> + '_ {
        self.quotes.iter().map(|q| {
            (
                q.underlying.clone(),
                MarketQuote {
                    price: q.price,
                    volatility: q.volatility,
                },
            )
        })
    }
}
