//! Option pricing port.
//!
//! Pricing is a pure function of its input; the risk engine calls it once per
//! live leg and never re-derives option math itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{LegPricing, OptionType, Side};

/// Everything a pricing model needs for one leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingInput {
    pub strike: Decimal,
    pub expiry: DateTime<Utc>,
    pub side: Side,
    pub option_type: OptionType,
    pub underlying_price: Decimal,
    pub volatility: Decimal,
    /// Pricing timestamp shared by every leg of one snapshot.
    pub as_of: DateTime<Utc>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// The model cannot price these inputs (expired, zero vol, ...).
    #[error("unpriceable input: {0}")]
    Unpriceable(String),

    /// The model produced a non-finite or unrepresentable number.
    #[error("numeric failure: {0}")]
    Numeric(String),
}

/// Per-unit long value and Greeks for one option contract.
pub trait PricingModel: Send + Sync {
    fn price(&self, input: &PricingInput) -> Result<LegPricing, PricingError>;
}
