//! Risk and pricing configuration.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::MarginPolicy;

/// Margin scenario grid.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Largest price shock as a fraction of spot (e.g., 0.15 = ±15%).
    #[serde(default = "default_price_shock_pct")]
    pub price_shock_pct: Decimal,
    /// Grid points on each side of an unchanged price.
    #[serde(default = "default_price_shock_steps")]
    pub price_shock_steps: u32,
    /// Volatility shock in points, applied up and down.
    #[serde(default = "default_vol_shock_points")]
    pub vol_shock_points: Decimal,
    /// Apply shocks jointly across underlyings.
    #[serde(default)]
    pub cross_margin: bool,
}

fn default_price_shock_pct() -> Decimal {
    Decimal::new(15, 2)
}

const fn default_price_shock_steps() -> u32 {
    3
}

fn default_vol_shock_points() -> Decimal {
    Decimal::from(10)
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            price_shock_pct: default_price_shock_pct(),
            price_shock_steps: default_price_shock_steps(),
            vol_shock_points: default_vol_shock_points(),
            cross_margin: false,
        }
    }
}

impl From<&RiskConfig> for MarginPolicy {
    fn from(config: &RiskConfig) -> Self {
        Self::new(
            config.price_shock_pct,
            config.price_shock_steps,
            config.vol_shock_points,
            config.cross_margin,
        )
    }
}

/// Pricing model parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PricingConfig {
    /// Continuously compounded annual rate (e.g., 0.05).
    #[serde(default)]
    pub risk_free_rate: f64,
}
