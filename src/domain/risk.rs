//! Portfolio risk types.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::leg::Position;
use super::money::round_display;

/// Sensitivities of an option's value.
///
/// `vega` is per volatility point (0.01), `theta` per calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: Decimal,
    pub gamma: Decimal,
    pub vega: Decimal,
    pub theta: Decimal,
}

impl Greeks {
    /// Scale every sensitivity by a signed contract quantity.
    ///
    /// `None` if any component leaves the `Decimal` range.
    #[must_use]
    pub fn checked_scaled(self, quantity: i64) -> Option<Self> {
        let quantity = Decimal::from(quantity);
        Some(Self {
            delta: self.delta.checked_mul(quantity)?,
            gamma: self.gamma.checked_mul(quantity)?,
            vega: self.vega.checked_mul(quantity)?,
            theta: self.theta.checked_mul(quantity)?,
        })
    }

    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        Some(Self {
            delta: self.delta.checked_add(rhs.delta)?,
            gamma: self.gamma.checked_add(rhs.gamma)?,
            vega: self.vega.checked_add(rhs.vega)?,
            theta: self.theta.checked_add(rhs.theta)?,
        })
    }

    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            delta: round_display(self.delta),
            gamma: round_display(self.gamma),
            vega: round_display(self.vega),
            theta: round_display(self.theta),
        }
    }
}

/// Per-unit (long, one contract) pricing of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegPricing {
    /// Theoretical value of one contract.
    pub value: Decimal,
    pub greeks: Greeks,
}

/// Margin requirement attributed to one underlying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderlyingMargin {
    pub margin: Decimal,
    /// Price shock (fraction of spot) of the worst scenario.
    pub worst_price_shock: Decimal,
    /// Volatility shock (points) of the worst scenario.
    pub worst_vol_shock: Decimal,
}

/// Portfolio-level risk of one owner at one consistent pricing timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSnapshot {
    pub owner: Address,
    pub net_delta: Decimal,
    pub net_gamma: Decimal,
    pub net_vega: Decimal,
    pub net_theta: Decimal,
    pub margin_required: Decimal,
    pub unrealized_pnl: Decimal,
    pub as_of: DateTime<Utc>,
    pub position_version: u64,
    pub legs_priced: usize,
    pub expired_legs: usize,
    pub margin_by_underlying: BTreeMap<String, UnderlyingMargin>,
    /// Net live holdings per series, ordered by series id.
    pub positions: Vec<Position>,
}

impl RiskSnapshot {
    /// Net Greeks as a single value.
    #[must_use]
    pub fn greeks(&self) -> Greeks {
        Greeks {
            delta: self.net_delta,
            gamma: self.net_gamma,
            vega: self.net_vega,
            theta: self.net_theta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn scaled_applies_signed_quantity() {
        let g = Greeks {
            delta: dec!(0.5),
            gamma: dec!(0.01),
            vega: dec!(0.2),
            theta: dec!(-0.05),
        };
        let short = g.checked_scaled(-3).unwrap();
        assert_eq!(short.delta, dec!(-1.5));
        assert_eq!(short.theta, dec!(0.15));
    }

    #[test]
    fn checked_add_nets_opposite_legs() {
        let a = Greeks {
            delta: dec!(1),
            gamma: dec!(2),
            vega: dec!(3),
            theta: dec!(4),
        };
        let flat = a.checked_add(a.checked_scaled(-1).unwrap()).unwrap();
        assert_eq!(flat, Greeks::default());
    }

    #[test]
    fn overflow_is_reported_not_wrapped() {
        let huge = Greeks {
            delta: Decimal::MAX,
            ..Greeks::default()
        };
        assert_eq!(huge.checked_scaled(2), None);
        assert_eq!(huge.checked_add(huge), None);
        assert!(huge.checked_scaled(-1).is_some());
    }

    #[test]
    fn rounded_uses_display_scale() {
        let g = Greeks {
            delta: dec!(0.123456785),
            ..Greeks::default()
        };
        assert_eq!(g.rounded().delta, dec!(0.12345678));
    }
}
