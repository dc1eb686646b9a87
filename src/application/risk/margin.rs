//! Scenario-based margin.
//!
//! Each scenario shocks the underlying price by a fraction of spot and the
//! volatility by a number of points. Leg P&L under a scenario is the
//! second-order Greek approximation `Δ·dS + ½Γ·dS² + vega·dσ`, scaled by
//! signed quantity. Margin is the worst scenario loss, floored at zero.
//! Arithmetic is checked; a result outside the `Decimal` range is an error.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::money::round_display;
use crate::domain::{DomainError, Greeks, UnderlyingMargin};

/// One priced leg as seen by the scenario grid.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioLeg<'a> {
    pub underlying: &'a str,
    pub quantity: i64,
    pub spot: Decimal,
    /// Per-unit Greeks.
    pub greeks: Greeks,
}

impl ScenarioLeg<'_> {
    fn pnl(&self, price_shock: Decimal, vol_shock: Decimal) -> Option<Decimal> {
        let g = &self.greeks;
        let ds = self.spot.checked_mul(price_shock)?;
        let convexity = dec!(0.5)
            .checked_mul(g.gamma)?
            .checked_mul(ds)?
            .checked_mul(ds)?;
        let unit = g
            .delta
            .checked_mul(ds)?
            .checked_add(convexity)?
            .checked_add(g.vega.checked_mul(vol_shock)?)?;
        unit.checked_mul(Decimal::from(self.quantity))
    }
}

/// Result of evaluating the grid over a portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarginResult {
    pub total: Decimal,
    pub by_underlying: BTreeMap<String, UnderlyingMargin>,
}

/// Scenario grid parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginPolicy {
    /// Largest price shock as a fraction of spot (0.15 = ±15%).
    price_shock: Decimal,
    /// Grid points on each side of zero.
    price_steps: u32,
    /// Volatility shock in points.
    vol_shock: Decimal,
    cross_margin: bool,
}

impl MarginPolicy {
    #[must_use]
    pub fn new(
        price_shock: Decimal,
        price_steps: u32,
        vol_shock: Decimal,
        cross_margin: bool,
    ) -> Self {
        Self {
            price_shock: price_shock.abs(),
            price_steps: price_steps.max(1),
            vol_shock: vol_shock.abs(),
            cross_margin,
        }
    }

    #[must_use]
    pub fn cross_margin(&self) -> bool {
        self.cross_margin
    }

    /// Every `(price_shock, vol_shock)` pair, in a fixed order.
    #[must_use]
    pub fn scenarios(&self) -> Vec<(Decimal, Decimal)> {
        let steps = i64::from(self.price_steps);
        let vols: Vec<Decimal> = if self.vol_shock.is_zero() {
            vec![Decimal::ZERO]
        } else {
            vec![-self.vol_shock, Decimal::ZERO, self.vol_shock]
        };
        let mut grid = Vec::with_capacity(vols.len() * (2 * self.price_steps as usize + 1));
        for k in -steps..=steps {
            let price = self.price_shock * Decimal::from(k) / Decimal::from(steps);
            for &vol in &vols {
                grid.push((price, vol));
            }
        }
        grid
    }

    /// Margin for a set of priced legs.
    pub fn evaluate(&self, legs: &[ScenarioLeg<'_>]) -> Result<MarginResult, DomainError> {
        let grid = self.scenarios();
        let mut groups: BTreeMap<&str, Vec<&ScenarioLeg<'_>>> = BTreeMap::new();
        for leg in legs {
            groups.entry(leg.underlying).or_default().push(leg);
        }

        let by_underlying = groups
            .iter()
            .map(|(underlying, legs)| {
                worst_case(&grid, legs).map(|margin| ((*underlying).to_string(), margin))
            })
            .collect::<Result<BTreeMap<String, UnderlyingMargin>, DomainError>>()?;

        let total = if self.cross_margin {
            let all: Vec<&ScenarioLeg<'_>> = legs.iter().collect();
            worst_case(&grid, &all)?.margin
        } else {
            by_underlying
                .values()
                .try_fold(Decimal::ZERO, |acc, m| acc.checked_add(m.margin))
                .ok_or_else(overflow)?
        };

        Ok(MarginResult {
            total: round_display(total),
            by_underlying,
        })
    }
}

impl Default for MarginPolicy {
    fn default() -> Self {
        Self::new(dec!(0.15), 3, dec!(10), false)
    }
}

fn overflow() -> DomainError {
    DomainError::ArithmeticOverflow {
        context: "scenario margin",
    }
}

fn worst_case(
    grid: &[(Decimal, Decimal)],
    legs: &[&ScenarioLeg<'_>],
) -> Result<UnderlyingMargin, DomainError> {
    let mut worst = (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
    for &(price, vol) in grid {
        let pnl = legs
            .iter()
            .try_fold(Decimal::ZERO, |acc, leg| acc.checked_add(leg.pnl(price, vol)?))
            .ok_or_else(overflow)?;
        if pnl < worst.0 {
            worst = (pnl, price, vol);
        }
    }
    let loss = if worst.0 < Decimal::ZERO {
        -worst.0
    } else {
        Decimal::ZERO
    };
    Ok(UnderlyingMargin {
        margin: round_display(loss),
        worst_price_shock: worst.1,
        worst_vol_shock: worst.2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(
        underlying: &str,
        quantity: i64,
        delta: Decimal,
        gamma: Decimal,
        vega: Decimal,
    ) -> ScenarioLeg<'_> {
        ScenarioLeg {
            underlying,
            quantity,
            spot: dec!(100),
            greeks: Greeks {
                delta,
                gamma,
                vega,
                theta: Decimal::ZERO,
            },
        }
    }

    fn policy() -> MarginPolicy {
        MarginPolicy::new(dec!(0.10), 2, dec!(5), false)
    }

    #[test]
    fn grid_is_symmetric() {
        let grid = policy().scenarios();
        assert_eq!(grid.len(), 15);
        assert_eq!(grid.first(), Some(&(dec!(-0.10), dec!(-5))));
        assert_eq!(grid.last(), Some(&(dec!(0.10), dec!(5))));
    }

    #[test]
    fn long_delta_loses_on_down_move() {
        let legs = [leg("ETH", 1, dec!(0.5), Decimal::ZERO, Decimal::ZERO)];
        let result = policy().evaluate(&legs).unwrap();
        // 0.5 * (100 * -0.10) = -5
        assert_eq!(result.total, dec!(5));
        assert_eq!(result.by_underlying["ETH"].worst_price_shock, dec!(-0.10));
    }

    #[test]
    fn flat_book_needs_no_margin() {
        let legs = [
            leg("ETH", 3, dec!(0.4), dec!(0.02), dec!(0.1)),
            leg("ETH", -3, dec!(0.4), dec!(0.02), dec!(0.1)),
        ];
        let result = policy().evaluate(&legs).unwrap();
        assert_eq!(result.total, Decimal::ZERO);
    }

    #[test]
    fn short_vega_loses_on_vol_spike() {
        let legs = [leg("BTC", -2, Decimal::ZERO, Decimal::ZERO, dec!(0.3))];
        let result = policy().evaluate(&legs).unwrap();
        assert_eq!(result.total, dec!(3));
        assert_eq!(result.by_underlying["BTC"].worst_vol_shock, dec!(5));
    }

    #[test]
    fn cross_margin_nets_opposing_underlyings() {
        let legs = [
            leg("ETH", 1, dec!(0.5), Decimal::ZERO, Decimal::ZERO),
            leg("BTC", -1, dec!(0.5), Decimal::ZERO, Decimal::ZERO),
        ];
        let isolated = policy().evaluate(&legs).unwrap();
        assert_eq!(isolated.total, dec!(10));

        let crossed = MarginPolicy::new(dec!(0.10), 2, dec!(5), true).evaluate(&legs).unwrap();
        assert_eq!(crossed.total, Decimal::ZERO);
        assert_eq!(crossed.by_underlying.len(), 2);
    }

    #[test]
    fn empty_book_has_zero_margin() {
        let result = policy().evaluate(&[]).unwrap();
        assert_eq!(result, MarginResult::default());
    }

    #[test]
    fn overflowing_scenario_is_an_error() {
        let legs = [leg("ETH", 1_000_000, Decimal::MAX, Decimal::ZERO, Decimal::ZERO)];
        let err = policy().evaluate(&legs).unwrap_err();
        assert_eq!(
            err,
            DomainError::ArithmeticOverflow {
                context: "scenario margin"
            }
        );
    }
}
