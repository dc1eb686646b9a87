//! Deterministic pricing doubles.

use std::sync::atomic::{AtomicUsize, Ordering};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{Greeks, LegPricing, OptionType};
use crate::port::outbound::{PricingError, PricingInput, PricingModel};

/// Returns fixed per-unit figures for every call and put.
///
/// Strikes listed with [`FixedPricing::failing_strike`] are unpriceable;
/// strikes listed with [`FixedPricing::panicking_strike`] panic inside
/// `price`.
#[derive(Debug)]
pub struct FixedPricing {
    pub call: LegPricing,
    pub put: LegPricing,
    failing_strikes: Vec<Decimal>,
    panicking_strikes: Vec<Decimal>,
    calls: AtomicUsize,
}

impl Default for FixedPricing {
    fn default() -> Self {
        Self {
            call: LegPricing {
                value: dec!(60),
                greeks: Greeks {
                    delta: dec!(0.5),
                    gamma: dec!(0.001),
                    vega: dec!(2),
                    theta: dec!(-1.5),
                },
            },
            put: LegPricing {
                value: dec!(40),
                greeks: Greeks {
                    delta: dec!(-0.4),
                    gamma: dec!(0.001),
                    vega: dec!(2),
                    theta: dec!(-1.2),
                },
            },
            failing_strikes: Vec::new(),
            panicking_strikes: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl FixedPricing {
    #[must_use]
    pub fn failing_strike(mut self, strike: Decimal) -> Self {
        self.failing_strikes.push(strike);
        self
    }

    #[must_use]
    pub fn panicking_strike(mut self, strike: Decimal) -> Self {
        self.panicking_strikes.push(strike);
        self
    }

    #[must_use]
    pub fn with_call(mut self, call: LegPricing) -> Self {
        self.call = call;
        self
    }

    /// Number of `price` invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PricingModel for FixedPricing {
    fn price(&self, input: &PricingInput) -> Result<LegPricing, PricingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(
            !self.panicking_strikes.contains(&input.strike),
            "pricing blew up at strike {}",
            input.strike
        );
        if self.failing_strikes.contains(&input.strike) {
            return Err(PricingError::Unpriceable(format!(
                "strike {} is scripted to fail",
                input.strike
            )));
        }
        Ok(match input.option_type {
            OptionType::Call => self.call,
            OptionType::Put => self.put,
        })
    }
}
