//! Black-Scholes pricing for European options.
//!
//! Math runs in `f64`; results are converted to `Decimal` with banker's
//! rounding at display scale. Vega is per volatility point and theta per
//! calendar day.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use crate::domain::money::round_display;
use crate::domain::{Greeks, LegPricing, OptionType};
use crate::port::outbound::{PricingError, PricingInput, PricingModel};

const MILLIS_PER_YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0 * 1000.0;
const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholes {
    risk_free_rate: f64,
}

impl BlackScholes {
    #[must_use]
    pub const fn new(risk_free_rate: f64) -> Self {
        Self { risk_free_rate }
    }

    #[must_use]
    pub const fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }
}

fn to_f64(value: Decimal, name: &str) -> Result<f64, PricingError> {
    value
        .to_f64()
        .ok_or_else(|| PricingError::Numeric(format!("{name} {value} is not representable")))
}

fn to_decimal(value: f64, name: &str) -> Result<Decimal, PricingError> {
    if !value.is_finite() {
        return Err(PricingError::Numeric(format!("{name} is {value}")));
    }
    Decimal::from_f64_retain(value)
        .map(round_display)
        .ok_or_else(|| PricingError::Numeric(format!("{name} {value} out of range")))
}

impl PricingModel for BlackScholes {
    fn price(&self, input: &PricingInput) -> Result<LegPricing, PricingError> {
        let millis = (input.expiry - input.as_of).num_milliseconds();
        if millis <= 0 {
            return Err(PricingError::Unpriceable("option has expired".into()));
        }
        let t = millis as f64 / MILLIS_PER_YEAR;

        let s = to_f64(input.underlying_price, "underlying price")?;
        let k = to_f64(input.strike, "strike")?;
        let sigma = to_f64(input.volatility, "volatility")?;
        if s <= 0.0 {
            return Err(PricingError::Unpriceable(format!(
                "non-positive underlying price {}",
                input.underlying_price
            )));
        }
        if k <= 0.0 {
            return Err(PricingError::Unpriceable(format!(
                "non-positive strike {}",
                input.strike
            )));
        }
        if sigma <= 0.0 {
            return Err(PricingError::Unpriceable(format!(
                "non-positive volatility {}",
                input.volatility
            )));
        }

        let n = Normal::new(0.0, 1.0).map_err(|e| PricingError::Numeric(e.to_string()))?;
        let r = self.risk_free_rate;
        let sqrt_t = t.sqrt();
        let d1 = ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / (sigma * sqrt_t);
        let d2 = d1 - sigma * sqrt_t;
        let discount = (-r * t).exp();
        let pdf_d1 = n.pdf(d1);

        let (value, delta, carry) = match input.option_type {
            OptionType::Call => (
                s * n.cdf(d1) - k * discount * n.cdf(d2),
                n.cdf(d1),
                -r * k * discount * n.cdf(d2),
            ),
            OptionType::Put => (
                k * discount * n.cdf(-d2) - s * n.cdf(-d1),
                n.cdf(d1) - 1.0,
                r * k * discount * n.cdf(-d2),
            ),
        };
        let gamma = pdf_d1 / (s * sigma * sqrt_t);
        let vega = s * pdf_d1 * sqrt_t / 100.0;
        let theta = (-(s * pdf_d1 * sigma) / (2.0 * sqrt_t) + carry) / DAYS_PER_YEAR;

        Ok(LegPricing {
            value: to_decimal(value.max(0.0), "value")?,
            greeks: Greeks {
                delta: to_decimal(delta, "delta")?,
                gamma: to_decimal(gamma, "gamma")?,
                vega: to_decimal(vega, "vega")?,
                theta: to_decimal(theta, "theta")?,
            },
        })
    }
}
