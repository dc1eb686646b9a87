//! Fixed-point monetary helpers.
//!
//! Strikes, premiums and Greeks are carried as [`Decimal`]. Conversions
//! between on-chain integer units and display units always round with
//! banker's rounding so repeated aggregation never drifts.

use std::str::FromStr;

use alloy_primitives::{Address, U256};
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::DomainError;

/// Price represented as a Decimal for precision.
pub type Price = Decimal;

/// Scale applied to every aggregated figure in a risk snapshot.
pub const DISPLAY_SCALE: u32 = 8;

/// Largest token decimals accepted for unit conversion.
pub const MAX_DECIMALS: u8 = 18;

/// Round to [`DISPLAY_SCALE`] using banker's rounding.
#[must_use]
pub fn round_display(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointNearestEven)
}

fn unit_scale(decimals: u8) -> Result<Decimal, DomainError> {
    if decimals > MAX_DECIMALS {
        return Err(DomainError::UnsupportedDecimals {
            decimals,
            max: MAX_DECIMALS,
        });
    }
    Ok(Decimal::from(10u64.pow(u32::from(decimals))))
}

/// Convert on-chain integer units to a display amount.
pub fn from_units(units: U256, decimals: u8) -> Result<Decimal, DomainError> {
    let scale = unit_scale(decimals)?;
    let raw: u128 = units.try_into().map_err(|_| DomainError::Overflow {
        amount: units.to_string(),
        target: "u128",
    })?;
    let whole = i128::try_from(raw).map_err(|_| DomainError::Overflow {
        amount: units.to_string(),
        target: "i128",
    })?;
    let value = Decimal::try_from_i128_with_scale(whole, 0).map_err(|_| DomainError::Overflow {
        amount: units.to_string(),
        target: "decimal",
    })?;
    Ok(round_display(value / scale))
}

/// Convert a display amount to on-chain integer units.
pub fn to_units(amount: Decimal, decimals: u8) -> Result<U256, DomainError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(DomainError::NegativeUnits { amount });
    }
    let scaled = amount
        .checked_mul(unit_scale(decimals)?)
        .ok_or_else(|| DomainError::Overflow {
            amount: amount.to_string(),
            target: "decimal",
        })?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
    let whole: u128 = scaled.mantissa().try_into().map_err(|_| DomainError::Overflow {
        amount: amount.to_string(),
        target: "u128",
    })?;
    Ok(U256::from(whole))
}

/// Parse an integer amount given either in decimal or `0x` hex notation.
pub fn parse_amount(input: &str) -> Result<U256, DomainError> {
    U256::from_str(input.trim()).map_err(|e| DomainError::InvalidAmount {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a 20-byte EVM address; checksum casing is not enforced.
pub fn parse_address(input: &str) -> Result<Address, DomainError> {
    Address::from_str(input.trim()).map_err(|e| DomainError::InvalidAddress {
        input: input.to_string(),
        reason: e.to_string(),
    })
}
