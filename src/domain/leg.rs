//! Strategy legs and owner position sets.

use std::collections::BTreeMap;
use std::fmt;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{LegId, SeriesId};
use super::money::Price;

/// Largest absolute contract count a single leg may carry.
pub const MAX_LEG_SIZE: i64 = 1_000_000_000_000;

/// Direction of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// +1 for buys, -1 for sells.
    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Call or put, as defined by the referenced series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

/// One option position entry contributing to an owner's aggregate risk.
///
/// All fields are private; construction goes through [`StrategyLeg::try_new`]
/// so the size and strike invariants always hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyLeg {
    id: LegId,
    series_id: SeriesId,
    underlying: String,
    side: Side,
    option_type: OptionType,
    size: i64,
    strike: Price,
    expiry: DateTime<Utc>,
    premium: Price,
}

impl StrategyLeg {
    /// Create a validated leg with a fresh id.
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        series_id: SeriesId,
        underlying: impl Into<String>,
        side: Side,
        option_type: OptionType,
        size: i64,
        strike: Price,
        expiry: DateTime<Utc>,
        premium: Price,
    ) -> Result<Self, DomainError> {
        let underlying = underlying.into();
        if size == 0 {
            return Err(DomainError::ZeroSize);
        }
        if size.unsigned_abs() > MAX_LEG_SIZE.unsigned_abs() {
            return Err(DomainError::SizeOutOfRange {
                size,
                max: MAX_LEG_SIZE,
            });
        }
        if strike <= Decimal::ZERO {
            return Err(DomainError::NonPositiveStrike { strike });
        }
        if premium < Decimal::ZERO {
            return Err(DomainError::NegativePremium { premium });
        }
        if underlying.trim().is_empty() {
            return Err(DomainError::EmptyUnderlying);
        }
        Ok(Self {
            id: LegId::new(),
            series_id,
            underlying,
            side,
            option_type,
            size,
            strike,
            expiry,
            premium,
        })
    }

    #[must_use]
    pub fn id(&self) -> LegId {
        self.id
    }

    #[must_use]
    pub fn series_id(&self) -> &SeriesId {
        &self.series_id
    }

    #[must_use]
    pub fn underlying(&self) -> &str {
        &self.underlying
    }

    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    #[must_use]
    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    /// Signed contract count as recorded by the trade.
    #[must_use]
    pub fn size(&self) -> i64 {
        self.size
    }

    #[must_use]
    pub fn strike(&self) -> Price {
        self.strike
    }

    #[must_use]
    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    /// Per-contract premium, fixed at trade time.
    #[must_use]
    pub fn premium(&self) -> Price {
        self.premium
    }

    /// Net exposure in contracts: `size * sign(side)`.
    ///
    /// Never overflows: `try_new` bounds `size` by [`MAX_LEG_SIZE`].
    #[must_use]
    pub fn signed_quantity(&self) -> i64 {
        self.size * self.side.sign()
    }

    /// Expired legs are excluded from live Greeks and margin.
    #[must_use]
    pub fn is_live(&self, at: DateTime<Utc>) -> bool {
        self.expiry > at
    }
}

/// Net holding of one owner in one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub series_id: SeriesId,
    pub underlying: String,
    pub option_type: OptionType,
    pub strike: Price,
    pub expiry: DateTime<Utc>,
    pub net_quantity: i64,
    pub legs: usize,
}

impl Position {
    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.net_quantity == 0
    }
}

/// Every leg an owner held at one logical point in time.
///
/// Produced by a single atomic read of the position store; `version` is the
/// store's per-owner version at that read.
#[derive(Debug, Clone)]
pub struct PositionSet {
    owner: Address,
    version: u64,
    read_at: DateTime<Utc>,
    legs: Vec<StrategyLeg>,
}

impl PositionSet {
    #[must_use]
    pub fn new(
        owner: Address,
        version: u64,
        read_at: DateTime<Utc>,
        legs: Vec<StrategyLeg>,
    ) -> Self {
        Self {
            owner,
            version,
            read_at,
            legs,
        }
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn read_at(&self) -> DateTime<Utc> {
        self.read_at
    }

    #[must_use]
    pub fn legs(&self) -> &[StrategyLeg] {
        &self.legs
    }

    /// Legs still alive at the read timestamp.
    pub fn live_legs(&self) -> impl Iterator<Item = &StrategyLeg> {
        let at = self.read_at;
        self.legs.iter().filter(move |leg| leg.is_live(at))
    }

    #[must_use]
    pub fn expired_count(&self) -> usize {
        self.legs.len() - self.live_legs().count()
    }

    /// Materialize live legs into net positions keyed by series.
    #[must_use]
    pub fn positions(&self) -> Vec<Position> {
        let mut by_series: BTreeMap<&SeriesId, Position> = BTreeMap::new();
        for leg in self.live_legs() {
            by_series
                .entry(leg.series_id())
                .and_modify(|p| {
                    p.net_quantity = p.net_quantity.saturating_add(leg.signed_quantity());
                    p.legs += 1;
                })
                .or_insert_with(|| Position {
                    series_id: leg.series_id().clone(),
                    underlying: leg.underlying().to_string(),
                    option_type: leg.option_type(),
                    strike: leg.strike(),
                    expiry: leg.expiry(),
                    net_quantity: leg.signed_quantity(),
                    legs: 1,
                });
        }
        by_series.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn leg(side: Side, size: i64, expiry: DateTime<Utc>) -> StrategyLeg {
        StrategyLeg::try_new(
            SeriesId::new("ETH-C-3000"),
            "ETH",
            side,
            OptionType::Call,
            size,
            dec!(3000),
            expiry,
            dec!(100),
        )
        .unwrap()
    }

    #[test]
    fn rejects_zero_size() {
        let result = StrategyLeg::try_new(
            SeriesId::new("s"),
            "ETH",
            Side::Buy,
            OptionType::Put,
            0,
            dec!(10),
            Utc::now(),
            dec!(1),
        );
        assert_eq!(result.unwrap_err(), DomainError::ZeroSize);
    }

    #[test]
    fn rejects_sizes_beyond_the_limit() {
        for size in [i64::MIN, i64::MAX, MAX_LEG_SIZE + 1, -MAX_LEG_SIZE - 1] {
            let result = StrategyLeg::try_new(
                SeriesId::new("s"),
                "ETH",
                Side::Sell,
                OptionType::Call,
                size,
                dec!(10),
                Utc::now(),
                dec!(1),
            );
            assert_eq!(
                result.unwrap_err(),
                DomainError::SizeOutOfRange {
                    size,
                    max: MAX_LEG_SIZE
                }
            );
        }

        let expiry = Utc::now() + Duration::days(1);
        assert_eq!(
            leg(Side::Sell, -MAX_LEG_SIZE, expiry).signed_quantity(),
            MAX_LEG_SIZE
        );
    }

    #[test]
    fn rejects_non_positive_strike() {
        let result = StrategyLeg::try_new(
            SeriesId::new("s"),
            "ETH",
            Side::Buy,
            OptionType::Put,
            1,
            dec!(0),
            Utc::now(),
            dec!(1),
        );
        assert!(matches!(result, Err(DomainError::NonPositiveStrike { .. })));
    }

    #[test]
    fn rejects_negative_premium_and_blank_underlying() {
        let negative = StrategyLeg::try_new(
            SeriesId::new("s"),
            "ETH",
            Side::Sell,
            OptionType::Put,
            1,
            dec!(10),
            Utc::now(),
            dec!(-1),
        );
        assert!(matches!(negative, Err(DomainError::NegativePremium { .. })));

        let blank = StrategyLeg::try_new(
            SeriesId::new("s"),
            " ",
            Side::Sell,
            OptionType::Put,
            1,
            dec!(10),
            Utc::now(),
            dec!(1),
        );
        assert_eq!(blank.unwrap_err(), DomainError::EmptyUnderlying);
    }

    #[test]
    fn signed_quantity_applies_side() {
        let expiry = Utc::now() + Duration::days(30);
        assert_eq!(leg(Side::Buy, 5, expiry).signed_quantity(), 5);
        assert_eq!(leg(Side::Sell, 5, expiry).signed_quantity(), -5);
        assert_eq!(leg(Side::Sell, -5, expiry).signed_quantity(), 5);
    }

    #[test]
    fn opposite_legs_net_to_flat_position() {
        let now = Utc::now();
        let expiry = now + Duration::days(30);
        let set = PositionSet::new(
            Address::ZERO,
            3,
            now,
            vec![leg(Side::Sell, 5, expiry), leg(Side::Sell, -5, expiry)],
        );

        let positions = set.positions();
        assert_eq!(positions.len(), 1);
        assert!(positions[0].is_flat());
        assert_eq!(positions[0].legs, 2);
    }

    #[test]
    fn expired_legs_are_not_live() {
        let now = Utc::now();
        let set = PositionSet::new(
            Address::ZERO,
            1,
            now,
            vec![
                leg(Side::Buy, 1, now - Duration::days(1)),
                leg(Side::Buy, 1, now + Duration::days(1)),
            ],
        );
        assert_eq!(set.live_legs().count(), 1);
        assert_eq!(set.expired_count(), 1);
        assert_eq!(set.positions()[0].net_quantity, 1);
    }
}
