//! Risk aggregation over an owner's option legs.

use std::collections::BTreeMap;
use std::sync::Arc;

use alloy_primitives::Address;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use super::margin::{MarginPolicy, ScenarioLeg};
use crate::domain::money::round_display;
use crate::domain::{CancelFlag, DomainError, Greeks, LegPricing, RiskSnapshot, StrategyLeg};
use crate::error::JobError;
use crate::port::outbound::{
    MarketDataError, MarketDataProvider, MarketQuote, PositionStore, PricingInput, PricingModel,
    StoreError,
};

/// Computes portfolio Greeks, margin and unrealized P&L for one owner.
///
/// Legs come from one atomic store read and are all priced at that read's
/// timestamp. Any leg that cannot be priced fails the whole snapshot; no
/// partial snapshot is ever returned.
pub struct RiskEngine {
    positions: Arc<dyn PositionStore>,
    market: Arc<dyn MarketDataProvider>,
    pricing: Arc<dyn PricingModel>,
    margin: MarginPolicy,
}

struct PricedLeg<'a> {
    leg: &'a StrategyLeg,
    quote: MarketQuote,
    pricing: LegPricing,
}

impl RiskEngine {
    #[must_use]
    pub fn new(
        positions: Arc<dyn PositionStore>,
        market: Arc<dyn MarketDataProvider>,
        pricing: Arc<dyn PricingModel>,
        margin: MarginPolicy,
    ) -> Self {
        Self {
            positions,
            market,
            pricing,
            margin,
        }
    }

    #[must_use]
    pub fn positions(&self) -> &Arc<dyn PositionStore> {
        &self.positions
    }

    /// Build a snapshot for `owner`.
    ///
    /// Checks `cancel` after each external call.
    #[instrument(skip_all, fields(owner = %owner))]
    pub async fn compute_snapshot(
        &self,
        owner: Address,
        cancel: &CancelFlag,
    ) -> Result<RiskSnapshot, JobError> {
        let set = self.positions.snapshot(owner).await.map_err(store_error)?;
        let as_of = set.read_at();
        ensure_not_cancelled(cancel)?;

        let mut quotes: BTreeMap<&str, MarketQuote> = BTreeMap::new();
        for leg in set.live_legs() {
            if quotes.contains_key(leg.underlying()) {
                continue;
            }
            let quote = self
                .market
                .quote(leg.underlying())
                .await
                .map_err(market_error)?;
            quotes.insert(leg.underlying(), quote);
            ensure_not_cancelled(cancel)?;
        }

        let mut priced = Vec::new();
        for leg in set.live_legs() {
            let quote = quotes[leg.underlying()];
            let input = PricingInput {
                strike: leg.strike(),
                expiry: leg.expiry(),
                side: leg.side(),
                option_type: leg.option_type(),
                underlying_price: quote.price,
                volatility: quote.volatility,
                as_of,
            };
            let pricing = self.pricing.price(&input).map_err(|err| {
                JobError::TransientDependency(format!(
                    "cannot price leg {} ({}): {err}",
                    leg.id(),
                    leg.series_id()
                ))
            })?;
            priced.push(PricedLeg {
                leg,
                quote,
                pricing,
            });
        }

        let mut net = Greeks::default();
        let mut unrealized_pnl = Decimal::ZERO;
        for p in &priced {
            let quantity = p.leg.signed_quantity();
            net = p
                .pricing
                .greeks
                .checked_scaled(quantity)
                .and_then(|greeks| net.checked_add(greeks))
                .ok_or_else(|| overflow("net greeks"))?;
            unrealized_pnl = p
                .pricing
                .value
                .checked_sub(p.leg.premium())
                .and_then(|edge| edge.checked_mul(Decimal::from(quantity)))
                .and_then(|pnl| unrealized_pnl.checked_add(pnl))
                .ok_or_else(|| overflow("unrealized P&L"))?;
        }

        let scenario_legs: Vec<ScenarioLeg<'_>> = priced
            .iter()
            .map(|p| ScenarioLeg {
                underlying: p.leg.underlying(),
                quantity: p.leg.signed_quantity(),
                spot: p.quote.price,
                greeks: p.pricing.greeks,
            })
            .collect();
        let margin = self.margin.evaluate(&scenario_legs)?;

        let net = net.rounded();
        debug!(
            version = set.version(),
            legs = priced.len(),
            expired = set.expired_count(),
            "Risk snapshot computed"
        );
        Ok(RiskSnapshot {
            owner,
            net_delta: net.delta,
            net_gamma: net.gamma,
            net_vega: net.vega,
            net_theta: net.theta,
            margin_required: margin.total,
            unrealized_pnl: round_display(unrealized_pnl),
            as_of,
            position_version: set.version(),
            legs_priced: priced.len(),
            expired_legs: set.expired_count(),
            margin_by_underlying: margin.by_underlying,
            positions: set.positions(),
        })
    }
}

fn ensure_not_cancelled(cancel: &CancelFlag) -> Result<(), JobError> {
    if cancel.is_requested() {
        return Err(JobError::Cancelled);
    }
    Ok(())
}

fn overflow(context: &'static str) -> JobError {
    DomainError::ArithmeticOverflow { context }.into()
}

fn store_error(err: StoreError) -> JobError {
    match err {
        StoreError::Conflict { .. } | StoreError::UnknownLeg(_) => {
            JobError::Consistency(err.to_string())
        }
        StoreError::Unavailable(_) => JobError::TransientDependency(err.to_string()),
    }
}

fn market_error(err: MarketDataError) -> JobError {
    JobError::TransientDependency(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::position::InMemoryPositionStore;
    use crate::testkit::domain::{leg, OWNER};
    use crate::testkit::market::ScriptedMarketData;
    use crate::testkit::pricing::FixedPricing;
    use crate::domain::{OptionType, Side};
    use rust_decimal_macros::dec;

    fn engine(store: Arc<InMemoryPositionStore>, pricing: FixedPricing) -> RiskEngine {
        RiskEngine::new(
            store,
            Arc::new(ScriptedMarketData::new().with_quote("ETH", dec!(2000), dec!(0.6))),
            Arc::new(pricing),
            MarginPolicy::default(),
        )
    }

    #[tokio::test]
    async fn offsetting_legs_net_to_zero_greeks() {
        let store = Arc::new(InMemoryPositionStore::new());
        for side in [Side::Buy, Side::Sell] {
            store
                .record_leg(OWNER, leg(side, OptionType::Call, 5, dec!(2100)))
                .await
                .unwrap();
        }

        let snapshot = engine(store, FixedPricing::default())
            .compute_snapshot(OWNER, &CancelFlag::default())
            .await
            .unwrap();
        assert_eq!(snapshot.net_delta, Decimal::ZERO);
        assert_eq!(snapshot.margin_required, Decimal::ZERO);
        assert_eq!(snapshot.legs_priced, 2);
        assert_eq!(snapshot.position_version, 2);
        assert_eq!(snapshot.positions.len(), 1);
        assert!(snapshot.positions[0].is_flat());
        assert_eq!(snapshot.positions[0].legs, 2);
    }

    #[tokio::test]
    async fn unpriceable_leg_fails_the_snapshot() {
        let store = Arc::new(InMemoryPositionStore::new());
        store
            .record_leg(OWNER, leg(Side::Buy, OptionType::Put, 1, dec!(1500)))
            .await
            .unwrap();

        let err = engine(store, FixedPricing::default().failing_strike(dec!(1500)))
            .compute_snapshot(OWNER, &CancelFlag::default())
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::TransientDependency(_)));
    }

    #[tokio::test]
    async fn cancelled_flag_stops_before_pricing() {
        let store = Arc::new(InMemoryPositionStore::new());
        store
            .record_leg(OWNER, leg(Side::Buy, OptionType::Put, 1, dec!(1500)))
            .await
            .unwrap();
        let cancel = CancelFlag::default();
        cancel.request();

        let err = engine(store, FixedPricing::default())
            .compute_snapshot(OWNER, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Cancelled));
    }

    #[tokio::test]
    async fn empty_book_is_a_zero_snapshot() {
        let store = Arc::new(InMemoryPositionStore::new());
        let snapshot = engine(store, FixedPricing::default())
            .compute_snapshot(OWNER, &CancelFlag::default())
            .await
            .unwrap();
        assert_eq!(snapshot.greeks(), Greeks::default());
        assert_eq!(snapshot.unrealized_pnl, Decimal::ZERO);
        assert_eq!(snapshot.position_version, 0);
    }

    #[tokio::test]
    async fn overflowing_valuation_is_a_validation_failure() {
        let store = Arc::new(InMemoryPositionStore::new());
        store
            .record_leg(OWNER, leg(Side::Sell, OptionType::Call, 2, dec!(2000)))
            .await
            .unwrap();
        let pricing = FixedPricing::default().with_call(LegPricing {
            value: Decimal::MAX,
            greeks: Greeks::default(),
        });

        let err = engine(store, pricing)
            .compute_snapshot(OWNER, &CancelFlag::default())
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Validation(_)));
        assert!(err.to_string().contains("unrealized P&L"), "{err}");
    }
}
