//! Runtime builders wired to test doubles.

use std::sync::Arc;

use alloy_primitives::Address;
use rust_decimal_macros::dec;

use super::domain::VAULT;
use super::market::ScriptedMarketData;
use super::pricing::FixedPricing;
use crate::adapter::outbound::InMemoryPositionStore;
use crate::application::{
    CalldataEncoder, JobRuntime, MarginPolicy, Processors, RiskEngine, RuntimeSettings,
};
use crate::port::outbound::{MarketDataProvider, PositionStore, PricingModel};

/// Asset decimals of the test vault.
pub const ASSET_DECIMALS: u8 = 6;

/// Processors over an empty store, an ETH quote and fixed pricing.
pub fn processors(vault: Address) -> Processors {
    let engine = RiskEngine::new(
        Arc::new(InMemoryPositionStore::new()),
        Arc::new(ScriptedMarketData::new().with_quote("ETH", dec!(2000), dec!(0.6))),
        Arc::new(FixedPricing::default()),
        MarginPolicy::default(),
    );
    Processors::new(CalldataEncoder::new(vault, ASSET_DECIMALS), engine)
}

/// Started runtime over the given doubles.
pub fn started_runtime(
    settings: RuntimeSettings,
    positions: Arc<dyn PositionStore>,
    market: Arc<dyn MarketDataProvider>,
    pricing: Arc<dyn PricingModel>,
) -> Arc<JobRuntime> {
    let engine = RiskEngine::new(Arc::clone(&positions), market, pricing, MarginPolicy::default());
    let runtime = JobRuntime::new(
        settings,
        Processors::new(CalldataEncoder::new(VAULT, ASSET_DECIMALS), engine),
        positions,
    );
    runtime.start();
    Arc::new(runtime)
}
