//! Composition root: wires adapters into a [`JobRuntime`].

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::{BlackScholes, InMemoryPositionStore, StaticMarketData};
use crate::application::{CalldataEncoder, JobRuntime, Processors, RiskEngine};
use crate::error::Result;
use crate::infrastructure::config::Config;
use crate::port::outbound::{MarketDataProvider, PositionStore, PricingModel};

/// Adapters a runtime is built from.
pub struct Adapters {
    pub positions: Arc<dyn PositionStore>,
    pub market: Arc<dyn MarketDataProvider>,
    pub pricing: Arc<dyn PricingModel>,
}

/// A runtime wired to the default in-process adapters, with handles to the
/// concrete store and feed so callers can load positions and marks.
pub struct LocalServices {
    pub runtime: Arc<JobRuntime>,
    pub positions: Arc<InMemoryPositionStore>,
    pub market: Arc<StaticMarketData>,
}

/// Build a runtime (not yet started) over the given adapters.
pub fn build_runtime(config: &Config, adapters: Adapters) -> Result<JobRuntime> {
    let encoder = CalldataEncoder::new(config.vault_address()?, config.vault.asset_decimals);
    let engine = RiskEngine::new(
        Arc::clone(&adapters.positions),
        adapters.market,
        adapters.pricing,
        config.margin_policy(),
    );
    let settings = config.runtime_settings();
    info!(
        vault = %encoder.vault(),
        workers = settings.workers,
        "Runtime assembled"
    );
    Ok(JobRuntime::new(
        settings,
        Processors::new(encoder, engine),
        adapters.positions,
    ))
}

/// Build a runtime over an in-memory store, the configured static quotes and
/// Black-Scholes pricing.
pub fn build_local(config: &Config) -> Result<LocalServices> {
    let positions = Arc::new(InMemoryPositionStore::new());
    let market = Arc::new(StaticMarketData::from_quotes(config.market.quotes()));
    let runtime = build_runtime(
        config,
        Adapters {
            positions: positions.clone(),
            market: market.clone(),
            pricing: Arc::new(BlackScholes::new(config.pricing.risk_free_rate)),
        },
    )?;
    Ok(LocalServices {
        runtime: Arc::new(runtime),
        positions,
        market,
    })
}
