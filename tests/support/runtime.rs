use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use optivault::adapter::outbound::InMemoryPositionStore;
use optivault::application::{JobRuntime, RuntimeSettings};
use optivault::domain::{JobStatus, StatusChange};
use optivault::port::inbound::JobSubscription;
use optivault::port::outbound::PositionStore;
use optivault::testkit::config::fast_settings;
use optivault::testkit::market::ScriptedMarketData;
use optivault::testkit::pricing::FixedPricing;
use optivault::testkit::runtime::started_runtime;
use rust_decimal_macros::dec;

/// A started runtime plus handles on its doubles.
pub struct Harness {
    pub runtime: Arc<JobRuntime>,
    pub positions: Arc<InMemoryPositionStore>,
    pub market: Arc<ScriptedMarketData>,
    pub pricing: Arc<FixedPricing>,
}

impl Harness {
    /// Fast settings, an ETH quote at 2000 and fixed pricing.
    pub fn start() -> Self {
        Self::with(fast_settings(), eth_market(), FixedPricing::default())
    }

    pub fn with(
        settings: RuntimeSettings,
        market: ScriptedMarketData,
        pricing: FixedPricing,
    ) -> Self {
        let positions = Arc::new(InMemoryPositionStore::new());
        Self::over_store(settings, positions, market, pricing)
    }

    pub fn over_store(
        settings: RuntimeSettings,
        positions: Arc<InMemoryPositionStore>,
        market: ScriptedMarketData,
        pricing: FixedPricing,
    ) -> Self {
        let market = Arc::new(market);
        let pricing = Arc::new(pricing);
        let runtime = started_runtime(
            settings,
            positions.clone(),
            market.clone(),
            pricing.clone(),
        );
        Self {
            runtime,
            positions,
            market,
            pricing,
        }
    }

    /// Same wiring over an arbitrary store.
    pub fn with_store(
        settings: RuntimeSettings,
        store: Arc<dyn PositionStore>,
        positions: Arc<InMemoryPositionStore>,
    ) -> Self {
        let market = Arc::new(eth_market());
        let pricing = Arc::new(FixedPricing::default());
        let runtime = started_runtime(settings, store, market.clone(), pricing.clone());
        Self {
            runtime,
            positions,
            market,
            pricing,
        }
    }
}

pub fn eth_market() -> ScriptedMarketData {
    ScriptedMarketData::new().with_quote("ETH", dec!(2000), dec!(0.6))
}

/// Settings with a single worker, so a slow job blocks the queue.
pub fn single_worker() -> RuntimeSettings {
    RuntimeSettings {
        workers: 1,
        ..fast_settings()
    }
}

/// Collect every change until the stream ends, with a safety timeout.
pub async fn collect(mut subscription: JobSubscription) -> Vec<StatusChange> {
    let mut changes = Vec::new();
    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(change) = subscription.next_change().await {
            let terminal = change.status.is_terminal();
            changes.push(change);
            if terminal {
                break;
            }
        }
    })
    .await;
    assert!(drained.is_ok(), "subscription did not finish: {changes:?}");
    changes
}

pub fn statuses(changes: &[StatusChange]) -> Vec<JobStatus> {
    changes.iter().map(|c| c.status).collect()
}

/// Read changes until `status` is observed.
pub async fn wait_for(subscription: &mut JobSubscription, status: JobStatus) {
    let reached = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(change) = subscription.next_change().await {
            if change.status == status {
                return true;
            }
        }
        false
    })
    .await;
    assert_eq!(reached, Ok(true), "never observed {status}");
}

/// Poll `condition` until it holds or five seconds pass.
pub async fn eventually<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Await `future` with a five second limit.
pub async fn within<T>(future: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}
