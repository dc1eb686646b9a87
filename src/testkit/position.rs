//! Position store wrappers for failure injection.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use alloy_primitives::Address;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::adapter::outbound::InMemoryPositionStore;
use crate::domain::{LegId, PositionSet, StrategyLeg};
use crate::port::outbound::{PositionChange, PositionStore, StoreError};

/// Delegates to an in-memory store but reports `Conflict` on the next
/// `n` snapshots.
#[derive(Debug)]
pub struct ConflictingStore {
    inner: Arc<InMemoryPositionStore>,
    conflicts_left: AtomicU32,
}

impl ConflictingStore {
    #[must_use]
    pub fn new(inner: Arc<InMemoryPositionStore>, conflicts: u32) -> Self {
        Self {
            inner,
            conflicts_left: AtomicU32::new(conflicts),
        }
    }
}

#[async_trait]
impl PositionStore for ConflictingStore {
    async fn snapshot(&self, owner: Address) -> Result<PositionSet, StoreError> {
        let conflict = self
            .conflicts_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if conflict {
            return Err(StoreError::Conflict {
                owner,
                reason: "version moved during read".into(),
            });
        }
        self.inner.snapshot(owner).await
    }

    async fn record_leg(&self, owner: Address, leg: StrategyLeg) -> Result<u64, StoreError> {
        self.inner.record_leg(owner, leg).await
    }

    async fn remove_leg(&self, owner: Address, leg_id: LegId) -> Result<u64, StoreError> {
        self.inner.remove_leg(owner, leg_id).await
    }

    fn version(&self, owner: Address) -> u64 {
        self.inner.version(owner)
    }

    fn subscribe(&self) -> broadcast::Receiver<PositionChange> {
        self.inner.subscribe()
    }
}
