//! Position storage port.

use alloy_primitives::Address;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::domain::{LegId, PositionSet, StrategyLeg};

/// Errors returned by a position store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A consistent read could not be established (e.g. a versioned read
    /// kept losing races with writers).
    #[error("conflicting write for {owner}: {reason}")]
    Conflict { owner: Address, reason: String },

    /// Backend unreachable.
    #[error("position store unavailable: {0}")]
    Unavailable(String),

    #[error("unknown leg {0}")]
    UnknownLeg(LegId),
}

/// Emitted after every committed mutation of an owner's legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionChange {
    pub owner: Address,
    /// Version after the mutation.
    pub version: u64,
}

/// Leg storage shared by trade settlement (writers) and risk snapshots
/// (readers).
///
/// `snapshot` must return every leg of the owner as of a single version:
/// no leg may be missing or doubled because of a concurrent write.
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Atomic read of all of `owner`'s legs.
    async fn snapshot(&self, owner: Address) -> Result<PositionSet, StoreError>;

    /// Record a settled leg. Returns the owner's new version.
    async fn record_leg(&self, owner: Address, leg: StrategyLeg) -> Result<u64, StoreError>;

    /// Remove a leg. Returns the owner's new version.
    async fn remove_leg(&self, owner: Address, leg_id: LegId) -> Result<u64, StoreError>;

    /// Current version of `owner`; 0 if nothing was ever recorded.
    ///
    /// Must reflect every write whose `record_leg` / `remove_leg` already
    /// returned.
    fn version(&self, owner: Address) -> u64;

    /// Change feed used to evict cached snapshots eagerly.
    fn subscribe(&self) -> broadcast::Receiver<PositionChange>;
}
