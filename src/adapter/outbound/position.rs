//! In-memory versioned position store.
//!
//! Each owner's legs sit behind one lock together with a version counter
//! that increments on every mutation, so a snapshot is always a single
//! consistent version.

use std::collections::HashMap;

use alloy_primitives::Address;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::{LegId, PositionSet, StrategyLeg};
use crate::port::outbound::{PositionChange, PositionStore, StoreError};

const CHANGE_FEED_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct OwnerBook {
    version: u64,
    legs: Vec<StrategyLeg>,
}

/// Process-local [`PositionStore`].
#[derive(Debug)]
pub struct InMemoryPositionStore {
    books: RwLock<HashMap<Address, OwnerBook>>,
    changes: broadcast::Sender<PositionChange>,
}

impl InMemoryPositionStore {
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            books: RwLock::new(HashMap::new()),
            changes,
        }
    }

    fn mutate<F>(&self, owner: Address, apply: F) -> Result<u64, StoreError>
    where
        F: FnOnce(&mut OwnerBook) -> Result<(), StoreError>,
    {
        let version = {
            let mut books = self.books.write();
            let book = books.entry(owner).or_default();
            apply(book)?;
            book.version += 1;
            book.version
        };
        // No receivers is fine.
        let _ = self.changes.send(PositionChange { owner, version });
        debug!(%owner, version, "Positions changed");
        Ok(version)
    }
}

impl Default for InMemoryPositionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PositionStore for InMemoryPositionStore {
    async fn snapshot(&self, owner: Address) -> Result<PositionSet, StoreError> {
        let books = self.books.read();
        let read_at = Utc::now();
        Ok(match books.get(&owner) {
            Some(book) => PositionSet::new(owner, book.version, read_at, book.legs.clone()),
            None => PositionSet::new(owner, 0, read_at, Vec::new()),
        })
    }

    async fn record_leg(&self, owner: Address, leg: StrategyLeg) -> Result<u64, StoreError> {
        self.mutate(owner, |book| {
            book.legs.push(leg);
            Ok(())
        })
    }

    async fn remove_leg(&self, owner: Address, leg_id: LegId) -> Result<u64, StoreError> {
        self.mutate(owner, |book| {
            let index = book
                .legs
                .iter()
                .position(|leg| leg.id() == leg_id)
                .ok_or(StoreError::UnknownLeg(leg_id))?;
            book.legs.remove(index);
            Ok(())
        })
    }

    fn version(&self, owner: Address) -> u64 {
        self.books.read().get(&owner).map_or(0, |b| b.version)
    }

    fn subscribe(&self) -> broadcast::Receiver<PositionChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OptionType, Side};
    use crate::testkit::domain::{leg, OWNER};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn every_mutation_bumps_version_and_notifies() {
        let store = InMemoryPositionStore::new();
        let mut feed = store.subscribe();

        let first = leg(Side::Buy, OptionType::Call, 2, dec!(2000));
        let id = first.id();
        assert_eq!(store.record_leg(OWNER, first).await.unwrap(), 1);
        assert_eq!(store.remove_leg(OWNER, id).await.unwrap(), 2);

        assert_eq!(feed.recv().await.unwrap().version, 1);
        assert_eq!(feed.recv().await.unwrap().version, 2);
        assert_eq!(store.version(OWNER), 2);
    }

    #[tokio::test]
    async fn removing_unknown_leg_leaves_version_unchanged() {
        let store = InMemoryPositionStore::new();
        store
            .record_leg(OWNER, leg(Side::Sell, OptionType::Put, 1, dec!(1800)))
            .await
            .unwrap();
        let err = store.remove_leg(OWNER, LegId::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownLeg(_)));
        assert_eq!(store.version(OWNER), 1);
    }

    #[tokio::test]
    async fn snapshot_of_unknown_owner_is_empty() {
        let store = InMemoryPositionStore::new();
        let set = store.snapshot(OWNER).await.unwrap();
        assert!(set.legs().is_empty());
        assert_eq!(set.version(), 0);
    }
}
