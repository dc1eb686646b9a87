//! Fingerprint-keyed result cache.
//!
//! Entries expire after a TTL. Risk snapshots also depend on the owner's
//! position version: once the store reports a newer version, any snapshot
//! computed at an older one is stale even inside its TTL. Failed outcomes
//! are kept for inspection but never satisfy a submission.

use std::time::Duration;

use alloy_primitives::Address;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::{Fingerprint, JobFailure, JobId, JobOutput, JobStatus, StatusChange};
use crate::port::outbound::PositionStore;

/// Position version a cached result was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub owner: Address,
    pub version: u64,
}

impl Dependency {
    /// Dependency carried by a job output, if any.
    #[must_use]
    pub fn of(output: &JobOutput) -> Option<Self> {
        output.as_risk().map(|snapshot| Self {
            owner: snapshot.owner,
            version: snapshot.position_version,
        })
    }
}

/// A stored terminal outcome.
#[derive(Debug, Clone)]
pub struct CachedResult {
    /// Terminal change of the job that produced the outcome.
    pub change: StatusChange,
    dependency: Option<Dependency>,
    stored_at: Instant,
}

impl CachedResult {
    #[must_use]
    pub fn job_id(&self) -> JobId {
        self.change.job_id
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.change.status == JobStatus::Completed
    }

    #[must_use]
    pub fn output(&self) -> Option<&JobOutput> {
        self.change.result.as_ref()
    }

    #[must_use]
    pub fn failure(&self) -> Option<&JobFailure> {
        self.change.error_info.as_ref()
    }

    #[must_use]
    pub fn dependency(&self) -> Option<Dependency> {
        self.dependency
    }
}

/// Concurrent result cache with TTL and version invalidation.
#[derive(Debug)]
pub struct ResultCache {
    entries: DashMap<Fingerprint, CachedResult>,
    /// Newest position version observed per owner.
    watermarks: DashMap<Address, u64>,
    ttl: Duration,
}

impl ResultCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            watermarks: DashMap::new(),
            ttl,
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CachedResult, now: Instant) -> bool {
        if now.duration_since(entry.stored_at) >= self.ttl {
            return false;
        }
        entry.dependency.map_or(true, |dep| {
            self.watermarks
                .get(&dep.owner)
                .map_or(true, |mark| dep.version >= *mark)
        })
    }

    /// A still-valid entry, successful or failed.
    #[must_use]
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<CachedResult> {
        let now = Instant::now();
        self.entries
            .get(fingerprint)
            .filter(|e| self.is_fresh(e, now))
            .map(|e| e.clone())
    }

    /// A still-valid successful entry; the only kind that short-circuits a
    /// submission.
    ///
    /// Snapshots are checked against the owner's current version in
    /// `positions`, so a write that already returned is never answered with
    /// an older snapshot, even before its change notification arrives.
    #[must_use]
    pub fn reusable(
        &self,
        fingerprint: &Fingerprint,
        positions: &dyn PositionStore,
    ) -> Option<CachedResult> {
        let hit = self.get(fingerprint).filter(CachedResult::is_success)?;
        if let Some(dep) = hit.dependency {
            let current = positions.version(dep.owner);
            if current > dep.version {
                debug!(
                    owner = %dep.owner,
                    cached = dep.version,
                    current,
                    "Cached snapshot superseded by a committed write"
                );
                self.invalidate_owner(dep.owner, current);
                return None;
            }
        }
        Some(hit)
    }

    /// Store the terminal change of a finished job.
    ///
    /// Non-terminal changes are ignored. A change computed against a version
    /// already superseded is not stored.
    pub fn store(&self, change: StatusChange) {
        if !change.status.is_terminal() {
            return;
        }
        let dependency = change.result.as_ref().and_then(Dependency::of);
        if let Some(dep) = dependency {
            let stale = self
                .watermarks
                .get(&dep.owner)
                .is_some_and(|mark| dep.version < *mark);
            if stale {
                debug!(
                    fingerprint = %change.fingerprint.short(),
                    version = dep.version,
                    "Not caching snapshot of superseded position version"
                );
                return;
            }
        }
        self.entries.insert(
            change.fingerprint,
            CachedResult {
                change,
                dependency,
                stored_at: Instant::now(),
            },
        );
    }

    /// Record that `owner`'s positions reached `version`, dropping every
    /// entry computed against an older version.
    pub fn invalidate_owner(&self, owner: Address, version: u64) -> usize {
        self.watermarks
            .entry(owner)
            .and_modify(|mark| *mark = (*mark).max(version))
            .or_insert(version);
        let before = self.entries.len();
        self.entries.retain(|_, e| {
            e.dependency
                .map_or(true, |dep| dep.owner != owner || dep.version >= version)
        });
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(%owner, version, removed, "Invalidated cached snapshots");
        }
        removed
    }

    /// Drop every version-dependent entry. Used when change notifications
    /// were lost and the watermarks can no longer be trusted.
    pub fn invalidate_dependent(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.dependency.is_none());
        before.saturating_sub(self.entries.len())
    }

    /// Remove expired and superseded entries.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| self.is_fresh(e, now));
        before.saturating_sub(self.entries.len())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
