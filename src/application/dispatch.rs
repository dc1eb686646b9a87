//! Submission entry point.
//!
//! A submission is answered, in order, by a still-valid cached success, by
//! the in-flight job with the same fingerprint, or by a freshly enqueued
//! job. Callers cannot tell a joined job from one they created except by
//! [`SubmitOrigin`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::cache::ResultCache;
use super::queue::JobQueue;
use super::registry::JobRegistry;
use crate::domain::{fingerprint, JobPayload};
use crate::error::{Error, Result};
use crate::port::inbound::{JobHandle, JobSubscription, SubmitOrigin};
use crate::port::outbound::PositionStore;

/// Deduplicating front door of the runtime.
pub struct Dispatcher {
    registry: Arc<JobRegistry>,
    queue: Arc<JobQueue>,
    cache: Arc<ResultCache>,
    positions: Arc<dyn PositionStore>,
    accepting: Arc<AtomicBool>,
    max_attempts: u32,
    job_timeout: Duration,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        registry: Arc<JobRegistry>,
        queue: Arc<JobQueue>,
        cache: Arc<ResultCache>,
        positions: Arc<dyn PositionStore>,
        accepting: Arc<AtomicBool>,
        max_attempts: u32,
        job_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            queue,
            cache,
            positions,
            accepting,
            max_attempts,
            job_timeout,
        }
    }

    pub fn submit(&self, payload: JobPayload) -> Result<JobHandle> {
        if !self.accepting.load(Ordering::SeqCst) {
            return Err(Error::NotAccepting);
        }

        let kind = payload.kind();
        let fingerprint = fingerprint(&payload);

        if let Some(hit) = self.cache.reusable(&fingerprint, self.positions.as_ref()) {
            debug!(job_id = %hit.job_id(), %kind, fingerprint = %fingerprint.short(), "Cache hit");
            let status = hit.change.status;
            return Ok(JobHandle::new(
                hit.job_id(),
                fingerprint,
                kind,
                status,
                SubmitOrigin::Cached,
                JobSubscription::resolved(hit.change),
            ));
        }

        let admission = self.registry.admit(
            fingerprint,
            payload,
            self.max_attempts,
            self.job_timeout,
            &self.queue,
        )?;
        Ok(JobHandle::new(
            admission.job_id,
            fingerprint,
            kind,
            admission.status,
            admission.origin,
            admission.subscription,
        ))
    }
}
