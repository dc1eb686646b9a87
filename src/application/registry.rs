//! Job records and the in-flight fingerprint index.
//!
//! Every status transition goes through here. A transition and the event
//! announcing it happen under one lock, so subscribers observe transitions
//! in exactly the order they were applied. Lock order is registry, then
//! queue or event channel; never the reverse.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::events::EventChannel;
use super::queue::{JobQueue, QueuedJob};
use crate::domain::job::InvalidTransition;
use crate::domain::{
    CancelFlag, Fingerprint, JobFailure, JobId, JobKind, JobOutput, JobPayload, JobRecord,
    JobStatus, StatusChange,
};
use crate::error::{Error, JobError};
use crate::port::inbound::{JobSubscription, SubmitOrigin};

/// Outcome of [`JobRegistry::admit`].
#[derive(Debug)]
pub struct Admission {
    pub job_id: JobId,
    pub status: JobStatus,
    pub origin: SubmitOrigin,
    pub subscription: JobSubscription,
}

/// Everything a worker needs to run one attempt.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    pub job_id: JobId,
    pub fingerprint: Fingerprint,
    pub kind: JobKind,
    pub payload: JobPayload,
    pub attempt: u32,
    pub max_attempts: u32,
    pub timeout: Duration,
    pub cancel: CancelFlag,
}

impl ClaimedJob {
    #[must_use]
    pub fn queued(&self) -> QueuedJob {
        QueuedJob {
            job_id: self.job_id,
            kind: self.kind,
        }
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    records: HashMap<JobId, JobRecord>,
    /// Fingerprint -> the unique Pending or Active job holding it.
    in_flight: HashMap<Fingerprint, JobId>,
}

impl RegistryState {
    fn release(&mut self, record: &JobRecord) {
        if self.in_flight.get(&record.fingerprint()) == Some(&record.id()) {
            self.in_flight.remove(&record.fingerprint());
        }
    }
}

/// Authoritative job state.
#[derive(Debug)]
pub struct JobRegistry {
    state: Mutex<RegistryState>,
    events: Arc<EventChannel>,
}

impl JobRegistry {
    #[must_use]
    pub fn new(events: Arc<EventChannel>) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            events,
        }
    }

    /// Join the in-flight job for `fingerprint`, or create and enqueue a new
    /// one. At most one job per fingerprint is ever Pending or Active.
    pub fn admit(
        &self,
        fingerprint: Fingerprint,
        payload: JobPayload,
        max_attempts: u32,
        timeout: Duration,
        queue: &JobQueue,
    ) -> Result<Admission, JobError> {
        let mut state = self.state.lock();

        if let Some(&job_id) = state.in_flight.get(&fingerprint) {
            if let Some(record) = state.records.get(&job_id) {
                let subscription = self.events.subscribe(job_id).unwrap_or_else(|| {
                    JobSubscription::resolved(StatusChange::from_record(record))
                });
                debug!(%job_id, fingerprint = %fingerprint.short(), "Joined in-flight job");
                return Ok(Admission {
                    job_id,
                    status: record.status(),
                    origin: SubmitOrigin::Joined,
                    subscription,
                });
            }
            warn!(%job_id, "In-flight index pointed at a missing record");
            state.in_flight.remove(&fingerprint);
        }

        let record = JobRecord::new(fingerprint, payload, max_attempts, timeout, Utc::now());
        let job_id = record.id();
        let kind = record.kind();
        queue.enqueue(QueuedJob { job_id, kind })?;

        // A worker that claims the job blocks on this lock until Pending is
        // published.
        self.events.publish(StatusChange::from_record(&record));
        state.in_flight.insert(fingerprint, job_id);
        state.records.insert(job_id, record);
        let subscription = self
            .events
            .subscribe(job_id)
            .ok_or_else(|| JobError::ResourceExhausted("event topic unavailable".into()))?;

        info!(%job_id, %kind, fingerprint = %fingerprint.short(), "Job enqueued");
        Ok(Admission {
            job_id,
            status: JobStatus::Pending,
            origin: SubmitOrigin::Created,
            subscription,
        })
    }

    /// `Pending -> Active` for a claimed job. `None` if the job is no
    /// longer pending (cancelled while queued, or unknown).
    pub fn begin(&self, job_id: JobId) -> Option<ClaimedJob> {
        let mut state = self.state.lock();
        let record = state.records.get_mut(&job_id)?;
        let attempt = match record.begin_attempt(Utc::now()) {
            Ok(attempt) => attempt,
            Err(err) => {
                debug!(%job_id, error = %err, "Skipping claimed job");
                return None;
            }
        };
        self.events.publish(StatusChange::from_record(record));
        Some(ClaimedJob {
            job_id,
            fingerprint: record.fingerprint(),
            kind: record.kind(),
            payload: record.payload().clone(),
            attempt,
            max_attempts: record.max_attempts(),
            timeout: record.timeout(),
            cancel: record.cancel_flag().clone(),
        })
    }

    /// `Active -> Completed`. Returns the published terminal change.
    pub fn complete(&self, job_id: JobId, output: JobOutput) -> Option<StatusChange> {
        self.finish(job_id, |record, now| record.complete(output, now))
    }

    /// `Active -> Failed`. Returns the published terminal change.
    pub fn fail(&self, job_id: JobId, failure: JobFailure) -> Option<StatusChange> {
        self.finish(job_id, |record, now| record.fail(failure, now))
    }

    /// `Active -> Cancelled` after the processor honoured a cancel request.
    pub fn cancel_active(&self, job_id: JobId) -> Option<StatusChange> {
        self.finish(job_id, |record, now| {
            if record.status() == JobStatus::Active {
                record.cancel(now)
            } else {
                Err(InvalidTransition {
                    from: record.status(),
                    to: JobStatus::Cancelled,
                })
            }
        })
    }

    /// `Active -> Pending` after a retryable failure. The fingerprint stays
    /// reserved.
    pub fn retry(&self, job_id: JobId, failure: JobFailure) -> bool {
        let mut state = self.state.lock();
        let Some(record) = state.records.get_mut(&job_id) else {
            return false;
        };
        match record.requeue(failure, Utc::now()) {
            Ok(()) => {
                self.events.publish(StatusChange::from_record(record));
                true
            }
            Err(err) => {
                warn!(%job_id, error = %err, "Retry rejected");
                false
            }
        }
    }

    /// Cancel a job on behalf of a caller.
    ///
    /// A Pending job is removed from the queue and becomes Cancelled. An
    /// Active job only gets its cancel flag raised; the processor decides
    /// at its next safe point. Terminal jobs are left untouched.
    pub fn cancel(&self, job_id: JobId, queue: &JobQueue) -> Result<JobStatus, Error> {
        let mut state = self.state.lock();
        let record = state
            .records
            .get_mut(&job_id)
            .ok_or(Error::UnknownJob(job_id))?;

        match record.status() {
            JobStatus::Pending => {
                queue.remove(job_id);
                record.cancel(Utc::now())?;
                self.events.publish(StatusChange::from_record(record));
                let record = record.clone();
                state.release(&record);
                info!(%job_id, "Pending job cancelled");
                Ok(JobStatus::Cancelled)
            }
            JobStatus::Active => {
                record.cancel_flag().request();
                info!(%job_id, "Cancellation requested for active job");
                Ok(JobStatus::Active)
            }
            status => Ok(status),
        }
    }

    /// Cancel Pending jobs that will never be claimed (shutdown).
    pub fn cancel_abandoned(&self, job_ids: &[JobId]) -> usize {
        let mut cancelled = 0;
        for &job_id in job_ids {
            let done = self.finish(job_id, |record, now| {
                if record.status() == JobStatus::Pending {
                    record.cancel(now)
                } else {
                    Err(InvalidTransition {
                        from: record.status(),
                        to: JobStatus::Cancelled,
                    })
                }
            });
            if done.is_some() {
                cancelled += 1;
            }
        }
        cancelled
    }

    fn finish<F>(&self, job_id: JobId, apply: F) -> Option<StatusChange>
    where
        F: FnOnce(&mut JobRecord, DateTime<Utc>) -> Result<(), InvalidTransition>,
    {
        let mut state = self.state.lock();
        let record = state.records.get_mut(&job_id)?;
        if let Err(err) = apply(record, Utc::now()) {
            debug!(%job_id, error = %err, "Terminal transition rejected");
            return None;
        }
        let change = StatusChange::from_record(record);
        self.events.publish(change.clone());
        let record = record.clone();
        state.release(&record);
        Some(change)
    }

    #[must_use]
    pub fn get(&self, job_id: JobId) -> Option<JobRecord> {
        self.state.lock().records.get(&job_id).cloned()
    }

    /// Job currently holding `fingerprint`, if any.
    #[must_use]
    pub fn in_flight(&self, fingerprint: &Fingerprint) -> Option<JobId> {
        self.state.lock().in_flight.get(fingerprint).copied()
    }

    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    /// Drop terminal records that finished before `cutoff`.
    pub fn evict_terminal(&self, cutoff: DateTime<Utc>) -> Vec<JobId> {
        let mut state = self.state.lock();
        let evicted: Vec<JobId> = state
            .records
            .values()
            .filter(|r| r.finished_at().is_some_and(|at| at < cutoff))
            .map(JobRecord::id)
            .collect();
        for job_id in &evicted {
            state.records.remove(job_id);
        }
        evicted
    }
}
