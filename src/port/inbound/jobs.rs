//! Job submission and notification contract exposed to the API layer.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::domain::{
    Fingerprint, JobId, JobKind, JobOutcome, JobPayload, JobRecord, JobStatus, StatusChange,
};
use crate::error::Result;

/// Ordered stream of status changes for one job.
///
/// Replays every transition published before the subscription was created,
/// then follows live transitions. Ends after the terminal state.
#[derive(Debug)]
pub struct JobSubscription {
    job_id: JobId,
    rx: mpsc::UnboundedReceiver<StatusChange>,
}

impl JobSubscription {
    #[must_use]
    pub fn new(job_id: JobId, rx: mpsc::UnboundedReceiver<StatusChange>) -> Self {
        Self { job_id, rx }
    }

    /// A subscription that yields a single, already known change.
    #[must_use]
    pub fn resolved(change: StatusChange) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let job_id = change.job_id;
        // Receiver is alive; the send cannot fail.
        let _ = tx.send(change);
        Self { job_id, rx }
    }

    #[must_use]
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Next transition, or `None` once the stream is finished.
    pub async fn next_change(&mut self) -> Option<StatusChange> {
        self.rx.recv().await
    }

    /// Drain the stream until the terminal outcome.
    pub async fn wait(mut self) -> JobOutcome {
        while let Some(change) = self.rx.recv().await {
            if let Some(outcome) = change.outcome() {
                return outcome;
            }
        }
        JobOutcome::Closed
    }
}

impl Stream for JobSubscription {
    type Item = StatusChange;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// How a submission was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitOrigin {
    /// A new job record was created and enqueued.
    Created,
    /// An equivalent job was already pending or active.
    Joined,
    /// A still-valid cached result was returned without a job.
    Cached,
}

/// Returned to the caller of `submit`.
#[derive(Debug)]
pub struct JobHandle {
    pub job_id: JobId,
    pub fingerprint: Fingerprint,
    pub kind: JobKind,
    /// Status observed at submission time.
    pub status: JobStatus,
    pub origin: SubmitOrigin,
    subscription: JobSubscription,
}

impl JobHandle {
    #[must_use]
    pub fn new(
        job_id: JobId,
        fingerprint: Fingerprint,
        kind: JobKind,
        status: JobStatus,
        origin: SubmitOrigin,
        subscription: JobSubscription,
    ) -> Self {
        Self {
            job_id,
            fingerprint,
            kind,
            status,
            origin,
            subscription,
        }
    }

    pub fn subscription_mut(&mut self) -> &mut JobSubscription {
        &mut self.subscription
    }

    #[must_use]
    pub fn into_subscription(self) -> JobSubscription {
        self.subscription
    }

    /// Wait for the job's terminal outcome.
    pub async fn wait(self) -> JobOutcome {
        self.subscription.wait().await
    }
}

/// Point-in-time counters for health and status output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeStats {
    pub accepting: bool,
    pub queued: usize,
    pub delayed: usize,
    pub in_flight: usize,
    pub tracked_jobs: usize,
    pub cached_results: usize,
    pub workers: usize,
}

/// Operations the API layer may invoke.
pub trait JobApi: Send + Sync {
    /// Submit work; deduplicated by fingerprint.
    fn submit(&self, payload: JobPayload) -> Result<JobHandle>;

    /// Attach an additional subscriber to a known job.
    fn subscribe(&self, job_id: JobId) -> Result<JobSubscription>;

    /// Cancel a pending job, or request cancellation of an active one.
    /// Returns the job's status after the request.
    fn cancel(&self, job_id: JobId) -> Result<JobStatus>;

    /// Current record, while retained.
    fn job(&self, job_id: JobId) -> Option<JobRecord>;

    fn stats(&self) -> RuntimeStats;
}
