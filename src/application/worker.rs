//! Worker pool.
//!
//! Each worker loops: claim the queue head, mark it Active, run the
//! processor under the job's timeout, then apply the terminal or retry
//! transition. The number of workers bounds execution concurrency.
//!
//! A panicking attempt is caught and fails its job permanently; the worker
//! keeps running.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::backoff::{RetryDecision, RetryPolicy};
use super::cache::ResultCache;
use super::processor::Processors;
use super::queue::{JobQueue, QueuedJob};
use super::registry::{ClaimedJob, JobRegistry};
use crate::domain::JobFailure;
use crate::error::JobError;

/// State shared by every worker.
pub struct WorkerContext {
    pub registry: Arc<JobRegistry>,
    pub queue: Arc<JobQueue>,
    pub cache: Arc<ResultCache>,
    pub processors: Arc<Processors>,
    pub retry: RetryPolicy,
}

impl WorkerContext {
    async fn execute(&self, worker: usize, queued: QueuedJob) {
        let Some(job) = self.registry.begin(queued.job_id) else {
            debug!(worker, job_id = %queued.job_id, "Claimed job is no longer pending");
            return;
        };
        debug!(
            worker,
            job_id = %job.job_id,
            kind = %job.kind,
            attempt = job.attempt,
            "Attempt started"
        );

        let attempt = AssertUnwindSafe(self.processors.run(&job.payload, &job.cancel));
        let result = match tokio::time::timeout(job.timeout, attempt.catch_unwind()).await {
            Ok(Ok(result)) => result,
            Ok(Err(payload)) => Err(JobError::Panicked(panic_message(payload.as_ref()))),
            Err(_) => Err(JobError::Timeout(job.timeout)),
        };

        match result {
            Ok(output) => {
                if let Some(change) = self.registry.complete(job.job_id, output) {
                    self.cache.store(change);
                    info!(worker, job_id = %job.job_id, attempts = job.attempt, "Job completed");
                }
            }
            Err(JobError::Cancelled) => {
                if self.registry.cancel_active(job.job_id).is_some() {
                    info!(worker, job_id = %job.job_id, "Job cancelled during attempt");
                }
            }
            Err(err) => self.handle_failure(worker, &job, &err),
        }
    }

    fn handle_failure(&self, worker: usize, job: &ClaimedJob, err: &JobError) {
        let class = err.class();
        let failure = JobFailure::new(class.kind(), err.to_string(), job.attempt);

        // Cancellation requested mid-attempt wins over a retry.
        let decision = if job.cancel.is_requested() {
            RetryDecision::GiveUp
        } else {
            self.retry.decide(class, job.attempt)
        };

        match decision {
            RetryDecision::Retry(delay) => {
                warn!(
                    worker,
                    job_id = %job.job_id,
                    attempt = job.attempt,
                    max_attempts = job.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Attempt failed, retrying"
                );
                if !self.registry.retry(job.job_id, failure) {
                    return;
                }
                if !self.queue.requeue_after(job.queued(), delay) {
                    self.registry.cancel_abandoned(&[job.job_id]);
                    info!(job_id = %job.job_id, "Queue closed; retry abandoned");
                }
            }
            RetryDecision::GiveUp if job.cancel.is_requested() => {
                self.registry.cancel_active(job.job_id);
                info!(worker, job_id = %job.job_id, "Job cancelled after failed attempt");
            }
            RetryDecision::GiveUp => {
                error!(
                    worker,
                    job_id = %job.job_id,
                    attempts = job.attempt,
                    kind = %failure.kind,
                    error = %err,
                    "Job failed"
                );
                if let Some(change) = self.registry.fail(job.job_id, failure) {
                    self.cache.store(change);
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        return (*message).to_string();
    }
    "unknown panic payload".to_string()
}

/// Fixed-size set of worker tasks.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `count` workers. Must be called inside a Tokio runtime.
    #[must_use]
    pub fn spawn(count: usize, context: Arc<WorkerContext>) -> Self {
        let handles = (0..count.max(1))
            .map(|worker| {
                let context = Arc::clone(&context);
                tokio::spawn(async move {
                    debug!(worker, "Worker started");
                    while let Some(job) = context.queue.claim_next().await {
                        context.execute(worker, job).await;
                    }
                    debug!(worker, "Worker stopped");
                })
            })
            .collect();
        Self { handles }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker to exit. Workers exit once the queue is closed
    /// and their current attempt is finished.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(err) = handle.await {
                error!(error = %err, "Worker task panicked");
            }
        }
    }
}
