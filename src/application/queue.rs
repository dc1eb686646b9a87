//! FIFO job queue shared by the dispatcher and the worker pool.
//!
//! Fresh submissions go to the tail in arrival order. Retries wait in a
//! delayed set until their backoff expires and are then appended to the
//! tail, so a retry never jumps ahead of work that was already ready.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::domain::{JobId, JobKind};
use crate::error::JobError;

/// Queue entry; the record itself lives in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedJob {
    pub job_id: JobId,
    pub kind: JobKind,
}

#[derive(Debug)]
struct Delayed {
    ready_at: Instant,
    job: QueuedJob,
}

#[derive(Debug, Default)]
struct QueueState {
    ready: VecDeque<QueuedJob>,
    delayed: Vec<Delayed>,
    closed: bool,
}

impl QueueState {
    /// Move due retries to the tail, earliest deadline first.
    fn promote_due(&mut self, now: Instant) {
        if self.delayed.iter().all(|d| d.ready_at > now) {
            return;
        }
        let (mut due, waiting): (Vec<_>, Vec<_>) =
            self.delayed.drain(..).partition(|d| d.ready_at <= now);
        self.delayed = waiting;
        due.sort_by_key(|d| d.ready_at);
        self.ready.extend(due.into_iter().map(|d| d.job));
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.delayed.iter().map(|d| d.ready_at).min()
    }

    fn pending(&self) -> usize {
        self.ready.len() + self.delayed.len()
    }
}

/// Bounded FIFO with delayed re-entry.
#[derive(Debug)]
pub struct JobQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    capacity: usize,
}

impl JobQueue {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            capacity,
        }
    }

    /// Append a new job.
    ///
    /// Fails with [`JobError::ResourceExhausted`] when the queue is full or
    /// closed.
    pub fn enqueue(&self, job: QueuedJob) -> Result<(), JobError> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(JobError::ResourceExhausted("queue is closed".into()));
            }
            if state.pending() >= self.capacity {
                return Err(JobError::ResourceExhausted(format!(
                    "queue is full ({} jobs)",
                    self.capacity
                )));
            }
            state.ready.push_back(job);
        }
        self.notify.notify_one();
        Ok(())
    }

    /// Re-enter a job after `delay`. Retries bypass the capacity limit.
    ///
    /// Returns `false` if the queue is closed and the job was not accepted.
    pub fn requeue_after(&self, job: QueuedJob, delay: Duration) -> bool {
        {
            let mut state = self.state.lock();
            if state.closed {
                return false;
            }
            if delay.is_zero() {
                state.ready.push_back(job);
            } else {
                state.delayed.push(Delayed {
                    ready_at: Instant::now() + delay,
                    job,
                });
            }
        }
        // Wake a sleeper so it can re-arm its timer for the new deadline.
        self.notify.notify_one();
        true
    }

    /// Take the head of the queue without waiting.
    pub fn try_claim(&self) -> Option<QueuedJob> {
        let mut state = self.state.lock();
        state.promote_due(Instant::now());
        state.ready.pop_front()
    }

    /// Wait for the next ready job. Returns `None` once the queue is closed.
    pub async fn claim_next(&self) -> Option<QueuedJob> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let deadline = {
                let mut state = self.state.lock();
                if state.closed {
                    return None;
                }
                state.promote_due(Instant::now());
                if let Some(job) = state.ready.pop_front() {
                    return Some(job);
                }
                state.next_deadline()
            };

            match deadline {
                Some(deadline) => {
                    tokio::select! {
                        () = &mut notified => {}
                        () = tokio::time::sleep_until(deadline) => {}
                    }
                }
                None => notified.await,
            }
        }
    }

    /// Drop a job that has not been claimed yet.
    pub fn remove(&self, job_id: JobId) -> bool {
        let mut state = self.state.lock();
        if let Some(index) = state.ready.iter().position(|j| j.job_id == job_id) {
            state.ready.remove(index);
            return true;
        }
        if let Some(index) = state.delayed.iter().position(|d| d.job.job_id == job_id) {
            state.delayed.remove(index);
            return true;
        }
        false
    }

    /// Stop handing out work and return everything still waiting.
    pub fn close(&self) -> Vec<QueuedJob> {
        let leftover = {
            let mut state = self.state.lock();
            state.closed = true;
            let mut leftover: Vec<_> = state.ready.drain(..).collect();
            leftover.extend(state.delayed.drain(..).map(|d| d.job));
            leftover
        };
        self.notify.notify_waiters();
        leftover
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Jobs ready to be claimed now.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().ready.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().pending() == 0
    }

    /// Retries waiting out their backoff.
    #[must_use]
    pub fn delayed_len(&self) -> usize {
        self.state.lock().delayed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> QueuedJob {
        QueuedJob {
            job_id: JobId::new(),
            kind: JobKind::LpDeposit,
        }
    }

    #[test]
    fn claims_in_arrival_order() {
        let queue = JobQueue::new(8);
        let (a, b, c) = (job(), job(), job());
        for j in [a, b, c] {
            queue.enqueue(j).unwrap();
        }
        assert_eq!(queue.try_claim(), Some(a));
        assert_eq!(queue.try_claim(), Some(b));
        assert_eq!(queue.try_claim(), Some(c));
        assert_eq!(queue.try_claim(), None);
    }

    #[test]
    fn full_queue_rejects_new_work() {
        let queue = JobQueue::new(1);
        queue.enqueue(job()).unwrap();
        let err = queue.enqueue(job()).unwrap_err();
        assert!(matches!(err, JobError::ResourceExhausted(_)));
    }

    #[test]
    fn retries_bypass_capacity() {
        let queue = JobQueue::new(1);
        queue.enqueue(job()).unwrap();
        assert!(queue.requeue_after(job(), Duration::ZERO));
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_retry_lands_behind_ready_work() {
        let queue = JobQueue::new(8);
        let retry = job();
        let fresh = job();
        assert!(queue.requeue_after(retry, Duration::from_millis(50)));
        queue.enqueue(fresh).unwrap();

        assert_eq!(queue.try_claim(), Some(fresh));
        assert_eq!(queue.try_claim(), None);
        assert_eq!(queue.delayed_len(), 1);

        assert_eq!(queue.claim_next().await, Some(retry));
    }

    #[tokio::test]
    async fn waiting_claimer_is_woken_by_enqueue() {
        let queue = std::sync::Arc::new(JobQueue::new(8));
        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.claim_next().await })
        };
        tokio::task::yield_now().await;
        let j = job();
        queue.enqueue(j).unwrap();
        assert_eq!(waiter.await.unwrap(), Some(j));
    }

    #[tokio::test]
    async fn close_releases_waiters_and_returns_leftovers() {
        let queue = std::sync::Arc::new(JobQueue::new(8));
        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.claim_next().await })
        };
        tokio::task::yield_now().await;
        assert!(queue.close().is_empty());
        assert_eq!(waiter.await.unwrap(), None);

        let closed = JobQueue::new(8);
        closed.enqueue(job()).unwrap();
        assert!(closed.requeue_after(job(), Duration::from_secs(1)));
        assert_eq!(closed.close().len(), 2);
        assert!(!closed.requeue_after(job(), Duration::ZERO));
        assert!(closed.enqueue(job()).is_err());
    }

    #[test]
    fn remove_drops_unclaimed_job() {
        let queue = JobQueue::new(8);
        let j = job();
        queue.enqueue(j).unwrap();
        assert!(queue.remove(j.job_id));
        assert!(!queue.remove(j.job_id));
        assert!(queue.is_empty());
    }
}
