//! Per-job status fan-out with replay.
//!
//! Each job has a topic holding its full transition history. A subscriber
//! first receives the history, then live transitions, so a late subscriber
//! still sees every state in order. Nothing is published after a terminal
//! state and subscriber senders are dropped at that point, which ends the
//! stream.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::{JobId, StatusChange};
use crate::port::inbound::JobSubscription;

#[derive(Debug, Default)]
struct Topic {
    history: Vec<StatusChange>,
    subscribers: Vec<mpsc::UnboundedSender<StatusChange>>,
    terminal_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct ChannelState {
    topics: HashMap<JobId, Topic>,
    closed: bool,
}

/// Ordered, replayable status notifications keyed by job.
#[derive(Debug, Default)]
pub struct EventChannel {
    state: Mutex<ChannelState>,
}

impl EventChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transition to its job's history and deliver it.
    ///
    /// Returns `false` if the change was dropped because the job already
    /// reached a terminal state.
    pub fn publish(&self, change: StatusChange) -> bool {
        let mut state = self.state.lock();
        let topic = state.topics.entry(change.job_id).or_default();
        if topic.terminal_at.is_some() {
            warn!(
                job_id = %change.job_id,
                status = %change.status,
                "Dropping transition published after terminal state"
            );
            return false;
        }

        topic.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
        let terminal = change.status.is_terminal();
        topic.history.push(change);
        if terminal {
            topic.terminal_at = Some(Instant::now());
            topic.subscribers.clear();
        }
        true
    }

    /// Attach a subscriber, replaying history first.
    ///
    /// `None` if the job is unknown or its topic was evicted.
    pub fn subscribe(&self, job_id: JobId) -> Option<JobSubscription> {
        let mut state = self.state.lock();
        let closed = state.closed;
        let topic = state.topics.get_mut(&job_id)?;

        let (tx, rx) = mpsc::unbounded_channel();
        for change in &topic.history {
            // Receiver is held locally; sends cannot fail here.
            let _ = tx.send(change.clone());
        }
        if topic.terminal_at.is_none() && !closed {
            topic.subscribers.push(tx);
        }
        Some(JobSubscription::new(job_id, rx))
    }

    /// Most recent transition of a job.
    #[must_use]
    pub fn latest(&self, job_id: JobId) -> Option<StatusChange> {
        self.state
            .lock()
            .topics
            .get(&job_id)
            .and_then(|t| t.history.last().cloned())
    }

    /// Full transition history of a job.
    #[must_use]
    pub fn history(&self, job_id: JobId) -> Vec<StatusChange> {
        self.state
            .lock()
            .topics
            .get(&job_id)
            .map(|t| t.history.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn subscriber_count(&self, job_id: JobId) -> usize {
        self.state
            .lock()
            .topics
            .get(&job_id)
            .map_or(0, |t| t.subscribers.len())
    }

    /// Forget topics that went terminal more than `retention` ago.
    pub fn evict_terminal(&self, retention: Duration) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock();
        let before = state.topics.len();
        state.topics.retain(|_, topic| {
            topic
                .terminal_at
                .map_or(true, |at| now.duration_since(at) < retention)
        });
        let evicted = before - state.topics.len();
        if evicted > 0 {
            debug!(evicted, "Evicted terminal event topics");
        }
        evicted
    }

    /// Drop every subscriber sender.
    ///
    /// Buffered changes stay readable; streams then end. Subscriptions made
    /// after this point receive history only.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        for topic in state.topics.values_mut() {
            topic.subscribers.clear();
        }
    }
}
